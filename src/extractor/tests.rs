use libxml::parser::Parser;
use libxml::tree::Document;

use super::Extractor;
use crate::options::Options;
use crate::util::Util;

fn parse(html: &str) -> Document {
    libxml::tree::node::set_node_rc_guard(10);
    let _ = env_logger::builder().is_test(true).try_init();

    Parser::default_html().parse_string(html).unwrap()
}

fn filler(sentences: usize) -> String {
    "The quick brown fox jumps over the lazy dog while the rain keeps falling outside. "
        .repeat(sentences)
        .trim()
        .to_owned()
}

#[test]
fn accepts_long_paragraph_on_first_pass() {
    let body_text = filler(8);
    let document = parse(&format!(
        "<html><body><p>{body_text}</p></body></html>"
    ));

    let extracted = Extractor::extract(document, &Options::default(), "")
        .unwrap()
        .expect("a single long paragraph should be enough content");

    let text = Util::get_inner_text(&extracted.content, true);
    assert!(text.len() >= 500);
    assert!(text.contains("quick brown fox"));
}

#[test]
fn wraps_content_in_page_container() {
    let body_text = filler(8);
    let document = parse(&format!(
        "<html><body><div id=\"main\"><p>{body_text}</p></div></body></html>"
    ));

    let extracted = Extractor::extract(document, &Options::default(), "")
        .unwrap()
        .unwrap();

    let pages = Util::get_elements_by_tag_name(&extracted.content, "*")
        .into_iter()
        .filter(|node| node.get_attribute("id").as_deref() == Some("readability-page-1"))
        .collect::<Vec<_>>();
    assert_eq!(pages.len(), 1);
    assert_eq!(
        pages[0].get_attribute("class").as_deref(),
        Some("page")
    );
}

#[test]
fn joins_short_closing_paragraph_sibling() {
    let paragraph = filler(3);
    let document = parse(&format!(
        "<html><body>\
         <div id=\"main\"><p>{paragraph}</p><p>{paragraph}</p><p>{paragraph}</p></div>\
         <p>Short closing remark that is under eighty characters and ends well.</p>\
         </body></html>"
    ));

    let extracted = Extractor::extract(document, &Options::default(), "")
        .unwrap()
        .unwrap();

    let text = Util::get_inner_text(&extracted.content, true);
    assert!(text.contains("quick brown fox"));
    assert!(text.contains("Short closing remark"));
}

#[test]
fn relaxes_flags_to_recover_unlikely_content() {
    // All the content hides in a container whose class matches the
    // unlikely-candidates pattern; only relaxing flags can recover it.
    let body_text = filler(8);
    let document = parse(&format!(
        "<html><body><div class=\"sidebar\"><p>{body_text}</p></div></body></html>"
    ));

    let extracted = Extractor::extract(document, &Options::default(), "")
        .unwrap()
        .expect("flag relaxation should recover the content");

    let text = Util::get_inner_text(&extracted.content, true);
    assert!(text.contains("quick brown fox"));
    assert!(text.len() >= 500);
}

#[test]
fn exhausted_flags_return_longest_attempt() {
    // Too short to ever clear the threshold; the best attempt wins.
    let body_text = filler(3);
    let document = parse(&format!(
        "<html><body><div class=\"sidebar\"><p>{body_text}</p></div></body></html>"
    ));

    let extracted = Extractor::extract(document, &Options::default(), "")
        .unwrap()
        .expect("the longest attempt should be returned");

    let text = Util::get_inner_text(&extracted.content, true);
    assert!(!text.is_empty());
    assert!(text.len() < 500);
    assert!(text.contains("quick brown fox"));
}

#[test]
fn returns_none_when_no_attempt_has_text() {
    let document = parse("<html><body><div class=\"x\"> </div></body></html>");

    let extracted = Extractor::extract(document, &Options::default(), "").unwrap();

    assert!(extracted.is_none());
}

#[test]
fn records_and_removes_byline() {
    let body_text = filler(8);
    let document = parse(&format!(
        "<html><body><div id=\"main\">\
         <div class=\"byline\">John Doe</div>\
         <p>{body_text}</p>\
         </div></body></html>"
    ));

    let extracted = Extractor::extract(document, &Options::default(), "")
        .unwrap()
        .unwrap();

    assert_eq!(extracted.byline.as_deref(), Some("John Doe"));
    let text = Util::get_inner_text(&extracted.content, true);
    assert!(!text.contains("John Doe"));
}

#[test]
fn detects_text_direction_from_ancestors() {
    let body_text = filler(8);
    let document = parse(&format!(
        "<html><body dir=\"rtl\"><p>{body_text}</p></body></html>"
    ));

    let extracted = Extractor::extract(document, &Options::default(), "")
        .unwrap()
        .unwrap();

    assert_eq!(extracted.dir.as_deref(), Some("rtl"));
}

#[test]
fn respects_candidate_list_capacity() {
    let paragraph = filler(3);
    let sections = (0..8)
        .map(|i| format!("<div id=\"s{i}\"><p>{paragraph}</p></div>"))
        .collect::<String>();
    let document = parse(&format!("<html><body>{sections}</body></html>"));

    let options = Options {
        nb_top_candidates: 1,
        ..Options::default()
    };

    let extracted = Extractor::extract(document, &options, "")
        .unwrap()
        .expect("extraction should still work with a single candidate slot");

    assert!(!Util::get_inner_text(&extracted.content, true).is_empty());
}

#[test]
fn removes_hidden_nodes() {
    let body_text = filler(8);
    let document = parse(&format!(
        "<html><body><div id=\"main\">\
         <p>{body_text}</p>\
         <p style=\"display: none\">You should never see this sentence anywhere.</p>\
         </div></body></html>"
    ));

    let extracted = Extractor::extract(document, &Options::default(), "")
        .unwrap()
        .unwrap();

    let text = Util::get_inner_text(&extracted.content, true);
    assert!(!text.contains("never see this sentence"));
}
