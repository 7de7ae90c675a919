use libxml::parser::Parser;
use libxml::tree::Document;
use url::Url;

use crate::{Options, Readability, ReadabilityError};

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

fn article_page(extra_head: &str, body: &str) -> String {
    format!("<html><head><title>Example Site</title>{extra_head}</head><body>{body}</body></html>")
}

#[test]
fn element_limit_is_enforced_before_parsing() {
    let document = parse(&article_page(
        "",
        "<div><p>One</p><p>Two</p><p>Three</p></div>",
    ));

    let options = Options {
        max_elems_to_parse: 3,
        ..Options::default()
    };

    match Readability::new(options).parse(document) {
        Err(ReadabilityError::TooManyElements { count, limit }) => {
            assert!(count > limit);
            assert_eq!(limit, 3);
        }
        other => panic!("expected a sized-document error, got {other:?}"),
    }
}

#[test]
fn documents_under_the_limit_parse() {
    let body_text = filler(8);
    let document = parse(&article_page("", &format!("<p>{body_text}</p>")));

    let options = Options {
        max_elems_to_parse: 1000,
        ..Options::default()
    };

    assert!(Readability::new(options).parse(document).unwrap().is_some());
}

#[test]
fn extracts_article_with_metadata() {
    let body_text = filler(8);
    let document = parse(&article_page(
        "<meta property=\"og:title\" content=\"A Fine Article\"/>\
         <meta name=\"description\" content=\"An excerpt.\"/>\
         <meta property=\"og:site_name\" content=\"Example\"/>",
        &format!("<div id=\"main\"><p>{body_text}</p></div>"),
    ));

    let article = Readability::new(Options::default())
        .parse(document)
        .unwrap()
        .expect("the article should be extracted");

    assert_eq!(article.title, "A Fine Article");
    assert_eq!(article.excerpt.as_deref(), Some("An excerpt."));
    assert_eq!(article.site_name.as_deref(), Some("Example"));
    assert!(article.content.contains("readability-page-1"));
    assert!(article.text_content.contains("quick brown fox"));
    assert_eq!(article.length, article.text_content.chars().count());
    assert!(article.length >= 500);
}

#[test]
fn resolves_title_separators() {
    let body_text = filler(8);
    let document = parse(&format!(
        "<html><head><title>The Quick Brown Fox Jumps - Example Site</title></head>\
         <body><div id=\"main\"><p>{body_text}</p></div></body></html>"
    ));

    let article = Readability::new(Options::default())
        .parse(document)
        .unwrap()
        .unwrap();

    assert_eq!(article.title, "The Quick Brown Fox Jumps");
}

#[test]
fn meta_byline_wins_over_detected_byline() {
    let body_text = filler(8);
    let document = parse(&article_page(
        "<meta name=\"author\" content=\"Meta Author\"/>",
        &format!(
            "<div id=\"main\"><div class=\"byline\">Page Author</div><p>{body_text}</p></div>"
        ),
    ));

    let article = Readability::new(Options::default())
        .parse(document)
        .unwrap()
        .unwrap();

    assert_eq!(article.byline.as_deref(), Some("Meta Author"));
}

#[test]
fn detected_byline_is_used_without_meta() {
    let body_text = filler(8);
    let document = parse(&article_page(
        "",
        &format!(
            "<div id=\"main\"><div class=\"byline\">Page Author</div><p>{body_text}</p></div>"
        ),
    ));

    let article = Readability::new(Options::default())
        .parse(document)
        .unwrap()
        .unwrap();

    assert_eq!(article.byline.as_deref(), Some("Page Author"));
}

#[test]
fn excerpt_falls_back_to_first_paragraph() {
    let first = "A leading paragraph that opens the article with enough text to be scored.";
    let rest = filler(8);
    let document = parse(&article_page(
        "",
        &format!("<div id=\"main\"><p>{first}</p><p>{rest}</p></div>"),
    ));

    let article = Readability::new(Options::default())
        .parse(document)
        .unwrap()
        .unwrap();

    assert_eq!(article.excerpt.as_deref(), Some(first));
}

#[test]
fn strips_classes_outside_preserved_set() {
    let body_text = filler(8);
    let document = parse(&article_page(
        "",
        &format!("<div id=\"main\"><p class=\"story highlight\">{body_text}</p></div>"),
    ));

    let article = Readability::new(Options::default())
        .parse(document)
        .unwrap()
        .unwrap();

    assert!(!article.content.contains("story"));
    assert!(article.content.contains("class=\"page\""));
}

#[test]
fn preserves_configured_classes() {
    let body_text = filler(8);
    let document = parse(&article_page(
        "",
        &format!("<div id=\"main\"><p class=\"story highlight\">{body_text}</p></div>"),
    ));

    let options = Options {
        classes_to_preserve: vec!["highlight".to_owned()],
        ..Options::default()
    };

    let article = Readability::new(options).parse(document).unwrap().unwrap();

    assert!(article.content.contains("class=\"highlight\""));
    assert!(!article.content.contains("story"));
}

#[test]
fn keep_classes_leaves_attributes_alone() {
    let body_text = filler(8);
    let document = parse(&article_page(
        "",
        &format!("<div id=\"main\"><p class=\"story\">{body_text}</p></div>"),
    ));

    let options = Options {
        keep_classes: true,
        ..Options::default()
    };

    let article = Readability::new(options).parse(document).unwrap().unwrap();

    assert!(article.content.contains("class=\"story\""));
}

#[test]
fn unwraps_javascript_links() {
    let body_text = filler(8);
    let document = parse(&article_page(
        "",
        &format!(
            "<div id=\"main\"><p>{body_text} <a href=\"javascript:void(0)\">Share this</a></p></div>"
        ),
    ));

    let article = Readability::new(Options::default())
        .parse(document)
        .unwrap()
        .unwrap();

    assert!(!article.content.contains("javascript:"));
    assert!(article.content.contains("Share this"));
}

#[test]
fn resolves_relative_uris_against_base() {
    let body_text = filler(8);
    let document = parse(&article_page(
        "",
        &format!(
            "<div id=\"main\"><p>{body_text} <a href=\"/about\">about us</a></p>\
             <p><img src=\"../img/pic.jpg\"/> {body_text}</p></div>"
        ),
    ));

    let options = Options {
        base_url: Some(Url::parse("https://example.com/news/article/").unwrap()),
        ..Options::default()
    };

    let article = Readability::new(options).parse(document).unwrap().unwrap();

    assert!(article.content.contains("https://example.com/about"));
    assert!(article.content.contains("https://example.com/news/img/pic.jpg"));
    assert!(!article.content.contains("\"/about\""));
}

#[test]
fn copies_lazy_image_source() {
    let body_text = filler(8);
    let document = parse(&article_page(
        "",
        &format!(
            "<div id=\"main\"><p>{body_text}</p>\
             <p><img class=\"lazyload\" data-src=\"https://example.com/hero.jpg\"/> {body_text}</p></div>"
        ),
    ));

    let article = Readability::new(Options::default())
        .parse(document)
        .unwrap()
        .unwrap();

    assert!(article
        .content
        .contains(" src=\"https://example.com/hero.jpg\""));
}

#[test]
fn removes_heading_duplicating_the_title() {
    let body_text = filler(8);
    let document = parse(&article_page(
        "<meta property=\"og:title\" content=\"Understanding the Borrow Checker\"/>",
        &format!(
            "<div id=\"main\"><h2>Understanding the Borrow Checker</h2><p>{body_text}</p></div>"
        ),
    ));

    let article = Readability::new(Options::default())
        .parse(document)
        .unwrap()
        .unwrap();

    assert_eq!(article.title, "Understanding the Borrow Checker");
    assert!(!article.content.contains("Understanding the Borrow Checker"));
}

#[test]
fn returns_no_result_for_contentless_pages() {
    let document = parse("<html><body><div class=\"x\"> </div></body></html>");

    let article = Readability::new(Options::default()).parse(document).unwrap();

    assert!(article.is_none());
}
