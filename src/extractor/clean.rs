use libxml::tree::{Document, Node};

use super::state::State;
use crate::constants;
use crate::error::ReadabilityError;
use crate::util::Util;

/// Prepare the selected article content for display: strip presentational
/// noise, junk subtrees and spurious structure, while preserving data
/// tables and video embeds.
pub(crate) fn prep_article(
    content: &mut Node,
    document: &Document,
    state: &State,
    title: &str,
) -> Result<(), ReadabilityError> {
    clean_styles(content);

    // Check for data tables before we continue, to avoid removing items in
    // those tables, which will often be isolated even though they're
    // visually linked to other content-ful elements (text, images, etc.).
    mark_data_tables(content);

    fix_lazy_images(content, document);

    // Clean out junk from the article content
    clean_conditionally(content, "form", state);
    clean_conditionally(content, "fieldset", state);
    clean(content, "object");
    clean(content, "embed");
    clean(content, "h1");
    clean(content, "footer");
    clean(content, "link");
    clean(content, "aside");

    // Clean out elements with little content that have "share" in their
    // id/class combinations from final top candidates, which means we don't
    // remove the top candidates even if they have "share".
    for top_level_child in content.get_child_elements() {
        clean_matched_nodes(&top_level_child, |node, match_string| {
            constants::SHARE_ELEMENTS.is_match(match_string)
                && node.get_content().len() < constants::DEFAULT_CHAR_THRESHOLD
        });
    }

    // If there is only one h2 and its text content substantially equals the
    // article title, they are probably using it as a header and not a
    // subheader, so remove it since we already extract the title separately.
    let h2_nodes = Util::get_elements_by_tag_name(content, "h2");
    if h2_nodes.len() == 1 && !title.is_empty() {
        let h2_text = h2_nodes[0].get_content();
        let length_similar_rate = (h2_text.len() as f64 - title.len() as f64) / title.len() as f64;

        if length_similar_rate.abs() < 0.5 {
            let titles_match = if length_similar_rate > 0.0 {
                h2_text.contains(title)
            } else {
                title.contains(h2_text.as_str())
            };
            if titles_match {
                clean(content, "h2");
            }
        }
    }

    clean(content, "iframe");
    clean(content, "input");
    clean(content, "textarea");
    clean(content, "select");
    clean(content, "button");
    clean_headers(content, state);

    // Do these last as the previous stuff may have removed junk that will
    // affect these
    clean_conditionally(content, "table", state);
    clean_conditionally(content, "ul", state);
    clean_conditionally(content, "div", state);

    remove_empty_paragraphs(content);
    remove_br_before_paragraphs(content);
    collapse_single_cell_tables(content);

    Ok(())
}

// Remove the style and deprecated presentational attributes from the node
// and everything under it. SVG subtrees keep theirs.
fn clean_styles(node: &mut Node) {
    if node.get_name().to_lowercase() == "svg" {
        return;
    }

    for attribute in constants::PRESENTATIONAL_ATTRIBUTES {
        let _ = node.remove_attribute(attribute);
    }

    if constants::DEPRECATED_SIZE_ATTRIBUTE_ELEMS.contains(node.get_name().to_uppercase().as_str())
    {
        let _ = node.remove_attribute("width");
        let _ = node.remove_attribute("height");
    }

    let mut child = node.get_first_element_child();
    while let Some(mut current) = child {
        clean_styles(&mut current);
        child = current.get_next_element_sibling();
    }
}

// Look for 'data' (as opposed to 'layout') tables and record the verdict on
// each, so the conditional cleaning pass can preserve them.
fn mark_data_tables(root: &Node) {
    for mut table in Util::get_elements_by_tag_name(root, "table") {
        if table
            .get_attribute("role")
            .map(|role| role == "presentation")
            .unwrap_or(false)
        {
            let _ = table.set_attribute(constants::DATA_TABLE_ATTR, "false");
            continue;
        }

        if table
            .get_attribute("datatable")
            .map(|datatable| datatable == "0")
            .unwrap_or(false)
        {
            let _ = table.set_attribute(constants::DATA_TABLE_ATTR, "false");
            continue;
        }

        let has_summary = table
            .get_attribute("summary")
            .map(|summary| !summary.is_empty())
            .unwrap_or(false);
        let has_caption = Util::get_first_element_by_tag_name(&table, "caption")
            .map(|caption| !caption.get_child_nodes().is_empty())
            .unwrap_or(false);
        if has_summary || has_caption {
            let _ = table.set_attribute(constants::DATA_TABLE_ATTR, "true");
            continue;
        }

        // If the table has a descendant with any of these tags, consider a
        // data table:
        let data_table_descendants = ["col", "colgroup", "tfoot", "thead", "th"];
        if data_table_descendants
            .iter()
            .any(|tag| Util::get_first_element_by_tag_name(&table, tag).is_some())
        {
            log::debug!("Data table because found data-y descendant");
            let _ = table.set_attribute(constants::DATA_TABLE_ATTR, "true");
            continue;
        }

        // Nested tables indicate a layout table:
        if Util::get_first_element_by_tag_name(&table, "table").is_some() {
            let _ = table.set_attribute(constants::DATA_TABLE_ATTR, "false");
            continue;
        }

        let (rows, columns) = Util::get_row_and_column_count(&table);
        if rows >= 10 || columns > 4 {
            let _ = table.set_attribute(constants::DATA_TABLE_ATTR, "true");
            continue;
        }

        // Now just go by size entirely:
        let _ = table.set_attribute(
            constants::DATA_TABLE_ATTR,
            if rows * columns > 10 { "true" } else { "false" },
        );
    }
}

// Convert images and figures that have properties like data-src into images
// that can be loaded without JS.
fn fix_lazy_images(root: &Node, document: &Document) {
    let mut nodes = Util::get_elements_by_tag_name(root, "img");
    nodes.extend(Util::get_elements_by_tag_name(root, "picture"));
    nodes.extend(Util::get_elements_by_tag_name(root, "figure"));

    for mut node in nodes {
        let class_contains_lazy = node
            .get_attribute("class")
            .map(|class| class.to_lowercase().contains("lazy"))
            .unwrap_or(false);
        if (node.has_attribute("src") || node.has_attribute("srcset")) && !class_contains_lazy {
            continue;
        }

        let tag_name = node.get_name().to_uppercase();
        for (name, value) in node.get_attributes() {
            if name == "src" || name == "srcset" {
                continue;
            }

            let copy_to = if constants::LAZY_SRCSET.is_match(&value) {
                "srcset"
            } else if constants::LAZY_SRC.is_match(&value) {
                "src"
            } else {
                continue;
            };

            if tag_name == "IMG" || tag_name == "PICTURE" {
                // An attribute name invalid for the target is dropped here,
                // never escalated.
                let _ = node.set_attribute(copy_to, &value);
            } else if tag_name == "FIGURE" {
                // If the item is a <figure> that does not contain an image
                // or picture, create one and place it inside the figure.
                let contains_image = Util::get_first_element_by_tag_name(&node, "img").is_some()
                    || Util::get_first_element_by_tag_name(&node, "picture").is_some();
                if !contains_image {
                    if let Ok(mut img) = Node::new("img", None, document) {
                        let _ = img.set_attribute(copy_to, &value);
                        let _ = node.add_child(&mut img);
                    }
                }
            }
        }
    }
}

// Whether the node or anything under it references a known video host.
// Covers <object> embeds that carry the url on a nested <param> or <embed>.
fn protects_video(node: &Node) -> bool {
    if Util::is_video_embed(node) {
        return true;
    }

    if node.get_name().to_lowercase() == "object" {
        return constants::VIDEOS.is_match(&node.get_content())
            || Util::get_elements_by_tag_name(node, "*")
                .iter()
                .any(Util::is_video_embed);
    }

    false
}

// Clean a node of all elements of type "tag".
// (Unless it's a youtube/vimeo video. People love movies.)
fn clean(root: &Node, tag: &str) {
    let is_embed = constants::EMBED_TAG_NAMES.contains(tag.to_uppercase().as_str());

    let nodes = Util::get_elements_by_tag_name(root, tag);
    for mut node in nodes.into_iter().rev() {
        if is_embed && protects_video(&node) {
            continue;
        }

        node.unlink();
    }
}

// Clean out elements whose id/class combination matches the filter,
// starting below the given node.
fn clean_matched_nodes(node: &Node, filter: impl Fn(&Node, &str) -> bool) {
    let end_of_search_marker_node = Util::next_node(node, true);
    let mut next = Util::next_node(node, false);

    while let Some(mut current) = next {
        if Some(&current) == end_of_search_marker_node.as_ref() {
            break;
        }

        let match_string = format!(
            "{} {}",
            current.get_attribute("class").unwrap_or_default(),
            current.get_attribute("id").unwrap_or_default()
        );

        if filter(&current, &match_string) {
            next = Util::remove_and_next(&mut current);
        } else {
            next = Util::next_node(&current, false);
        }
    }
}

// Clean out spurious headers from the content.
fn clean_headers(root: &Node, state: &State) {
    let mut nodes = Util::get_elements_by_tag_name(root, "h1");
    nodes.append(&mut Util::get_elements_by_tag_name(root, "h2"));

    for mut node in nodes.into_iter().rev() {
        if Util::get_class_weight(&node, state.weigh_classes) < 0 {
            log::debug!(
                "Removing header with low class weight: {} {}",
                node.get_name(),
                node.get_attribute("class").unwrap_or_default()
            );
            node.unlink();
        }
    }
}

// Clean an element of all tags of type "tag" if they look fishy.
// "Fishy" is an algorithm based on content length, classnames, link density,
// number of images & embeds, etc.
fn clean_conditionally(root: &Node, tag: &str, state: &State) {
    if !state.clean_conditionally {
        return;
    }

    // Traverse backwards so we can remove nodes at the same time without
    // affecting the traversal.
    let nodes = Util::get_elements_by_tag_name(root, tag);
    for mut node in nodes.into_iter().rev() {
        if should_remove_conditionally(&node, tag, state) {
            node.unlink();
        }
    }
}

fn should_remove_conditionally(node: &Node, tag: &str, state: &State) -> bool {
    // First check if this node IS a data table, in which case don't remove
    // it. Next check if we're inside a data table, in which case don't
    // remove it as well.
    if tag == "table" && Util::is_data_table(node) {
        return false;
    }

    if Util::has_ancestor_tag(node, "table", Some(u64::MAX), Some(Util::is_data_table)) {
        return false;
    }

    let weight = Util::get_class_weight(node, state.weigh_classes);
    if weight < 0 {
        return true;
    }

    if Util::get_char_count(node, ',') >= 10 {
        return false;
    }

    // If there are not very many commas, and the number of non-paragraph
    // elements is more than paragraphs or other ominous signs, remove the
    // element.
    let is_list = tag == "ul" || tag == "ol";
    let p = Util::get_elements_by_tag_name(node, "p").len();
    let img = Util::get_elements_by_tag_name(node, "img").len();
    let li = Util::get_elements_by_tag_name(node, "li").len() as i64 - 100;
    let input = Util::get_elements_by_tag_name(node, "input").len();

    let mut embed_count = 0;
    for embed_tag in ["object", "embed", "iframe"] {
        for embed_node in Util::get_elements_by_tag_name(node, embed_tag) {
            // If this embed references a video host, don't delete the node.
            if protects_video(&embed_node) {
                return false;
            }

            embed_count += 1;
        }
    }

    let link_density = Util::get_link_density(node);
    let content_length = Util::get_inner_text(node, true).len();
    let has_figure_ancestor =
        Util::has_ancestor_tag(node, "figure", None, None::<fn(&Node) -> bool>);

    (img > 1 && (p as f64) / (img as f64) < 0.5 && !has_figure_ancestor)
        || (!is_list && li > p as i64)
        || (input as f64) > f64::floor(p as f64 / 3.0)
        || (!is_list && content_length < 25 && (img == 0 || img > 2) && !has_figure_ancestor)
        || (!is_list && weight < 25 && link_density > 0.2)
        || (weight >= 25 && link_density > 0.5)
        || (embed_count == 1 && content_length < 75)
        || embed_count > 1
}

// Remove paragraphs that carry neither text nor any image, embed, object or
// iframe. At this point nasty iframes have been removed, only embedded
// video ones remain.
fn remove_empty_paragraphs(root: &Node) {
    let p_nodes = Util::get_elements_by_tag_name(root, "p");
    for mut p_node in p_nodes.into_iter().rev() {
        let img_count = Util::get_elements_by_tag_name(&p_node, "img").len();
        let embed_count = Util::get_elements_by_tag_name(&p_node, "embed").len();
        let object_count = Util::get_elements_by_tag_name(&p_node, "object").len();
        let iframe_count = Util::get_elements_by_tag_name(&p_node, "iframe").len();
        let total_count = img_count + embed_count + object_count + iframe_count;

        if total_count == 0 && Util::get_inner_text(&p_node, false).is_empty() {
            p_node.unlink();
        }
    }
}

fn remove_br_before_paragraphs(root: &Node) {
    for mut br_node in Util::get_elements_by_tag_name(root, "br") {
        if let Some(next) = Util::next_element(br_node.get_next_sibling()) {
            if next.get_name().to_uppercase() == "P" {
                br_node.unlink();
            }
        }
    }
}

// Collapse tables that consist of a single row with a single cell into the
// cell itself, retagged by its content.
fn collapse_single_cell_tables(root: &Node) {
    for table in Util::get_elements_by_tag_name(root, "table") {
        let tbody = if Util::has_single_tag_inside_element(&table, "TBODY") {
            match table.get_child_elements().into_iter().next() {
                Some(tbody) => tbody,
                None => continue,
            }
        } else {
            table.clone()
        };

        if !Util::has_single_tag_inside_element(&tbody, "TR") {
            continue;
        }
        let row = match tbody.get_child_elements().into_iter().next() {
            Some(row) => row,
            None => continue,
        };

        if !Util::has_single_tag_inside_element(&row, "TD") {
            continue;
        }
        let mut cell = match row.get_child_elements().into_iter().next() {
            Some(cell) => cell,
            None => continue,
        };

        let all_phrasing_content = cell
            .get_child_nodes()
            .iter()
            .all(Util::is_phrasing_content);
        if cell
            .set_name(if all_phrasing_content { "p" } else { "div" })
            .is_err()
        {
            continue;
        }

        if let Some(mut parent) = table.get_parent() {
            if let Err(error) = parent.replace_child_node(cell, table) {
                log::warn!("Failed to collapse single-cell table: {error}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use libxml::parser::Parser;
    use libxml::tree::Document;

    use super::*;

    fn parse(html: &str) -> Document {
        libxml::tree::node::set_node_rc_guard(10);
        let _ = env_logger::builder().is_test(true).try_init();

        Parser::default_html().parse_string(html).unwrap()
    }

    fn marked_table(html: &str) -> bool {
        let document = parse(html);
        let root = document.get_root_element().unwrap();

        mark_data_tables(&root);

        let table = Util::get_first_element_by_tag_name(&root, "table").unwrap();
        Util::is_data_table(&table)
    }

    #[test]
    fn presentation_role_marks_layout_table() {
        // role wins over every other signal
        assert!(!marked_table(
            "<html><body><table role=\"presentation\" summary=\"data\"><tr><th>h</th></tr></table></body></html>",
        ));
    }

    #[test]
    fn datatable_zero_marks_layout_table() {
        assert!(!marked_table(
            "<html><body><table datatable=\"0\" summary=\"data\"><tr><td>x</td></tr></table></body></html>",
        ));
    }

    #[test]
    fn summary_marks_data_table_regardless_of_size() {
        assert!(marked_table(
            "<html><body><table summary=\"data\"><tr><td>a</td><td>b</td></tr><tr><td>c</td><td>d</td></tr></table></body></html>",
        ));
    }

    #[test]
    fn caption_marks_data_table() {
        assert!(marked_table(
            "<html><body><table><caption>numbers</caption><tr><td>1</td></tr></table></body></html>",
        ));
    }

    #[test]
    fn th_descendant_marks_data_table() {
        assert!(marked_table(
            "<html><body><table><tr><th>h</th></tr><tr><td>1</td></tr></table></body></html>",
        ));
    }

    #[test]
    fn nested_table_marks_layout_table() {
        assert!(!marked_table(
            "<html><body><table><tr><td><table><tr><td>inner</td></tr></table></td></tr></table></body></html>",
        ));
    }

    #[test]
    fn many_rows_mark_data_table() {
        let rows = "<tr><td>x</td></tr>".repeat(10);
        assert!(marked_table(&format!(
            "<html><body><table>{rows}</table></body></html>"
        )));
    }

    #[test]
    fn cell_count_fallback_marks_data_table() {
        // 3 rows x 4 columns = 12 > 10
        let rows = "<tr><td>a</td><td>b</td><td>c</td><td>d</td></tr>".repeat(3);
        assert!(marked_table(&format!(
            "<html><body><table>{rows}</table></body></html>"
        )));
    }

    #[test]
    fn small_plain_table_marks_layout_table() {
        assert!(!marked_table(
            "<html><body><table><tr><td>a</td><td>b</td></tr></table></body></html>",
        ));
    }

    #[test]
    fn marking_is_deterministic() {
        let document = parse(
            "<html><body><table summary=\"data\"><tr><td>a</td></tr></table></body></html>",
        );
        let root = document.get_root_element().unwrap();

        mark_data_tables(&root);
        let table = Util::get_first_element_by_tag_name(&root, "table").unwrap();
        let first = Util::is_data_table(&table);

        mark_data_tables(&root);
        assert_eq!(first, Util::is_data_table(&table));
    }

    #[test]
    fn data_table_survives_conditional_cleaning() {
        let document = parse(
            "<html><body><div><table summary=\"data\"><tr><td><a href=\"/x\">1</a></td><td><a href=\"/y\">2</a></td></tr></table></div></body></html>",
        );
        let root = document.get_root_element().unwrap();
        let state = State::default();

        mark_data_tables(&root);
        clean_conditionally(&root, "table", &state);

        assert!(Util::get_first_element_by_tag_name(&root, "table").is_some());
    }

    #[test]
    fn link_heavy_layout_table_is_cleaned() {
        let document = parse(
            "<html><body><div><table><tr><td><a href=\"/x\">one</a></td><td><a href=\"/y\">two</a></td></tr></table></div></body></html>",
        );
        let root = document.get_root_element().unwrap();
        let state = State::default();

        mark_data_tables(&root);
        clean_conditionally(&root, "table", &state);

        assert!(Util::get_first_element_by_tag_name(&root, "table").is_none());
    }

    #[test]
    fn conditional_cleaning_respects_relaxed_flag() {
        let document = parse(
            "<html><body><div><table><tr><td><a href=\"/x\">one</a></td><td><a href=\"/y\">two</a></td></tr></table></div></body></html>",
        );
        let root = document.get_root_element().unwrap();
        let state = State {
            clean_conditionally: false,
            ..State::default()
        };

        mark_data_tables(&root);
        clean_conditionally(&root, "table", &state);

        assert!(Util::get_first_element_by_tag_name(&root, "table").is_some());
    }

    #[test]
    fn negative_weight_node_is_cleaned() {
        let document = parse(
            "<html><body><section><div class=\"sidebar\">Related links and other boilerplate text.</div></section></body></html>",
        );
        let root = document.get_root_element().unwrap();
        let state = State::default();

        clean_conditionally(&root, "div", &state);

        assert!(Util::get_first_element_by_tag_name(&root, "div").is_none());
    }

    #[test]
    fn video_embed_is_preserved() {
        let document = parse(
            "<html><body><div><iframe src=\"https://www.youtube.com/embed/abc\"></iframe></div></body></html>",
        );
        let root = document.get_root_element().unwrap();

        clean(&root, "iframe");

        assert!(Util::get_first_element_by_tag_name(&root, "iframe").is_some());
    }

    #[test]
    fn plain_iframe_is_cleaned() {
        let document = parse(
            "<html><body><div><iframe src=\"https://ads.example.com/frame\"></iframe></div></body></html>",
        );
        let root = document.get_root_element().unwrap();

        clean(&root, "iframe");

        assert!(Util::get_first_element_by_tag_name(&root, "iframe").is_none());
    }

    #[test]
    fn single_cell_table_collapses_to_paragraph() {
        let document = parse(
            "<html><body><div><table><tbody><tr><td><span>Hello</span> world</td></tr></tbody></table></div></body></html>",
        );
        let root = document.get_root_element().unwrap();

        collapse_single_cell_tables(&root);

        assert!(Util::get_first_element_by_tag_name(&root, "table").is_none());
        let paragraph = Util::get_first_element_by_tag_name(&root, "p").unwrap();
        assert_eq!(Util::get_inner_text(&paragraph, true), "Hello world");
    }

    #[test]
    fn single_cell_table_with_block_content_collapses_to_div() {
        let document = parse(
            "<html><body><section><table><tr><td><p>block content</p></td></tr></table></section></body></html>",
        );
        let root = document.get_root_element().unwrap();

        collapse_single_cell_tables(&root);

        assert!(Util::get_first_element_by_tag_name(&root, "table").is_none());
        let section = Util::get_first_element_by_tag_name(&root, "section").unwrap();
        let div = Util::get_first_element_by_tag_name(&section, "div").unwrap();
        assert_eq!(Util::get_inner_text(&div, true), "block content");
    }

    #[test]
    fn multi_cell_table_is_not_collapsed() {
        let document = parse(
            "<html><body><table><tr><td>a</td><td>b</td></tr></table></body></html>",
        );
        let root = document.get_root_element().unwrap();

        collapse_single_cell_tables(&root);

        assert!(Util::get_first_element_by_tag_name(&root, "table").is_some());
    }
}
