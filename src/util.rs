use libxml::{
    tree::{Document, Node, NodeType},
    xpath::Context,
};

use crate::constants;
use crate::error::ReadabilityError;

pub struct Util;

impl Util {
    pub fn evaluate_xpath(
        xpath_ctx: &Context,
        xpath: &str,
        throw_if_empty: bool,
    ) -> Result<Vec<Node>, ReadabilityError> {
        let res = xpath_ctx.evaluate(xpath).map_err(|()| {
            log::debug!("Evaluation of xpath '{}' yielded no results", xpath);
            ReadabilityError::Xml
        })?;

        let node_vec = res.get_nodes_as_vec();

        if node_vec.is_empty() && throw_if_empty {
            log::debug!("Evaluation of xpath '{}' yielded no results", xpath);
            return Err(ReadabilityError::Xml);
        }

        Ok(node_vec)
    }

    pub fn extract_value(context: &Context, xpath: &str) -> Result<String, ReadabilityError> {
        let node_vec = Util::evaluate_xpath(context, xpath, false)?;
        if let Some(val) = node_vec.first() {
            return Ok(val.get_content());
        }

        Err(ReadabilityError::Xml)
    }

    pub fn is_probably_visible(node: &Node) -> bool {
        let style_hidden = node
            .get_attribute("style")
            .map(|style| constants::STYLE_HIDDEN.is_match(&style))
            .unwrap_or(false);
        let is_hidden = node.has_attribute("hidden");
        let aria_hidden = node
            .get_attribute("aria-hidden")
            .map(|attr| attr == "true")
            .unwrap_or(false);
        let has_fallback_image = node
            .get_class_names()
            .iter()
            .any(|class| class.contains("fallback-image"));

        !style_hidden && !is_hidden && (!aria_hidden || has_fallback_image)
    }

    pub fn is_whitespace(node: &Node) -> bool {
        let is_text_node = node
            .get_type()
            .map(|t| t == NodeType::TextNode)
            .unwrap_or(false);
        let is_element_node = node
            .get_type()
            .map(|t| t == NodeType::ElementNode)
            .unwrap_or(false);

        (is_text_node && node.get_content().trim().is_empty())
            || (is_element_node && node.get_name().to_uppercase() == "BR")
    }

    pub fn remove_and_next(node: &mut Node) -> Option<Node> {
        let next_node = Self::next_node(node, true);
        node.unlink();
        next_node
    }

    // Depth-first pre-order traversal over elements. Pass true to skip the
    // node itself and its subtree, e.g. after removing it.
    pub fn next_node(node: &Node, ignore_self_and_kids: bool) -> Option<Node> {
        let mut node = node.clone();

        // First check for kids if those aren't being ignored
        let first_child = node.get_first_element_child();
        if !ignore_self_and_kids && first_child.is_some() {
            return first_child;
        }

        // Then for siblings...
        let next_sibling = node.get_next_element_sibling();
        if next_sibling.is_some() {
            return next_sibling;
        }

        // And finally, move up the parent chain *and* find a sibling
        // (because this is depth-first traversal, we will have already
        // seen the parent nodes themselves).
        while let Some(parent) = node.get_parent() {
            let parent_name = parent.get_name().to_uppercase();
            if parent_name == "HTML" {
                break;
            }

            let next_sibling = parent.get_next_element_sibling();
            if next_sibling.is_some() {
                return next_sibling;
            } else {
                node = parent;
            }
        }

        None
    }

    // The nearest following sibling that is an element, skipping whitespace
    // text nodes in between.
    pub fn next_element(node: Option<Node>) -> Option<Node> {
        let mut next = node;

        while let Some(n) = next {
            let is_element = n
                .get_type()
                .map(|t| t == NodeType::ElementNode)
                .unwrap_or(false);
            if is_element {
                return Some(n);
            }

            if !n.get_content().trim().is_empty() {
                return None;
            }

            next = n.get_next_sibling();
        }

        None
    }

    pub fn get_inner_text(node: &Node, normalize_spaces: bool) -> String {
        let content = node.get_content().trim().to_owned();
        if normalize_spaces {
            constants::NORMALIZE.replace_all(&content, " ").into()
        } else {
            content
        }
    }

    pub fn get_char_count(node: &Node, char: char) -> usize {
        Util::get_inner_text(node, true).split(char).count() - 1
    }

    pub fn has_ancestor_tag<F>(
        node: &Node,
        tag_name: &str,
        max_depth: Option<u64>,
        filter: Option<F>,
    ) -> bool
    where
        F: Fn(&Node) -> bool,
    {
        let max_depth = max_depth.unwrap_or(3);
        let tag_name = tag_name.to_uppercase();
        let mut depth = 0;
        let mut node = node.get_parent();

        loop {
            if depth > max_depth {
                return false;
            }

            let tmp_node = match node {
                Some(node) => node,
                None => return false,
            };

            if tmp_node.get_name().to_uppercase() == tag_name
                && filter
                    .as_ref()
                    .map(|filter| filter(&tmp_node))
                    .unwrap_or(true)
            {
                return true;
            }

            node = tmp_node.get_parent();
            depth += 1;
        }
    }

    // Check if this node has only whitespace and a single element child with
    // the given tag.
    pub fn has_single_tag_inside_element(node: &Node, tag: &str) -> bool {
        let children = node.get_child_elements();
        if children.len() != 1
            || children
                .first()
                .map(|n| n.get_name().to_uppercase() != tag.to_uppercase())
                .unwrap_or(true)
        {
            return false;
        }

        // And there should be no text nodes with real content
        !node.get_child_nodes().iter().any(|n| {
            n.get_type()
                .map(|t| t == NodeType::TextNode)
                .unwrap_or(false)
                && constants::HAS_CONTENT.is_match(&n.get_content())
        })
    }

    pub fn is_element_without_content(node: &Node) -> bool {
        if let Some(node_type) = node.get_type() {
            let children_len = node.get_child_elements().len();

            node_type == NodeType::ElementNode
                && node.get_content().trim().is_empty()
                && (children_len == 0
                    || children_len
                        == Self::get_elements_by_tag_name(node, "br").len()
                            + Self::get_elements_by_tag_name(node, "hr").len())
        } else {
            false
        }
    }

    pub fn get_elements_by_tag_name(node: &Node, tag: &str) -> Vec<Node> {
        let tag = tag.to_uppercase();
        let all_tags = tag == "*";
        let mut vec = Vec::new();

        fn get_elems(node: &Node, tag: &str, vec: &mut Vec<Node>, all_tags: bool) {
            for child in node.get_child_elements() {
                if all_tags || child.get_name().to_uppercase() == tag {
                    vec.push(child.clone());
                }
                get_elems(&child, tag, vec, all_tags);
            }
        }

        get_elems(node, &tag, &mut vec, all_tags);
        vec
    }

    pub fn get_first_element_by_tag_name(node: &Node, tag: &str) -> Option<Node> {
        Self::get_elements_by_tag_name(node, tag).into_iter().next()
    }

    pub fn get_link_density(node: &Node) -> f64 {
        let text_length = Util::get_inner_text(node, true).len();
        if text_length == 0 {
            return 0.0;
        }

        let mut link_length = 0;

        let link_nodes = Util::get_elements_by_tag_name(node, "a");
        for link_node in link_nodes {
            link_length += Util::get_inner_text(&link_node, true).len();
        }

        link_length as f64 / text_length as f64
    }

    // Determine whether element has any children block level elements.
    pub fn has_child_block_element(node: &Node) -> bool {
        node.get_child_nodes().iter().any(|node| {
            constants::DIV_TO_P_ELEMS.contains(node.get_name().to_uppercase().as_str())
                || Self::has_child_block_element(node)
        })
    }

    pub fn is_phrasing_content(node: &Node) -> bool {
        let tag_name = node.get_name().to_uppercase();
        let is_text_node = node
            .get_type()
            .map(|t| t == NodeType::TextNode)
            .unwrap_or(false);

        is_text_node
            || constants::PHRASING_ELEMS.contains(&tag_name.as_str())
            || ((tag_name == "A" || tag_name == "DEL" || tag_name == "INS")
                && node.get_child_nodes().iter().all(Self::is_phrasing_content))
    }

    pub fn get_node_ancestors(node: &Node, max_depth: Option<u64>) -> Vec<Node> {
        let mut ancestors = Vec::new();
        let mut node = node.clone();
        let max_depth = max_depth.unwrap_or(u64::MAX);

        for _ in 0..max_depth {
            let parent = node.get_parent();
            match parent {
                Some(parent) => {
                    ancestors.push(parent.clone());
                    node = parent;
                }
                None => return ancestors,
            }
        }

        ancestors
    }

    // Class/id weight of an element. Zero when class weighing was relaxed
    // by the retry controller.
    pub fn get_class_weight(node: &Node, weigh_classes: bool) -> i64 {
        if !weigh_classes {
            return 0;
        }

        let mut weight = 0;

        // Look for a special classname
        if let Some(class_names) = node.get_property("class") {
            if !class_names.is_empty() {
                if constants::NEGATIVE.is_match(&class_names) {
                    weight -= 25;
                }

                if constants::POSITIVE.is_match(&class_names) {
                    weight += 25;
                }
            }
        }

        // Look for a special ID
        if let Some(id) = node.get_property("id") {
            if !id.is_empty() {
                if constants::NEGATIVE.is_match(&id) {
                    weight -= 25;
                }

                if constants::POSITIVE.is_match(&id) {
                    weight += 25;
                }
            }
        }

        weight
    }

    pub fn get_row_and_column_count(node: &Node) -> (usize, usize) {
        if node.get_name().to_uppercase() != "TABLE" {
            return (0, 0);
        }

        let mut rows = 0;
        let mut columns = 0;

        let trs = Self::get_elements_by_tag_name(node, "tr");
        for tr in trs {
            let row_span = tr
                .get_attribute("rowspan")
                .and_then(|span| span.parse::<usize>().ok())
                .unwrap_or(1);
            rows += row_span;

            // Now look for column-related info
            let mut columns_in_this_row = 0;
            let cells = Self::get_elements_by_tag_name(&tr, "td");
            for cell in cells {
                let colspan = cell
                    .get_attribute("colspan")
                    .and_then(|span| span.parse::<usize>().ok())
                    .unwrap_or(1);
                columns_in_this_row += colspan;
            }
            columns = usize::max(columns, columns_in_this_row);
        }

        (rows, columns)
    }

    pub fn is_data_table(node: &Node) -> bool {
        node.get_attribute(constants::DATA_TABLE_ATTR)
            .and_then(|is_data_table| is_data_table.parse::<bool>().ok())
            .unwrap_or(false)
    }

    // Whether any attribute of the node references a known video host.
    // Embeds that do are always preserved.
    pub fn is_video_embed(node: &Node) -> bool {
        node.get_attributes()
            .iter()
            .any(|(_name, value)| constants::VIDEOS.is_match(value))
    }

    // Replaces 2 or more successive <br> elements with a single <p>.
    // Whitespace between <br> elements are ignored.
    // For example:
    //   <div>foo<br>bar<br> <br><br>abc</div>
    // will become:
    //   <div>foo<br>bar<p>abc</p></div>
    pub fn replace_brs(node: &Node, document: &Document) {
        let br_nodes = Self::get_elements_by_tag_name(node, "br");

        for br_node in br_nodes {
            let mut next = br_node.get_next_sibling();

            // Whether 2 or more <br> elements have been found and replaced
            // with a <p> block.
            let mut replaced = false;

            // If we find a <br> chain, remove the <br>s until we hit another
            // node or non-whitespace. This leaves behind the first <br> in
            // the chain (which will be replaced with a <p> later).
            while let Some(mut n) = Self::next_element(next.clone()) {
                if n.get_name().to_uppercase() != "BR" {
                    break;
                }

                replaced = true;
                next = n.get_next_sibling();
                n.unlink();
            }

            if !replaced {
                continue;
            }

            // If we removed a <br> chain, replace the remaining <br> with a
            // <p>. Add all sibling nodes as children of the <p> until we hit
            // another <br> chain.
            let mut parent = match br_node.get_parent() {
                Some(parent) => parent,
                None => continue,
            };
            let mut p = match Node::new("p", None, document) {
                Ok(p) => p,
                Err(()) => continue,
            };
            if let Err(error) = parent.replace_child_node(p.clone(), br_node) {
                log::warn!("Failed to replace br chain: {error}");
                continue;
            }

            next = p.get_next_sibling();

            while let Some(mut next_node) = next {
                // If we've hit another <br><br>, we're done adding children
                // to this <p>.
                if next_node.get_name().to_uppercase() == "BR" {
                    if let Some(next_elem) = Self::next_element(next_node.get_next_sibling()) {
                        if next_elem.get_name().to_uppercase() == "BR" {
                            break;
                        }
                    }
                }

                if !Self::is_phrasing_content(&next_node) {
                    break;
                }

                // Otherwise, make this node a child of the new <p>.
                let sibling = next_node.get_next_sibling();
                next_node.unlink();
                let _ = p.add_child(&mut next_node);

                next = sibling;
            }

            while let Some(mut last_child) = p.get_last_child() {
                if Self::is_whitespace(&last_child) {
                    last_child.unlink();
                } else {
                    break;
                }
            }

            if let Some(mut parent) = p.get_parent() {
                if parent.get_name().to_uppercase() == "P" {
                    let _ = parent.set_name("DIV");
                }
            }
        }
    }
}
