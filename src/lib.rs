//! Extract the main readable content from an already-parsed HTML document.
//!
//! The entry point is [`Readability`]: feed it a [`libxml`] [`Document`] and
//! it returns the subtree most likely to be the article body, cleaned of
//! navigation, ads and other boilerplate, together with the article
//! metadata.
//!
//! ```no_run
//! use libxml::parser::Parser;
//! use readability_extractor::{Options, Readability};
//!
//! let document = Parser::default_html().parse_string("<html>...</html>").unwrap();
//! let article = Readability::new(Options::default()).parse(document).unwrap();
//! if let Some(article) = article {
//!     println!("{}: {} chars", article.title, article.length);
//! }
//! ```

mod article;
mod constants;
mod error;
mod extractor;
mod metadata;
mod options;
mod util;

#[cfg(test)]
mod tests;

pub use crate::article::Article;
pub use crate::error::ReadabilityError;
pub use crate::options::Options;

use libxml::tree::{Document, Node, NodeType};
use libxml::xpath::Context;
use url::Url;

use crate::extractor::{Extracted, Extractor};
use crate::util::Util;

pub struct Readability {
    options: Options,
}

impl Readability {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// Run the extraction pipeline on `document`.
    ///
    /// The document is consumed and mutated in the process. Returns
    /// `Ok(None)` when no attempt produced any text, and
    /// [`ReadabilityError::TooManyElements`] before touching the tree when
    /// the document exceeds the configured element limit.
    pub fn parse(&self, document: Document) -> Result<Option<Article>, ReadabilityError> {
        libxml::tree::node::set_node_rc_guard(10);

        let root = document.get_root_element().ok_or(ReadabilityError::Xml)?;

        // Avoid parsing too large documents, as per config.
        if self.options.max_elems_to_parse > 0 {
            let count = Util::get_elements_by_tag_name(&root, "*").len() + 1;
            if count > self.options.max_elems_to_parse {
                return Err(ReadabilityError::TooManyElements {
                    count,
                    limit: self.options.max_elems_to_parse,
                });
            }
        }

        Self::prep_document(&document)?;

        let context = Context::new(&document).map_err(|()| ReadabilityError::Xml)?;
        let meta = metadata::extract(&context);

        let Extracted {
            document: source_document,
            content,
            byline,
            dir,
        } = match Extractor::extract(document, &self.options, &meta.title)? {
            Some(extracted) => extracted,
            None => return Ok(None),
        };

        // Reparent the accepted content under a fresh output document
        // before post-processing and serialization.
        let mut article_document = Document::new().map_err(|()| ReadabilityError::Xml)?;
        let mut article_root =
            Node::new("article", None, &article_document).map_err(|()| ReadabilityError::Xml)?;
        article_document.set_root_element(&article_root);

        for mut child in content.get_child_nodes() {
            child.unlink();
            article_root.add_child(&mut child).map_err(|error| {
                log::error!("{error}");
                ReadabilityError::Xml
            })?;
        }

        // The source document may go once its nodes have moved over.
        drop(source_document);

        self.post_process_content(&mut article_root, &article_document)?;

        let text_content = Util::get_inner_text(&article_root, true);
        let excerpt = meta.excerpt.clone().or_else(|| {
            // Use the article's first paragraph as the excerpt. This is used
            // for displaying a preview of the article's content.
            Util::get_elements_by_tag_name(&article_root, "p")
                .first()
                .map(|paragraph| paragraph.get_content().trim().to_owned())
        });

        Ok(Some(Article {
            title: meta.title,
            byline: meta.byline.or(byline),
            dir,
            content: article::serialize(&article_document),
            length: text_content.chars().count(),
            text_content,
            excerpt,
            site_name: meta.site_name,
        }))
    }

    // Prepare the document for extraction: strip scripts and styles, and
    // handle terrible markup.
    fn prep_document(document: &Document) -> Result<(), ReadabilityError> {
        let context = Context::new(document).map_err(|()| ReadabilityError::Xml)?;

        Self::strip_nodes(&context, "//script");
        Self::strip_nodes(&context, "//noscript");
        Self::strip_nodes(&context, "//style");

        if let Some(root) = document.get_root_element() {
            if let Some(body) = Util::get_first_element_by_tag_name(&root, "body") {
                Util::replace_brs(&body, document);
            }

            for mut font_node in Util::get_elements_by_tag_name(&root, "font") {
                let _ = font_node.set_name("span");
            }
        }

        Ok(())
    }

    fn strip_nodes(context: &Context, xpath: &str) {
        if let Ok(nodes) = Util::evaluate_xpath(context, xpath, false) {
            for mut node in nodes {
                node.unlink();
            }
        }
    }

    fn post_process_content(
        &self,
        article_root: &mut Node,
        article_document: &Document,
    ) -> Result<(), ReadabilityError> {
        // Readers cannot open relative uris, so we convert them to absolute
        // ones where a base is known.
        Self::fix_relative_uris(article_root, self.options.base_url.as_ref(), article_document);

        if !self.options.keep_classes {
            let mut classes_to_preserve = vec![constants::READABILITY_PAGE_CLASS.to_owned()];
            classes_to_preserve.extend(self.options.classes_to_preserve.iter().cloned());
            Self::clean_classes(article_root, &classes_to_preserve);
        }

        Self::strip_reserved_attributes(article_root);

        let context = Context::new(article_document).map_err(|()| ReadabilityError::Xml)?;
        Self::prevent_self_closing_tags(&context)?;

        Ok(())
    }

    // Convert each <a> and <img> uri in the given element to an absolute
    // one. `javascript:` links cannot work once scripts are gone, so they
    // are unwrapped into plain text or an inert span.
    fn fix_relative_uris(root: &Node, base_url: Option<&Url>, document: &Document) {
        for mut link in Util::get_elements_by_tag_name(root, "a") {
            let href = match link.get_attribute("href") {
                Some(href) => href,
                None => continue,
            };

            if href.trim().starts_with("javascript:") {
                let child_nodes = link.get_child_nodes();
                let single_text_child = child_nodes.len() == 1
                    && child_nodes
                        .first()
                        .and_then(|child| child.get_type())
                        .map(|node_type| node_type == NodeType::TextNode)
                        .unwrap_or(false);

                let mut parent = match link.get_parent() {
                    Some(parent) => parent,
                    None => continue,
                };

                let new_node = if single_text_child {
                    match Node::new_text(&link.get_content(), document) {
                        Ok(text) => text,
                        Err(()) => continue,
                    }
                } else {
                    // If the link has multiple children, they should all be
                    // preserved.
                    let mut container = match Node::new("span", None, document) {
                        Ok(container) => container,
                        Err(()) => continue,
                    };
                    for mut child in child_nodes {
                        child.unlink();
                        let _ = container.add_child(&mut child);
                    }
                    container
                };

                if let Err(error) = parent.replace_child_node(new_node, link) {
                    log::warn!("Failed to unwrap javascript: link: {error}");
                }
            } else if let Some(absolute) = Self::to_absolute_uri(&href, base_url) {
                let _ = link.set_attribute("href", &absolute);
            }
        }

        for mut image in Util::get_elements_by_tag_name(root, "img") {
            if let Some(src) = image.get_attribute("src") {
                if let Some(absolute) = Self::to_absolute_uri(&src, base_url) {
                    let _ = image.set_attribute("src", &absolute);
                }
            }
        }
    }

    fn to_absolute_uri(uri: &str, base_url: Option<&Url>) -> Option<String> {
        let base_url = base_url?;

        // Hash links refer to the extracted document itself; leave them be.
        if uri.starts_with('#') {
            return None;
        }

        let is_relative = Url::parse(uri)
            .err()
            .map(|error| error == url::ParseError::RelativeUrlWithoutBase)
            .unwrap_or(false);
        if !is_relative {
            return None;
        }

        base_url
            .join(uri.trim())
            .ok()
            .map(|joined| joined.as_str().to_owned())
    }

    // Remove the class attribute from every element except those carrying a
    // preserved class.
    fn clean_classes(node: &mut Node, classes_to_preserve: &[String]) {
        if let Some(class_attr) = node.get_attribute("class") {
            let kept = class_attr
                .split_whitespace()
                .filter(|class| classes_to_preserve.iter().any(|keep| keep == class))
                .collect::<Vec<_>>()
                .join(" ");

            if kept.is_empty() {
                let _ = node.remove_attribute("class");
            } else {
                let _ = node.set_attribute("class", &kept);
            }
        }

        let mut child = node.get_first_element_child();
        while let Some(mut current) = child {
            Self::clean_classes(&mut current, classes_to_preserve);
            child = current.get_next_element_sibling();
        }
    }

    fn strip_reserved_attributes(root: &Node) {
        let mut nodes = Util::get_elements_by_tag_name(root, "*");
        nodes.push(root.clone());

        for mut node in nodes {
            let _ = node.remove_attribute(constants::SCORE_ATTR);
            let _ = node.remove_attribute(constants::DATA_TABLE_ATTR);
        }
    }

    // Add an empty text node to childless non-void elements so the
    // serializer does not emit self-closing tags for them.
    fn prevent_self_closing_tags(context: &Context) -> Result<(), ReadabilityError> {
        let node_vec = Util::evaluate_xpath(context, "//*[not(node())]", false)?;
        for mut node in node_vec {
            if matches!(node.get_name().as_str(), "meta" | "img" | "br" | "hr") {
                continue;
            }

            let _ = node.add_text_child(None, "empty", "");
        }

        Ok(())
    }
}
