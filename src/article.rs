use libxml::tree::{Document, SaveOptions};

/// The extracted article.
///
/// `content` holds the cleaned markup wrapped in the paging container;
/// `text_content` is the same content with markup removed.
#[derive(Debug, Clone)]
pub struct Article {
    pub title: String,
    pub byline: Option<String>,
    /// Text direction, taken from the first explicit `dir` attribute on the
    /// chosen container or its ancestors.
    pub dir: Option<String>,
    pub content: String,
    pub text_content: String,
    /// Character count of `text_content`.
    pub length: usize,
    pub excerpt: Option<String>,
    pub site_name: Option<String>,
}

pub(crate) fn serialize(document: &Document) -> String {
    let options = SaveOptions {
        format: false,
        no_declaration: false,
        no_empty_tags: true,
        no_xhtml: false,
        xhtml: false,
        as_xml: false,
        as_html: true,
        non_significant_whitespace: false,
    };
    document.to_string_with_options(options)
}
