use std::collections::HashMap;

use libxml::xpath::Context;

use crate::constants;
use crate::util::Util;

/// Metadata gathered from `<meta>` tags and the document title, computed
/// once before extraction mutates the tree.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub title: String,
    pub byline: Option<String>,
    pub excerpt: Option<String>,
    pub site_name: Option<String>,
}

pub fn extract(context: &Context) -> Metadata {
    let values = collect_meta_values(context);

    let title = pick(
        &values,
        &[
            "dc:title",
            "dcterm:title",
            "og:title",
            "weibo:article:title",
            "weibo:webpage:title",
            "title",
            "twitter:title",
        ],
    )
    .map(decode_entities)
    .unwrap_or_else(|| resolve_document_title(context));

    let byline = pick(&values, &["dc:creator", "dcterm:creator", "author"]).map(decode_entities);

    let excerpt = pick(
        &values,
        &[
            "dc:description",
            "dcterm:description",
            "og:description",
            "weibo:article:description",
            "weibo:webpage:description",
            "description",
            "twitter:description",
        ],
    );

    let site_name = pick(&values, &["og:site_name"]);

    Metadata {
        title,
        byline,
        excerpt,
        site_name,
    }
}

fn decode_entities(value: String) -> String {
    match escaper::decode_html(&value) {
        Ok(decoded) => decoded,
        Err(_error) => value,
    }
}

fn collect_meta_values(context: &Context) -> HashMap<String, String> {
    let mut values = HashMap::new();

    let meta_nodes = Util::evaluate_xpath(context, "//meta", false).unwrap_or_default();
    for meta in meta_nodes {
        let content = match meta.get_attribute("content") {
            Some(content) if !content.trim().is_empty() => content,
            _ => continue,
        };

        // `property` is a space-separated list of values
        let mut matched_property = false;
        if let Some(property) = meta.get_attribute("property") {
            for property_match in constants::META_PROPERTY.find_iter(&property) {
                matched_property = true;
                values.insert(
                    normalize_meta_key(property_match.as_str()),
                    content.trim().to_owned(),
                );
            }
        }

        // `name` is a single value
        if !matched_property {
            if let Some(name) = meta.get_attribute("name") {
                if constants::META_NAME.is_match(&name) {
                    values.insert(normalize_meta_key(&name), content.trim().to_owned());
                }
            }
        }
    }

    values
}

fn normalize_meta_key(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '.' { ':' } else { c })
        .collect()
}

fn pick(values: &HashMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| values.get(*key))
        .cloned()
        .filter(|value| !value.is_empty())
}

// Resolve the displayed article title from the document title, cutting
// site-name decorations at separators while guarding against over-trimming.
pub fn resolve_document_title(context: &Context) -> String {
    let orig_title = Util::extract_value(context, "//title")
        .map(|title| title.trim().to_owned())
        .unwrap_or_default();
    let mut title = orig_title.clone();
    let mut title_had_hierarchical_separators = false;

    if constants::TITLE_SEPARATOR.is_match(&title) {
        // If there's a separator in the title, first remove the final part
        title_had_hierarchical_separators =
            constants::TITLE_HIERARCHICAL_SEPARATOR.is_match(&title);
        title = constants::TITLE_CUT_END.replace(&orig_title, "$1").into();

        // If the resulting title is too short (3 words or fewer), remove
        // the first part instead:
        if word_count(&title) < 3 {
            title = constants::TITLE_CUT_FRONT
                .replace(&orig_title, "$1")
                .into();
        }
    } else if title.contains(": ") {
        // Check if we have a heading containing this exact string, so we
        // could assume it's the full title.
        let mut headings = Util::evaluate_xpath(context, "//h1", false).unwrap_or_default();
        headings.extend(Util::evaluate_xpath(context, "//h2", false).unwrap_or_default());

        let trimmed_title = title.trim().to_owned();
        let heading_matches = headings
            .iter()
            .any(|heading| heading.get_content().trim() == trimmed_title);

        // If we don't, let's extract the title out of the original string.
        if !heading_matches {
            if let Some(pos) = orig_title.rfind(':') {
                title = orig_title[pos + 1..].to_owned();

                // If the title is now too short, try the first colon
                // instead. But if we have too many words before the colon
                // there's something weird with the titles and the H tags so
                // let's just use the original title instead.
                if word_count(&title) < 3 {
                    if let Some(pos) = orig_title.find(':') {
                        title = orig_title[pos + 1..].to_owned();
                    }
                } else if let Some(pos) = orig_title.find(':') {
                    if word_count(&orig_title[..pos]) > 5 {
                        title = orig_title.clone();
                    }
                }
            }
        }
    } else if title.len() > 150 || title.len() < 15 {
        let h_ones = Util::evaluate_xpath(context, "//h1", false).unwrap_or_default();
        if h_ones.len() == 1 {
            title = Util::get_inner_text(&h_ones[0], true);
        }
    }

    let title = constants::NORMALIZE.replace_all(title.trim(), " ").to_string();

    // If we now have 4 words or fewer as our title, and either no
    // 'hierarchical' separators (\, /, > or ») were found in the original
    // title or we decreased the number of words by more than 1 word, use
    // the original title.
    let title_word_count = word_count(&title);
    let separatorless_word_count = word_count(
        constants::TITLE_ANY_SEPARATOR
            .replace_all(&orig_title, "")
            .as_ref(),
    );
    if title_word_count <= 4
        && (!title_had_hierarchical_separators || title_word_count != separatorless_word_count - 1)
    {
        return orig_title;
    }

    title
}

fn word_count(text: &str) -> usize {
    constants::WORD_COUNT.split(text).count()
}
