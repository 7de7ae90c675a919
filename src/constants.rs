use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

pub const DEFAULT_CHAR_THRESHOLD: usize = 500;
pub const DEFAULT_N_TOP_CANDIDATES: usize = 5;
pub const MINIMUM_TOPCANDIDATES: usize = 3;

// Reserved attributes carrying per-node pipeline state. Stripped from the
// final output.
pub const SCORE_ATTR: &str = "content-score";
pub const DATA_TABLE_ATTR: &str = "is-data-table";

pub const READABILITY_PAGE_ID: &str = "readability-page-1";
pub const READABILITY_PAGE_CLASS: &str = "page";

pub static UNLIKELY_CANDIDATES: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r#"-ad-|ai2html|banner|breadcrumbs|combx|comment|community|cover-wrap|disqus|extra|footer|gdpr|header|legends|menu|related|remark|replies|rss|shoutbox|sidebar|skyscraper|social|sponsor|supplemental|ad-break|agegate|pagination|pager|popup|yom-remote"#).case_insensitive(true).build().expect("UNLIKELY_CANDIDATES regex")
});
pub static OKAY_MAYBE_ITS_A_CANDIDATE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r#"and|article|body|column|content|main|shadow"#)
        .case_insensitive(true)
        .build()
        .expect("OKAY_MAYBE_ITS_A_CANDIDATE regex")
});
pub static POSITIVE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(
        r#"article|body|content|entry|hentry|h-entry|main|page|pagination|post|text|blog|story"#,
    )
    .case_insensitive(true)
    .build()
    .expect("POSITIVE regex")
});
pub static NEGATIVE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r#"hidden|^hid$| hid$| hid |^hid |banner|combx|comment|com-|contact|foot|footer|footnote|gdpr|masthead|media|meta|outbrain|promo|related|scroll|share|shoutbox|sidebar|skyscraper|sponsor|shopping|tags|tool|widget"#).case_insensitive(true).build().expect("NEGATIVE regex")
});
pub static BYLINE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r#"byline|author|dateline|writtenby|p-author"#)
        .case_insensitive(true)
        .build()
        .expect("BYLINE regex")
});
pub static SHARE_ELEMENTS: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r#"(\b|_)(share|sharedaddy)(\b|_)"#)
        .case_insensitive(true)
        .build()
        .expect("SHARE_ELEMENTS regex")
});
pub static VIDEOS: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r#"//(www\.)?((dailymotion|youtube|youtube-nocookie|player\.vimeo|v\.qq)\.com|(archive|upload\.wikimedia)\.org|player\.twitch\.tv)"#).case_insensitive(true).build().expect("VIDEOS regex")
});
pub static NORMALIZE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\s{2,}"#).expect("NORMALIZE regex"));
pub static HAS_CONTENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\S$"#).expect("HAS_CONTENT regex"));
pub static SIBLING_CONTENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\.( |$)"#).expect("SIBLING_CONTENT regex"));
pub static STYLE_HIDDEN: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r#"display\s*:\s*none"#)
        .case_insensitive(true)
        .build()
        .expect("STYLE_HIDDEN regex")
});

// Lazy-loading detection: attribute values that look like image urls.
pub static LAZY_SRCSET: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r#"\.(jpg|jpeg|png|webp)\s+\d"#)
        .case_insensitive(true)
        .build()
        .expect("LAZY_SRCSET regex")
});
pub static LAZY_SRC: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r#"^\s*\S+\.(jpg|jpeg|png|webp)\S*\s*$"#)
        .case_insensitive(true)
        .build()
        .expect("LAZY_SRC regex")
});

// Meta tag vocabulary. `property` is a space-separated list of values while
// `name` holds a single value, hence the two shapes.
pub static META_PROPERTY: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(
        r#"\s*(dc|dcterm|og|twitter)\s*:\s*(author|creator|description|title|site_name)\s*"#,
    )
    .case_insensitive(true)
    .build()
    .expect("META_PROPERTY regex")
});
pub static META_NAME: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r#"^\s*(?:(dc|dcterm|og|twitter|weibo:(article|webpage))\s*[\.:]\s*)?(author|creator|description|title|site_name)\s*$"#)
        .case_insensitive(true)
        .build()
        .expect("META_NAME regex")
});

// Title resolution.
pub static TITLE_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#" [\|\-\\/>»] "#).expect("TITLE_SEPARATOR regex"));
pub static TITLE_HIERARCHICAL_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#" [\\/>»] "#).expect("TITLE_HIERARCHICAL_SEPARATOR regex"));
pub static TITLE_CUT_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(.*)[\|\-\\/>»] .*"#).expect("TITLE_CUT_END regex"));
pub static TITLE_CUT_FRONT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[^\|\-\\/>»]*[\|\-\\/>»](.*)"#).expect("TITLE_CUT_FRONT regex"));
pub static TITLE_ANY_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\|\-\\/>»]+"#).expect("TITLE_ANY_SEPARATOR regex"));
pub static WORD_COUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\s+"#).expect("WORD_COUNT regex"));

pub const DEFAULT_TAGS_TO_SCORE: &[&str] =
    &["SECTION", "H2", "H3", "H4", "H5", "H6", "P", "TD", "PRE"];

pub static DIV_TO_P_ELEMS: Lazy<HashSet<&str>> = Lazy::new(|| {
    HashSet::from([
        "A",
        "BLOCKQUOTE",
        "DL",
        "DIV",
        "IMG",
        "OL",
        "P",
        "PRE",
        "TABLE",
        "UL",
        "SELECT",
    ])
});

pub static ALTER_TO_DIV_EXCEPTIONS: Lazy<HashSet<&str>> =
    Lazy::new(|| HashSet::from(["DIV", "ARTICLE", "SECTION", "P"]));

pub static EMBED_TAG_NAMES: Lazy<HashSet<&str>> =
    Lazy::new(|| HashSet::from(["OBJECT", "EMBED", "IFRAME"]));

pub const PRESENTATIONAL_ATTRIBUTES: &[&str] = &[
    "align",
    "background",
    "bgcolor",
    "border",
    "cellpadding",
    "cellspacing",
    "frame",
    "hspace",
    "rules",
    "style",
    "valign",
    "vspace",
];

pub static DEPRECATED_SIZE_ATTRIBUTE_ELEMS: Lazy<HashSet<&str>> =
    Lazy::new(|| HashSet::from(["TABLE", "TH", "TD", "HR", "PRE"]));

pub const PHRASING_ELEMS: &[&str] = &[
    // "CANVAS", "IFRAME", "SVG", "VIDEO",
    "ABBR", "AUDIO", "B", "BDO", "BR", "BUTTON", "CITE", "CODE", "DATA", "DATALIST", "DFN", "EM",
    "EMBED", "I", "IMG", "INPUT", "KBD", "LABEL", "MARK", "MATH", "METER", "NOSCRIPT", "OBJECT",
    "OUTPUT", "PROGRESS", "Q", "RUBY", "SAMP", "SCRIPT", "SELECT", "SMALL", "SPAN", "STRONG",
    "SUB", "SUP", "TEXTAREA", "TIME", "VAR", "WBR",
];
