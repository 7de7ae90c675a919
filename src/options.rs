use url::Url;

use crate::constants;

/// Knobs recognized by [`crate::Readability`].
///
/// The defaults mirror the behavior of the reference heuristics; most
/// callers only ever set `base_url`.
#[derive(Debug, Clone)]
pub struct Options {
    /// Maximum number of elements the document may contain. `0` disables
    /// the check. Exceeding it aborts before any mutation.
    pub max_elems_to_parse: usize,
    /// Capacity of the ranked candidate list kept during selection.
    pub nb_top_candidates: usize,
    /// Minimum extracted text length for an attempt to be accepted.
    pub char_threshold: usize,
    /// Class names kept in the output in addition to the reserved `page`
    /// marker class.
    pub classes_to_preserve: Vec<String>,
    /// Keep all class attributes instead of stripping them.
    pub keep_classes: bool,
    /// Base against which relative `href`/`src` references are resolved.
    /// When unset, relative references are left untouched.
    pub base_url: Option<Url>,
    /// Emit per-candidate score tracing. Never changes behavior.
    pub debug: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_elems_to_parse: 0,
            nb_top_candidates: constants::DEFAULT_N_TOP_CANDIDATES,
            char_threshold: constants::DEFAULT_CHAR_THRESHOLD,
            classes_to_preserve: Vec::new(),
            keep_classes: false,
            base_url: None,
            debug: false,
        }
    }
}
