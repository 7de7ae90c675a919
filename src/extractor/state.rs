/// Heuristic strictness flags for a single parse invocation.
///
/// The retry controller clears them one at a time, in field order, and
/// never sets one again.
pub struct State {
    pub strip_unlikely: bool,
    pub weigh_classes: bool,
    pub clean_conditionally: bool,
    pub byline: Option<String>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            strip_unlikely: true,
            weigh_classes: true,
            clean_conditionally: true,
            byline: None,
        }
    }
}
