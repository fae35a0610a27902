//! Title classification: raw window title to `(application, context)`.
//!
//! Policy: split on the first `" - "`. Most applications format their
//! titles as `App - Document`; titles whose documents themselves
//! contain the separator keep it verbatim in the context.

use vigil_storage::WindowKey;

/// Separator between application and context in a raw title.
pub const SEPARATOR: &str = " - ";

/// Context assigned when a title carries no separator.
pub const DEFAULT_CONTEXT: &str = "Main";

/// Map a raw title to its window key. Pure; an empty title yields the
/// reserved no-window key.
#[must_use]
pub fn classify(raw_title: &str) -> WindowKey {
    // Split before trimming: a leading " - " still counts as a
    // separator, leaving an empty application.
    match raw_title.split_once(SEPARATOR) {
        Some((application, context)) => WindowKey::new(application, context),
        None => WindowKey::new(raw_title, DEFAULT_CONTEXT),
    }
}
