//! Small presentation helpers shared by the modules.

use time::{Duration, OffsetDateTime};

/// Shorten `text` to `max_chars` characters, appending `...` when cut.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}...", &text[..cut]),
    }
}

/// Whole days elapsed between `then` and `now`; negative when `then` is in
/// the future.
pub fn days_since(then: OffsetDateTime, now: OffsetDateTime) -> i64 {
    let elapsed: Duration = now - then;
    elapsed.whole_days()
}
