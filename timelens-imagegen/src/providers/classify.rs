//! Quota detection for backend error messages.
//!
//! Backends report quota exhaustion as free text, so detection is a substring
//! match. When a backend changes its wording this list is what needs updating.

use super::Classification;

/// Lowercase substrings that mark a quota or zero-limit error.
pub const QUOTA_MARKERS: &[&str] = &["quota", "limit: 0"];

/// Classify a backend error message.
///
/// Returns [`Classification::Retryable`] if the message contains any of
/// [`QUOTA_MARKERS`], ignoring case, and [`Classification::Fatal`] otherwise.
///
/// # Examples
///
/// ```
/// use timelens_imagegen::providers::{Classification, classify_failure};
///
/// assert_eq!(classify_failure("Quota exceeded"), Classification::Retryable);
/// assert_eq!(classify_failure("Invalid API key"), Classification::Fatal);
/// ```
pub fn classify_failure(message: &str) -> Classification {
    let message = message.to_lowercase();
    if QUOTA_MARKERS.iter().any(|marker| message.contains(marker)) {
        Classification::Retryable
    } else {
        Classification::Fatal
    }
}
