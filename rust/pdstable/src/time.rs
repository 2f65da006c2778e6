//! Conversion of ISO time strings to seconds.
//!
//! The engine does not know any time scale. Columns opted in to time conversion are
//! converted by a caller-supplied [`TimeConverter`], typically a TAI or TDB converter
//! from a dedicated time library.

/// Converts ISO-formatted time text into seconds, or `None` if the text cannot be
/// interpreted.
pub trait TimeConverter: Send + Sync {
    fn seconds_from_iso(&self, text: &str) -> Option<f64>;
}

impl<F> TimeConverter for F
where
    F: Fn(&str) -> Option<f64> + Send + Sync,
{
    fn seconds_from_iso(&self, text: &str) -> Option<f64> {
        self(text)
    }
}
