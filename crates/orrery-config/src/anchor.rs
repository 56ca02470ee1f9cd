//! Anchor records: named celestial objects with center, frame, and existence.

use serde::{Deserialize, Serialize};

/// A named entry in the host settings giving a celestial object's center
/// name, body-fixed reference frame, and temporal existence interval.
///
/// The existence interval is half-open, `[start, end)`, in seconds past
/// J2000. Outside of it the object has no defined pose and must not be
/// rendered or picked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anchor {
    /// Center name, e.g. "Earth".
    pub center: String,
    /// Reference-frame name, e.g. "IAU_EARTH".
    pub frame: String,
    /// Start of existence, seconds past J2000.
    pub start_existence: f64,
    /// End of existence, seconds past J2000.
    pub end_existence: f64,
}

impl Anchor {
    /// The `(start, end)` existence pair in seconds past J2000.
    pub fn existence(&self) -> (f64, f64) {
        (self.start_existence, self.end_existence)
    }

    /// Whether the interval is well-formed (`start <= end`). Anchors that
    /// fail this are rejected by plugins at load time.
    pub fn has_valid_existence(&self) -> bool {
        self.start_existence <= self.end_existence
    }
}
