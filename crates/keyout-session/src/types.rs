//! Shared types for the keyout processing session.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Upper bound of the tolerance slider (inclusive).
pub const TOLERANCE_MAX: u8 = 100;

/// Upper bound of the blur radius slider (inclusive).
pub const BLUR_RADIUS_MAX: f64 = 5.0;

/// Granularity of the blur radius slider.
pub const BLUR_RADIUS_STEP: f64 = 0.1;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// The user-chosen RGB value identifying the background to remove.
///
/// Replaced wholesale by each new click; never edited in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeedColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl SeedColor {
    /// Create a seed color from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS `rgb()` notation, used for the swatch next to the value.
    #[must_use]
    pub fn to_css(self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Comma-joined decimal triple with no spaces and no alpha, e.g. `12,200,44`.
impl fmt::Display for SeedColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.r, self.g, self.b)
    }
}

/// Which removal algorithm the service should run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Flat color-distance keying.
    #[default]
    Simple,
    /// Color-distance keying with local refinement.
    Advanced,
}

impl Mode {
    /// Wire name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable snapshot of the processing configuration.
///
/// Produced by [`ParameterStore`](crate::ParameterStore) after every
/// field change. A request is never built from a snapshot whose
/// `color` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessingParameters {
    /// Color distance tolerance, `0..=100`.
    pub tolerance: u8,

    /// Edge blur radius, `0.0..=5.0` in steps of `0.1`.
    pub blur_radius: f64,

    /// Removal algorithm.
    pub mode: Mode,

    /// Whether the service should run its edge-refinement pass.
    pub refine_edges: bool,

    /// Seed color, absent until the user has clicked the image.
    pub color: Option<SeedColor>,
}

impl Default for ProcessingParameters {
    fn default() -> Self {
        Self {
            tolerance: 30,
            blur_radius: 2.0,
            mode: Mode::default(),
            refine_edges: false,
            color: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_color_displays_as_comma_joined_triple() {
        assert_eq!(SeedColor::new(12, 200, 44).to_string(), "12,200,44");
        assert_eq!(SeedColor::new(0, 0, 0).to_string(), "0,0,0");
    }

    #[test]
    fn mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Mode::Simple).ok().as_deref(), Some("\"simple\""));
        assert_eq!(
            serde_json::to_string(&Mode::Advanced).ok().as_deref(),
            Some("\"advanced\"")
        );
    }

    #[test]
    fn default_parameters_match_service_defaults() {
        let params = ProcessingParameters::default();
        assert_eq!(params.tolerance, 30);
        assert!((params.blur_radius - 2.0).abs() < f64::EPSILON);
        assert_eq!(params.mode, Mode::Simple);
        assert!(!params.refine_edges);
        assert!(params.color.is_none());
    }
}
