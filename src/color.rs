use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            to_color32(Hsl::new(hue, 0.75, 0.55).into_color())
        })
        .collect()
}

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

// ---------------------------------------------------------------------------
// Color mapping: category value → Color32
// ---------------------------------------------------------------------------

/// Maps the distinct values of a categorical column to distinct colours.
///
/// Built once per dataset so a category keeps its colour while filters change.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map for the given values, in the given order.
    pub fn new(values: &[String]) -> Self {
        let mapping = values
            .iter()
            .cloned()
            .zip(generate_palette(values.len()))
            .collect();
        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given category value.
    pub fn color_for(&self, value: &str) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}

// ---------------------------------------------------------------------------
// Continuous scales
// ---------------------------------------------------------------------------

/// Red–white–blue diverging scale for correlations in `[-1, 1]`.
///
/// -1 maps to red, 0 to near-white and +1 to blue.
pub fn diverging(value: f64) -> Color32 {
    let red = LinSrgb::new(0.40, 0.02, 0.03);
    let white = LinSrgb::new(0.93, 0.93, 0.93);
    let blue = LinSrgb::new(0.01, 0.10, 0.38);

    let t = value.clamp(-1.0, 1.0) as f32;
    let lin = if t < 0.0 {
        white.mix(red, -t)
    } else {
        white.mix(blue, t)
    };
    to_color32(lin.into_color())
}

/// Colour for category `code` out of `n`, sweeping blue → green → red like a
/// rainbow scale.
pub fn code_color(code: usize, n: usize) -> Color32 {
    let t = if n > 1 {
        code as f32 / (n - 1) as f32
    } else {
        0.5
    };
    let hue = 240.0 * (1.0 - t);
    to_color32(Hsl::new(hue, 0.85, 0.5).into_color())
}
