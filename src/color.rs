use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::Value;

/// Accent used for single-series charts.
pub const ACCENT: Color32 = Color32::from_rgb(0x1D, 0xB9, 0x54);
/// Secondary series colour.
pub const ACCENT_DARK: Color32 = Color32::from_rgb(0x0A, 0x5D, 0x2A);

fn hsl_to_color32(hsl: Hsl) -> Color32 {
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

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
            hsl_to_color32(Hsl::new(hue, 0.75, 0.55))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Continuous green scale
// ---------------------------------------------------------------------------

/// Position of `value` inside `[min, max]` on a light-to-dark green ramp.
pub fn greens(value: f64, min: f64, max: f64) -> Color32 {
    let span = max - min;
    let t = if span.abs() < f64::EPSILON || !span.is_finite() {
        1.0
    } else {
        ((value - min) / span).clamp(0.0, 1.0)
    };
    let lightness = 0.88 - 0.62 * t as f32;
    hsl_to_color32(Hsl::new(140.0, 0.55, lightness))
}

// ---------------------------------------------------------------------------
// Color mapping: cell value → Color32
// ---------------------------------------------------------------------------

/// Maps the distinct values of a series column to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<Value, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map from a column's distinct values.
    pub fn new(unique_values: &BTreeSet<Value>) -> Self {
        let palette = generate_palette(unique_values.len());
        let mapping: BTreeMap<Value, Color32> = unique_values
            .iter()
            .zip(palette)
            .map(|(v, c)| (v.clone(), c))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given value.
    pub fn color_for(&self, value: &Value) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        assert_eq!(generate_palette(4).len(), 4);
    }

    #[test]
    fn greens_darken_with_value() {
        let light = greens(0.0, 0.0, 100.0);
        let dark = greens(100.0, 0.0, 100.0);
        assert!(dark.g() < light.g());
        // Degenerate range does not divide by zero.
        assert_eq!(greens(3.0, 3.0, 3.0), dark);
    }

    #[test]
    fn unknown_values_fall_back_to_gray() {
        let vals: BTreeSet<Value> = [Value::from("A"), Value::from("B")].into_iter().collect();
        let cm = ColorMap::new(&vals);
        assert_ne!(cm.color_for(&Value::from("A")), cm.color_for(&Value::from("B")));
        assert_eq!(cm.color_for(&Value::from("Z")), Color32::GRAY);
    }
}
