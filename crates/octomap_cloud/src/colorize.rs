//! VoxelColorizer - height to color mapping.
//!
//! ```text
//! t   = clamp((z - min_z) / (max_z - min_z), 0, 1)     (0.5 on a flat map)
//! hue = fract((1 - t) * color_factor)
//!
//!  hue:   0      1/6     2/6     3/6     4/6     5/6      1
//!         red  yellow   green    cyan    blue  magenta   red
//! ```
//!
//! Saturation and value are fixed at 1. Low voxels get the high end of the
//! hue band, high voxels the low end.

use crate::config::bounded_color_factor;
use crate::types::{HeightRange, Rgba};

/// Map a height to an opaque color.
///
/// Deterministic: equal inputs always produce equal colors. Never fails; a
/// flat or degenerate range yields the midpoint color.
pub fn colorize(world_z: f64, min_z: f64, max_z: f64, color_factor: f64) -> Rgba {
  let factor = bounded_color_factor(color_factor);
  hue_to_rgb(height_hue(normalize_height(world_z, min_z, max_z), factor))
}

/// Colorize against a precomputed [`HeightRange`].
#[inline]
pub fn colorize_in(world_z: f64, range: &HeightRange, color_factor: f64) -> Rgba {
  colorize(world_z, range.min, range.max, color_factor)
}

/// Position of `z` within `[min_z, max_z]`, clamped to [0, 1].
///
/// Returns 0.5 when the span is zero, negative or not finite.
pub fn normalize_height(z: f64, min_z: f64, max_z: f64) -> f64 {
  let span = max_z - min_z;
  if !(span.is_finite() && span > 0.0) || !z.is_finite() {
    return 0.5;
  }
  ((z - min_z) / span).clamp(0.0, 1.0)
}

/// Hue in [0, 1) for a normalized height.
#[inline]
fn height_hue(t: f64, color_factor: f64) -> f64 {
  let h = (1.0 - t) * color_factor;
  h - h.floor()
}

/// Six-sector HSV ramp at full saturation and value.
fn hue_to_rgb(hue: f64) -> Rgba {
  let h = hue * 6.0;
  let sector = h.floor() as i32;
  let mut f = h - sector as f64;
  // Secondary channel rises in even sectors and falls in odd ones.
  if sector & 1 == 0 {
    f = 1.0 - f;
  }
  let v = 1.0_f32;
  let m = 0.0_f32;
  let n = (1.0 - f) as f32;

  match sector {
    0 | 6 => Rgba::rgb(v, n, m),
    1 => Rgba::rgb(n, v, m),
    2 => Rgba::rgb(m, v, n),
    3 => Rgba::rgb(m, n, v),
    4 => Rgba::rgb(n, m, v),
    5 => Rgba::rgb(v, m, n),
    _ => Rgba::rgb(1.0, 0.5, 0.5),
  }
}

#[cfg(test)]
#[path = "colorize_test.rs"]
mod colorize_test;
