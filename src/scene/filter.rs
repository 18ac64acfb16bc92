//! Image filter descriptors.
//!
//! Filters are stored on image objects as an ordered list and serialized
//! with the scene. Pixel work lives in `render::adjust`.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fmt;

/// One filter with its normalized parameter.
///
/// Brightness, contrast, saturation and vibrance take values in `[-1, 1]`,
/// blur in `[0, 1]`, hue rotation in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Filter {
    Brightness { brightness: f32 },
    Contrast { contrast: f32 },
    Saturation { saturation: f32 },
    Vibrance { vibrance: f32 },
    Blur { blur: f32 },
    HueRotation { rotation: f32 },
}

impl Filter {
    pub fn kind(&self) -> FilterKind {
        match self {
            Filter::Brightness { .. } => FilterKind::Brightness,
            Filter::Contrast { .. } => FilterKind::Contrast,
            Filter::Saturation { .. } => FilterKind::Saturation,
            Filter::Vibrance { .. } => FilterKind::Vibrance,
            Filter::Blur { .. } => FilterKind::Blur,
            Filter::HueRotation { .. } => FilterKind::Hue,
        }
    }

    pub fn amount(&self) -> f32 {
        match *self {
            Filter::Brightness { brightness } => brightness,
            Filter::Contrast { contrast } => contrast,
            Filter::Saturation { saturation } => saturation,
            Filter::Vibrance { vibrance } => vibrance,
            Filter::Blur { blur } => blur,
            Filter::HueRotation { rotation } => rotation,
        }
    }
}

/// Slider bounds for one adjustable filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SliderRange {
    pub min: i32,
    pub max: i32,
    pub step: i32,
    pub default: i32,
}

/// The adjustable filters, in application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Brightness,
    Contrast,
    Saturation,
    Vibrance,
    Blur,
    Hue,
}

impl FilterKind {
    pub const ALL: [FilterKind; 6] = [
        FilterKind::Brightness,
        FilterKind::Contrast,
        FilterKind::Saturation,
        FilterKind::Vibrance,
        FilterKind::Blur,
        FilterKind::Hue,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            FilterKind::Brightness => "brightness",
            FilterKind::Contrast => "contrast",
            FilterKind::Saturation => "saturation",
            FilterKind::Vibrance => "vibrance",
            FilterKind::Blur => "blur",
            FilterKind::Hue => "hue",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FilterKind::Brightness => "Brightness",
            FilterKind::Contrast => "Contrast",
            FilterKind::Saturation => "Saturation",
            FilterKind::Vibrance => "Vibrance",
            FilterKind::Blur => "Blur",
            FilterKind::Hue => "Hue",
        }
    }

    pub fn range(&self) -> SliderRange {
        match self {
            FilterKind::Blur => SliderRange {
                min: 0,
                max: 100,
                step: 1,
                default: 0,
            },
            FilterKind::Hue => SliderRange {
                min: -180,
                max: 180,
                step: 1,
                default: 0,
            },
            _ => SliderRange {
                min: -100,
                max: 100,
                step: 1,
                default: 0,
            },
        }
    }

    /// Build the filter for a slider position. Out-of-range values are clamped.
    pub fn filter_for(&self, slider: i32) -> Filter {
        let range = self.range();
        let v = slider.clamp(range.min, range.max) as f32;
        match self {
            FilterKind::Brightness => Filter::Brightness { brightness: v / 100.0 },
            FilterKind::Contrast => Filter::Contrast { contrast: v / 100.0 },
            FilterKind::Saturation => Filter::Saturation { saturation: v / 100.0 },
            FilterKind::Vibrance => Filter::Vibrance { vibrance: v / 100.0 },
            FilterKind::Blur => Filter::Blur { blur: v / 100.0 },
            FilterKind::Hue => Filter::HueRotation {
                rotation: v * (PI / 180.0),
            },
        }
    }

    /// Inverse of [`FilterKind::filter_for`].
    pub fn slider_for(filter: &Filter) -> (FilterKind, i32) {
        let kind = filter.kind();
        let value = match kind {
            FilterKind::Hue => (filter.amount() * (180.0 / PI)).round() as i32,
            _ => (filter.amount() * 100.0).round() as i32,
        };
        (kind, value)
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
