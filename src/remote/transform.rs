//! Transformation URL grammar.
//!
//! A transformed asset is addressed as `{base}?tr=k-v,k-v`. Any query string
//! already on the URL is dropped, so directives never stack across calls.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Directives that mark an image whose background was already replaced.
pub const BACKGROUND_DIRECTIVES: [&str; 3] = ["e-bgremove", "e-removedotbg", "e-changebg"];

/// Directive requesting AI background removal.
pub const BG_REMOVE: &str = "e-bgremove";

/// URL without its query string.
pub fn base_url(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// Whether `url` is served by the transformation host.
pub fn is_transform_host(url: &str, host: &str) -> bool {
    !host.is_empty() && url.contains(host)
}

/// Whether `url` carries any background-removal directive.
pub fn has_background_directive(url: &str) -> bool {
    BACKGROUND_DIRECTIVES.iter().any(|d| url.contains(d))
}

/// Builder for `?tr=` URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformUrl {
    base: String,
    directives: Vec<String>,
}

impl TransformUrl {
    /// Start from `url`, discarding its query string.
    pub fn new(url: &str) -> Self {
        Self {
            base: base_url(url).to_string(),
            directives: Vec::new(),
        }
    }

    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Append `key-value`.
    pub fn param(self, key: &str, value: impl fmt::Display) -> Self {
        self.directive(format!("{}-{}", key, value))
    }

    pub fn build(&self) -> String {
        if self.directives.is_empty() {
            return self.base.clone();
        }
        format!("{}?tr={}", self.base, self.directives.join(","))
    }
}

impl fmt::Display for TransformUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}

/// URL of `url` with its background removed.
///
/// Only transform-host URLs can be processed; anything else is returned
/// unchanged.
pub fn background_removal_url(url: &str, host: &str) -> String {
    if is_transform_host(url, host) {
        TransformUrl::new(url).directive(BG_REMOVE).build()
    } else {
        url.to_string()
    }
}

/// Side of the image that generative fill grows towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Top,
    Bottom,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Top,
        Direction::Bottom,
        Direction::Left,
        Direction::Right,
    ];

    pub fn is_horizontal(&self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// Focus directive anchoring the original pixels on the opposite side.
    pub fn focus(&self) -> &'static str {
        match self {
            Direction::Left => "fo-right",
            Direction::Right => "fo-left",
            Direction::Top => "fo-bottom",
            Direction::Bottom => "fo-top",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Top => "top",
            Direction::Bottom => "bottom",
            Direction::Left => "left",
            Direction::Right => "right",
        };
        f.write_str(s)
    }
}

/// Generative-fill URL that pads `url` to `width` × `height`.
pub fn extension_url(url: &str, width: u32, height: u32, direction: Direction) -> String {
    TransformUrl::new(url)
        .directive("bg-genfill")
        .param("w", width)
        .param("h", height)
        .directive("cm-pad_resize")
        .directive(direction.focus())
        .build()
}
