//! Editor tool identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolId {
    #[default]
    Resize,
    Crop,
    Adjust,
    Text,
    Background,
    AiExtender,
    AiEdit,
}

/// Cursor pair applied to the surface: (default, hover).
pub type CursorStyle = (&'static str, &'static str);

impl ToolId {
    pub const ALL: [ToolId; 7] = [
        ToolId::Resize,
        ToolId::Crop,
        ToolId::Adjust,
        ToolId::Text,
        ToolId::Background,
        ToolId::AiExtender,
        ToolId::AiEdit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolId::Resize => "resize",
            ToolId::Crop => "crop",
            ToolId::Adjust => "adjust",
            ToolId::Text => "text",
            ToolId::Background => "background",
            ToolId::AiExtender => "ai_extender",
            ToolId::AiEdit => "ai_edit",
        }
    }

    pub fn cursor(&self) -> CursorStyle {
        match self {
            ToolId::Crop => ("crosshair", "crosshair"),
            _ => ("default", "move"),
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolId::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown tool '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_cursor_is_crosshair() {
        assert_eq!(ToolId::Crop.cursor(), ("crosshair", "crosshair"));
        for tool in ToolId::ALL.into_iter().filter(|t| *t != ToolId::Crop) {
            assert_eq!(tool.cursor(), ("default", "move"));
        }
    }

    #[test]
    fn test_names_round_trip() {
        for tool in ToolId::ALL {
            assert_eq!(tool.as_str().parse::<ToolId>().unwrap(), tool);
        }
        assert_eq!(
            serde_json::to_string(&ToolId::AiExtender).unwrap(),
            "\"ai_extender\""
        );
    }
}
