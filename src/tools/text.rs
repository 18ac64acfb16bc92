//! Text overlays.

use serde::{Deserialize, Serialize};

use crate::error::{PixxelError, Result};
use crate::scene::{Color, ObjectId, ObjectKind, ObjectType, TextAlign, TextObject, Transform};
use crate::session::{Applied, EditorSession, commit};

pub const DEFAULT_TEXT: &str = "Edit this text";

/// Font families offered for text objects.
pub const FONT_FAMILIES: [&str; 8] = [
    "Arial",
    "Arial Black",
    "Helvetica",
    "Times New Roman",
    "Courier New",
    "Georgia",
    "Verdana",
    "Comic Sans MS",
];

pub const MIN_FONT_SIZE: f64 = 8.0;
pub const MAX_FONT_SIZE: f64 = 120.0;

/// Style changes for a text object. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub text: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub fill: Option<Color>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub text_align: Option<TextAlign>,
}

impl TextStyle {
    fn apply_to(&self, text: &mut TextObject) {
        if let Some(content) = &self.text {
            text.text = content.clone();
        }
        if let Some(family) = &self.font_family {
            text.font_family = family.clone();
        }
        if let Some(size) = self.font_size {
            text.font_size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        }
        if let Some(fill) = self.fill {
            text.fill = fill;
        }
        if let Some(bold) = self.bold {
            text.bold = bold;
        }
        if let Some(italic) = self.italic {
            text.italic = italic;
        }
        if let Some(underline) = self.underline {
            text.underline = underline;
        }
        if let Some(align) = self.text_align {
            text.text_align = align;
        }
    }
}

/// Add the default text at the canvas centre and select it.
pub async fn add(session: &EditorSession) -> Result<Applied<ObjectId>> {
    let surface = session.surface()?;
    let center = session.logical_size()?.center();
    Ok(commit(&surface, |s| {
        let text = TextObject::new(DEFAULT_TEXT);
        let id = s.add(ObjectKind::Text(text), Transform::centered(center, 1.0));
        s.set_active(Some(id));
        id
    })
    .await)
}

/// Restyle the text object `id`.
pub async fn update(session: &EditorSession, id: ObjectId, style: &TextStyle) -> Result<Applied> {
    let surface = session.surface()?;
    let applied = commit(&surface, |s| {
        match s.scene().get(id).map(|o| o.object_type()) {
            Some(ObjectType::Text) => {}
            Some(_) => return Err(PixxelError::Validation("object is not text".to_string())),
            None => return Err(PixxelError::NotFound(format!("Object {}", id.0))),
        }
        s.modify(id, |o| {
            if let Some(text) = o.as_text_mut() {
                style.apply_to(text);
            }
        })
    })
    .await;
    match applied {
        Applied::Done(result) => result.map(Applied::Done),
        Applied::Stale => Ok(Applied::Stale),
    }
}

/// Delete the text object `id`.
pub async fn delete(session: &EditorSession, id: ObjectId) -> Result<Applied<bool>> {
    let surface = session.surface()?;
    Ok(commit(&surface, |s| {
        let is_text = s
            .scene()
            .get(id)
            .is_some_and(|o| o.object_type() == ObjectType::Text);
        is_text && s.remove(id).is_some()
    })
    .await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_applies_only_set_fields() {
        let mut text = TextObject::new("a");
        TextStyle {
            bold: Some(true),
            font_size: Some(500.0),
            ..Default::default()
        }
        .apply_to(&mut text);
        assert!(text.bold);
        assert!(!text.italic);
        assert_eq!(text.font_size, MAX_FONT_SIZE);
        assert_eq!(text.text, "a");
    }

    #[test]
    fn test_style_parses_from_json() {
        let style: TextStyle =
            serde_json::from_value(serde_json::json!({"fill": "#ff0000", "textAlign": "center"}))
                .unwrap();
        assert_eq!(style.fill, Some(Color::rgb(255, 0, 0)));
        assert_eq!(style.text_align, Some(TextAlign::Center));
    }
}
