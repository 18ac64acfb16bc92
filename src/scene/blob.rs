//! Persisted scene format.
//!
//! The blob is stored on the project record as an opaque JSON value. Only
//! this module reads or writes its structure.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{Color, ObjectId, Scene, SceneObject};
use crate::error::{PixxelError, Result};

/// Current blob format version.
pub const BLOB_VERSION: u32 = 1;

/// Largest object id kept as-is on load.
pub const MAX_STORED_ID: u64 = u32::MAX as u64;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneBlob {
    pub version: u32,
    pub objects: Vec<SceneObject>,
    #[serde(default)]
    pub background: Option<Color>,
    #[serde(default)]
    pub background_image: Option<SceneObject>,
}

impl Scene {
    /// Snapshot the document part of the scene. Helper objects are skipped.
    pub fn to_blob(&self) -> SceneBlob {
        SceneBlob {
            version: BLOB_VERSION,
            objects: self.drawables().cloned().collect(),
            background: self.background,
            background_image: self.background_image.clone(),
        }
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self.to_blob())?)
    }

    /// Rebuild a scene from a blob. Duplicate ids are reassigned, and a blob
    /// with ids above [`MAX_STORED_ID`] is renumbered from 1.
    pub fn from_blob(mut blob: SceneBlob) -> Result<Scene> {
        if blob.version > BLOB_VERSION {
            return Err(PixxelError::Scene(format!(
                "unsupported scene version {} (newest known is {})",
                blob.version, BLOB_VERSION
            )));
        }

        let mut scene = Scene {
            background: blob.background,
            background_image: blob.background_image,
            ..Scene::default()
        };

        let mut seen = HashSet::new();
        let max_id = blob.objects.iter().map(|o| o.id.0).max().unwrap_or(0);
        if max_id > MAX_STORED_ID {
            tracing::warn!(max_id, "Renumbering scene objects with out-of-range ids");
            for (i, object) in blob.objects.iter_mut().enumerate() {
                object.id = ObjectId(i as u64 + 1);
            }
            scene.next_id = blob.objects.len() as u64 + 1;
        } else {
            scene.next_id = max_id + 1;
        }

        for mut object in blob.objects {
            if !seen.insert(object.id) {
                object.id = ObjectId(scene.next_id);
                scene.next_id += 1;
            }
            scene.objects.push(object);
        }
        Ok(scene)
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Scene> {
        let blob: SceneBlob = serde_json::from_value(value.clone())
            .map_err(|e| PixxelError::Scene(format!("malformed scene blob: {}", e)))?;
        Scene::from_blob(blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::scene::{
        Filter, HelperRole, ImageObject, ObjectKind, ObjectType, ShapeObject, TextObject, Transform,
    };
    use pretty_assertions::assert_eq;

    fn sample_scene() -> Scene {
        let mut scene = Scene::new();
        let mut img = ImageObject::new("https://ik.imagekit.io/demo/cat.png", 640.0, 480.0);
        img.filters.push(Filter::Brightness { brightness: 0.2 });
        scene.add(
            ObjectKind::Image(img),
            Transform::centered(Point::new(400.0, 300.0), 1.25),
        );
        let mut t = Transform::centered(Point::new(100.0, 50.0), 1.0);
        t.angle = 15.0;
        scene.add(ObjectKind::Text(TextObject::new("Hello")), t);
        scene.add(
            ObjectKind::Shape(ShapeObject::rect(30.0, 40.0)),
            Transform {
                left: 5.0,
                top: 6.0,
                scale_x: 2.0,
                scale_y: 0.5,
                ..Default::default()
            },
        );
        scene.background = Some(Color::rgb(10, 20, 30));
        scene
    }

    #[test]
    fn test_round_trip_preserves_objects() {
        let scene = sample_scene();
        let json = scene.to_json().unwrap();
        let restored = Scene::from_json(&json).unwrap();

        assert_eq!(restored.len(), 3);
        let types: Vec<ObjectType> = restored.objects().iter().map(|o| o.object_type()).collect();
        assert_eq!(types, vec![ObjectType::Image, ObjectType::Text, ObjectType::Shape]);
        for (a, b) in scene.objects().iter().zip(restored.objects()) {
            assert_eq!(a.transform, b.transform);
            assert_eq!(a.kind, b.kind);
        }
        assert_eq!(restored.background, scene.background);
    }

    #[test]
    fn test_helpers_are_not_persisted() {
        let mut scene = sample_scene();
        let id = scene.add(
            ObjectKind::Shape(ShapeObject::rect(10.0, 10.0)),
            Transform::default(),
        );
        if let Some(obj) = scene.get_mut(id) {
            obj.helper = Some(HelperRole::CropRect);
        }
        let restored = Scene::from_json(&scene.to_json().unwrap()).unwrap();
        assert_eq!(restored.len(), 3);
        assert_eq!(restored.crop_rects().count(), 0);
    }

    #[test]
    fn test_new_ids_do_not_collide_after_load() {
        let scene = sample_scene();
        let mut restored = Scene::from_json(&scene.to_json().unwrap()).unwrap();
        let id = restored.add(ObjectKind::Text(TextObject::new("x")), Transform::default());
        assert!(scene.objects().iter().all(|o| o.id != id));
    }

    #[test]
    fn test_huge_ids_are_renumbered() {
        let mut json = sample_scene().to_json().unwrap();
        json["objects"][0]["id"] = serde_json::json!(u64::MAX);
        json["objects"][1]["id"] = serde_json::json!(u64::MAX);

        let mut restored = Scene::from_json(&json).unwrap();
        let ids: Vec<ObjectId> = restored.objects().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![ObjectId(1), ObjectId(2), ObjectId(3)]);
        let added = restored.add(ObjectKind::Text(TextObject::new("x")), Transform::default());
        assert_eq!(added, ObjectId(4));
    }

    #[test]
    fn test_rejects_future_version() {
        let json = serde_json::json!({"version": 99, "objects": []});
        assert!(matches!(Scene::from_json(&json), Err(PixxelError::Scene(_))));
    }

    #[test]
    fn test_rejects_garbage() {
        let json = serde_json::json!({"objects": "nope"});
        assert!(Scene::from_json(&json).is_err());
    }
}
