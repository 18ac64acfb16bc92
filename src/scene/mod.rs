//! # Scene Graph
//!
//! Ordered collection of drawable objects plus the canvas background. The
//! scene is plain data: it emits no events and knows nothing about display
//! scale. [`crate::surface::GraphicsSurface`] wraps it with change tracking.

mod blob;
pub mod color;
pub mod filter;
pub mod object;

pub use blob::{BLOB_VERSION, SceneBlob};
pub use color::Color;
pub use filter::{Filter, FilterKind, SliderRange};
pub use object::{
    HelperRole, ImageObject, ObjectId, ObjectKind, ObjectType, OriginX, OriginY, SceneObject,
    ShapeKind, ShapeObject, TextAlign, TextObject, Transform,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    objects: Vec<SceneObject>,
    next_id: u64,
    active: Option<ObjectId>,
    /// Solid fill behind everything. `None` is transparent.
    pub background: Option<Color>,
    /// Image drawn over the background colour, under the objects.
    pub background_image: Option<SceneObject>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            objects: Vec::new(),
            next_id: 1,
            active: None,
            background: Some(Color::WHITE),
            background_image: None,
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every object in stacking order, helpers included.
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Objects that are part of the document (helpers excluded).
    pub fn drawables(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().filter(|o| o.helper.is_none())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    fn allocate_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a new object on top of the stack.
    pub fn add(&mut self, kind: ObjectKind, transform: Transform) -> ObjectId {
        let id = self.allocate_id();
        self.objects.push(SceneObject::new(id, kind, transform));
        id
    }

    /// Append an existing object, assigning it a fresh id.
    pub fn insert(&mut self, mut object: SceneObject) -> ObjectId {
        object.id = self.allocate_id();
        let id = object.id;
        self.objects.push(object);
        id
    }

    /// Swap the object at `id` for `replacement`, keeping its stacking position.
    pub fn replace(&mut self, id: ObjectId, mut replacement: SceneObject) -> Option<ObjectId> {
        let new_id = self.allocate_id();
        let slot = self.objects.iter_mut().find(|o| o.id == id)?;
        replacement.id = new_id;
        *slot = replacement;
        if self.active == Some(id) {
            self.active = Some(new_id);
        }
        Some(new_id)
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        let idx = self.objects.iter().position(|o| o.id == id)?;
        if self.active == Some(id) {
            self.active = None;
        }
        Some(self.objects.remove(idx))
    }

    /// Remove all objects and reset the background to white.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.active = None;
        self.background = Some(Color::WHITE);
        self.background_image = None;
    }

    pub fn active(&self) -> Option<ObjectId> {
        self.active
    }

    pub fn active_object(&self) -> Option<&SceneObject> {
        self.active.and_then(|id| self.get(id))
    }

    /// Select `id`; unknown ids clear the selection.
    pub fn set_active(&mut self, id: Option<ObjectId>) {
        self.active = id.filter(|id| self.get(*id).is_some());
    }

    /// First object of the given type in stacking order.
    pub fn first_of(&self, ty: ObjectType) -> Option<&SceneObject> {
        self.drawables().find(|o| o.object_type() == ty)
    }

    /// The active object if it is an image, otherwise the first image.
    pub fn active_or_first_image(&self) -> Option<ObjectId> {
        match self.active_object() {
            Some(obj) if obj.object_type() == ObjectType::Image => Some(obj.id),
            _ => self.first_of(ObjectType::Image).map(|o| o.id),
        }
    }

    pub fn crop_rects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().filter(|o| o.is_crop_rect())
    }

    /// Every distinct image source referenced by the scene.
    pub fn image_sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = self
            .objects
            .iter()
            .chain(self.background_image.iter())
            .filter_map(|o| o.as_image().map(|img| img.src.clone()))
            .collect();
        sources.sort();
        sources.dedup();
        sources
    }
}
