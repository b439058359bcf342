//! Scene that owns the primitives handed to the renderer

use crate::primitive::PrimitiveCollection;

/// Rendering context visualizers attach their primitives to
#[derive(Debug, Default)]
pub struct Scene {
    primitives: PrimitiveCollection,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primitives(&self) -> &PrimitiveCollection {
        &self.primitives
    }
}
