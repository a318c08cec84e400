use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::transform::Transform;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryType {
    Quad,
    Box,
    Sphere,
    Tet,
    Mesh,
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct GeometryFlags: u8 {
        const VISIBLE     = 1 << 0;
        const SHADOWING   = 1 << 1;
        const TRANSPARENT = 1 << 2;
    }
}

impl Default for GeometryFlags {
    fn default() -> Self {
        GeometryFlags::VISIBLE | GeometryFlags::SHADOWING
    }
}

/// A dense-array entity: fields are POD, cross-references to other scene
/// arrays are plain `u32` ids rather than pointers (§9).
#[derive(Clone, Copy, Debug)]
pub struct Geometry {
    pub transform: Transform,
    pub geometry_type: GeometryType,
    pub material_id: u32,
    /// Index into `Scene::meshes`; meaningless unless `geometry_type == Mesh`.
    pub mesh_id: u32,
    pub flags: GeometryFlags,
}

impl Geometry {
    pub fn new(geometry_type: GeometryType, transform: Transform, material_id: u32) -> Self {
        Geometry {
            transform,
            geometry_type,
            material_id,
            mesh_id: 0,
            flags: GeometryFlags::default(),
        }
    }

    pub fn with_mesh_id(mut self, mesh_id: u32) -> Self {
        self.mesh_id = mesh_id;
        self
    }

    pub fn with_flags(mut self, flags: GeometryFlags) -> Self {
        self.flags = flags;
        self
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.flags.contains(GeometryFlags::VISIBLE)
    }

    #[inline]
    pub fn is_shadowing(&self) -> bool {
        self.flags.contains(GeometryFlags::SHADOWING)
    }

    #[inline]
    pub fn is_transparent(&self) -> bool {
        self.flags.contains(GeometryFlags::TRANSPARENT)
    }
}
