//! Construction-time error taxonomy (§7/§11.1). Intersection and shading
//! code never returns `Result` — a primitive test either hits or it
//! doesn't, and the shader always produces a color (black on a full miss).
//! The boundary these types guard is asset/scene *construction*, which
//! happens before any frame is rendered.

use thiserror::Error;

/// Failures building a [`crate::mesh::Mesh`] or [`crate::texture::Texture`]
/// from already-decoded arrays (the binary-file *parsing* that produces
/// those arrays is out of scope — see SPEC_FULL.md §6).
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("{what} {index} is out of range (len {len})")]
    IndexOutOfRange { what: &'static str, index: u32, len: u32 },

    #[error("{what} has {got} entries, expected {expected}")]
    ArrayLengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("mip level {level} exceeds the texture's {mip_count} mips")]
    MipLevelOutOfRange { level: u32, mip_count: u32 },

    #[error("texture dimensions must be nonzero, got {width}x{height}")]
    EmptyTexture { width: u32, height: u32 },
}

/// Failures assembling a [`crate::scene::Scene`] from geometries, lights,
/// materials and the assets they reference.
#[derive(Debug, Error)]
pub enum SceneBuildError {
    #[error("geometry {geometry_index} references out-of-range material_id {material_id} ({material_count} materials loaded)")]
    InvalidMaterialId {
        geometry_index: u32,
        material_id: u32,
        material_count: u32,
    },

    #[error("geometry {geometry_index} references out-of-range mesh_id {mesh_id} ({mesh_count} meshes loaded)")]
    InvalidMeshId {
        geometry_index: u32,
        mesh_id: u32,
        mesh_count: u32,
    },

    #[error("material {material_index} references out-of-range texture_id {texture_id} ({texture_count} textures loaded)")]
    InvalidTextureId {
        material_index: u32,
        texture_id: u32,
        texture_count: u32,
    },

    #[error("declared capacity of {declared} {what} does not match the {supplied} supplied")]
    CapacityMismatch {
        what: &'static str,
        declared: usize,
        supplied: usize,
    },
}
