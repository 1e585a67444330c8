use crate::{error::Result, material::Material};
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: glm::Vec3,
    pub normal: glm::Vec3,
    pub tex_coord: glm::Vec2,
}

/// A triangle of three indices into the vertex list of its [`Mesh`].
///
/// The winding order is the one of the source geometry.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face {
    pub indices: [u32; 3],
}

impl Face {
    pub const fn new(a: u32, b: u32, c: u32) -> Self {
        Self { indices: [a, b, c] }
    }
}

/// Geometry sharing exactly one material.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
    pub material: Material,
}

impl Mesh {
    /// Component-wise minimum and maximum of all vertex positions, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(glm::Vec3, glm::Vec3)> {
        let first = self.vertices.first()?.position;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(min, max), v| {
                    (glm::min2(&min, &v.position), glm::max2(&max, &v.position))
                }),
        )
    }

    /// Checks that every face only references existing vertices.
    pub fn indices_in_bounds(&self) -> bool {
        let count = self.vertices.len();
        self.faces
            .iter()
            .all(|f| f.indices.iter().all(|&i| (i as usize) < count))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub meshes: Vec<Mesh>,
}

impl MeshData {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Ok(bincode::deserialize::<MeshData>(&bytes)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        MeshData::from_bytes(data)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&self)?)
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.vertices.len()).sum()
    }

    pub fn face_count(&self) -> usize {
        self.meshes.iter().map(|m| m.faces.len()).sum()
    }
}
