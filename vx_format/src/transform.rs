use crate::{
    error::{FormatError, Result},
    mesh::{Face, Mesh},
};
use log::debug;
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl Mesh {
    /// Mirrors positions and normals on `axis`.
    ///
    /// Texture coordinates and the winding of the faces stay untouched, so the faces of a
    /// mirrored mesh wind the other way around. Use [`Mesh::reverse_winding`] to restore it.
    pub fn flip(&mut self, axis: Axis) {
        let n = axis.index();
        for v in &mut self.vertices {
            v.position[n] = -v.position[n];
            v.normal[n] = -v.normal[n];
        }
    }

    pub fn reverse_winding(&mut self) {
        for face in &mut self.faces {
            face.indices.swap(1, 2);
        }
    }
}

/// Moves the centroid of all vertices of `meshes` to the origin and scales them so the
/// vertex furthest away from it ends up at distance 1.
///
/// Every vertex weighs the same, no matter how many vertices its mesh has. Nothing is
/// modified if the batch has no vertices or all of them share one position.
pub fn center_and_normalize(meshes: &mut [Mesh]) -> Result<()> {
    let count: usize = meshes.iter().map(|m| m.vertices.len()).sum();
    if count == 0 {
        return Err(FormatError::DegenerateInput(
            "cannot normalize meshes without vertices".into(),
        ));
    }

    let positions = || meshes.iter().flat_map(|m| m.vertices.iter().map(|v| v.position));
    let center = positions().fold(glm::Vec3::zeros(), |acc, p| acc + p) / count as f32;
    let max_distance = positions()
        .map(|p| glm::distance(&p, &center))
        .fold(0.0f32, f32::max);

    if !max_distance.is_normal() {
        return Err(FormatError::DegenerateInput(format!(
            "cannot normalize meshes with a radius of {}",
            max_distance
        )));
    }

    debug!(
        "Normalizing {} vertices around {:?} with radius {}",
        count, center, max_distance
    );

    for mesh in meshes.iter_mut() {
        for v in &mut mesh.vertices {
            v.position = (v.position - center) / max_distance;
        }
    }

    Ok(())
}

/// Concatenates `meshes` into a single mesh.
///
/// The result carries the material of the first mesh; the materials of the others are dropped.
pub fn merge(meshes: &[Mesh]) -> Result<Mesh> {
    let first = meshes
        .first()
        .ok_or_else(|| FormatError::DegenerateInput("cannot merge an empty list of meshes".into()))?;

    let mut out = Mesh {
        vertices: Vec::with_capacity(meshes.iter().map(|m| m.vertices.len()).sum()),
        faces: Vec::with_capacity(meshes.iter().map(|m| m.faces.len()).sum()),
        material: first.material.clone(),
    };

    for mesh in meshes {
        let offset = out.vertices.len() as u32;
        out.vertices.extend_from_slice(&mesh.vertices);
        out.faces.extend(mesh.faces.iter().map(|f| Face {
            indices: f.indices.map(|i| i + offset),
        }));
    }

    Ok(out)
}
