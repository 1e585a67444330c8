use anyhow::Result;
use serde::Deserialize;
use std::path::Path;
use vx_format::Axis;

/// Per asset import options, read from a toml file next to the model.
#[derive(Debug, Default, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ObjMeta {
    /// Mirror the imported meshes on the x, y and z axis
    pub flip_axis: [bool; 3],
    /// Center the model at the origin and scale it into the unit sphere
    pub center_and_normalize: bool,
    /// Merge all submeshes into one, keeping only the first material
    pub merge: bool,
}

impl ObjMeta {
    pub fn parse(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let meta: Self = toml::from_slice(&data)?;
        Ok(meta)
    }

    pub fn flipped_axes(&self) -> impl Iterator<Item = Axis> + '_ {
        Axis::ALL
            .iter()
            .copied()
            .filter(move |axis| self.flip_axis[axis.index()])
    }
}
