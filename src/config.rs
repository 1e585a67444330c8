use log::debug;
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{VoxelError, VoxelResult};

/// Value written to raster texels that are not covered by any surface.
pub const DEFAULT_SENTINEL: f32 = 0.4;

/// Settings of one voxelization run, usually read from a toml file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxelConfig {
    /// Number of cells along each axis of the grid
    pub grid_length: u32,
    pub world_min: [f32; 3],
    pub world_max: [f32; 3],
    /// Width and height of the surface raster
    pub raster_resolution: usize,
    pub sentinel: f32,
}

impl Default for VoxelConfig {
    fn default() -> Self {
        Self {
            grid_length: 64,
            world_min: [-1.0; 3],
            world_max: [1.0; 3],
            raster_resolution: 32,
            sentinel: DEFAULT_SENTINEL,
        }
    }
}

impl VoxelConfig {
    pub fn parse(path: &Path) -> VoxelResult<Self> {
        let data = std::fs::read(path)?;
        let config: Self = toml::from_slice(&data)?;
        config.validate()?;
        debug!("Loaded voxel config from `{}`: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn validate(&self) -> VoxelResult<()> {
        validate_grid_length(self.grid_length)?;
        validate_bounds(&self.world_min(), &self.world_max())?;
        validate_resolution(self.raster_resolution)?;
        validate_sentinel(self.sentinel)
    }

    pub fn world_min(&self) -> glm::Vec3 {
        self.world_min.into()
    }

    pub fn world_max(&self) -> glm::Vec3 {
        self.world_max.into()
    }
}

pub(crate) fn validate_grid_length(grid_length: u32) -> VoxelResult<()> {
    // cell coordinates are stored as i32
    if grid_length == 0 || grid_length > i32::MAX as u32 {
        return Err(VoxelError::DegenerateInput(format!(
            "grid length must be in 1..={}, got {}",
            i32::MAX,
            grid_length
        )));
    }
    Ok(())
}

pub(crate) fn validate_bounds(world_min: &glm::Vec3, world_max: &glm::Vec3) -> VoxelResult<()> {
    let extent = world_max - world_min;
    if !extent.iter().all(|e| e.is_finite() && *e > 0.0) {
        return Err(VoxelError::DegenerateInput(format!(
            "world bounds {:?} to {:?} have no extent",
            world_min.as_slice(),
            world_max.as_slice()
        )));
    }
    Ok(())
}

pub(crate) fn validate_resolution(resolution: usize) -> VoxelResult<()> {
    if resolution == 0 {
        return Err(VoxelError::DegenerateInput(
            "raster resolution must be positive".into(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_sentinel(sentinel: f32) -> VoxelResult<()> {
    // a NaN sentinel never compares equal, so every texel would become a sample
    if !sentinel.is_finite() {
        return Err(VoxelError::DegenerateInput(format!(
            "sentinel must be finite, got {}",
            sentinel
        )));
    }
    Ok(())
}
