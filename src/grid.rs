use log::debug;
use nalgebra_glm as glm;
use std::collections::HashSet;

use crate::{
    config::{validate_bounds, validate_grid_length, VoxelConfig},
    error::VoxelResult,
};

/// A cubic grid of `grid_length³` cells spanning the world box `[world_min, world_max]`,
/// remembering which cells are occupied.
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    grid_length: u32,
    world_min: glm::Vec3,
    world_max: glm::Vec3,
    voxel_scale: glm::Vec3,
    occupied: HashSet<glm::IVec3>,
}

impl VoxelGrid {
    pub fn new(grid_length: u32, world_min: glm::Vec3, world_max: glm::Vec3) -> VoxelResult<Self> {
        validate_grid_length(grid_length)?;
        validate_bounds(&world_min, &world_max)?;

        let mut grid = Self {
            grid_length,
            world_min,
            world_max,
            voxel_scale: glm::Vec3::zeros(),
            occupied: HashSet::new(),
        };
        grid.rescale();
        Ok(grid)
    }

    pub fn from_config(config: &VoxelConfig) -> VoxelResult<Self> {
        Self::new(config.grid_length, config.world_min(), config.world_max())
    }

    /// Cell containing `pos`. Positions outside the world box saturate to the closest
    /// boundary cell, so the result is always inside `[0, grid_length)³`.
    pub fn world_to_grid(&self, pos: &glm::Vec3) -> glm::IVec3 {
        let extent = self.world_max - self.world_min;
        let normalized = (pos - self.world_min).component_div(&extent);
        let clamped = glm::clamp_vec(&normalized, &glm::Vec3::zeros(), &glm::vec3(1.0, 1.0, 1.0));
        let last = self.grid_length as i32 - 1;

        // a position on the max face lands on grid_length and is pulled back into the last cell
        glm::floor(&(clamped * self.grid_length as f32)).map(|c| (c as i32).clamp(0, last))
    }

    /// Center of `cell` in world space.
    pub fn grid_to_world(&self, cell: &glm::IVec3) -> glm::Vec3 {
        let cell = cell.map(|c| c as f32);
        self.world_min + (cell + glm::vec3(0.5, 0.5, 0.5)).component_mul(&self.voxel_scale)
    }

    pub fn is_occupied(&self, cell: &glm::IVec3) -> bool {
        self.occupied.contains(cell)
    }

    /// Returns `true` if the cell was free before. Cells outside the grid are never occupied.
    pub fn mark_occupied(&mut self, cell: glm::IVec3) -> bool {
        self.contains(&cell) && self.occupied.insert(cell)
    }

    /// Whether `cell` lies within `[0, grid_length)³`.
    pub fn contains(&self, cell: &glm::IVec3) -> bool {
        let len = self.grid_length as i32;
        cell.iter().all(|c| (0..len).contains(c))
    }

    pub fn clear(&mut self) {
        self.occupied.clear();
    }

    /// Recomputes the edge lengths of a cell from the grid length and the world box.
    pub fn rescale(&mut self) {
        self.voxel_scale = (self.world_max - self.world_min) / self.grid_length as f32;
        debug!(
            "Rescaled grid of length {} to voxel scale {:?}",
            self.grid_length,
            self.voxel_scale.as_slice()
        );
    }

    /// Changes the resolution of the grid. Occupancy is cleared, since the cells it refers to
    /// no longer exist.
    pub fn set_grid_length(&mut self, grid_length: u32) -> VoxelResult<()> {
        validate_grid_length(grid_length)?;
        self.grid_length = grid_length;
        self.rescale();
        self.clear();
        Ok(())
    }

    pub fn set_bounds(&mut self, world_min: glm::Vec3, world_max: glm::Vec3) -> VoxelResult<()> {
        validate_bounds(&world_min, &world_max)?;
        self.world_min = world_min;
        self.world_max = world_max;
        self.rescale();
        self.clear();
        Ok(())
    }

    pub fn grid_length(&self) -> u32 {
        self.grid_length
    }

    pub fn world_min(&self) -> glm::Vec3 {
        self.world_min
    }

    pub fn world_max(&self) -> glm::Vec3 {
        self.world_max
    }

    pub fn voxel_scale(&self) -> glm::Vec3 {
        self.voxel_scale
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied.len()
    }

    pub fn occupied(&self) -> impl Iterator<Item = &glm::IVec3> {
        self.occupied.iter()
    }
}
