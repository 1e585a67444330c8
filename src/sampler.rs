use anyhow::anyhow;
use log::{debug, info};
use nalgebra_glm as glm;
use vx_format::Mesh;

use crate::{
    config::{validate_resolution, VoxelConfig},
    error::VoxelResult,
    grid::VoxelGrid,
    placement::{InstanceSink, Placement},
    raster::{self, SurfaceRasterizer},
};

/// The next step [`SurfaceSampler::update`] has to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No surface samples are cached
    Sampling,
    /// Samples exist but have not been turned into placements yet
    Placing,
    /// Placements exist but have not been handed to the instance sink
    Instancing,
    /// Nothing left to do until the next invalidation
    Ready,
}

/// Turns the surface of a model into one placement per occupied grid cell.
///
/// Work happens in three phases, each of which only runs while its output is missing:
/// sampling the surface through a [`SurfaceRasterizer`], mapping the samples onto the grid
/// and handing the placements to an [`InstanceSink`]. Every change of the grid or the model
/// transform drops the results of all three phases at once.
#[derive(Debug)]
pub struct SurfaceSampler {
    meshes: Vec<Mesh>,
    grid: VoxelGrid,
    model_matrix: glm::Mat4,
    raster_resolution: usize,
    sentinel: f32,
    samples: Vec<glm::Vec3>,
    placements: Vec<Placement>,
    instances_ready: bool,
}

impl SurfaceSampler {
    pub fn new(meshes: Vec<Mesh>, config: &VoxelConfig) -> VoxelResult<Self> {
        config.validate()?;

        Ok(Self {
            meshes,
            grid: VoxelGrid::from_config(config)?,
            model_matrix: glm::identity(),
            raster_resolution: config.raster_resolution,
            sentinel: config.sentinel,
            samples: Vec::new(),
            placements: Vec::new(),
            instances_ready: false,
        })
    }

    pub fn phase(&self) -> Phase {
        if self.samples.is_empty() {
            Phase::Sampling
        } else if self.placements.is_empty() {
            Phase::Placing
        } else if !self.instances_ready {
            Phase::Instancing
        } else {
            Phase::Ready
        }
    }

    /// Runs every pending phase in order and returns the phase reached.
    ///
    /// A surface without any samples keeps the sampler in [`Phase::Sampling`], so the next
    /// call asks the rasterizer again.
    pub fn update(
        &mut self,
        rasterizer: &mut dyn SurfaceRasterizer,
        sink: &mut dyn InstanceSink,
    ) -> VoxelResult<Phase> {
        self.sample(rasterizer)?;
        self.generate_placements();
        self.hand_off(sink)?;
        Ok(self.phase())
    }

    /// Collects every covered texel of a fresh raster of the surface. Does nothing if
    /// samples are cached already.
    pub fn sample(&mut self, rasterizer: &mut dyn SurfaceRasterizer) -> VoxelResult<()> {
        if !self.samples.is_empty() {
            return Ok(());
        }

        let triangles = raster::surface_triangles(&self.meshes, &self.model_matrix);
        let raster = rasterizer.rasterize(&triangles, self.raster_resolution, self.sentinel)?;
        if raster.resolution() != self.raster_resolution {
            return Err(anyhow!(
                "rasterizer returned a raster of resolution {}, expected {}",
                raster.resolution(),
                self.raster_resolution
            )
            .into());
        }

        // exact comparison, the rasterizer writes the sentinel verbatim
        let sentinel = raster::sentinel_value(self.sentinel);
        self.samples
            .extend(raster.texels().iter().filter(|t| **t != sentinel).copied());

        info!(
            "Sampled {} surface points from {} triangles",
            self.samples.len(),
            triangles.len()
        );
        Ok(())
    }

    /// Places one voxel per cell hit by at least one sample. Does nothing without samples or
    /// if placements exist already.
    pub fn generate_placements(&mut self) {
        if self.samples.is_empty() || !self.placements.is_empty() {
            return;
        }

        let scale = self.grid.voxel_scale();
        for sample in &self.samples {
            let cell = self.grid.world_to_grid(sample);
            if self.grid.mark_occupied(cell) {
                self.placements.push(Placement {
                    cell,
                    center: self.grid.grid_to_world(&cell),
                    scale,
                });
            }
        }

        info!(
            "Generated {} placements from {} samples",
            self.placements.len(),
            self.samples.len()
        );
    }

    /// Uploads the placements once. A failed upload is retried by the next call.
    pub fn hand_off(&mut self, sink: &mut dyn InstanceSink) -> VoxelResult<()> {
        if self.placements.is_empty() || self.instances_ready {
            return Ok(());
        }

        sink.upload(&self.placements)?;
        self.instances_ready = true;
        info!("Handed {} placements to the instance sink", self.placements.len());
        Ok(())
    }

    /// Drops samples, placements, occupancy and the uploaded instances together.
    pub fn invalidate(&mut self) {
        debug!("Invalidating surface samples");
        self.samples.clear();
        self.placements.clear();
        self.grid.clear();
        self.instances_ready = false;
    }

    pub fn set_grid_length(&mut self, grid_length: u32) -> VoxelResult<()> {
        self.grid.set_grid_length(grid_length)?;
        self.invalidate();
        Ok(())
    }

    pub fn set_world_bounds(&mut self, world_min: glm::Vec3, world_max: glm::Vec3) -> VoxelResult<()> {
        self.grid.set_bounds(world_min, world_max)?;
        self.invalidate();
        Ok(())
    }

    pub fn set_model_matrix(&mut self, model_matrix: glm::Mat4) {
        self.model_matrix = model_matrix;
        self.invalidate();
    }

    pub fn set_raster_resolution(&mut self, resolution: usize) -> VoxelResult<()> {
        validate_resolution(resolution)?;
        self.raster_resolution = resolution;
        self.invalidate();
        Ok(())
    }

    pub fn set_meshes(&mut self, meshes: Vec<Mesh>) {
        self.meshes = meshes;
        self.invalidate();
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn model_matrix(&self) -> &glm::Mat4 {
        &self.model_matrix
    }

    pub fn raster_resolution(&self) -> usize {
        self.raster_resolution
    }

    pub fn samples(&self) -> &[glm::Vec3] {
        &self.samples
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        error::VoxelError,
        raster::{PositionRaster, SurfaceTriangle, UvRasterizer},
    };
    use approx::assert_relative_eq;
    use std::collections::HashSet;
    use vx_format::{Face, Material, Vertex};

    /// Returns a prepared raster and counts how often it was asked for one.
    struct FixedRasterizer {
        texels: Vec<glm::Vec3>,
        calls: usize,
    }

    impl FixedRasterizer {
        fn new(texels: Vec<glm::Vec3>) -> Self {
            Self { texels, calls: 0 }
        }
    }

    impl SurfaceRasterizer for FixedRasterizer {
        fn rasterize(
            &mut self,
            _triangles: &[SurfaceTriangle],
            resolution: usize,
            sentinel: f32,
        ) -> anyhow::Result<PositionRaster> {
            self.calls += 1;
            let mut raster = PositionRaster::new(resolution, sentinel);
            for (i, texel) in self.texels.iter().enumerate() {
                raster.set(i % resolution, i / resolution, *texel);
            }
            Ok(raster)
        }
    }

    struct FailingRasterizer;

    impl SurfaceRasterizer for FailingRasterizer {
        fn rasterize(&mut self, _: &[SurfaceTriangle], _: usize, _: f32) -> anyhow::Result<PositionRaster> {
            Err(anyhow!("device lost"))
        }
    }

    struct FlakySink {
        fail: bool,
        uploads: Vec<usize>,
    }

    impl InstanceSink for FlakySink {
        fn upload(&mut self, placements: &[Placement]) -> anyhow::Result<()> {
            if self.fail {
                return Err(anyhow!("out of memory"));
            }
            self.uploads.push(placements.len());
            Ok(())
        }
    }

    fn small_config() -> VoxelConfig {
        VoxelConfig {
            grid_length: 4,
            raster_resolution: 8,
            ..VoxelConfig::default()
        }
    }

    // a unit quad in the xy plane whose texture coordinates cover the whole raster
    fn quad() -> Vec<Mesh> {
        let vertex = |x: f32, y: f32| Vertex {
            position: glm::vec3(x, y, 0.0),
            normal: glm::vec3(0.0, 0.0, 1.0),
            tex_coord: glm::vec2(x + 0.5, y + 0.5),
        };
        vec![Mesh {
            vertices: vec![
                vertex(-0.5, -0.5),
                vertex(0.5, -0.5),
                vertex(0.5, 0.5),
                vertex(-0.5, 0.5),
            ],
            faces: vec![Face::new(0, 1, 2), Face::new(0, 2, 3)],
            material: Material::fallback(),
        }]
    }

    fn assert_consistent(sampler: &SurfaceSampler) {
        let cells: HashSet<_> = sampler.placements().iter().map(|p| p.cell).collect();
        assert_eq!(cells.len(), sampler.placements().len());
        assert_eq!(sampler.grid().occupied_count(), sampler.placements().len());
        for placement in sampler.placements() {
            assert!(sampler.grid().is_occupied(&placement.cell));
        }
    }

    #[test]
    fn test_update_quad() -> VoxelResult<()> {
        let mut sampler = SurfaceSampler::new(quad(), &small_config())?;
        let mut uploads: Vec<Vec<Placement>> = Vec::new();
        assert_eq!(sampler.phase(), Phase::Sampling);

        let phase = sampler.update(&mut UvRasterizer::new(), &mut uploads)?;

        assert_eq!(phase, Phase::Ready);
        assert_eq!(sampler.samples().len(), 64);
        assert_eq!(sampler.placements().len(), 4);
        assert_consistent(&sampler);
        for placement in sampler.placements() {
            assert!(placement.cell.x == 1 || placement.cell.x == 2);
            assert!(placement.cell.y == 1 || placement.cell.y == 2);
            assert_eq!(placement.cell.z, 2);
            assert_eq!(placement.scale, glm::vec3(0.5, 0.5, 0.5));
        }
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0], sampler.placements());

        Ok(())
    }

    #[test]
    fn test_phases_run_once() -> VoxelResult<()> {
        let mut sampler = SurfaceSampler::new(quad(), &small_config())?;
        let mut rasterizer = FixedRasterizer::new(vec![glm::vec3(0.9, 0.9, 0.9)]);
        let mut uploads: Vec<Vec<Placement>> = Vec::new();

        sampler.sample(&mut rasterizer)?;
        assert_eq!(sampler.phase(), Phase::Placing);
        sampler.generate_placements();
        assert_eq!(sampler.phase(), Phase::Instancing);
        sampler.hand_off(&mut uploads)?;
        assert_eq!(sampler.phase(), Phase::Ready);

        for _ in 0..3 {
            assert_eq!(sampler.update(&mut rasterizer, &mut uploads)?, Phase::Ready);
        }
        assert_eq!(rasterizer.calls, 1);
        assert_eq!(uploads.len(), 1);

        let placement = sampler.placements()[0];
        assert_eq!(placement.cell, glm::vec3(3, 3, 3));
        assert_relative_eq!(placement.center, glm::vec3(0.75, 0.75, 0.75));

        Ok(())
    }

    #[test]
    fn test_sentinel_and_duplicates() -> VoxelResult<()> {
        let sentinel = glm::vec3(0.4, 0.4, 0.4);
        let mut rasterizer = FixedRasterizer::new(vec![
            glm::vec3(0.9, 0.9, 0.9),
            sentinel,
            glm::vec3(0.8, 0.6, -0.55),
            glm::vec3(-0.9, 0.0, 0.0),
            // close to the sentinel is not the sentinel
            glm::vec3(0.4, 0.4, 0.400001),
            glm::vec3(0.9, 0.9, 0.9),
        ]);
        let mut sampler = SurfaceSampler::new(quad(), &small_config())?;

        sampler.update(&mut rasterizer, &mut Vec::<Vec<Placement>>::new())?;

        assert_eq!(sampler.samples().len(), 5);
        assert_eq!(sampler.placements().len(), 4);
        assert!(!sampler.grid().is_occupied(&glm::vec3(2, 2, 3)));
        assert_consistent(&sampler);

        Ok(())
    }

    #[test]
    fn test_empty_surface_keeps_sampling() -> VoxelResult<()> {
        let mut rasterizer = FixedRasterizer::new(Vec::new());
        let mut uploads: Vec<Vec<Placement>> = Vec::new();
        let mut sampler = SurfaceSampler::new(quad(), &small_config())?;

        assert_eq!(sampler.update(&mut rasterizer, &mut uploads)?, Phase::Sampling);
        assert_eq!(sampler.update(&mut rasterizer, &mut uploads)?, Phase::Sampling);
        assert_eq!(rasterizer.calls, 2);
        assert!(sampler.placements().is_empty());
        assert!(uploads.is_empty());

        Ok(())
    }

    #[test]
    fn test_invalidation_resets_all_phases() -> VoxelResult<()> {
        let mut sampler = SurfaceSampler::new(quad(), &small_config())?;
        let mut rasterizer = UvRasterizer::new();
        let mut uploads: Vec<Vec<Placement>> = Vec::new();
        sampler.update(&mut rasterizer, &mut uploads)?;

        sampler.set_grid_length(8)?;
        assert_eq!(sampler.phase(), Phase::Sampling);
        assert!(sampler.samples().is_empty());
        assert!(sampler.placements().is_empty());
        assert_eq!(sampler.grid().occupied_count(), 0);

        assert_eq!(sampler.update(&mut rasterizer, &mut uploads)?, Phase::Ready);
        assert_eq!(sampler.placements().len(), 16);
        assert_consistent(&sampler);
        assert_eq!(uploads.len(), 2);

        sampler.set_model_matrix(glm::translation(&glm::vec3(0.5, 0.5, 0.0)));
        sampler.set_grid_length(4)?;
        sampler.update(&mut rasterizer, &mut uploads)?;
        assert_eq!(sampler.placements().len(), 4);
        for placement in sampler.placements() {
            assert!(placement.cell.x >= 2 && placement.cell.y >= 2);
        }

        sampler.set_raster_resolution(2)?;
        sampler.update(&mut rasterizer, &mut uploads)?;
        assert_eq!(sampler.samples().len(), 4);
        assert_consistent(&sampler);
        assert_eq!(uploads.len(), 4);

        Ok(())
    }

    #[test]
    fn test_rejected_changes_keep_state() -> VoxelResult<()> {
        let mut sampler = SurfaceSampler::new(quad(), &small_config())?;
        sampler.update(&mut UvRasterizer::new(), &mut Vec::<Vec<Placement>>::new())?;

        assert!(matches!(
            sampler.set_grid_length(0),
            Err(VoxelError::DegenerateInput(_))
        ));
        assert!(matches!(
            sampler.set_world_bounds(glm::vec3(1.0, 1.0, 1.0), glm::vec3(1.0, 2.0, 2.0)),
            Err(VoxelError::DegenerateInput(_))
        ));
        assert!(matches!(
            sampler.set_raster_resolution(0),
            Err(VoxelError::DegenerateInput(_))
        ));

        assert_eq!(sampler.phase(), Phase::Ready);
        assert_eq!(sampler.placements().len(), 4);
        assert_consistent(&sampler);

        Ok(())
    }

    #[test]
    fn test_collaborator_failures() -> VoxelResult<()> {
        let mut sampler = SurfaceSampler::new(quad(), &small_config())?;
        let mut sink = FlakySink {
            fail: true,
            uploads: Vec::new(),
        };

        assert!(matches!(
            sampler.update(&mut FailingRasterizer, &mut sink),
            Err(VoxelError::Other(_))
        ));
        assert_eq!(sampler.phase(), Phase::Sampling);

        let mut rasterizer = UvRasterizer::new();
        assert!(sampler.update(&mut rasterizer, &mut sink).is_err());
        assert_eq!(sampler.phase(), Phase::Instancing);

        sink.fail = false;
        assert_eq!(sampler.update(&mut rasterizer, &mut sink)?, Phase::Ready);
        assert_eq!(sink.uploads, vec![4]);

        Ok(())
    }

    #[test]
    fn test_invalid_config() {
        let config = VoxelConfig {
            raster_resolution: 0,
            ..VoxelConfig::default()
        };
        assert!(SurfaceSampler::new(quad(), &config).is_err());
    }
}
