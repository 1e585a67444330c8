use anyhow::{Context, Result};
use log::{info, warn};
use std::path::PathBuf;
use structopt::StructOpt;
use voxel_engine::{
    vx_format::{glm, Mesh},
    InstanceSink, Phase, Placement, SurfaceSampler, UvRasterizer, VoxelConfig,
};

// Cli arguments
#[derive(StructOpt, Debug)]
#[structopt(name = "voxelize")]
struct CliArgs {
    /// Wavefront model to voxelize
    #[structopt(parse(from_os_str))]
    model: PathBuf,
    /// Voxelization settings, defaults are used if omitted
    #[structopt(short = "c", long = "config", parse(from_os_str))]
    config: Option<PathBuf>,
    /// File to write the placements to
    #[structopt(short = "o", long = "output", default_value = "placements.bin", parse(from_os_str))]
    output: PathBuf,
    /// Center the model and scale it into the unit sphere before voxelizing
    #[structopt(long = "center")]
    center: bool,
    /// Output debug info
    #[structopt(short = "v", long = "verbose")]
    verbose: bool,
}

/// Writes the placements as a bincode encoded list.
struct FileSink {
    path: PathBuf,
}

impl InstanceSink for FileSink {
    fn upload(&mut self, placements: &[Placement]) -> Result<()> {
        let data = bincode::serialize(placements).context("Could not serialize placements")?;
        std::fs::write(&self.path, data)
            .with_context(|| format!("Could not write placements to: {}", self.path.display()))?;
        info!("Wrote {} placements to `{}`", placements.len(), self.path.display());
        Ok(())
    }
}

fn main() -> Result<()> {
    let args = CliArgs::from_args();

    if !args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    } else {
        env_logger::Builder::new()
            .filter(None, log::LevelFilter::Debug)
            .init();
    }

    run(args)
}

fn run(args: CliArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => VoxelConfig::parse(path)?,
        None => VoxelConfig::default(),
    };

    let meshes = voxel_engine::vx_asset::load_meshes(&args.model, args.center)?;
    match model_extent(&meshes) {
        Some((min, max)) => info!(
            "Model `{}` spans {:?} to {:?}",
            args.model.display(),
            min.as_slice(),
            max.as_slice()
        ),
        None => warn!("Model `{}` has no vertices", args.model.display()),
    }

    let mut sampler = SurfaceSampler::new(meshes, &config)?;
    let mut sink = FileSink { path: args.output };

    match sampler.update(&mut UvRasterizer::new(), &mut sink)? {
        Phase::Ready => info!(
            "Occupied {} of {} cells",
            sampler.grid().occupied_count(),
            u64::from(config.grid_length).pow(3)
        ),
        phase => warn!(
            "Voxelization of `{}` stopped in phase {:?}, the model has no texture coordinates covering the raster",
            args.model.display(),
            phase
        ),
    }

    Ok(())
}

fn model_extent(meshes: &[Mesh]) -> Option<(glm::Vec3, glm::Vec3)> {
    meshes
        .iter()
        .filter_map(Mesh::bounds)
        .reduce(|(min, max), (lo, hi)| (glm::min2(&min, &lo), glm::max2(&max, &hi)))
}

#[cfg(test)]
mod test {
    use super::*;
    use voxel_engine::vx_format::{Material, Vertex};

    fn mesh(positions: &[[f32; 3]]) -> Mesh {
        Mesh {
            vertices: positions
                .iter()
                .map(|p| Vertex {
                    position: (*p).into(),
                    normal: glm::vec3(0.0, 0.0, 1.0),
                    tex_coord: glm::vec2(0.0, 0.0),
                })
                .collect(),
            faces: Vec::new(),
            material: Material::fallback(),
        }
    }

    #[test]
    fn test_model_extent() {
        let meshes = [
            mesh(&[[0.0, 1.0, 2.0], [1.0, -1.0, 0.0]]),
            mesh(&[]),
            mesh(&[[-3.0, 0.5, 4.0]]),
        ];
        assert_eq!(
            model_extent(&meshes),
            Some((glm::vec3(-3.0, -1.0, 0.0), glm::vec3(1.0, 1.0, 4.0)))
        );
        assert_eq!(model_extent(&[mesh(&[])]), None);
    }
}
