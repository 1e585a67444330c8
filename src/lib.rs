pub mod config;
pub mod error;
pub mod grid;
pub mod placement;
pub mod raster;
pub mod sampler;

pub use config::VoxelConfig;
pub use error::{VoxelError, VoxelResult};
pub use grid::VoxelGrid;
pub use placement::{InstanceSink, Placement};
pub use raster::{surface_triangles, PositionRaster, SurfaceRasterizer, SurfaceTriangle, UvRasterizer};
pub use sampler::{Phase, SurfaceSampler};

pub use vx_asset;
pub use vx_format;
