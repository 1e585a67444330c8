use std::io;

use vx_asset::ImportError;
use vx_format::FormatError;

/// Error type for every function of the voxelization pipeline
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum VoxelError {
    /// Empty vertex sets, zero sized grids or world bounds without extent
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),
    /// The model could not be imported
    #[error(transparent)]
    Import(#[from] ImportError),
    /// Errors of the shared mesh format
    #[error(transparent)]
    Format(#[from] FormatError),
    /// The configuration file is not valid toml or has unexpected fields
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Failures reported by the rasterizer or the instance sink
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type VoxelResult<T> = Result<T, VoxelError>;
