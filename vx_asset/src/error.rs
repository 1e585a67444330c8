use std::path::PathBuf;
use vx_format::FormatError;

use crate::mesh::obj::parser::ParserError;

pub type Result<T> = std::result::Result<T, ImportError>;

/// Aborts an import as a whole; no partial list of meshes is returned.
#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    /// The model or one of the textures it references does not exist
    #[error("Resource not found: {}", .0.display())]
    ResourceNotFound(PathBuf),
    /// The model exists but could not be read or parsed
    #[error("Failed to import `{}`: {}", .path.display(), .message)]
    ImportFailure { path: PathBuf, message: String },
    /// Post processing of the imported meshes failed
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl ImportError {
    pub(crate) fn from_parser(path: PathBuf, err: ParserError) -> Self {
        match err {
            ParserError::MissingResource(resource) => ImportError::ResourceNotFound(resource),
            err => ImportError::ImportFailure {
                path,
                message: err.to_string(),
            },
        }
    }
}
