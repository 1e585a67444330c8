pub mod error;
pub mod material;
pub mod mesh;
pub mod transform;

pub use error::{FormatError, Result};
pub use material::{Material, Texture};
pub use mesh::{Face, Mesh, MeshData, Vertex};
pub use transform::{center_and_normalize, merge, Axis};

pub use nalgebra_glm as glm;
