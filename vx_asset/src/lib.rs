pub mod error;
pub mod mesh;
pub(crate) mod utils;

pub use error::{ImportError, Result};
pub use mesh::obj::{load_meshes, load_with_meta, meta::ObjMeta};
pub use mesh::vertex_key::VertexKey;
