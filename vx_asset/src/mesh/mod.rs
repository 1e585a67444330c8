pub mod obj;
pub mod vertex_key;
