/// Identifies one corner of a face by the source indices of its attributes.
///
/// Two corners referencing the same position but different normals or texture coordinates
/// get different keys, and therefore end up as different vertices. The key deliberately
/// holds indices and not resolved values, so it says nothing about whether two vertices
/// happen to look alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexKey {
    pub position: usize,
    pub normal: Option<usize>,
    pub tex_coord: Option<usize>,
}

impl VertexKey {
    pub const fn new(position: usize, normal: Option<usize>, tex_coord: Option<usize>) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }
}
