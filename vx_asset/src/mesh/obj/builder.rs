use std::{
    collections::{hash_map::Entry, HashMap},
    ops::Range,
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{debug, warn};
use nalgebra_glm as glm;
use vx_format::{Face, Material, Mesh, Texture, Vertex};

use super::{mtl::MtlMaterial, parser::ParserError};
use crate::mesh::vertex_key::VertexKey;

/// A face corner as written in the file: 1-based, negative values count from the end.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct ObjFaceIndex {
    pub(crate) vert_i: isize,
    pub(crate) uv_i: Option<isize>,
    pub(crate) normal_i: Option<isize>,
}

#[derive(Debug, Default, PartialEq)]
pub(crate) struct ObjFace {
    pub(crate) face_i: Vec<ObjFaceIndex>,
}

/// Triangles sharing one `o`/`g` statement, each with the material that was active for it.
#[derive(Debug, Default)]
pub(crate) struct ObjShape {
    pub(crate) name: Option<String>,
    pub(crate) triangles: Vec<[VertexKey; 3]>,
    pub(crate) material_ids: Vec<Option<usize>>,
}

#[derive(Debug, Default)]
pub(crate) struct ObjMeshData {
    pub(crate) shapes: Vec<ObjShape>,
    pub(crate) positions: Vec<[f32; 3]>,
    pub(crate) uvs: Vec<[f32; 2]>,
    pub(crate) normals: Vec<[f32; 3]>,
    pub(crate) materials: Vec<MtlMaterial>,
}

#[derive(Debug, Default)]
pub(crate) struct ObjMeshBuilder {
    pub(crate) mesh: ObjMeshData,
    pub(crate) curr_shape: ObjShape,
    pub(crate) curr_material: Option<usize>,
    pub(crate) material_names: HashMap<String, usize>,
    pub(crate) base_dir: PathBuf,
}

impl ObjMeshBuilder {
    pub(crate) fn new(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_owned(),
            ..Self::default()
        }
    }

    pub(crate) fn set_group(&mut self, name: &str) {
        let name = if name.is_empty() {
            None
        } else {
            Some(name.into())
        };

        if self.curr_shape.triangles.is_empty() {
            self.curr_shape.name = name;
        } else {
            let mut shape = ObjShape {
                name,
                ..ObjShape::default()
            };
            std::mem::swap(&mut shape, &mut self.curr_shape);
            self.mesh.shapes.push(shape);
        }
    }

    pub(crate) fn push_materials(&mut self, materials: Vec<MtlMaterial>) {
        for material in materials {
            let id = self.mesh.materials.len();
            self.material_names.insert(material.name.clone(), id);
            self.mesh.materials.push(material);
        }
    }

    pub(crate) fn use_material(&mut self, name: &str) {
        self.curr_material = self.material_names.get(name).copied();
        if self.curr_material.is_none() {
            warn!("Unknown material `{}`, falling back to the default material", name);
        }
    }

    pub(crate) fn push_position(&mut self, position: [f32; 3]) {
        self.mesh.positions.push(position);
    }

    pub(crate) fn push_uv(&mut self, uv: [f32; 2]) {
        self.mesh.uvs.push(uv);
    }

    pub(crate) fn push_normal(&mut self, normal: [f32; 3]) {
        self.mesh.normals.push(normal);
    }

    /// Resolves the corners of `face` and fan triangulates it into the current shape.
    pub(crate) fn push_face(&mut self, face: ObjFace) -> Result<(), ParserError> {
        let corners = face
            .face_i
            .iter()
            .map(|c| -> Result<VertexKey, ParserError> {
                Ok(VertexKey {
                    position: resolve_index("Position", c.vert_i, self.mesh.positions.len())?,
                    // indices into an empty array fall back to the face normal and (0, 0)
                    normal: c
                        .normal_i
                        .filter(|_| !self.mesh.normals.is_empty())
                        .map(|i| resolve_index("Normal", i, self.mesh.normals.len()))
                        .transpose()?,
                    tex_coord: c
                        .uv_i
                        .filter(|_| !self.mesh.uvs.is_empty())
                        .map(|i| resolve_index("Texture coordinate", i, self.mesh.uvs.len()))
                        .transpose()?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // triangulate polygons for convex shapes (we might find faces which have more than three indexes)
        for i in 2..corners.len() {
            self.curr_shape
                .triangles
                .push([corners[0], corners[i - 1], corners[i]]);
            self.curr_shape.material_ids.push(self.curr_material);
        }

        Ok(())
    }

    pub(crate) fn build_meshes(mut self) -> Result<Vec<Mesh>, ParserError> {
        // push the last shape
        if !self.curr_shape.triangles.is_empty() {
            self.mesh.shapes.push(std::mem::take(&mut self.curr_shape));
        }

        let mut textures: HashMap<usize, Arc<Texture>> = HashMap::new();
        let mut out = Vec::new();

        for shape in &self.mesh.shapes {
            for range in material_runs(&shape.material_ids) {
                let material_id = shape.material_ids[range.start];
                debug!(
                    "Building submesh of `{}` from triangles {:?} with material {:?}",
                    shape.name.as_deref().unwrap_or("<unnamed>"),
                    range,
                    material_id
                );

                let mut mesh = self.build_submesh(&shape.triangles[range])?;
                mesh.material = self.resolve_material(material_id, &mut textures)?;
                out.push(mesh);
            }
        }

        Ok(out)
    }

    /// Creates one vertex per distinct [`VertexKey`] of `triangles`.
    fn build_submesh(&self, triangles: &[[VertexKey; 3]]) -> Result<Mesh, ParserError> {
        let data = &self.mesh;
        let mut mesh = Mesh::default();
        let mut vertex_cache: HashMap<VertexKey, u32> = HashMap::new();

        for triangle in triangles {
            let corners = [
                data.position(triangle[0].position)?,
                data.position(triangle[1].position)?,
                data.position(triangle[2].position)?,
            ];
            let geometric_normal = face_normal(&corners);

            let mut face = Face::default();
            for (j, key) in triangle.iter().enumerate() {
                face.indices[j] = match vertex_cache.entry(*key) {
                    Entry::Occupied(entry) => *entry.get(),
                    Entry::Vacant(entry) => {
                        let vertex = Vertex {
                            position: corners[j],
                            normal: match key.normal {
                                Some(i) if !data.normals.is_empty() => data.normal(i)?,
                                _ => geometric_normal,
                            },
                            tex_coord: match key.tex_coord {
                                Some(i) if !data.uvs.is_empty() => data.uv(i)?,
                                _ => glm::vec2(0.0, 0.0),
                            },
                        };
                        let idx = mesh.vertices.len() as u32;
                        mesh.vertices.push(vertex);
                        *entry.insert(idx)
                    }
                };
            }
            mesh.faces.push(face);
        }

        Ok(mesh)
    }

    fn resolve_material(
        &self,
        material_id: Option<usize>,
        textures: &mut HashMap<usize, Arc<Texture>>,
    ) -> Result<Material, ParserError> {
        let obj_material = match material_id.and_then(|id| self.mesh.materials.get(id)) {
            Some(m) => m,
            None => return Ok(Material::fallback()),
        };

        let mut material = Material {
            diffuse: obj_material.diffuse.into(),
            specular: obj_material.specular.into(),
            shininess: obj_material.shininess,
            transparency: obj_material.transparency,
            diffuse_texture_path: None,
            diffuse_texture: None,
        };

        if !obj_material.diffuse_texname.is_empty() {
            let path = self.base_dir.join(&obj_material.diffuse_texname);
            if !path.is_file() {
                return Err(ParserError::MissingResource(path));
            }

            let texture = match material_id.and_then(|id| textures.get(&id)) {
                Some(texture) => Arc::clone(texture),
                None => {
                    let texture = Arc::new(Texture::load(&path)?);
                    if let Some(id) = material_id {
                        textures.insert(id, Arc::clone(&texture));
                    }
                    texture
                }
            };
            material.diffuse_texture_path = Some(path);
            material.diffuse_texture = Some(texture);
        }

        Ok(material)
    }
}

impl ObjMeshData {
    fn position(&self, i: usize) -> Result<glm::Vec3, ParserError> {
        lookup("Position", &self.positions, i).map(glm::Vec3::from)
    }

    fn normal(&self, i: usize) -> Result<glm::Vec3, ParserError> {
        lookup("Normal", &self.normals, i).map(glm::Vec3::from)
    }

    fn uv(&self, i: usize) -> Result<glm::Vec2, ParserError> {
        lookup("Texture coordinate", &self.uvs, i).map(glm::Vec2::from)
    }
}

fn lookup<T: Copy>(kind: &'static str, values: &[T], i: usize) -> Result<T, ParserError> {
    values.get(i).copied().ok_or(ParserError::IndexOutOfRange {
        kind,
        index: i as isize + 1,
        len: values.len(),
    })
}

// turns a 1-based, possibly negative obj index into a 0-based one
fn resolve_index(kind: &'static str, index: isize, len: usize) -> Result<usize, ParserError> {
    let resolved = match index {
        i if i > 0 => Some(i as usize - 1),
        i if i < 0 => len.checked_sub(i.unsigned_abs()),
        _ => None,
    };
    resolved.ok_or(ParserError::IndexOutOfRange { kind, index, len })
}

/// Splits a shape into maximal runs of consecutive triangles sharing a material.
pub(crate) fn material_runs(material_ids: &[Option<usize>]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = 0;
    for end in 1..=material_ids.len() {
        if end == material_ids.len() || material_ids[end] != material_ids[start] {
            runs.push(start..end);
            start = end;
        }
    }
    runs
}

/// Normal of the plane through `corners`, following their winding. Degenerate triangles
/// get a zero normal.
fn face_normal(corners: &[glm::Vec3; 3]) -> glm::Vec3 {
    glm::cross(&(corners[1] - corners[0]), &(corners[2] - corners[0]))
        .try_normalize(0.0)
        .unwrap_or_else(glm::Vec3::zeros)
}
