use anyhow::Result;
use log::{debug, warn};
use nalgebra_glm as glm;
use vx_format::Mesh;

/// A world space triangle together with its texture coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceTriangle {
    pub positions: [glm::Vec3; 3],
    pub tex_coords: [glm::Vec2; 3],
}

/// Collects the faces of `meshes`, moved into world space by `model_matrix`.
///
/// Faces referring to vertices the mesh does not have are skipped.
pub fn surface_triangles(meshes: &[Mesh], model_matrix: &glm::Mat4) -> Vec<SurfaceTriangle> {
    let to_world = |p: &glm::Vec3| glm::vec4_to_vec3(&(model_matrix * glm::vec4(p.x, p.y, p.z, 1.0)));

    let mut triangles = Vec::with_capacity(meshes.iter().map(|m| m.faces.len()).sum());
    for mesh in meshes {
        for face in &mesh.faces {
            let corners = match face.indices.map(|i| mesh.vertices.get(i as usize)) {
                [Some(a), Some(b), Some(c)] => [a, b, c],
                _ => {
                    warn!("Skipping face {:?} with out of range indices", face.indices);
                    continue;
                }
            };
            triangles.push(SurfaceTriangle {
                positions: corners.map(|v| to_world(&v.position)),
                tex_coords: corners.map(|v| v.tex_coord),
            });
        }
    }
    triangles
}

/// Square raster of world positions, stored row by row.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionRaster {
    resolution: usize,
    texels: Vec<glm::Vec3>,
}

impl PositionRaster {
    /// A raster where every texel holds `sentinel` in all three components.
    pub fn new(resolution: usize, sentinel: f32) -> Self {
        Self {
            resolution,
            texels: vec![sentinel_value(sentinel); resolution * resolution],
        }
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&glm::Vec3> {
        if x >= self.resolution || y >= self.resolution {
            return None;
        }
        self.texels.get(y * self.resolution + x)
    }

    pub fn set(&mut self, x: usize, y: usize, value: glm::Vec3) {
        if x < self.resolution && y < self.resolution {
            self.texels[y * self.resolution + x] = value;
        }
    }

    pub fn texels(&self) -> &[glm::Vec3] {
        &self.texels
    }
}

pub(crate) fn sentinel_value(sentinel: f32) -> glm::Vec3 {
    glm::vec3(sentinel, sentinel, sentinel)
}

/// Produces world space samples of a surface by drawing it through its parametrization.
pub trait SurfaceRasterizer {
    /// Draws `triangles` into a `resolution x resolution` raster. Covered texels hold the
    /// world position of the surface under them, all others hold `sentinel`.
    fn rasterize(
        &mut self,
        triangles: &[SurfaceTriangle],
        resolution: usize,
        sentinel: f32,
    ) -> Result<PositionRaster>;
}

/// Software rasterizer drawing triangles in texture coordinate space.
///
/// `u` maps to columns and `v` to rows, texels are sampled at their centres. Where triangles
/// overlap in texture space the one drawn last wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct UvRasterizer;

impl UvRasterizer {
    pub fn new() -> Self {
        Self
    }

    fn draw_triangle(&self, raster: &mut PositionRaster, triangle: &SurfaceTriangle) -> usize {
        let res = raster.resolution() as f32;
        let [p0, p1, p2] = triangle.tex_coords.map(|uv| uv * res);

        let area_x_2 = edge(&p0, &p1, &p2);
        if area_x_2 == 0.0 || !area_x_2.is_finite() {
            return 0;
        }

        let min = glm::min2(&glm::min2(&p0, &p1), &p2);
        let max = glm::max2(&glm::max2(&p0, &p1), &p2);
        let x_range = texel_range(min.x, max.x, raster.resolution());
        let y_range = texel_range(min.y, max.y, raster.resolution());

        let mut covered = 0;
        for y in y_range {
            for x in x_range.clone() {
                let p = glm::vec2(x as f32 + 0.5, y as f32 + 0.5);

                // barycentrics, positive inside for either winding
                let b0 = edge(&p1, &p2, &p) / area_x_2;
                let b1 = edge(&p2, &p0, &p) / area_x_2;
                let b2 = edge(&p0, &p1, &p) / area_x_2;
                if b0 < 0.0 || b1 < 0.0 || b2 < 0.0 {
                    continue;
                }

                let [w0, w1, w2] = triangle.positions;
                raster.set(x, y, w0 * b0 + w1 * b1 + w2 * b2);
                covered += 1;
            }
        }
        covered
    }
}

impl SurfaceRasterizer for UvRasterizer {
    fn rasterize(
        &mut self,
        triangles: &[SurfaceTriangle],
        resolution: usize,
        sentinel: f32,
    ) -> Result<PositionRaster> {
        anyhow::ensure!(resolution > 0, "raster resolution must be positive");

        let mut raster = PositionRaster::new(resolution, sentinel);
        let covered: usize = triangles
            .iter()
            .map(|triangle| self.draw_triangle(&mut raster, triangle))
            .sum();

        debug!(
            "Rasterized {} triangles into {}x{} texels, {} texel writes",
            triangles.len(),
            resolution,
            resolution,
            covered
        );
        Ok(raster)
    }
}

// twice the signed area of the triangle (a, b, c)
fn edge(a: &glm::Vec2, b: &glm::Vec2, c: &glm::Vec2) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

// texels whose centres may lie within [min, max]
fn texel_range(min: f32, max: f32, resolution: usize) -> std::ops::Range<usize> {
    let start = (min - 0.5).ceil().max(0.0) as usize;
    let end = ((max - 0.5).floor() + 1.0).max(0.0) as usize;
    start.min(resolution)..end.min(resolution)
}
