use crate::error::Result;
use log::debug;
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Decoded pixels of an image file, shared between the meshes that use it.
pub struct Texture {
    pub path: PathBuf,
    pub image: image::RgbaImage,
}

impl Texture {
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading texture: {}", path.display());
        let image = image::open(path)?.to_rgba8();
        Ok(Self {
            path: path.to_owned(),
            image,
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("path", &self.path)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl PartialEq for Texture {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub diffuse: glm::Vec3,
    pub specular: glm::Vec3,
    pub shininess: f32,
    pub transparency: f32,
    /// Resolved location of the diffuse texture, kept so the pixels can be reloaded after
    /// deserialization.
    pub diffuse_texture_path: Option<PathBuf>,
    #[serde(skip)]
    pub diffuse_texture: Option<Arc<Texture>>,
}

impl Material {
    /// Used for geometry that does not reference any material.
    pub fn fallback() -> Self {
        Self {
            diffuse: glm::vec3(1.0, 1.0, 1.0),
            specular: glm::vec3(0.0, 0.0, 0.0),
            shininess: 1.0,
            transparency: 1.0,
            diffuse_texture_path: None,
            diffuse_texture: None,
        }
    }

    /// Loads the diffuse texture if a path is set and it was not loaded yet.
    pub fn load_texture(&mut self) -> Result<Option<Arc<Texture>>> {
        if self.diffuse_texture.is_none() {
            if let Some(path) = &self.diffuse_texture_path {
                self.diffuse_texture = Some(Arc::new(Texture::load(path)?));
            }
        }
        Ok(self.diffuse_texture.clone())
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::fallback()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fallback() {
        let material = Material::default();
        assert_eq!(material.diffuse, glm::vec3(1.0, 1.0, 1.0));
        assert_eq!(material.specular, glm::vec3(0.0, 0.0, 0.0));
        assert_eq!(material.shininess, 1.0);
        assert!(material.diffuse_texture.is_none());
    }

    #[test]
    fn test_load_without_path() -> Result<()> {
        let mut material = Material::fallback();
        assert!(material.load_texture()?.is_none());
        Ok(())
    }

    #[test]
    fn test_load_missing_texture() {
        let mut material = Material {
            diffuse_texture_path: Some(PathBuf::from("does/not/exist.png")),
            ..Material::fallback()
        };
        assert!(material.load_texture().is_err());
        assert!(material.diffuse_texture.is_none());
    }
}
