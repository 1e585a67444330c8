mod builder;
pub mod meta;
mod mtl;
pub(crate) mod parser;

use anyhow::{Context, Result};
use log::info;
use std::path::Path;
use vx_format::{Mesh, MeshData};

use crate::{error::ImportError, utils};

use self::meta::ObjMeta;

/// Imports the model at `path` as a list of meshes, one per run of triangles sharing a
/// material within each shape.
///
/// Texture file names are resolved relative to the directory of the model.
pub fn load_meshes(path: &Path, center_and_normalize: bool) -> crate::Result<Vec<Mesh>> {
    if !path.is_file() {
        return Err(ImportError::ResourceNotFound(path.to_owned()));
    }
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

    let mut meshes = parser::parse(path, base_dir)
        .and_then(|builder| builder.build_meshes())
        .map_err(|err| ImportError::from_parser(path.to_owned(), err))?;

    info!(
        "Imported {} meshes with {} vertices from `{}`",
        meshes.len(),
        meshes.iter().map(|m| m.vertices.len()).sum::<usize>(),
        path.display()
    );

    if center_and_normalize {
        vx_format::center_and_normalize(&mut meshes)?;
    }

    Ok(meshes)
}

/// Imports the model at `path` and applies the post processing requested by `meta`.
pub fn load_with_meta(path: &Path, meta: &ObjMeta) -> crate::Result<Vec<Mesh>> {
    let mut meshes = load_meshes(path, meta.center_and_normalize)?;

    for axis in meta.flipped_axes() {
        meshes.iter_mut().for_each(|m| m.flip(axis));
    }

    if meta.merge && meshes.len() > 1 {
        meshes = vec![vx_format::merge(&meshes)?];
    }

    Ok(meshes)
}

fn serialize(meshes: Vec<Mesh>) -> Result<Vec<u8>> {
    MeshData { meshes }
        .to_bytes()
        .context("Could not serialize MeshData")
}

fn save(path: &Path, output_dir: &Path, data: Vec<u8>) -> Result<()> {
    let file_name = utils::file_name(path)?;
    let target = utils::combine_path(output_dir, file_name, "vxm")?;
    utils::write_file(target, data)?;
    Ok(())
}

/// Parse meta from file called `file.toml` or alternativley from folder scoped meta file named `obj.toml` or else use default meta
pub(crate) fn parse_meta(path: &Path) -> Result<ObjMeta> {
    let dir = path
        .parent()
        .with_context(|| format!("Path terminates in root or prefix: {}", path.display()))?;
    let meta_file = utils::file_name(path)?;

    let path = utils::combine_path(dir, meta_file, "toml")?;
    if path.is_file() {
        return ObjMeta::parse(&path);
    }

    // check if folder scoped meta exists
    let path = utils::combine_path(dir, "obj", "toml")?;
    if path.is_file() {
        return ObjMeta::parse(&path);
    }

    Ok(ObjMeta::default())
}

/// Converts the model at `path` into a `.vxm` file inside `output_dir`.
pub fn process(path: &Path, output_dir: &Path) -> Result<()> {
    info!("Processing Wavefront `.obj`-file: `{}`", path.display());
    let meta = parse_meta(path)?;
    let meshes = load_with_meta(path, &meta)?;
    save(path, output_dir, serialize(meshes)?)
}
