use std::path::Path;

use log::{debug, warn};

use super::parser::{parse_numbers, read_lines, ParserError};

/// A material as described by a `.mtl` library.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MtlMaterial {
    pub(crate) name: String,
    pub(crate) diffuse: [f32; 3],
    pub(crate) specular: [f32; 3],
    pub(crate) shininess: f32,
    pub(crate) transparency: f32,
    /// Relative to the directory of the model, empty if there is no texture
    pub(crate) diffuse_texname: String,
}

impl Default for MtlMaterial {
    fn default() -> Self {
        Self {
            name: String::new(),
            diffuse: [0.0, 0.0, 0.0],
            specular: [0.0, 0.0, 0.0],
            shininess: 1.0,
            transparency: 1.0,
            diffuse_texname: String::new(),
        }
    }
}

// parses a wavefront material library (https://en.wikipedia.org/wiki/Wavefront_.obj_file#Material_template_library)
pub(crate) fn parse(path: &Path) -> Result<Vec<MtlMaterial>, ParserError> {
    log::info!("Loading material library: {}", path.display());
    let lines = read_lines(path)?.collect::<Result<Vec<_>, _>>()?;
    parse_lines(lines.iter().map(String::as_str))
}

pub(crate) fn parse_lines<'a>(
    lines: impl Iterator<Item = &'a str>,
) -> Result<Vec<MtlMaterial>, ParserError> {
    let mut materials: Vec<MtlMaterial> = Vec::new();

    for line in lines {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (token, value) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let value = value.trim();

        if token == "newmtl" {
            materials.push(MtlMaterial {
                name: value.into(),
                ..MtlMaterial::default()
            });
            continue;
        }

        let material = match materials.last_mut() {
            Some(material) => material,
            None => {
                warn!("Found `{}` before any `newmtl`. Ignoring.", token);
                continue;
            }
        };

        match token {
            "Kd" => material.diffuse = parse_color(token, value)?,
            "Ks" => material.specular = parse_color(token, value)?,
            "Ns" => material.shininess = parse_numbers(token, value, 1)?[0],
            "d" => material.transparency = parse_numbers(token, value, 1)?[0],
            "Tr" => material.transparency = 1.0 - parse_numbers(token, value, 1)?[0],
            // options may precede the file name, which always comes last
            "map_Kd" => {
                material.diffuse_texname = value
                    .split_whitespace()
                    .last()
                    .unwrap_or_default()
                    .into()
            }
            _ => debug!("Ignoring material statement: \"{}\"", token),
        }
    }

    Ok(materials)
}

fn parse_color(token: &str, value: &str) -> Result<[f32; 3], ParserError> {
    let numbers = parse_numbers(token, value, 3)?;
    Ok([numbers[0], numbers[1], numbers[2]])
}
