use std::fs;
use std::io::{self, BufRead};
use std::{
    num,
    path::{Path, PathBuf},
};

use log::{debug, warn};

use super::{builder::*, mtl};

#[derive(thiserror::Error, Debug)]
pub enum ParserError {
    #[error("Failed to parse float.")]
    ParseFloat(#[from] num::ParseFloatError),
    #[error("Failed to parse integer.")]
    ParseInt(#[from] num::ParseIntError),
    #[error("Failed to read model: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to parse face: {0}")]
    ParseFace(String),
    #[error("Expected at least {expected} values for `{token}`, found {found}.")]
    MissingValues {
        token: String,
        expected: usize,
        found: usize,
    },
    #[error("{kind} index {index} is out of range, only {len} are defined.")]
    IndexOutOfRange {
        kind: &'static str,
        index: isize,
        len: usize,
    },
    #[error("Resource not found: {}", .0.display())]
    MissingResource(PathBuf),
    #[error("Failed to load texture: {0}")]
    Texture(#[from] vx_format::FormatError),
}

// parses wavefront obj (https://en.wikipedia.org/wiki/Wavefront_.obj_file)
// polygons are fan triangulated, material libraries are resolved relative to `base_dir`
pub(crate) fn parse(filepath: &Path, base_dir: &Path) -> Result<ObjMeshBuilder, ParserError> {
    let mut builder = ObjMeshBuilder::new(base_dir);

    let lines = read_lines(filepath)?;
    log::info!("Loading mesh: {}", filepath.display());

    for line in lines {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        debug!("Parsing: \"{}\"", line);

        let (token, value) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        parse_token(token, value.trim(), &mut builder)?;
    }

    Ok(builder)
}

pub(crate) fn parse_token(
    token: &str,
    value: &str,
    builder: &mut ObjMeshBuilder,
) -> Result<(), ParserError> {
    match token {
        // comment
        t if t.starts_with('#') => debug!("Comment: {:?}", value),
        // material library
        "mtllib" => {
            let path = builder.base_dir.join(value);
            match mtl::parse(&path) {
                Ok(materials) => builder.push_materials(materials),
                Err(err) => warn!(
                    "Could not load material library `{}`: {}",
                    path.display(),
                    err
                ),
            }
        }
        // material
        "usemtl" => builder.use_material(value),
        // object name and groups both start a new shape
        "o" | "g" => builder.set_group(value),
        // vertex
        "v" => builder.push_position(parse_vertex(value)?),
        // texture coordinates
        "vt" => builder.push_uv(parse_uv(value)?),
        // vertex normals
        "vn" => builder.push_normal(parse_normal(value)?),
        // faces
        "f" => builder.push_face(parse_face(value)?)?,
        // parameter space vertices
        "vp" => warn!("Parameter space vertices not supported. Ignoring."),
        // smoothing groups
        "s" => debug!("Smoothing groups not supported. Ignoring."),
        "l" | "p" => warn!("Line and point elements not supported. Ignoring."),
        _ => warn!("Found unknown token: \"{}\"", token),
    };

    Ok(())
}

// vertex colors after the position are accepted but dropped
fn parse_vertex(value: &str) -> Result<[f32; 3], ParserError> {
    let vec = parse_numbers("v", value, 3)?;
    Ok([vec[0], vec[1], vec[2]])
}

fn parse_normal(value: &str) -> Result<[f32; 3], ParserError> {
    let numbers = parse_numbers("vn", value, 3)?;
    Ok([numbers[0], numbers[1], numbers[2]])
}

fn parse_uv(value: &str) -> Result<[f32; 2], ParserError> {
    let numbers = parse_numbers("vt", value, 1)?;
    Ok([numbers[0], numbers.get(1).copied().unwrap_or(0.0)])
}

// parses numbers seperated by whitespace
pub(crate) fn parse_numbers(
    token: &str,
    value: &str,
    expected: usize,
) -> Result<Vec<f32>, ParserError> {
    let numbers = value
        .split_whitespace()
        .map(|x| x.parse())
        .collect::<Result<Vec<f32>, _>>()?;

    if numbers.len() < expected {
        return Err(ParserError::MissingValues {
            token: token.into(),
            expected,
            found: numbers.len(),
        });
    }

    Ok(numbers)
}

// parses triples/face indexes seperated by whitespace, which are itself seperated by slashes
fn parse_face(value: &str) -> Result<ObjFace, ParserError> {
    let face_i = value
        .split_whitespace()
        .map(parse_face_index)
        .collect::<Result<Vec<_>, _>>()?;

    if face_i.len() < 3 {
        return Err(ParserError::ParseFace(format!(
            "a face needs at least 3 corners, found {}",
            face_i.len()
        )));
    }

    Ok(ObjFace { face_i })
}

// parses a single face index seperated by slashes
fn parse_face_index(value: &str) -> Result<ObjFaceIndex, ParserError> {
    let triplet = parse_triplet(value)?;

    Ok(ObjFaceIndex {
        vert_i: triplet[0]
            .ok_or_else(|| ParserError::ParseFace(format!("missing position in `{}`", value)))?,
        uv_i: triplet[1],
        normal_i: triplet[2],
    })
}

// parse a triplet seperated by slashes, indices stay 1-based and may be negative
fn parse_triplet(value: &str) -> Result<[Option<isize>; 3], num::ParseIntError> {
    let mut ret = [None; 3];

    for (a, b) in ret.iter_mut().zip(value.split('/')) {
        *a = if b.is_empty() { None } else { Some(b.parse()?) }
    }

    Ok(ret)
}

// The output is wrapped in a Result to allow matching on errors
// Returns an Iterator to the Reader of the lines of the file.
pub(crate) fn read_lines<P>(filename: P) -> io::Result<io::Lines<io::BufReader<fs::File>>>
where
    P: AsRef<Path>,
{
    let file = fs::File::open(filename)?;
    Ok(io::BufReader::new(file).lines())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::num::ParseIntError;

    fn builder() -> ObjMeshBuilder {
        ObjMeshBuilder::new(Path::new("."))
    }

    #[test]
    fn test_parse_token() -> Result<(), ParserError> {
        let mut builder = builder();

        parse_token("o", "foo bar", &mut builder)?;
        parse_token("v", "1 2 3", &mut builder)?;
        parse_token("v", "4 5 6 0.1 0.2 0.3", &mut builder)?;
        parse_token("v", "7 8 9", &mut builder)?;
        parse_token("f", "1 2 3", &mut builder)?;
        parse_token("g", "new group", &mut builder)?;
        parse_token("f", "-3 -2 -1", &mut builder)?;

        assert_eq!(
            builder.mesh.positions,
            vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]
        );
        assert_eq!(builder.mesh.shapes.len(), 1);
        assert_eq!(builder.mesh.shapes[0].name, Some("foo bar".into()));
        assert_eq!(builder.curr_shape.name, Some("new group".into()));
        assert_eq!(builder.curr_shape.triangles, builder.mesh.shapes[0].triangles);

        Ok(())
    }

    #[test]
    fn test_parse_vertex() -> Result<(), ParserError> {
        assert_eq!(parse_vertex("1 1 1 1 2 3")?, [1.0, 1.0, 1.0]);
        assert!(matches!(
            parse_vertex("1 1"),
            Err(ParserError::MissingValues { expected: 3, found: 2, .. })
        ));
        assert!(matches!(parse_vertex("1 a 1"), Err(ParserError::ParseFloat(_))));

        Ok(())
    }

    #[test]
    fn test_parse_uv() -> Result<(), ParserError> {
        assert_eq!(parse_uv("0.5")?, [0.5, 0.0]);
        assert_eq!(parse_uv("0.5 0.25 0")?, [0.5, 0.25]);
        Ok(())
    }

    #[test]
    fn test_parse_face() -> Result<(), ParserError> {
        assert_eq!(
            parse_face("1 2/2 3/2/1 5//2")?,
            ObjFace {
                face_i: vec![
                    ObjFaceIndex {
                        vert_i: 1,
                        ..ObjFaceIndex::default()
                    },
                    ObjFaceIndex {
                        vert_i: 2,
                        uv_i: Some(2),
                        ..ObjFaceIndex::default()
                    },
                    ObjFaceIndex {
                        vert_i: 3,
                        uv_i: Some(2),
                        normal_i: Some(1),
                    },
                    ObjFaceIndex {
                        vert_i: 5,
                        normal_i: Some(2),
                        ..ObjFaceIndex::default()
                    }
                ]
            }
        );
        assert!(matches!(parse_face("1 2"), Err(ParserError::ParseFace(_))));
        assert!(matches!(parse_face("1 /2 3"), Err(ParserError::ParseFace(_))));
        Ok(())
    }

    #[test]
    fn test_parse_triplet() -> Result<(), ParseIntError> {
        assert_eq!(parse_triplet("1")?, [Some(1), None, None]);
        assert_eq!(parse_triplet("1/3")?, [Some(1), Some(3), None]);
        assert_eq!(parse_triplet("1/2/3")?, [Some(1), Some(2), Some(3)]);
        assert_eq!(parse_triplet("1//3")?, [Some(1), None, Some(3)]);
        assert_eq!(parse_triplet("-1//-2")?, [Some(-1), None, Some(-2)]);

        Ok(())
    }

    #[test]
    fn test_fan_triangulation() -> Result<(), ParserError> {
        let mut builder = builder();
        for _ in 0..5 {
            parse_token("v", "0 0 0", &mut builder)?;
        }
        parse_token("f", "1 2 3 4 5", &mut builder)?;

        let corners: Vec<[usize; 3]> = builder
            .curr_shape
            .triangles
            .iter()
            .map(|t| t.map(|c| c.position))
            .collect();
        assert_eq!(corners, vec![[0, 1, 2], [0, 2, 3], [0, 3, 4]]);

        Ok(())
    }
}
