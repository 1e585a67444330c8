use anyhow::{anyhow, Context, Result};
use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

pub(crate) fn file_name(path: &Path) -> Result<&str> {
    path.file_stem()
        .ok_or_else(|| anyhow!("No file stem found in `{}`", path.display()))?
        .to_str()
        .ok_or_else(|| anyhow!("Can't convert file stem of `{}` to string", path.display()))
}

pub(crate) fn combine_path(directory: &Path, file_name: &str, extension: &str) -> Result<PathBuf> {
    Ok(directory.join(format!("{}.{}", file_name, extension)))
}

pub(crate) fn write_file(target: PathBuf, data: Vec<u8>) -> Result<File> {
    let mut buffer = File::create(&target)
        .with_context(|| format!("Could not create file: {}", &target.display()))?;
    buffer
        .write_all(data.as_slice())
        .with_context(|| format!("Could not write data to file: {}", &target.display()))?;
    Ok(buffer)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_file_name() -> Result<()> {
        assert_eq!(file_name(Path::new("models/cube.obj"))?, "cube");
        assert!(file_name(Path::new("/")).is_err());
        Ok(())
    }

    #[test]
    fn test_combine_path() -> Result<()> {
        assert_eq!(
            combine_path(Path::new("out"), "cube", "vxm")?,
            Path::new("out/cube.vxm")
        );
        Ok(())
    }
}
