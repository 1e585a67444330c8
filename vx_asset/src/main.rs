use anyhow::{Context, Result};
use log::{debug, info, warn, LevelFilter};
use std::{
    fs,
    path::{Path, PathBuf},
};
use structopt::StructOpt;
use vx_asset::mesh::obj;
use walkdir::WalkDir;

/// Converts every Wavefront model below a folder into `.vxm` meshes
#[derive(StructOpt, Debug)]
#[structopt(name = "vx_asset")]
struct Opts {
    /// Folder to search for `.obj` files
    #[structopt(parse(from_os_str))]
    input: PathBuf,
    /// Folder receiving the converted meshes, mirroring the input layout
    #[structopt(short = "o", long = "output", parse(from_os_str))]
    output: PathBuf,
    /// Log every parsed statement
    #[structopt(short = "v", long = "verbose")]
    verbose: bool,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("Input folder does not exist: {}", .0.display())]
    MissingInput(PathBuf),
    #[error("`{}` is not inside the input folder", .0.display())]
    OutsideInput(PathBuf),
}

/// What happened to a single file of the input tree.
enum Outcome {
    Converted,
    Skipped,
}

fn init_logger(verbose: bool) {
    let mut builder = if verbose {
        let mut builder = env_logger::Builder::new();
        builder.filter(None, LevelFilter::Debug);
        builder
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
    };
    builder.init();
}

fn main() -> Result<()> {
    let opts = Opts::from_args();
    init_logger(opts.verbose);

    if !opts.input.is_dir() {
        return Err(CliError::MissingInput(opts.input).into());
    }

    let mut converted = 0;
    for entry in WalkDir::new(&opts.input) {
        let entry = match entry {
            Ok(entry) if entry.file_type().is_file() => entry,
            Ok(_) => continue,
            Err(err) => {
                warn!("Skipping unreadable entry: {}", err);
                continue;
            }
        };

        if let Outcome::Converted = convert_file(entry.path(), &opts.input, &opts.output)? {
            converted += 1;
        }
    }

    info!(
        "Converted {} models from `{}`",
        converted,
        opts.input.display()
    );
    Ok(())
}

fn convert_file(path: &Path, input: &Path, output: &Path) -> Result<Outcome> {
    let extension = match path.extension().and_then(|e| e.to_str()) {
        Some(extension) => extension.to_ascii_lowercase(),
        None => {
            warn!("Ignoring `{}` without file extension", path.display());
            return Ok(Outcome::Skipped);
        }
    };

    match extension.as_str() {
        "obj" => {
            let relative = path
                .strip_prefix(input)
                .map_err(|_| CliError::OutsideInput(path.to_owned()))?;
            let target_dir = relative
                .parent()
                .map_or_else(|| output.to_owned(), |dir| output.join(dir));
            fs::create_dir_all(&target_dir).with_context(|| {
                format!("Could not create output folder: {}", target_dir.display())
            })?;

            obj::process(path, &target_dir)?;
            Ok(Outcome::Converted)
        }
        // meta files and material libraries are read alongside their model
        "toml" | "mtl" => {
            debug!("Ignoring companion file `{}`", path.display());
            Ok(Outcome::Skipped)
        }
        _ => {
            warn!("Could not handle `{}`", path.display());
            Ok(Outcome::Skipped)
        }
    }
}
