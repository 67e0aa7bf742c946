//! Code related to the example models and the CLI commands for interacting with them.
use super::{CompareOpts, handle_compare_command};
use crate::settings::Settings;
use anyhow::{Context, Result, ensure};
use clap::Subcommand;
use include_dir::{Dir, DirEntry, include_dir};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// The directory containing the example models.
const EXAMPLES_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/demos");

/// The file in each example naming the pair of models to compare
const EXAMPLE_FILE_NAME: &str = "example.toml";

/// The available subcommands for managing example models.
#[derive(Subcommand)]
pub enum ExampleSubcommands {
    /// List available examples.
    List,
    /// Provide information about the specified example.
    Info {
        /// The name of the example.
        name: String,
    },
    /// Extract an example's pair of models to a new directory.
    Extract {
        /// The name of the example to extract.
        name: String,
        /// The destination folder for the example.
        new_path: Option<PathBuf>,
    },
    /// Compare the models of an example.
    Run {
        /// The name of the example to run.
        name: String,
        /// Other comparison options
        #[command(flatten)]
        opts: CompareOpts,
    },
}

impl ExampleSubcommands {
    /// Execute the supplied example subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::List => handle_example_list_command(),
            Self::Info { name } => handle_example_info_command(&name)?,
            Self::Extract {
                name,
                new_path: dest,
            } => handle_example_extract_command(&name, dest.as_deref())?,
            Self::Run { name, opts } => handle_example_run_command(&name, &opts, None)?,
        }

        Ok(())
    }
}

/// The pair of models making up an example
#[derive(Debug, Deserialize, PartialEq)]
struct ExampleFile {
    /// The subdirectory holding the first model
    model_a: PathBuf,
    /// The subdirectory holding the second model
    model_b: PathBuf,
}

/// Get the subdirectory of the specified example
fn get_example_dir(name: &str) -> Result<&'static Dir<'static>> {
    EXAMPLES_DIR.get_dir(name).context("Example not found.")
}

/// Read the description of which models an example compares
fn read_example_file(name: &str) -> Result<ExampleFile> {
    let path: PathBuf = [name, EXAMPLE_FILE_NAME].iter().collect();
    let contents = EXAMPLES_DIR
        .get_file(&path)
        .with_context(|| format!("Example {name} has no {EXAMPLE_FILE_NAME}"))?
        .contents_utf8()
        .context("Example file is not UTF-8 encoded")?;

    Ok(toml::from_str(contents)?)
}

/// Handle the `example list` command.
fn handle_example_list_command() {
    for entry in EXAMPLES_DIR.dirs() {
        println!("{}", entry.path().display());
    }
}

/// Handle the `example info` command.
fn handle_example_info_command(name: &str) -> Result<()> {
    let path: PathBuf = [name, "README.txt"].iter().collect();
    let readme = EXAMPLES_DIR
        .get_file(path)
        .context("Example not found.")?
        .contents_utf8()
        .context("README.txt is not UTF-8 encoded")?;

    println!("{readme}");

    Ok(())
}

/// Handle the `example extract` command
fn handle_example_extract_command(name: &str, dest: Option<&Path>) -> Result<()> {
    let dest = dest.unwrap_or(Path::new(name));
    extract_example(name, dest)
}

/// Copy the contents of an embedded directory to a new location, including subdirectories
fn extract_dir(dir: &Dir, root: &Path, new_path: &Path) -> Result<()> {
    for entry in dir.entries() {
        let relative = entry
            .path()
            .strip_prefix(root)
            .context("Example entry outside of example directory")?;
        let dest = new_path.join(relative);
        match entry {
            DirEntry::Dir(sub_dir) => {
                fs::create_dir(&dest)?;
                extract_dir(sub_dir, root, new_path)?;
            }
            DirEntry::File(f) => fs::write(&dest, f.contents())?,
        }
    }

    Ok(())
}

/// Extract the specified example to a new directory
fn extract_example(name: &str, new_path: &Path) -> Result<()> {
    let sub_dir = get_example_dir(name)?;

    ensure!(
        !new_path.exists(),
        "Destination directory {} already exists",
        new_path.display()
    );

    fs::create_dir(new_path)?;
    extract_dir(sub_dir, sub_dir.path(), new_path)
}

/// Handle the `example run` command.
pub fn handle_example_run_command(
    name: &str,
    opts: &CompareOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let example = read_example_file(name)?;
    let temp_dir = TempDir::new().context("Failed to create temporary directory.")?;
    let example_path = temp_dir.path().join(name);
    extract_example(name, &example_path)?;
    handle_compare_command(
        &example_path.join(&example.model_a),
        &example_path.join(&example.model_b),
        opts,
        settings,
    )
}
