//! Common routines for loading solved models from disk.
use crate::model::SolvedModel;
use crate::results::StoreFormat;
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

mod results;
mod topology;
use results::read_results;
use topology::read_topology;

/// The file describing a solved model
const MODEL_FILE_NAME: &str = "model.toml";

/// Read a series of type `T`s from a CSV file.
///
/// Will raise an error if the file is empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let vec = read_csv_internal(file_path)?;
    ensure!(!vec.is_empty(), "CSV file {} cannot be empty", file_path.display());

    Ok(vec)
}

/// Read a series of type `T`s from a CSV file which may be absent or empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv_optional<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    if !file_path.exists() {
        return Ok(Vec::new());
    }

    read_csv_internal(file_path)
}

fn read_csv_internal<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?
        .into_deserialize()
        .process_results(|iter| iter.collect_vec())
        .with_context(|| input_err_msg(file_path))
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Format an error message to include the file path
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// The contents of `model.toml`
#[derive(Debug, Deserialize, PartialEq)]
struct ModelFile {
    /// A short name for the model, used in reports
    name: String,
    /// Which key scheme the model's results use
    format: StoreFormat,
    /// The objective value at the optimum
    objective: f64,
    /// The number of modelled timesteps
    timesteps: u32,
}

/// Read a solved model from the specified directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model results
///
/// # Returns
///
/// The solved model or an error.
pub fn load_model<P: AsRef<Path>>(model_dir: P) -> Result<SolvedModel> {
    let model_dir = model_dir.as_ref();
    let file_path = model_dir.join(MODEL_FILE_NAME);
    let model_file: ModelFile = read_toml(&file_path)?;
    ensure!(
        model_file.objective.is_finite(),
        "Objective in {} must be a finite number",
        file_path.display()
    );

    let topology = read_topology(model_dir)?;
    let results = read_results(model_dir, model_file.format, model_file.timesteps)?;

    Ok(SolvedModel {
        name: model_file.name,
        topology,
        objective: model_file.objective,
        results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Record {
        id: String,
        value: u32,
    }

    /// Create an example CSV file in dir_path
    fn create_csv_file(dir_path: &Path, contents: &str) -> PathBuf {
        let file_path = dir_path.join("test.csv");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "{contents}").unwrap();
        file_path
    }

    #[test]
    fn test_read_csv() {
        let dir = tempdir().unwrap();
        let file_path = create_csv_file(dir.path(), "id,value\nhello, 1\nworld,2\n");
        let records: Vec<Record> = read_csv(&file_path).unwrap();
        assert_eq!(
            records,
            &[
                Record {
                    id: "hello".to_string(),
                    value: 1,
                },
                Record {
                    id: "world".to_string(),
                    value: 2,
                }
            ]
        );

        // File with no data (only column headers)
        let file_path = create_csv_file(dir.path(), "id,value\n");
        assert!(read_csv::<Record>(&file_path).is_err());
        assert!(read_csv_optional::<Record>(&file_path).unwrap().is_empty());

        // Missing file
        let file_path = dir.path().join("missing.csv");
        assert!(read_csv::<Record>(&file_path).is_err());
        assert!(read_csv_optional::<Record>(&file_path).unwrap().is_empty());
    }

    #[test]
    fn test_read_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(MODEL_FILE_NAME);
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(
                file,
                "name = \"urbs\"\nformat = \"indexed\"\nobjective = 1.5e6\ntimesteps = 3"
            )
            .unwrap();
        }

        assert_eq!(
            read_toml::<ModelFile>(&file_path).unwrap(),
            ModelFile {
                name: "urbs".into(),
                format: StoreFormat::Indexed,
                objective: 1.5e6,
                timesteps: 3
            }
        );

        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "format = \"tabular\"").unwrap();
        }
        assert_error!(
            read_toml::<ModelFile>(&file_path),
            input_err_msg(&file_path)
        );
    }
}
