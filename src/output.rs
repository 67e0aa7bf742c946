//! The module responsible for writing comparison results to disk.
use crate::report::Report;
use crate::topology::SiteID;
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The root folder in which comparison-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "modelcmp_results";

/// The output file name for discrepancies
const DISCREPANCIES_FILE_NAME: &str = "discrepancies.csv";

/// The output file name for entities which could not be compared
const NOT_FOUND_FILE_NAME: &str = "not_found.csv";

/// The output file name for per-step value pairs
const SERIES_FILE_NAME: &str = "series.csv";

/// The output file name for capacity pairs
const CAPACITIES_FILE_NAME: &str = "capacities.csv";

/// Get the name of a model from its directory path
fn get_model_name(model_dir: &Path) -> Result<String> {
    // Canonicalise in case the user has specified "."
    let model_dir = model_dir
        .canonicalize()
        .context("Could not resolve path to model")?;

    Ok(model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?
        .to_string())
}

/// Get the default output directory for a comparison of the two specified models
pub fn get_output_dir(model_a_dir: &Path, model_b_dir: &Path) -> Result<PathBuf> {
    let name = format!(
        "{}_vs_{}",
        get_model_name(model_a_dir)?,
        get_model_name(model_b_dir)?
    );

    Ok([OUTPUT_DIRECTORY_ROOT, &name].iter().collect())
}

/// Create a new output directory, optionally replacing an existing one.
///
/// # Returns
///
/// `true` if an existing, non-empty directory was replaced.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut it) = fs::read_dir(output_dir) {
        if it.next().is_none() {
            // Folder exists and is empty
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Please delete the folder or pass \
             the --overwrite command-line option."
        );

        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Represents a row in the discrepancies CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct DiscrepancyRow {
    class: String,
    site: Option<SiteID>,
    entity: String,
    quantity: String,
    step: Option<u32>,
    value_a: f64,
    value_b: f64,
    difference: f64,
}

/// Represents a row in the not-found CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct NotFoundRow {
    class: String,
    site: SiteID,
    entity: String,
    quantity: Option<String>,
    model: String,
}

/// Represents a row in the series CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SeriesRow {
    class: String,
    site: SiteID,
    entity: String,
    quantity: String,
    step: u32,
    value_a: f64,
    value_b: f64,
}

/// Represents a row in the capacities CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct CapacityRow {
    class: String,
    site: SiteID,
    entity: String,
    quantity: String,
    value_a: f64,
    value_b: f64,
}

/// An object for writing a comparison report to CSV files
pub struct ReportWriter {
    discrepancies_writer: csv::Writer<File>,
    not_found_writer: csv::Writer<File>,
    series_writer: csv::Writer<File>,
    capacities_writer: csv::Writer<File>,
}

impl ReportWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    pub fn create(output_path: &Path) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        Ok(Self {
            discrepancies_writer: new_writer(DISCREPANCIES_FILE_NAME)?,
            not_found_writer: new_writer(NOT_FOUND_FILE_NAME)?,
            series_writer: new_writer(SERIES_FILE_NAME)?,
            capacities_writer: new_writer(CAPACITIES_FILE_NAME)?,
        })
    }

    /// Write every part of a report
    pub fn write_report(&mut self, report: &Report) -> Result<()> {
        self.write_discrepancies(report)?;
        self.write_not_found(report)?;
        self.write_series(report)?;
        self.write_capacities(report)?;

        Ok(())
    }

    fn write_discrepancies(&mut self, report: &Report) -> Result<()> {
        for d in report.discrepancies() {
            let row = DiscrepancyRow {
                class: d.class.to_string(),
                site: d.site.clone(),
                entity: d.entity.clone(),
                quantity: d.quantity.to_string(),
                step: d.step,
                value_a: d.value_a,
                value_b: d.value_b,
                difference: d.difference,
            };
            self.discrepancies_writer.serialize(row)?;
        }

        Ok(())
    }

    fn write_not_found(&mut self, report: &Report) -> Result<()> {
        for not_found in &report.not_found {
            let row = NotFoundRow {
                class: not_found.class.to_string(),
                site: not_found.site.clone(),
                entity: not_found.entity.clone(),
                quantity: not_found.quantity.map(|q| q.to_string()),
                model: not_found.model.clone(),
            };
            self.not_found_writer.serialize(row)?;
        }

        Ok(())
    }

    fn write_series(&mut self, report: &Report) -> Result<()> {
        for point in &report.series {
            let row = SeriesRow {
                class: point.class.to_string(),
                site: point.site.clone(),
                entity: point.entity.clone(),
                quantity: point.quantity.to_string(),
                step: point.step,
                value_a: point.value_a,
                value_b: point.value_b,
            };
            self.series_writer.serialize(row)?;
        }

        Ok(())
    }

    fn write_capacities(&mut self, report: &Report) -> Result<()> {
        for pair in &report.capacities {
            let row = CapacityRow {
                class: pair.class.to_string(),
                site: pair.site.clone(),
                entity: pair.entity.clone(),
                quantity: pair.quantity.to_string(),
                value_a: pair.value_a,
                value_b: pair.value_b,
            };
            self.capacities_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.discrepancies_writer.flush()?;
        self.not_found_writer.flush()?;
        self.series_writer.flush()?;
        self.capacities_writer.flush()?;

        Ok(())
    }
}
