//! Code for writing metadata to file
use crate::report::Report;
use crate::tolerance::ObjectivePolicy;
use anyhow::{Result, anyhow};
use chrono::prelude::*;
use platform_info::{PlatformInfo, PlatformInfoAPI, UNameAPI};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// The output file name for metadata
const METADATA_FILE_NAME: &str = "metadata.toml";

#[derive(Serialize)]
struct Metadata<'a> {
    comparison: ComparisonMetadata<'a>,
    program: ProgramMetadata<'a>,
    platform: PlatformMetadata,
}

/// Information about the comparison
#[derive(Serialize)]
struct ComparisonMetadata<'a> {
    /// Path to the first model
    model_a_path: &'a Path,
    /// Path to the second model
    model_b_path: &'a Path,
    /// Name of the first model
    model_a: &'a str,
    /// Name of the second model
    model_b: &'a str,
    /// The tolerance used for all quantities
    tolerance: f64,
    /// How objectives were compared
    objective_policy: ObjectivePolicy,
    /// The number of discrepancies found
    discrepancies: usize,
    /// The number of entities or quantities which could not be compared
    not_found: usize,
    /// The number of value pairs compared
    checks: usize,
    /// The date and time at which the comparison was made
    datetime: String,
}

#[derive(Serialize)]
struct ProgramMetadata<'a> {
    /// The program name
    name: &'a str,
    /// The program version as specified in Cargo.toml
    version: &'a str,
    /// Whether it is a debug build
    is_debug: bool,
}

impl Default for ProgramMetadata<'_> {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            is_debug: cfg!(debug_assertions),
        }
    }
}

/// Information about the platform on which the program is running.
///
/// The fields correspond to different data available from the [`PlatformInfo`] struct.
#[derive(Serialize)]
struct PlatformMetadata {
    sysname: String,
    nodename: String,
    release: String,
    version: String,
    machine: String,
    osname: String,
}

impl PlatformMetadata {
    fn new() -> Result<Self> {
        let info = PlatformInfo::new()
            .map_err(|err| anyhow!("Unable to determine platform info: {err}"))?;
        Ok(Self {
            sysname: info.sysname().to_string_lossy().into(),
            nodename: info.nodename().to_string_lossy().into(),
            release: info.release().to_string_lossy().into(),
            version: info.version().to_string_lossy().into(),
            machine: info.machine().to_string_lossy().into(),
            osname: info.osname().to_string_lossy().into(),
        })
    }
}

/// Write metadata about a comparison to the specified output path in TOML format
pub fn write_metadata(
    output_path: &Path,
    model_paths: (&Path, &Path),
    report: &Report,
    objective_policy: ObjectivePolicy,
) -> Result<()> {
    let metadata = Metadata {
        comparison: ComparisonMetadata {
            model_a_path: model_paths.0,
            model_b_path: model_paths.1,
            model_a: &report.model_a,
            model_b: &report.model_b,
            tolerance: report.tolerance.value(),
            objective_policy,
            discrepancies: report.discrepancies().count(),
            not_found: report.not_found.len(),
            checks: report.checks.values().sum(),
            datetime: Local::now().to_rfc2822(),
        },
        program: ProgramMetadata::default(),
        platform: PlatformMetadata::new()?,
    };
    let file_path = output_path.join(METADATA_FILE_NAME);
    fs::write(&file_path, toml::to_string(&metadata)?)?;

    Ok(())
}
