//! Common functionality for modelcmp, a tool for cross-validating the solutions of two energy
//! system optimisation models.
#![warn(missing_docs)]

use std::path::PathBuf;

pub mod cli;
pub mod compare;
pub mod id;
pub mod input;
pub mod log;
pub mod model;
pub mod output;
pub mod report;
pub mod resolver;
pub mod results;
pub mod settings;
pub mod tolerance;
pub mod topology;

#[cfg(test)]
mod fixture;

/// Get config dir for program.
///
/// This is a subfolder of the user's config directory.
pub fn get_modelcmp_config_dir() -> PathBuf {
    let Some(mut config_dir) = dirs::config_dir() else {
        // No config dir on this platform, so fall back to the current directory
        return PathBuf::new();
    };

    config_dir.push("modelcmp");
    config_dir
}
