//! The command line interface for the program.
use crate::compare::compare_all;
use crate::input::load_model;
use crate::log;
use crate::output::metadata::write_metadata;
use crate::output::{ReportWriter, create_output_directory, get_output_dir};
use crate::settings::Settings;
use crate::tolerance::Tolerance;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;
pub mod settings;
use settings::SettingsSubcommands;

/// The command line interface for the program.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for the compare command
#[derive(Args, Default)]
pub struct CompareOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
    /// The smallest absolute difference to report (overrides the settings file)
    #[arg(short, long)]
    pub tolerance: Option<f64>,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Compare two solved models.
    Compare {
        /// Path to the directory of the first (indexed or network) model.
        model_a: PathBuf,
        /// Path to the directory of the second model.
        model_b: PathBuf,
        /// Other comparison options
        #[command(flatten)]
        opts: CompareOpts,
    },
    /// Manage example models.
    Example {
        /// The available subcommands for managing example models.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Validate a solved model.
    Validate {
        /// The path to the model directory.
        model_dir: PathBuf,
    },
    /// Manage settings file.
    Settings {
        /// The subcommands for managing the settings file.
        #[command(subcommand)]
        subcommand: SettingsSubcommands,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Compare {
                model_a,
                model_b,
                opts,
            } => handle_compare_command(&model_a, &model_b, &opts, None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Validate { model_dir } => handle_validate_command(&model_dir, None),
            Self::Settings { subcommand } => subcommand.execute(),
        }
    }
}

/// Parse CLI arguments and run the program
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ modelcmp --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Handle the `compare` command.
pub fn handle_compare_command(
    model_a_path: &Path,
    model_b_path: &Path,
    opts: &CompareOpts,
    settings: Option<Settings>,
) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // These settings can be overridden by command-line arguments
    let tolerance = match opts.tolerance {
        Some(tolerance) => Tolerance::new(tolerance)?,
        None => settings.tolerance,
    };
    let overwrite = opts.overwrite || settings.overwrite;

    // Get path to output folder
    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(model_a_path, model_b_path)?;
        &pathbuf
    };

    let overwritten = create_output_directory(output_path, overwrite).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_path.display()
        )
    })?;

    // Initialise program logger
    log::init(Some(&settings.log_level), Some(output_path))
        .context("Failed to initialise logging.")?;

    // NB: We have to wait until the logger is initialised to display this warning
    if overwritten {
        warn!("Output folder will be overwritten");
    }

    let model_a = load_model(model_a_path).with_context(|| {
        format!("Failed to load model from {}.", model_a_path.display())
    })?;
    let model_b = load_model(model_b_path).with_context(|| {
        format!("Failed to load model from {}.", model_b_path.display())
    })?;
    info!("Loaded models {} and {}", model_a.name, model_b.name);
    info!("Output folder: {}", output_path.display());

    let report = compare_all(&model_a, &model_b, tolerance, settings.objective_policy)?;
    print!("{report}");

    let mut writer = ReportWriter::create(output_path)?;
    writer.write_report(&report)?;
    writer.flush()?;
    write_metadata(
        output_path,
        (model_a_path, model_b_path),
        &report,
        settings.objective_policy,
    )?;
    info!("Comparison complete!");

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(model_path: &Path, settings: Option<Settings>) -> Result<()> {
    // Load program settings, if not provided
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load().context("Failed to load settings.")?
    };

    // Initialise program logger (we won't save log files when running the validate command)
    log::init(Some(&settings.log_level), None).context("Failed to initialise logging.")?;

    // Load/validate the model
    let model = load_model(model_path).context("Failed to validate model.")?;
    info!(
        "Model {} ({} results, {} sites, {} timesteps) is valid",
        model.name,
        model.format(),
        model.topology.sites.len(),
        model.timestep_count()
    );

    Ok(())
}
