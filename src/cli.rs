//! Command-line interface implementation for kiln.
//! Provides argument parsing and help text formatting using clap.

use clap::{error::ErrorKind, CommandFactory, Parser};
use std::path::PathBuf;

/// Command-line arguments structure for kiln.
#[derive(Parser, Debug)]
#[command(author, version, about = "kiln: plugin-driven project scaffolding generator", long_about = None)]
pub struct Args {
    /// Directory where the generated project will be created
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Template directory to render into the project
    #[arg(short, long, value_name = "DIR")]
    pub template: Option<PathBuf>,

    /// Run configuration file (kiln.json, kiln.yml or kiln.yaml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Plugin to apply. Repeat to select several; they run in the given order
    /// after the plugins listed in the configuration file.
    #[arg(short, long = "plugin", value_name = "NAME")]
    pub plugins: Vec<String>,

    /// Directory holding plugin-<name> plugin directories
    #[arg(long, value_name = "DIR")]
    pub plugins_dir: Option<PathBuf>,

    /// Project name exposed to templates as `project.name`
    #[arg(short, long)]
    pub name: Option<String>,

    /// Force overwrite of existing output directory
    #[arg(short, long)]
    pub force: bool,

    /// Skip the confirmation prompt when the output directory exists.
    #[arg(long)]
    pub skip_overwrite_check: bool,

    /// Fail when a template references an undefined variable
    #[arg(long)]
    pub strict: bool,

    /// Print the files that would be written without writing them
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parses command line arguments and returns the Args structure.
///
/// # Exits
/// * With status code 1 if required arguments are missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if e.kind() == ErrorKind::MissingRequiredArgument {
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}
