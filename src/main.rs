//! kiln's main application entry point.
//! Handles command-line argument parsing, merges it with the run
//! configuration and drives the generator from plugins to disk.

use std::path::{Path, PathBuf};

use kiln::{
    cli::{get_args, Args},
    config::{find_config, load_config, GenerationConfig},
    error::{default_error_handler, Error, Result},
    generator::Generator,
    loader::DirectoryResolver,
    logger::init_logger,
    prompt::{DialoguerPrompter, Prompter},
    renderer::MiniJinjaRenderer,
};

/// Main application entry point.
fn main() {
    let args = get_args();
    init_logger(args.verbose);

    if let Err(err) = run(args) {
        default_error_handler(err);
    }
}

/// Ensures the output directory is safe to write to.
///
/// # Errors
/// * Returns `Error::OutputDirectoryExists` if the directory exists, `force`
///   is not set and the user declines to write into it
fn get_output_dir<P: AsRef<Path>>(
    prompt: &dyn Prompter,
    output_dir: P,
    force: bool,
    skip_overwrite_check: bool,
) -> Result<PathBuf> {
    let output_dir = output_dir.as_ref();
    if output_dir.exists() && !force {
        let confirmed = prompt.confirm(
            skip_overwrite_check,
            format!("Directory '{}' already exists. Write into it?", output_dir.display()),
        )?;
        if !confirmed {
            return Err(Error::OutputDirectoryExists {
                output_dir: output_dir.display().to_string(),
            });
        }
    }
    Ok(output_dir.to_path_buf())
}

/// Reads the explicit config file, or `kiln.*` from the current directory,
/// and applies the command-line overrides.
fn get_config(args: &Args) -> Result<GenerationConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => match find_config(".") {
            Some(path) => load_config(path)?,
            None => GenerationConfig::default(),
        },
    };

    if let Some(template) = &args.template {
        config.template = Some(template.clone());
    }
    if let Some(dir) = &args.plugins_dir {
        config.plugins_dir = Some(dir.clone());
    }
    if let Some(name) = &args.name {
        config.name = Some(name.clone());
    }
    for plugin in &args.plugins {
        config.add_plugin(plugin);
    }
    config.strict |= args.strict;
    Ok(config)
}

/// Main application logic execution.
///
/// # Flow
/// 1. Loads the run configuration and applies CLI overrides
/// 2. Checks the output directory
/// 3. Runs every plugin and renders the template
/// 4. Commits the file set and reports isolated problems
fn run(args: Args) -> Result<()> {
    let prompt = DialoguerPrompter::new();
    let config = get_config(&args)?;
    let output_root =
        get_output_dir(&prompt, &args.output_dir, args.force, args.skip_overwrite_check)?;

    let engine = if config.strict { MiniJinjaRenderer::strict() } else { MiniJinjaRenderer::new() };
    let resolver = DirectoryResolver::new(config.plugins_dir());

    let project_name = config.name.clone().or_else(|| {
        output_root.file_name().map(|name| name.to_string_lossy().into_owned())
    });

    let mut generator = Generator::new(&resolver, &engine)
        .with_options(config.options.clone())
        .with_manifest_file(&config.manifest_file);
    if let Some(name) = project_name {
        generator = generator.with_project_name(name);
    }

    let generation = generator.generate(config.template.as_deref(), &config.plugin_specs())?;
    let summary = generator.commit(&generation, &output_root, args.dry_run)?;

    let action = if summary.dry_run { "Would write" } else { "Wrote" };
    for file in &summary.files {
        println!("{}: '{}'", action, output_root.join(file).display());
    }

    if !generation.diagnostics.is_empty() {
        eprintln!("{} problem(s) were skipped:", generation.diagnostics.len());
        for diagnostic in &generation.diagnostics {
            eprintln!("  - {diagnostic}");
        }
    }

    println!("Project generation completed successfully in {}.", output_root.display());
    Ok(())
}
