//! PropColor CLI - Command-line tool for appending colored materials to models.
//!
//! This is the main entry point for the PropColor command-line application.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use propcolor::prelude::*;

/// PropColor - studio model material and skin tool
#[derive(Parser)]
#[command(name = "propcolor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the textures, directories and skins of a model
    Info {
        /// Path to the MDL file
        #[arg(short, long, env = "PROPCOLOR_MODEL")]
        model: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Append one material to a model
    AddMaterial {
        /// Path to the MDL file
        #[arg(short, long, env = "PROPCOLOR_MODEL")]
        model: PathBuf,

        /// Output MDL file
        #[arg(short, long)]
        output: PathBuf,

        /// Material path, relative to the materials directory
        #[arg(long)]
        material: String,

        /// Also add a skin family that uses the new material everywhere
        #[arg(long)]
        with_skin: bool,
    },

    /// Append materials with one skin each to one or more models
    AddSkins {
        /// Paths to the MDL files
        #[arg(short, long, required = true, num_args = 1..)]
        model: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, env = "PROPCOLOR_OUTPUT")]
        output: PathBuf,

        /// Material paths, one skin family per material
        #[arg(long, required = true, num_args = 1..)]
        material: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Info { model, json } => {
            cmd_info(&model, json)?;
        }
        Commands::AddMaterial {
            model,
            output,
            material,
            with_skin,
        } => {
            cmd_add_material(&model, &output, &material, with_skin)?;
        }
        Commands::AddSkins {
            model,
            output,
            material,
        } => {
            cmd_add_skins(&model, &output, &material)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_info(path: &Path, json: bool) -> Result<()> {
    let model = StudioModel::load(path).context("Failed to load model")?;
    let summary = ModelSummary::from(&model);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Model: {} (version {})", summary.name, summary.version);
    println!("Size: {} bytes", summary.length);
    println!("Surface property: {}", summary.surface_prop);

    println!("\nTextures ({}):", summary.textures.len());
    for (slot, name) in summary.textures.iter().enumerate() {
        println!("  [{:>3}] {}", slot, name);
    }

    println!("\nTexture directories ({}):", summary.texture_dirs.len());
    for dir in &summary.texture_dirs {
        println!("  {}", dir);
    }

    println!(
        "\nSkin families ({} x {} references):",
        summary.skin_families.len(),
        summary.num_skin_ref
    );
    for (skin, family) in summary.skin_families.iter().enumerate() {
        println!("  skin {:>3}: {:?}", skin, family);
    }

    if !summary.key_values.is_empty() {
        println!("\nKey values: {} bytes", summary.key_values.len());
    }

    Ok(())
}

fn cmd_add_material(input: &Path, output: &Path, material: &str, with_skin: bool) -> Result<()> {
    println!("Adding material: {} -> {}", material, output.display());

    let mut model = StudioModel::load(input).context("Failed to load model")?;
    let skin = model.skin_families().len();

    if with_skin {
        model
            .add_material_with_skin(material)
            .context("Failed to add material with skin")?;
    } else {
        model.add_material(material).context("Failed to add material")?;
    }

    model.save(output).context("Failed to write output model")?;

    if with_skin {
        println!("Material added as skin {}", skin);
    } else {
        println!("Material added");
    }

    Ok(())
}

fn cmd_add_skins(models: &[PathBuf], output: &Path, materials: &[String]) -> Result<()> {
    println!(
        "Adding {} skins to {} models in {}...",
        materials.len(),
        models.len(),
        output.display()
    );

    let destinations = output_paths(models, output)?;
    fs::create_dir_all(output)?;

    let pb = ProgressBar::new(models.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();

    // Each model gets its own instance, so files are processed independently
    let errors: usize = models
        .par_iter()
        .zip(destinations.par_iter())
        .map(|(input, destination)| {
            let result = add_skins_to(input, destination, materials);
            pb.inc(1);

            match result {
                Ok(()) => {
                    debug!(model = %input.display(), output = %destination.display(), "patched model");
                    0
                }
                Err(e) => {
                    error!(model = %input.display(), "{:#}", e);
                    1
                }
            }
        })
        .sum();

    pb.finish_with_message("Done");
    println!(
        "Patched {} models in {:?} ({} errors)",
        models.len() - errors,
        start.elapsed(),
        errors
    );

    if errors > 0 {
        anyhow::bail!("{} models could not be patched", errors);
    }

    Ok(())
}

/// Map every input model to its file in `output_dir`.
///
/// Two inputs with the same file name would be written to the same
/// destination by parallel workers, so that is rejected up front.
fn output_paths(models: &[PathBuf], output_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::with_capacity(models.len());

    models
        .iter()
        .map(|input| {
            let file_name = input
                .file_name()
                .with_context(|| format!("Not a file: {}", input.display()))?;
            if !seen.insert(file_name) {
                anyhow::bail!(
                    "More than one input model is named {}; outputs would collide in {}",
                    file_name.to_string_lossy(),
                    output_dir.display()
                );
            }
            Ok(output_dir.join(file_name))
        })
        .collect()
}

fn add_skins_to(input: &Path, output: &Path, materials: &[String]) -> Result<()> {
    let mut model = StudioModel::load(input).context("Failed to load model")?;
    model
        .add_materials_with_skins(materials)
        .context("Failed to add skins")?;
    model.save(output).context("Failed to write output model")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_paths() {
        let models = vec![
            PathBuf::from("props/crate01.mdl"),
            PathBuf::from("props/barrel.mdl"),
        ];

        let paths = output_paths(&models, Path::new("out")).unwrap();
        assert_eq!(
            paths,
            vec![PathBuf::from("out/crate01.mdl"), PathBuf::from("out/barrel.mdl")]
        );
    }

    #[test]
    fn test_output_paths_rejects_duplicate_names() {
        let models = vec![
            PathBuf::from("a/crate01.mdl"),
            PathBuf::from("b/crate01.mdl"),
        ];

        let err = output_paths(&models, Path::new("out")).unwrap_err();
        assert!(err.to_string().contains("crate01.mdl"));
    }

    #[test]
    fn test_output_paths_rejects_directories() {
        let models = vec![PathBuf::from("props/..")];
        assert!(output_paths(&models, Path::new("out")).is_err());
    }
}
