//! postdoc - rich-text post and snippet documents
//!
//! Renders persisted document trees to HTML, imports markdown, checks the
//! plugin tables and finds orphaned image uploads.

#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, RenderMode};
use postdoc::draggable::{self, DragConfig};
use postdoc::editor_config::EditorConfig;
use postdoc::html_serializer::SerializeOptions;
use postdoc::plugins::default_registry;
use postdoc::render::render_editor;
use postdoc::{markdown, pipeline};
use std::path::{Path, PathBuf};

/// Main entry point for the postdoc CLI application
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Run the CLI application
fn run() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = EditorConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config {}", cli.config.display()))?;

    match cli.command {
        Commands::Render {
            inputs,
            output,
            mode,
            keep_data_attributes,
            preserve_class,
        } => {
            let mut options = config.serializer.to_options();
            if keep_data_attributes {
                options.strip_data_attributes = false;
            }
            options.preserve_class_names.extend(preserve_class);
            handle_render_command(&inputs, output.as_deref(), mode, &options)?;
        }

        Commands::Import { input, output } => {
            handle_import_command(&input, output.as_deref())?;
        }

        Commands::Check => {
            handle_check_command()?;
        }

        Commands::Orphans { uploads, documents } => {
            handle_orphans_command(&uploads, &documents)?;
        }
    }

    Ok(())
}

/// Handle the render command
fn handle_render_command(
    inputs: &[PathBuf],
    output: Option<&Path>,
    mode: RenderMode,
    options: &SerializeOptions,
) -> Result<()> {
    let registry = default_registry();
    let paths = pipeline::discover_documents(inputs);
    if paths.is_empty() {
        anyhow::bail!("No document files found");
    }

    let targets = match output {
        Some(dir) => Some(pipeline::output_paths(&paths, inputs, dir)?),
        None => None,
    };

    let results = match mode {
        RenderMode::Static => pipeline::render_files(&paths, &registry, options),
        RenderMode::Editor => {
            let drag = DragConfig::standard();
            paths
                .iter()
                .map(|path| -> Result<_, pipeline::PipelineError> {
                    let document = pipeline::load_document(path, &registry)?;
                    Ok(pipeline::RenderedDocument {
                        source: path.clone(),
                        html: render_editor(&document.nodes, &registry, &drag),
                    })
                })
                .collect()
        }
    };

    let mut failed = 0;
    for (index, result) in results.into_iter().enumerate() {
        let rendered = match result {
            Ok(rendered) => rendered,
            Err(e) => {
                log::warn!("Skipping document: {}", e);
                failed += 1;
                continue;
            }
        };

        match targets.as_ref().and_then(|targets| targets.get(index)) {
            Some(target) => {
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create directory {}", parent.display())
                    })?;
                }
                std::fs::write(target, &rendered.html)
                    .with_context(|| format!("Failed to write {}", target.display()))?;
                println!("✓ {} -> {}", rendered.source.display(), target.display());
            }
            None => println!("{}", rendered.html),
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} documents could not be rendered", failed, paths.len());
    }
    Ok(())
}

/// Handle the import command
fn handle_import_command(input: &Path, output: Option<&Path>) -> Result<()> {
    let nodes = markdown::import_file(input, &default_registry())?;
    let json = serde_json::to_string_pretty(&nodes).context("Failed to serialize document")?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✓ Imported {} blocks to {}", nodes.len(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Handle the check command
fn handle_check_command() -> Result<()> {
    let registry = default_registry();
    registry
        .validate()
        .context("Plugin registry is inconsistent")?;

    let drag = DragConfig::standard();
    draggable::validate(&drag, &registry).context("Drag metadata is inconsistent")?;

    println!("✓ {} plugin bindings", registry.bindings().len());
    println!("  Void types: {}", registry.void_types().join(", "));
    println!("\nDraggable blocks:");
    for kind in drag.draggable_types() {
        let options = drag.options(kind);
        println!(
            "  {:<12} level: {:<5} padding-top: {}",
            kind,
            options
                .level
                .map_or_else(|| "any".to_string(), |level| level.to_string()),
            options.padding_top.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

/// Handle the orphans command
fn handle_orphans_command(uploads: &Path, documents: &[PathBuf]) -> Result<()> {
    let registry = default_registry();
    let paths = pipeline::discover_documents(documents);
    let orphans = pipeline::find_orphans(uploads, &paths, &registry)
        .with_context(|| format!("Failed to scan uploads in {}", uploads.display()))?;

    if orphans.is_empty() {
        println!("No orphaned uploads");
    }
    for key in orphans {
        println!("{}", key);
    }
    Ok(())
}
