//! circuit-gen CLI entry point.
//!
//! Loads a saved diagram, runs resolution and validation, and writes the
//! generated simulation program.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use circuit_blocks::{Document, EditorConfig, GenerateOptions};

/// Generate a pydig simulation program from a circuit diagram.
#[derive(Parser, Debug)]
#[command(name = "circuit-gen", version, about)]
struct Cli {
    /// Diagram snapshot (JSON). Reads stdin if not provided
    diagram: Option<PathBuf>,

    /// File with helper functions copied into the program verbatim
    #[arg(short = 'a', long = "aux")]
    aux: Option<PathBuf>,

    /// Ask the simulator to write a CSV trace
    #[arg(short = 't', long = "trace")]
    trace: bool,

    /// Simulation run time
    #[arg(short = 'd', long = "duration", default_value_t = 10)]
    duration: i64,

    /// Editor settings file (JSON)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Write the program to this file instead of stdout
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EditorConfig::from_file(path)
            .with_context(|| format!("cannot load settings from '{}'", path.display()))?,
        None => EditorConfig::default(),
    };

    let json = match &cli.diagram {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("cannot read '{}'", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("cannot read stdin")?;
            buf
        }
    };
    let mut document = Document::from_json(&json, config).context("invalid diagram")?;

    let auxiliary = match &cli.aux {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("cannot read '{}'", path.display()))?,
        None => String::new(),
    };

    let options = GenerateOptions {
        emit_trace: cli.trace,
        run_duration: cli.duration,
    };
    let program = document
        .generate(&auxiliary, &options)
        .context("generation failed")?;

    match &cli.output {
        Some(path) => {
            fs::write(path, &program)
                .with_context(|| format!("cannot write '{}'", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = io::stdout();
            stdout.write_all(program.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
