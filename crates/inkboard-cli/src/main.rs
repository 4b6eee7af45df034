//! Inkboard command-line host.

mod commands;
mod error;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Render, inspect, store and generate Inkboard drawing documents.
#[derive(Parser, Debug)]
#[command(name = "inkboard", version, about = "Inkboard drawing document tool")]
pub struct Cli {
    /// Directory of stored drawings [default: platform data dir]
    #[arg(long, global = true, value_name = "DIR")]
    pub store_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// A document read either from a file or from the drawing store.
#[derive(Args, Debug, Clone, Default)]
#[group(required = true, multiple = false)]
pub struct Source {
    /// Document file.
    #[arg(value_name = "DOC.json")]
    pub input: Option<PathBuf>,

    /// Name of a stored drawing.
    #[arg(long, value_name = "NAME")]
    pub id: Option<String>,
}

/// Where a generated document goes. Both may be given.
#[derive(Args, Debug, Clone, Default)]
#[group(required = true, multiple = true)]
pub struct Target {
    /// Output document path.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Store the document under this name.
    #[arg(long, value_name = "NAME")]
    pub save: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rasterize a document to PNG.
    Render {
        #[command(flatten)]
        source: Source,

        /// Output PNG path.
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Image width in pixels.
        #[arg(long, default_value_t = 1024)]
        width: u32,

        /// Image height in pixels.
        #[arg(long, default_value_t = 768)]
        height: u32,

        /// Device pixels per view unit.
        #[arg(long, default_value_t = 1.0)]
        scale: f64,

        /// Background color as #rrggbb or #rrggbbaa.
        #[arg(long, default_value = "#ffffff")]
        background: String,
    },

    /// Report the envelopes a document contains.
    Inspect {
        #[command(flatten)]
        source: Source,
    },

    /// Write a small sample document built through the engine.
    Demo {
        #[command(flatten)]
        target: Target,

        /// Engine configuration JSON; missing fields take defaults.
        #[arg(long, value_name = "CONFIG.json")]
        config: Option<PathBuf>,
    },

    /// Load a document file through the engine and store it.
    Import {
        #[arg(value_name = "DOC.json")]
        input: PathBuf,

        /// Stored name [default: the file stem]
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
    },

    /// List stored drawings.
    List,

    /// Delete a stored drawing.
    Remove {
        #[arg(value_name = "NAME")]
        name: String,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("Running {:?}", cli.command);

    let mut context = commands::Context::new(cli.store_dir);
    match commands::run(cli.command, &mut context) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
