//! vship-flat CLI - GPU image metrics through the flattened Vship entry points

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// GPU image quality metrics (SSIMULACRA2, Butteraugli, CVVDP) via libvship.
#[derive(Parser)]
#[command(name = "vship-flat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// GPU to run on
    #[arg(long, global = true, env = "VSHIP_GPU")]
    #[cfg_attr(not(feature = "native"), allow(dead_code))]
    gpu: Option<i32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a CVVDP display configuration for built-in presets
    DisplayModels {
        /// Preset to include (standard_4k, standard_fhd, standard_hdr, standard_hdr_dark)
        #[arg(long = "preset", required = true)]
        presets: Vec<String>,

        /// Output JSON file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the libvship version
    #[cfg(feature = "native")]
    Version,

    /// List GPUs visible to libvship
    #[cfg(feature = "native")]
    Devices {
        /// Run the full self-test on each GPU
        #[arg(long)]
        check: bool,
    },

    /// Score a distorted raw 8-bit 4:2:0 video against a reference
    #[cfg(feature = "native")]
    Compare(commands::compare::CompareArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::DisplayModels { presets, output } => commands::display_models::run(&presets, output),
        #[cfg(feature = "native")]
        Commands::Version => commands::device::version(),
        #[cfg(feature = "native")]
        Commands::Devices { check } => commands::device::list(check),
        #[cfg(feature = "native")]
        Commands::Compare(args) => commands::compare::run(&args, cli.gpu),
    }
}
