mod demo;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use hexscape_common::Hex;
use hexscape_render::FrameStats;
use tracing_subscriber::EnvFilter;

use demo::DemoConfig;

#[derive(Parser)]
#[command(name = "hexscape-cli", about = "CLI tool for hexscape rendering")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML file with surface, renderer, scene and grid settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Build the hex-tile renderer headlessly and draw the grid
    Frame {
        /// Number of frames to draw
        #[arg(short, long, default_value = "1")]
        frames: u32,
        /// Print per-frame stats as JSON
        #[arg(long)]
        json: bool,
    },
    /// Distance in tiles between two hex cells given in axial coordinates
    Distance {
        #[arg(allow_hyphen_values = true)]
        q1: i32,
        #[arg(allow_hyphen_values = true)]
        r1: i32,
        #[arg(allow_hyphen_values = true)]
        q2: i32,
        #[arg(allow_hyphen_values = true)]
        r2: i32,
    },
    /// Print the effective configuration as YAML
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("hexscape-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("render: {}", hexscape_render::crate_info());
            println!("backend: {}", hexscape_render_glow::crate_info());
            let config = DemoConfig::load(cli.config.as_deref())?;
            let renderer = demo::build_renderer(&config)?;
            let ids: Vec<&str> = renderer.descriptor_ids().map(|id| id.as_str()).collect();
            println!("descriptors: {}", ids.join(", "));
        }
        Commands::Frame { frames, json } => {
            let config = DemoConfig::load(cli.config.as_deref())?;
            let stats = demo::run_frames(&config, frames)?;
            if json {
                let out = serde_json::to_string_pretty(&stats).context("encoding frame stats")?;
                println!("{out}");
            } else {
                print_stats(&config, &stats);
            }
        }
        Commands::Distance { q1, r1, q2, r2 } => {
            let a = Hex::new(q1, r1);
            let b = Hex::new(q2, r2);
            println!(
                "({q1}, {r1}, {}) -> ({q2}, {r2}, {}): {}",
                a.s(),
                b.s(),
                a.distance_to(&b)
            );
        }
        Commands::Config => {
            let config = DemoConfig::load(cli.config.as_deref())?;
            let out = serde_yaml::to_string(&config).context("encoding config")?;
            print!("{out}");
        }
    }

    Ok(())
}

fn print_stats(config: &DemoConfig, stats: &[FrameStats]) {
    println!(
        "Hex grid: {}x{} tiles on a {}x{} surface",
        config.grid.rows, config.grid.cols, config.surface.width, config.surface.height
    );
    for (i, s) in stats.iter().enumerate() {
        println!(
            "Frame {i}: entities={}, draw_calls={}, bytes_uploaded={}",
            s.entities, s.draw_calls, s.bytes_uploaded
        );
    }
}
