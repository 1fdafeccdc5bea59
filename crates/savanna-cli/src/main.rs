//! Savanna - terminal driver for the grazer/hunter simulation.

mod telemetry;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    cursor::MoveTo,
    queue,
    terminal::{Clear, ClearType},
};
use rand_chacha::ChaCha8Rng;
use savanna_core::WorldConfig;
use savanna_world::{Checkpoint, World};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "savanna")]
#[command(version)]
#[command(about = "Grid-based predator-prey simulation of grazers and hunters")]
struct Cli {
    /// Enable debug logging for the simulation crates
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new simulation
    Run {
        /// Configuration file (JSON); built-in defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Run this many steps without prompting, then print the final frame
        #[arg(short, long)]
        steps: Option<u64>,

        /// Write a checkpoint here when the run ends
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Continue a simulation from a checkpoint
    Resume {
        /// Checkpoint file to resume from
        #[arg(short, long)]
        checkpoint: PathBuf,

        /// Run this many steps without prompting, then print the final frame
        #[arg(short, long)]
        steps: Option<u64>,

        /// Write a checkpoint here when the run ends
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Write the default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "savanna.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_telemetry(cli.verbose)?;

    match cli.command {
        Commands::Run {
            config,
            seed,
            steps,
            save,
        } => {
            let config = match config {
                Some(path) => WorldConfig::from_json_file(&path)
                    .with_context(|| format!("loading config from {}", path.display()))?,
                None => WorldConfig::default(),
            };
            let seed = seed.unwrap_or_else(rand::random);
            info!(seed, width = config.width, height = config.height, "Starting simulation");

            let world = World::from_seed(config, seed)?;
            drive(world, steps, save.as_deref())
        }
        Commands::Resume {
            checkpoint,
            steps,
            save,
        } => {
            let world = Checkpoint::load(&checkpoint)
                .with_context(|| format!("reading checkpoint {}", checkpoint.display()))?
                .into_world()?;
            info!(step = world.step_count(), "Resuming simulation");
            drive(world, steps, save.as_deref())
        }
        Commands::Init { output } => {
            std::fs::write(&output, WorldConfig::default().to_json_pretty()?)
                .with_context(|| format!("writing {}", output.display()))?;
            println!("Wrote default configuration to {}", output.display());
            Ok(())
        }
    }
}

fn drive(mut world: World<ChaCha8Rng>, steps: Option<u64>, save: Option<&Path>) -> Result<()> {
    match steps {
        Some(steps) => headless(&mut world, steps)?,
        None => interactive(&mut world)?,
    }

    if let Some(path) = save {
        Checkpoint::capture(&world).save(path)?;
    }
    Ok(())
}

fn headless(world: &mut World<ChaCha8Rng>, steps: u64) -> Result<()> {
    let reports = world.run(steps);
    let census = world.census();

    let mut out = io::stdout().lock();
    writeln!(out, "Iteration {}", world.step_count())?;
    write!(out, "{}", world.frame())?;
    writeln!(
        out,
        "Ran {} steps: {} grazers, {} hunters",
        reports.len(),
        census.grazers,
        census.hunters
    )?;
    Ok(())
}

fn interactive(world: &mut World<ChaCha8Rng>) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut line = String::new();

    loop {
        draw(&mut io::stdout().lock(), world)?;

        line.clear();
        if input.read_line(&mut line)? == 0 || wants_quit(&line) {
            break;
        }

        world.step().emit();
    }

    println!();
    Ok(())
}

/// Redraw the screen with the current frame and the prompt
fn draw(out: &mut impl Write, world: &World<ChaCha8Rng>) -> Result<()> {
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    writeln!(out, "Iteration {}", world.step_count())?;
    write!(out, "{}", world.frame())?;
    write!(out, "Press Enter to continue, or 'q' to quit: ")?;
    out.flush()?;
    Ok(())
}

fn wants_quit(line: &str) -> bool {
    line.starts_with(['q', 'Q'])
}
