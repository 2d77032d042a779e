#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays Haggis Hunt in a terminal.

mod config;
mod level_file;
mod session;

use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Parser;
use haggis_hunt_core::Side;
use log::info;

use crate::{config::SessionConfig, session::Session};

/// Turn-based haggis hunting on a hexagonal maze.
#[derive(Debug, Parser)]
#[command(name = "haggis-hunt", version, long_about = None)]
struct Args {
    /// Level file: height, width, then one code per cell.
    level: PathBuf,

    /// TOML session file providing seed, frame length and budgets.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for wall heights and the computer players.
    #[arg(long)]
    seed: Option<u64>,

    /// Let the computer play the hero too.
    #[arg(long)]
    autoplay: bool,

    /// Frames simulated before giving up on a turn.
    #[arg(long)]
    max_frames: Option<u64>,
}

impl Args {
    fn session_config(&self) -> Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::load(path)?,
            None => SessionConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(max_frames) = self.max_frames {
            config.max_frames = max_frames.max(1);
        }
        config.autoplay |= self.autoplay;
        Ok(config)
    }
}

/// Entry point for the Haggis Hunt command-line interface.
fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = args.session_config()?;
    info!("starting session with {config:?}");

    let spec = level_file::read(&args.level)
        .with_context(|| format!("failed to load level from {}", args.level.display()))?;
    let autoplay = config.autoplay;
    let mut session = Session::new(spec, config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if autoplay {
        let loser = session.run_autoplay(&mut out)?;
        match loser {
            Some(side) => writeln!(
                out,
                "{} lost after {} frames",
                match side {
                    Side::Hero => "the hero",
                    Side::Opponent => "the haggis",
                },
                session.frames()
            )?,
            None => writeln!(out, "no winner after {} frames", session.frames())?,
        }
    } else {
        session.run_interactive(io::stdin().lock(), &mut out)?;
    }
    out.flush().context("failed to flush stdout")?;
    Ok(())
}
