//! Arcade Forge headless runner
//!
//! Loads a level, plays it with the autopilot at the fixed timestep and
//! optionally writes one JSON snapshot per simulated second.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use arcade_forge::autopilot::Autopilot;
use arcade_forge::consts::*;
use arcade_forge::sim::{GameEvent, GamePhase, GameState, snapshot, tick};
use arcade_forge::{LevelData, Tuning};

/// Play a generated arcade level headlessly
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Level JSON produced by the content generator
    level: PathBuf,

    /// Balance overrides (JSON); defaults are used when missing or invalid
    #[arg(short, long)]
    tuning: Option<PathBuf>,

    /// Session seed
    #[arg(short, long, default_value_t = 1)]
    seed: u64,

    /// Stop after this many simulated seconds
    #[arg(long, default_value_t = 300.0)]
    seconds: f32,

    /// Scale difficulty as if this were level N of a run
    #[arg(long)]
    level_number: Option<u32>,

    /// Write one JSON snapshot per simulated second to this file
    #[arg(long)]
    snapshots: Option<PathBuf>,

    /// Pace the simulation to wall-clock time
    #[arg(long)]
    realtime: bool,
}

/// Runs the simulation loop and the snapshot sink
struct Runner {
    state: GameState,
    pilot: Autopilot,
    snapshots: Option<BufWriter<File>>,
    /// Leftover wall-clock time (realtime mode)
    accumulator: f32,
    max_ticks: u64,
    ticks: u64,
}

impl Runner {
    fn finished(&self) -> bool {
        self.state.phase.is_terminal() || self.ticks >= self.max_ticks
    }

    /// One fixed simulation step
    fn step(&mut self) -> Result<()> {
        let input = self.pilot.next_input(&self.state);
        let events = tick(&mut self.state, &input, SIM_DT);
        self.ticks += 1;

        for event in &events {
            match event {
                GameEvent::EnemyDefeated { kind, .. } => log::info!("Defeated {kind}"),
                GameEvent::PickupCollected { kind, .. } => log::info!("Collected {kind}"),
                _ => {}
            }
        }

        if self.ticks % 60 == 0 || self.finished() {
            self.write_snapshot()?;
        }
        Ok(())
    }

    fn write_snapshot(&mut self) -> Result<()> {
        let Some(out) = self.snapshots.as_mut() else {
            return Ok(());
        };
        serde_json::to_writer(&mut *out, &snapshot(&self.state)).context("writing snapshot")?;
        out.write_all(b"\n").context("writing snapshot")?;
        Ok(())
    }

    /// Run as fast as possible
    fn run_headless(&mut self) -> Result<()> {
        while !self.finished() {
            self.step()?;
        }
        Ok(())
    }

    /// Run ticks against wall-clock time
    fn run_realtime(&mut self) -> Result<()> {
        let mut last = Instant::now();
        while !self.finished() {
            let now = Instant::now();
            let dt = now.duration_since(last).as_secs_f32().min(0.1);
            last = now;
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS && !self.finished() {
                self.step()?;
                self.accumulator -= SIM_DT;
                substeps += 1;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    log::info!("Arcade Forge starting...");

    let mut level = LevelData::load(&args.level)
        .with_context(|| format!("loading level {}", args.level.display()))?;
    let tuning = Tuning::load_or_default(args.tuning.as_deref());

    if let Some(n) = args.level_number {
        let mut rng = Pcg32::seed_from_u64(args.seed.wrapping_add(u64::from(n)));
        level.scale_difficulty(n, &mut rng);
    }

    let snapshots = match &args.snapshots {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => None,
    };

    let seconds = if args.seconds.is_finite() { args.seconds.max(0.0) } else { 0.0 };
    let mut runner = Runner {
        state: GameState::new(level, tuning, args.seed),
        pilot: Autopilot::new(),
        snapshots,
        accumulator: 0.0,
        max_ticks: (seconds / SIM_DT).ceil() as u64,
        ticks: 0,
    };

    if args.realtime {
        runner.run_realtime()?;
    } else {
        runner.run_headless()?;
    }

    if let Some(out) = runner.snapshots.as_mut() {
        out.flush().context("flushing snapshots")?;
    }

    let state = &runner.state;
    match state.phase {
        GamePhase::Victory => log::info!(
            "Victory after {:.1}s, score {}",
            state.elapsed,
            state.score
        ),
        GamePhase::GameOver => log::info!(
            "Game over after {:.1}s, score {}",
            state.elapsed,
            state.score
        ),
        phase => log::info!(
            "Stopped in {phase:?} after {:.1}s, score {}",
            state.elapsed,
            state.score
        ),
    }
    Ok(())
}
