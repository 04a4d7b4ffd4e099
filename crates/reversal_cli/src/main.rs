//! Command-line runner for headless reversal-learning sessions.
//!
//! Examples:
//!   reversal run
//!   reversal run --init-seed 1 --env-seed 43 --order-seed 54
//!   reversal run --trials 200 --responder random --miss-rate 0.05 --out trials.jsonl
//!   reversal run --practice --deterministic-reward --deterministic-reversal --narrate
//!   reversal batch --sessions 32 --config session.json
//!
//! Logging goes through `tracing`; set `RUST_LOG` to change the filter (default `info`).

use std::error::Error;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use reversal::narration::{Narrator, Silent, TracingNarrator};
use reversal_session::{
    run_batch, seeded_configs, AlwaysSame, RandomResponder, RecordWriter, Responder, Session,
    SessionConfig, SessionSummary, WinStayLoseShift,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "reversal",
    version,
    about = "Headless Hampton (2006) reversal-learning sessions"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one session and print its summary.
    Run {
        #[command(flatten)]
        task: TaskArgs,

        /// Write one JSON record per trial to this file.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Narrate every environment step through the log.
        #[arg(long)]
        narrate: bool,

        /// Print the summary as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Run independent sessions with seeds offset by session index.
    Batch {
        #[command(flatten)]
        task: TaskArgs,

        #[arg(long, default_value_t = 8)]
        sessions: usize,
    },
}

#[derive(Debug, Args)]
struct TaskArgs {
    /// JSON session config; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    trials: Option<u32>,

    /// Stop after the practice reversal limit is reached.
    #[arg(long)]
    practice: bool,

    #[arg(long)]
    deterministic_reward: bool,

    #[arg(long)]
    deterministic_reversal: bool,

    /// Seed for the stream that draws the initial hidden state.
    #[arg(long)]
    init_seed: Option<u64>,

    /// Task seed applied after the initial reset.
    #[arg(long, allow_negative_numbers = true)]
    env_seed: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    order_seed: Option<i64>,

    #[arg(long, value_enum, default_value_t = ResponderKind::Wsls)]
    responder: ResponderKind,

    /// Probability that the random responder misses a trial.
    #[arg(long, default_value_t = 0.0)]
    miss_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ResponderKind {
    /// Win-stay, lose-shift.
    Wsls,
    /// Uniformly random key presses.
    Random,
    /// Always choose stimulus 0.
    #[value(name = "stim0")]
    Stim0,
    /// Always choose stimulus 1.
    #[value(name = "stim1")]
    Stim1,
}

impl TaskArgs {
    fn session_config(&self) -> Result<SessionConfig, Box<dyn Error>> {
        let mut cfg = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
                SessionConfig::from_json(&text)?
            }
            None => SessionConfig::default(),
        };

        if let Some(trials) = self.trials {
            cfg.num_trials = trials;
        }
        if let Some(seed) = self.init_seed {
            cfg.env.seed = Some(seed);
        }
        if let Some(seed) = self.env_seed {
            cfg.env_seed = seed;
        }
        if let Some(seed) = self.order_seed {
            cfg.order_seed = seed;
        }
        cfg.practice |= self.practice;
        cfg.env.deterministic_reward |= self.deterministic_reward;
        cfg.env.deterministic_reversal |= self.deterministic_reversal;
        Ok(cfg)
    }

    fn responder(&self, index: usize) -> Box<dyn Responder> {
        match self.responder {
            ResponderKind::Wsls => Box::new(WinStayLoseShift::new(0)),
            ResponderKind::Random => Box::new(RandomResponder::new(index as u64, self.miss_rate)),
            ResponderKind::Stim0 => Box::new(AlwaysSame(0)),
            ResponderKind::Stim1 => Box::new(AlwaysSame(1)),
        }
    }
}

fn print_summary(summary: &SessionSummary) {
    println!("trials run        : {}", summary.trials_run);
    println!("responses / misses: {} / {}", summary.responses, summary.misses);
    println!("rewarded          : {}", summary.rewarded);
    println!(
        "correct choices   : {} ({:.1}%)",
        summary.correct_choices,
        summary.stats.accuracy() * 100.0
    );
    println!("reversals         : {}", summary.reversals);
    if let Some(mean) = summary.stats.mean_trials_per_reversal() {
        println!("trials / reversal : {:.1}", mean);
    }
    if let Some(t) = summary.stats.learning_at_trial {
        println!("learning at trial : {}", t);
    }
    if summary.ended_early {
        println!("ended early       : practice limit reached");
    }
    println!("final reward      : ${:.2}", summary.cumulative_reward);
}

fn run_single(
    task: &TaskArgs,
    out: Option<PathBuf>,
    narrate: bool,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let cfg = task.session_config()?;
    info!(
        "CLI args {:?}, ordering seed {}, task seed {}, init seed {:?}",
        std::env::args().collect::<Vec<_>>(),
        cfg.order_seed,
        cfg.env_seed,
        cfg.env.seed
    );

    let narrator: Box<dyn Narrator> = if narrate {
        Box::new(TracingNarrator)
    } else {
        Box::new(Silent)
    };
    let mut session = Session::with_narrator(cfg, narrator);
    let mut responder = task.responder(0);

    let summary = match out {
        Some(path) => {
            let file = File::create(&path)
                .map_err(|e| format!("failed to create {}: {}", path.display(), e))?;
            let mut writer = RecordWriter::new(BufWriter::new(file));
            let summary = session.run(&mut responder, |r| writer.write(r))?;
            writer.finish()?;
            info!("Trial records written to {}", path.display());
            summary
        }
        None => session.run(&mut responder, |_| Ok(()))?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn run_many(task: &TaskArgs, sessions: usize) -> Result<(), Box<dyn Error>> {
    let base = task.session_config()?;
    info!(
        "Running {} sessions from task seed {} / ordering seed {} / init seed {:?}",
        sessions, base.env_seed, base.order_seed, base.env.seed
    );
    let configs = seeded_configs(&base, sessions);
    let results = run_batch(&configs, |i| task.responder(i));

    let mut rewards = Vec::with_capacity(results.len());
    let mut reversals = 0u64;
    for (i, result) in results.into_iter().enumerate() {
        match result {
            Ok(summary) => {
                println!(
                    "session {:>3}: reward ${:>6.2}  reversals {:>2}  accuracy {:>5.1}%",
                    i,
                    summary.cumulative_reward,
                    summary.reversals,
                    summary.stats.accuracy() * 100.0
                );
                reversals += summary.reversals as u64;
                rewards.push(summary.cumulative_reward);
            }
            Err(e) => warn!("session {} failed: {}", i, e),
        }
    }

    if !rewards.is_empty() {
        let mean = rewards.iter().sum::<f64>() / rewards.len() as f64;
        println!(
            "mean reward ${:.2} over {} sessions, {:.2} reversals per session",
            mean,
            rewards.len(),
            reversals as f64 / rewards.len() as f64
        );
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            task,
            out,
            narrate,
            json,
        } => run_single(&task, out, narrate, json),
        Command::Batch { task, sessions } => run_many(&task, sessions),
    }
}
