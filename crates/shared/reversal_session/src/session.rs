use std::io::{self, Write};

use reversal::env::{EnvConfig, ReversalEnv};
use reversal::error::EnvError;
use reversal::narration::{Narrator, Silent};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::responder::Responder;
use crate::schedule::{Key, Schedule, TrialPlan};
use crate::stats::SessionStats;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Env(#[from] EnvError),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub env: EnvConfig,
    /// Task seed, applied after the initial reset.
    pub env_seed: i64,
    /// Stimulus placement and timing seed.
    pub order_seed: i64,
    pub num_trials: u32,
    /// End early once `practice_reversal_limit` reversals have happened.
    pub practice: bool,
    pub practice_reversal_limit: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            env: EnvConfig::default(),
            env_seed: 43,
            order_seed: 54,
            num_trials: 100,
            practice: false,
            practice_reversal_limit: 3,
        }
    }
}

impl SessionConfig {
    pub fn from_json(text: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn with_trials(mut self, num_trials: u32) -> Self {
        self.num_trials = num_trials;
        self
    }

    pub fn with_seeds(mut self, env_seed: i64, order_seed: i64) -> Self {
        self.env_seed = env_seed;
        self.order_seed = order_seed;
        self
    }

    pub fn with_practice(mut self, practice: bool) -> Self {
        self.practice = practice;
        self
    }
}

/// One row of the trial log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    #[serde(flatten)]
    pub plan: TrialPlan,
    pub key: Option<Key>,
    pub action: Option<u32>,
    pub hidden_state_before: Option<u32>,
    pub observation: Option<u32>,
    pub reward: Option<f64>,
    pub cumulative_reward: f64,
    pub correct_streak: u32,
    pub reversal_count: u32,
    pub reversed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub trials_run: u32,
    pub responses: u32,
    pub misses: u32,
    pub rewarded: u32,
    pub correct_choices: u32,
    pub cumulative_reward: f64,
    pub reversals: u32,
    pub ended_early: bool,
    pub stats: SessionStats,
}

/// Headless run of the task: schedule, responses, environment, bookkeeping.
#[derive(Debug)]
pub struct Session<N: Narrator = Silent> {
    cfg: SessionConfig,
    env: ReversalEnv<N>,
    schedule: Schedule,
    trials_run: u32,
    responses: u32,
    misses: u32,
    rewarded: u32,
    cumulative_reward: f64,
    ended_early: bool,
    stats: SessionStats,
}

impl Session<Silent> {
    pub fn new(cfg: SessionConfig) -> Self {
        Self::with_narrator(cfg, Silent)
    }
}

impl<N: Narrator> Session<N> {
    /// Construct, reset, then seed the task: the initial hidden state comes
    /// from the construction-time stream, trial outcomes from `env_seed`.
    pub fn with_narrator(cfg: SessionConfig, narrator: N) -> Self {
        let mut env = ReversalEnv::with_narrator(cfg.env, narrator);
        env.reset();
        env.seed(cfg.env_seed);
        let schedule = Schedule::new(cfg.order_seed);
        Self {
            cfg,
            env,
            schedule,
            trials_run: 0,
            responses: 0,
            misses: 0,
            rewarded: 0,
            cumulative_reward: 0.0,
            ended_early: false,
            stats: SessionStats::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.cfg
    }

    pub fn env(&self) -> &ReversalEnv<N> {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut ReversalEnv<N> {
        &mut self.env
    }

    pub fn cumulative_reward(&self) -> f64 {
        self.cumulative_reward
    }

    pub fn is_finished(&self) -> bool {
        self.ended_early || self.trials_run >= self.cfg.num_trials
    }

    pub fn run_trial<R: Responder + ?Sized>(
        &mut self,
        responder: &mut R,
    ) -> Result<TrialRecord, SessionError> {
        let plan = self.schedule.next_plan();
        let key = responder.respond(&plan);
        let hidden_state_before = self.env.hidden_state();

        let mut record = TrialRecord {
            plan,
            key,
            action: None,
            hidden_state_before,
            observation: None,
            reward: None,
            cumulative_reward: self.cumulative_reward,
            correct_streak: self.env.correct_streak(),
            reversal_count: self.env.reversal_count(),
            reversed: false,
        };

        match key {
            None => self.misses += 1,
            Some(key) => {
                let action = key.to_action(plan.leftmost);
                let reversals_before = self.env.reversal_count();
                let step = self.env.step(action)?;
                let reversed = self.env.reversal_count() != reversals_before;

                self.responses += 1;
                if step.rewarded() {
                    self.rewarded += 1;
                }
                self.cumulative_reward += step.reward;
                self.stats
                    .record_trial(Some(action) == hidden_state_before, reversed);
                responder.feedback(action, step.observation);

                record.action = Some(action);
                record.observation = Some(step.observation);
                record.reward = Some(step.reward);
                record.cumulative_reward = self.cumulative_reward;
                record.correct_streak = self.env.correct_streak();
                record.reversal_count = self.env.reversal_count();
                record.reversed = reversed;
            }
        }

        self.trials_run += 1;

        if self.cfg.practice && self.env.reversal_count() >= self.cfg.practice_reversal_limit {
            info!(
                "Ending practice due to {} reversals",
                self.env.reversal_count()
            );
            self.ended_early = true;
        }

        Ok(record)
    }

    /// Run until finished, handing each record to `on_trial`.
    pub fn run<R, F>(
        &mut self,
        responder: &mut R,
        mut on_trial: F,
    ) -> Result<SessionSummary, SessionError>
    where
        R: Responder + ?Sized,
        F: FnMut(&TrialRecord) -> Result<(), SessionError>,
    {
        while !self.is_finished() {
            let record = self.run_trial(responder)?;
            on_trial(&record)?;
        }
        info!("Done. Final reward ${:.2}", self.cumulative_reward);
        Ok(self.summary())
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            trials_run: self.trials_run,
            responses: self.responses,
            misses: self.misses,
            rewarded: self.rewarded,
            correct_choices: self.stats.correct,
            cumulative_reward: self.cumulative_reward,
            reversals: self.env.reversal_count(),
            ended_early: self.ended_early,
            stats: self.stats.clone(),
        }
    }
}

/// Writes trial records as JSON lines.
#[derive(Debug)]
pub struct RecordWriter<W: Write> {
    inner: W,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write(&mut self, record: &TrialRecord) -> Result<(), SessionError> {
        serde_json::to_writer(&mut self.inner, record)?;
        self.inner.write_all(b"\n")?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<W, SessionError> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}
