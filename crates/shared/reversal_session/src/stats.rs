use serde::{Deserialize, Serialize};

const RECENT_WINDOW: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub correct: u32,
    pub incorrect: u32,
    pub trials: u32,
    pub recent: Vec<bool>,
    /// Scored-trial indices (1-based) on which a reversal fired.
    pub reversal_trials: Vec<u32>,
    pub learning_at_trial: Option<u32>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            correct: 0,
            incorrect: 0,
            trials: 0,
            recent: Vec::with_capacity(RECENT_WINDOW),
            reversal_trials: Vec::new(),
            learning_at_trial: None,
        }
    }

    fn update_milestones(&mut self) {
        // Gate on a minimum number of trials to avoid "instant" learning on tiny samples.
        if self.trials < 20 {
            return;
        }
        if self.learning_at_trial.is_none() && self.last_100_rate() >= 0.70 {
            self.learning_at_trial = Some(self.trials);
        }
    }

    /// `is_correct`: the choice matched the hidden state before the step.
    pub fn record_trial(&mut self, is_correct: bool, reversed: bool) {
        if is_correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }

        self.recent.push(is_correct);
        if self.recent.len() > RECENT_WINDOW {
            self.recent.remove(0);
        }

        self.trials += 1;
        if reversed {
            self.reversal_trials.push(self.trials);
        }
        self.update_milestones();
    }

    pub fn accuracy(&self) -> f32 {
        let total = self.correct + self.incorrect;
        if total == 0 {
            0.5
        } else {
            self.correct as f32 / total as f32
        }
    }

    pub fn recent_rate(&self) -> f32 {
        if self.recent.is_empty() {
            return 0.5;
        }
        let correct_count = self.recent.iter().filter(|&&x| x).count();
        correct_count as f32 / self.recent.len() as f32
    }

    pub fn last_100_rate(&self) -> f32 {
        if self.recent.len() < 10 {
            return self.recent_rate();
        }
        let start = self.recent.len().saturating_sub(100);
        let slice = &self.recent[start..];
        let correct_count = slice.iter().filter(|&&x| x).count();
        correct_count as f32 / slice.len() as f32
    }

    /// Scored trials per reversal, up to and including the last reversal.
    pub fn mean_trials_per_reversal(&self) -> Option<f32> {
        let last = *self.reversal_trials.last()?;
        Some(last as f32 / self.reversal_trials.len() as f32)
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}
