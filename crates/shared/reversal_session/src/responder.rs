use std::collections::VecDeque;

use reversal::prng::Prng;

use crate::schedule::{Key, TrialPlan};

/// Simulated participant.
pub trait Responder {
    /// Key pressed during the stimulus window, or `None` for no response.
    fn respond(&mut self, plan: &TrialPlan) -> Option<Key>;

    /// Feedback for a trial the environment scored.
    fn feedback(&mut self, _action: u32, _observation: u32) {}

    fn name(&self) -> &'static str;
}

impl<R: Responder + ?Sized> Responder for Box<R> {
    fn respond(&mut self, plan: &TrialPlan) -> Option<Key> {
        (**self).respond(plan)
    }

    fn feedback(&mut self, action: u32, observation: u32) {
        (**self).feedback(action, observation)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Repeat a rewarded choice, switch after a loss.
#[derive(Debug, Clone, Default)]
pub struct WinStayLoseShift {
    next_action: u32,
}

impl WinStayLoseShift {
    pub fn new(first_action: u32) -> Self {
        Self {
            next_action: first_action.min(1),
        }
    }
}

impl Responder for WinStayLoseShift {
    fn respond(&mut self, plan: &TrialPlan) -> Option<Key> {
        Some(Key::for_action(self.next_action, plan.leftmost))
    }

    fn feedback(&mut self, action: u32, observation: u32) {
        self.next_action = if observation == 1 { action } else { 1 - action };
    }

    fn name(&self) -> &'static str {
        "wsls"
    }
}

/// Always picks the same stimulus, wherever it is displayed.
#[derive(Debug, Clone, Copy)]
pub struct AlwaysSame(pub u32);

impl Responder for AlwaysSame {
    fn respond(&mut self, plan: &TrialPlan) -> Option<Key> {
        Some(Key::for_action(self.0.min(1), plan.leftmost))
    }

    fn name(&self) -> &'static str {
        "same"
    }
}

/// Replays recorded key presses; silent once exhausted.
#[derive(Debug, Clone, Default)]
pub struct Scripted {
    keys: VecDeque<Option<Key>>,
}

impl Scripted {
    pub fn new(keys: impl IntoIterator<Item = Option<Key>>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.keys.len()
    }
}

impl Responder for Scripted {
    fn respond(&mut self, _plan: &TrialPlan) -> Option<Key> {
        self.keys.pop_front().flatten()
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Presses a uniformly random key, missing the window with `miss_rate`.
#[derive(Debug, Clone)]
pub struct RandomResponder {
    rng: Prng,
    miss_rate: f64,
}

impl RandomResponder {
    pub fn new(seed: u64, miss_rate: f64) -> Self {
        Self {
            rng: Prng::new(seed),
            miss_rate: miss_rate.clamp(0.0, 1.0),
        }
    }
}

impl Responder for RandomResponder {
    fn respond(&mut self, _plan: &TrialPlan) -> Option<Key> {
        if self.miss_rate > 0.0 && self.rng.next_f64() < self.miss_rate {
            return None;
        }
        if self.rng.below(2) == 0 {
            Some(Key::One)
        } else {
            Some(Key::Two)
        }
    }

    fn name(&self) -> &'static str {
        "random"
    }
}
