use reversal::prng::Prng;
use serde::{Deserialize, Serialize};

/// Response keys: `One` is the left-hand key, `Two` the right-hand key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    One,
    Two,
}

impl Key {
    pub fn label(self) -> &'static str {
        match self {
            Key::One => "1",
            Key::Two => "2",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "1" => Some(Key::One),
            "2" => Some(Key::Two),
            _ => None,
        }
    }

    /// The environment action selected by pressing this key when
    /// stimulus `leftmost` is shown on the left.
    pub fn to_action(self, leftmost: u32) -> u32 {
        match (self, leftmost) {
            (Key::One, 0) => 0,
            (Key::Two, 0) => 1,
            (Key::One, _) => 1,
            (Key::Two, _) => 0,
        }
    }

    /// Inverse of [`to_action`](Self::to_action).
    pub fn for_action(action: u32, leftmost: u32) -> Self {
        if action == leftmost {
            Key::One
        } else {
            Key::Two
        }
    }
}

/// Layout and planned durations of one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialPlan {
    pub trial: u32,
    /// Stimulus shown on the left (0 or 1).
    pub leftmost: u32,
    pub stimulus_secs: u32,
    pub feedback_secs: u32,
}

const SIDES: [u32; 2] = [0, 1];
const STIMULUS_SECS: [u32; 3] = [1, 2, 3];
const FEEDBACK_SECS: [u32; 3] = [2, 3, 4];

/// Stimulus placement and timing stream. Separate from the environment's
/// stream so the two never perturb each other.
#[derive(Debug, Clone)]
pub struct Schedule {
    rng: Prng,
    next_trial: u32,
}

impl Schedule {
    pub fn new(order_seed: i64) -> Self {
        Self {
            rng: Prng::from_signed(order_seed),
            next_trial: 0,
        }
    }

    /// Draws side, stimulus duration and feedback duration, in that order.
    pub fn next_plan(&mut self) -> TrialPlan {
        let trial = self.next_trial;
        self.next_trial += 1;

        let leftmost = *self.rng.choose(&SIDES).unwrap_or(&0);
        let stimulus_secs = *self.rng.choose(&STIMULUS_SECS).unwrap_or(&2);
        let feedback_secs = *self.rng.choose(&FEEDBACK_SECS).unwrap_or(&3);

        TrialPlan {
            trial,
            leftmost,
            stimulus_secs,
            feedback_secs,
        }
    }
}
