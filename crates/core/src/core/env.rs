#[cfg(not(feature = "std"))]
use alloc::{format, string::String};

use hashbrown::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::EnvError;
use crate::narration::{Narrator, Silent};
use crate::prng::Prng;

/// Choices available to the agent: the two stimuli.
pub const ACTION_SPACE: [u32; 2] = [0, 1];
/// Feedback symbols: 0 = loss, 1 = win.
pub const OBSERVATION_SPACE: [u32; 2] = [0, 1];
/// Which action is currently the good one.
pub const STATE_SPACE: [u32; 2] = [0, 1];

/// Win probability when the chosen action matches the hidden state.
pub const P_REWARD_CORRECT: f64 = 0.7;
/// Win probability for the other action.
pub const P_REWARD_INCORRECT: f64 = 0.4;
/// Consecutive correct choices before a reversal becomes possible.
pub const REVERSAL_STREAK: u32 = 4;
/// Per-trial reversal probability once the streak qualifies.
pub const P_REVERSAL: f64 = 0.25;
/// Magnitude of a win or loss (25 cents).
pub const REWARD_MAGNITUDE: f64 = 0.25;

/// Used in `no_std` builds when no seed is configured.
#[cfg(not(feature = "std"))]
const FALLBACK_SEED: u64 = 1;

/// Diagnostic payload returned with each step. Always empty today.
pub type StepInfo = HashMap<String, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EnvConfig {
    /// Reward is exactly `action == hidden_state` instead of a draw.
    pub deterministic_reward: bool,
    /// A qualifying streak always reverses instead of with probability 0.25.
    pub deterministic_reversal: bool,
    /// Initial stream seed. Without one the stream starts from process entropy.
    pub seed: Option<u64>,
}

impl EnvConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_deterministic_reward(mut self, on: bool) -> Self {
        self.deterministic_reward = on;
        self
    }

    pub fn with_deterministic_reversal(mut self, on: bool) -> Self {
        self.deterministic_reversal = on;
        self
    }

    /// Both decisions resolved without the stream.
    pub fn deterministic() -> Self {
        Self::default()
            .with_deterministic_reward(true)
            .with_deterministic_reversal(true)
    }
}

/// Result of one trial.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// 1 when rewarded, 0 otherwise.
    pub observation: u32,
    /// `+0.25` when rewarded, `-0.25` otherwise.
    pub reward: f64,
    /// Always `false`; the caller decides when a session ends.
    pub done: bool,
    pub info: StepInfo,
}

impl Step {
    fn from_outcome(rewarded: bool) -> Self {
        let (observation, reward) = if rewarded {
            (1, REWARD_MAGNITUDE)
        } else {
            (0, -REWARD_MAGNITUDE)
        };
        Self {
            observation,
            reward,
            done: false,
            info: StepInfo::new(),
        }
    }

    pub fn rewarded(&self) -> bool {
        self.observation == 1
    }

    /// `(observation, reward, done)` without the info map.
    pub fn as_tuple(&self) -> (u32, f64, bool) {
        (self.observation, self.reward, self.done)
    }
}

/// Two-armed probabilistic reversal-learning task (Hampton et al., 2006).
///
/// One action is "correct" (wins 70% of the time), the other wins 40% of the
/// time. After four consecutive correct choices the contingencies reverse
/// with probability 0.25 on each further correct trial.
///
/// Random draws per step, in order: the reward draw (unless
/// `deterministic_reward`), then the reversal draw (only when the streak
/// qualifies and `deterministic_reversal` is off).
#[derive(Debug)]
pub struct ReversalEnv<N: Narrator = Silent> {
    cfg: EnvConfig,
    rng: Prng,
    narrator: N,
    hidden_state: Option<u32>,
    correct_streak: u32,
    reversal_count: u32,
}

impl ReversalEnv<Silent> {
    pub fn new(cfg: EnvConfig) -> Self {
        Self::with_narrator(cfg, Silent)
    }
}

impl Default for ReversalEnv<Silent> {
    fn default() -> Self {
        Self::new(EnvConfig::default())
    }
}

impl<N: Narrator> ReversalEnv<N> {
    pub fn with_narrator(cfg: EnvConfig, narrator: N) -> Self {
        let rng = match cfg.seed {
            Some(seed) => Prng::new(seed),
            #[cfg(feature = "std")]
            None => Prng::from_entropy(),
            #[cfg(not(feature = "std"))]
            None => Prng::new(FALLBACK_SEED),
        };
        Self {
            cfg,
            rng,
            narrator,
            hidden_state: None,
            correct_streak: 0,
            reversal_count: 0,
        }
    }

    pub fn config(&self) -> &EnvConfig {
        &self.cfg
    }

    pub fn narrator(&self) -> &N {
        &self.narrator
    }

    pub fn narrator_mut(&mut self) -> &mut N {
        &mut self.narrator
    }

    pub fn into_narrator(self) -> N {
        self.narrator
    }

    /// Reseed the private stream. Counters and hidden state are untouched.
    pub fn seed(&mut self, value: i64) {
        self.rng.reseed(value.unsigned_abs());
    }

    /// Start an episode: draw the hidden state, zero the counters.
    ///
    /// Does not reseed the stream.
    pub fn reset(&mut self) {
        self.hidden_state = Some(self.rng.below(STATE_SPACE.len() as u32));
        self.correct_streak = 0;
        self.reversal_count = 0;
    }

    /// `None` until the first [`reset`](Self::reset) or override.
    pub fn hidden_state(&self) -> Option<u32> {
        self.hidden_state
    }

    /// Force the hidden state. Reproducibility and test affordance only;
    /// counters are left as they are.
    pub fn override_hidden_state(&mut self, state: u32) -> Result<(), EnvError> {
        if !STATE_SPACE.contains(&state) {
            return Err(EnvError::InvalidState(state));
        }
        self.hidden_state = Some(state);
        Ok(())
    }

    pub fn correct_streak(&self) -> u32 {
        self.correct_streak
    }

    pub fn reversal_count(&self) -> u32 {
        self.reversal_count
    }

    pub fn step(&mut self, action: u32) -> Result<Step, EnvError> {
        if !ACTION_SPACE.contains(&action) {
            return Err(EnvError::InvalidAction(action));
        }
        let state = self.hidden_state.ok_or(EnvError::NotReset)?;
        let matched = action == state;

        let rewarded = if self.cfg.deterministic_reward {
            matched
        } else {
            let p = if matched {
                P_REWARD_CORRECT
            } else {
                P_REWARD_INCORRECT
            };
            self.rng.next_f64() < p
        };

        // Driven by the match, not the outcome: an unlucky correct choice still counts.
        if matched {
            self.correct_streak += 1;
        } else {
            self.correct_streak = 0;
        }

        self.narrator.log(&format!(
            "Action={} State={} Rewarded={} CorrectCount={}",
            action, state, rewarded, self.correct_streak
        ));

        if self.correct_streak >= REVERSAL_STREAK
            && (self.cfg.deterministic_reversal || self.rng.next_f64() < P_REVERSAL)
        {
            self.hidden_state = Some(1 - state);
            self.correct_streak = 0;
            self.reversal_count += 1;
            self.narrator.log("Reversal");
        }

        Ok(Step::from_outcome(rewarded))
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::narration::Recorder;

    fn deterministic_env() -> ReversalEnv<Recorder> {
        let mut env = ReversalEnv::with_narrator(EnvConfig::deterministic(), Recorder::new());
        env.reset();
        env.override_hidden_state(0).unwrap();
        env.seed(42);
        env
    }

    #[test]
    fn reference_scenario() {
        let mut env = deterministic_env();

        assert_eq!(env.step(0).unwrap().as_tuple(), (1, 0.25, false));
        assert_eq!(env.correct_streak(), 1);

        assert_eq!(env.step(1).unwrap().as_tuple(), (0, -0.25, false));
        assert_eq!(env.correct_streak(), 0);

        for expected_streak in 1..=3 {
            let s = env.step(0).unwrap();
            assert_eq!(s.as_tuple(), (1, 0.25, false));
            assert!(s.info.is_empty());
            assert_eq!(env.correct_streak(), expected_streak);
        }
        assert_eq!(env.hidden_state(), Some(0));

        // Fourth consecutive correct choice: rewarded on the pre-flip state, then reversed.
        assert_eq!(env.step(0).unwrap().as_tuple(), (1, 0.25, false));
        assert_eq!(env.hidden_state(), Some(1));
        assert_eq!(env.correct_streak(), 0);
        assert_eq!(env.reversal_count(), 1);

        assert_eq!(env.step(1).unwrap().as_tuple(), (1, 0.25, false));
        assert_eq!(env.step(0).unwrap().as_tuple(), (0, -0.25, false));
    }

    #[test]
    fn narration_lines() {
        let mut env = deterministic_env();
        for _ in 0..4 {
            env.step(0).unwrap();
        }
        let lines = &env.narrator().lines;
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "Action=0 State=0 Rewarded=true CorrectCount=1");
        assert_eq!(lines[3], "Action=0 State=0 Rewarded=true CorrectCount=4");
        assert_eq!(lines[4], "Reversal");
    }

    #[test]
    fn step_before_reset_fails_fast() {
        let mut env = ReversalEnv::new(EnvConfig::default().with_seed(1));
        assert_eq!(env.step(0), Err(EnvError::NotReset));
        assert_eq!(env.hidden_state(), None);
    }

    #[test]
    fn override_makes_env_usable_without_reset() {
        let mut env = ReversalEnv::new(EnvConfig::deterministic());
        env.override_hidden_state(1).unwrap();
        assert!(env.step(1).unwrap().rewarded());
    }

    #[test]
    fn invalid_action_mutates_nothing() {
        let mut env = ReversalEnv::new(EnvConfig::default().with_seed(7));
        env.reset();
        env.step(env.hidden_state().unwrap()).unwrap();
        let streak = env.correct_streak();
        let state = env.hidden_state();

        assert_eq!(env.step(2), Err(EnvError::InvalidAction(2)));
        assert_eq!(env.step(u32::MAX), Err(EnvError::InvalidAction(u32::MAX)));
        assert_eq!(env.correct_streak(), streak);
        assert_eq!(env.hidden_state(), state);

        // No draw consumed: the stream still matches a twin that never saw the bad calls.
        let mut twin = ReversalEnv::new(EnvConfig::default().with_seed(7));
        twin.reset();
        twin.step(twin.hidden_state().unwrap()).unwrap();
        for a in [0, 1, 1, 0, 0, 0, 1] {
            assert_eq!(env.step(a).unwrap(), twin.step(a).unwrap());
        }
    }

    #[test]
    fn invalid_override_rejected() {
        let mut env = ReversalEnv::new(EnvConfig::deterministic());
        env.reset();
        let before = env.hidden_state();
        assert_eq!(env.override_hidden_state(3), Err(EnvError::InvalidState(3)));
        assert_eq!(env.hidden_state(), before);
    }

    #[test]
    fn seeded_runs_are_identical() {
        let actions: Vec<u32> = (0..500).map(|i| ((i * 7 + i / 3) % 2) as u32).collect();
        let run = || {
            let mut env = ReversalEnv::new(EnvConfig::default().with_seed(99));
            env.reset();
            env.seed(43);
            let steps: Vec<(u32, f64, bool)> = actions
                .iter()
                .map(|&a| env.step(a).unwrap().as_tuple())
                .collect();
            (steps, env.hidden_state(), env.reversal_count())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn reset_zeroes_counters_without_reseeding() {
        let mut env = ReversalEnv::new(EnvConfig::deterministic().with_seed(5));
        env.reset();
        let s = env.hidden_state().unwrap();
        for _ in 0..4 {
            env.step(s).unwrap();
        }
        assert_eq!(env.reversal_count(), 1);
        env.step(1 - s).unwrap();
        env.reset();
        assert_eq!(env.correct_streak(), 0);
        assert_eq!(env.reversal_count(), 0);

        // A second reset continues the stream rather than replaying it.
        let mut a = Prng::new(5);
        let first = a.below(2);
        let second = a.below(2);
        let mut fresh = ReversalEnv::new(EnvConfig::deterministic().with_seed(5));
        fresh.reset();
        assert_eq!(fresh.hidden_state(), Some(first));
        fresh.reset();
        assert_eq!(fresh.hidden_state(), Some(second));
    }

    #[test]
    fn deterministic_reward_consumes_no_draws() {
        // Deterministic reward and reversal: the stream is only touched by reset.
        let mut env = ReversalEnv::new(EnvConfig::deterministic().with_seed(11));
        env.reset();
        for i in 0..50u32 {
            let state = env.hidden_state().unwrap();
            let action = if i % 5 == 4 { 1 - state } else { state };
            assert_eq!(env.step(action).unwrap().rewarded(), action == state);
        }
        env.reset();

        let mut shadow = Prng::new(11);
        shadow.below(2);
        assert_eq!(env.hidden_state(), Some(shadow.below(2)));
    }

    #[test]
    fn stochastic_draw_order_matches_stream() {
        let mut env = ReversalEnv::new(EnvConfig::default().with_seed(3));
        env.reset();
        env.seed(43);
        let mut shadow = Prng::new(43);

        let mut state = env.hidden_state().unwrap();
        let mut streak = 0;
        for _ in 0..300 {
            let action = state;
            let step = env.step(action).unwrap();
            assert_eq!(step.rewarded(), shadow.next_f64() < P_REWARD_CORRECT);
            streak += 1;
            if streak >= REVERSAL_STREAK && shadow.next_f64() < P_REVERSAL {
                state = 1 - state;
                streak = 0;
            }
            assert_eq!(env.hidden_state(), Some(state));
            assert_eq!(env.correct_streak(), streak);
        }
    }

    #[test]
    fn invariants_hold_over_long_random_runs() {
        for seed in 0..8u64 {
            let mut env = ReversalEnv::new(EnvConfig::default().with_seed(seed));
            env.reset();
            let mut chooser = Prng::new(seed + 1000);
            let mut prev_streak = 0;
            let mut prev_reversals = 0;
            for _ in 0..2_000 {
                let state = env.hidden_state().unwrap();
                // Mostly correct choices so reversals actually happen.
                let action = if chooser.next_f64() < 0.8 { state } else { 1 - state };
                let step = env.step(action).unwrap();

                assert!(!step.done);
                assert!(step.info.is_empty());
                match step.observation {
                    1 => assert_eq!(step.reward, 0.25),
                    0 => assert_eq!(step.reward, -0.25),
                    other => panic!("observation {other}"),
                }
                assert!(STATE_SPACE.contains(&env.hidden_state().unwrap()));

                if env.reversal_count() != prev_reversals {
                    assert_eq!(env.reversal_count(), prev_reversals + 1);
                    assert_eq!(env.correct_streak(), 0);
                    assert_eq!(action, state);
                    assert!(prev_streak + 1 >= REVERSAL_STREAK);
                    assert_eq!(env.hidden_state(), Some(1 - state));
                } else if action == state {
                    assert_eq!(env.correct_streak(), prev_streak + 1);
                } else {
                    assert_eq!(env.correct_streak(), 0);
                }
                prev_streak = env.correct_streak();
                prev_reversals = env.reversal_count();
            }
            assert!(prev_reversals > 0);
        }
    }

    #[test]
    fn probabilistic_reversal_waits_for_streak() {
        // Deterministic reward, probabilistic reversal: no reversal before 4 correct.
        let cfg = EnvConfig::default()
            .with_deterministic_reward(true)
            .with_seed(21);
        for seed in 0..20 {
            let mut env = ReversalEnv::new(cfg);
            env.reset();
            env.seed(seed);
            let state = env.hidden_state().unwrap();
            for _ in 0..3 {
                env.step(state).unwrap();
            }
            assert_eq!(env.reversal_count(), 0);
            assert_eq!(env.hidden_state(), Some(state));
        }
    }

    #[test]
    fn config_defaults_and_builders() {
        let cfg = EnvConfig::default();
        assert!(!cfg.deterministic_reward);
        assert!(!cfg.deterministic_reversal);
        assert_eq!(cfg.seed, None);

        let cfg = EnvConfig::default()
            .with_deterministic_reversal(true)
            .with_seed(9);
        assert!(!cfg.deterministic_reward);
        assert!(cfg.deterministic_reversal);
        assert_eq!(cfg.seed, Some(9));
    }

    #[test]
    fn negative_seed_accepted() {
        let mut a = ReversalEnv::new(EnvConfig::default().with_seed(1));
        let mut b = ReversalEnv::new(EnvConfig::default().with_seed(1));
        a.override_hidden_state(0).unwrap();
        b.override_hidden_state(0).unwrap();
        a.seed(-17);
        b.seed(17);
        for act in [0, 0, 1, 0, 0, 0, 0, 0, 1] {
            assert_eq!(a.step(act).unwrap(), b.step(act).unwrap());
        }
    }
}
