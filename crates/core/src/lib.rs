//! # reversal
//!
//! A two-armed probabilistic reversal-learning environment after
//! Hampton, Bossaerts & O'Doherty (2006).
//!
//! One stimulus wins 70% of the time, the other 40%. Once the agent has picked
//! the better stimulus four times in a row, the contingencies covertly swap
//! with probability 0.25 on every further correct trial.
//!
//! ## Quick Start
//!
//! ```
//! use reversal::prelude::*;
//!
//! let mut env = ReversalEnv::new(EnvConfig::default().with_seed(43));
//! env.reset();
//!
//! let step = env.step(0).unwrap();
//! assert!(step.reward == 0.25 || step.reward == -0.25);
//! assert!(!step.done);
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Standard library support, entropy seeding, `tracing` narration
//! - `serde` (default): Enable serialization/deserialization of [`env::EnvConfig`]
//!
//! ## no_std Support
//!
//! Disable default features for `no_std` environments (an allocator is still required):
//! ```toml
//! reversal = { version = "0.1", default-features = false }
//! ```
//!
//! ## Modules
//!
//! - [`env`]: The environment state machine
//! - [`prng`]: Seed-compatible Mersenne Twister stream
//! - [`narration`]: Trial narration sinks
//! - [`error`]: Argument and precondition errors

// no_std support
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

#[path = "core/env.rs"]
pub mod env;

#[path = "core/error.rs"]
pub mod error;

#[path = "core/narration.rs"]
pub mod narration;

#[path = "core/prng.rs"]
pub mod prng;

/// Prelude module for convenient imports.
///
/// ```
/// use reversal::prelude::*;
/// ```
pub mod prelude {
    pub use crate::env::{EnvConfig, ReversalEnv, Step, StepInfo};
    pub use crate::error::EnvError;
    #[cfg(feature = "std")]
    pub use crate::narration::{TracingNarrator, WriterNarrator};
    pub use crate::narration::{Narrator, Recorder, Silent};
    pub use crate::prng::Prng;
}
