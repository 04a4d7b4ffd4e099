//! Headless sessions of the reversal-learning task.
//!
//! Reproduces the experiment runner's trial loop without a window or a clock:
//! a placement/timing [`schedule::Schedule`] on its own stream, a simulated
//! [`responder::Responder`], the key-to-stimulus mapping, cumulative reward,
//! practice-mode termination and per-trial records.

pub mod batch;
pub mod responder;
pub mod schedule;
pub mod session;
pub mod stats;

pub use batch::{run_batch, seeded_configs};
pub use responder::{AlwaysSame, RandomResponder, Responder, Scripted, WinStayLoseShift};
pub use schedule::{Key, Schedule, TrialPlan};
pub use session::{RecordWriter, Session, SessionConfig, SessionError, SessionSummary, TrialRecord};
pub use stats::SessionStats;
