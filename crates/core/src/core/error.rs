use thiserror::Error;

/// Precondition and argument failures raised by [`crate::env::ReversalEnv`].
///
/// None of these mutate the environment or consume random draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EnvError {
    #[error("invalid action {0}: expected 0 or 1")]
    InvalidAction(u32),

    #[error("invalid hidden state {0}: expected 0 or 1")]
    InvalidState(u32),

    #[error("step called before reset")]
    NotReset,
}
