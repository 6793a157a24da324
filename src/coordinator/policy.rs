//! Common vocabulary shared by the three selection policies.

/// The outcome of comparing two workers' trajectories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Pick { winner: usize, loser: usize },
    NoDecision,
}
