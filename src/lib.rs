pub mod config;
pub mod coordinator;
pub mod instance;
pub mod logging;
pub mod message;
pub mod scribe;
pub mod snapshot;
pub mod solution;
pub mod supervisor;
pub mod worker;

/// item/constraint counts, solution value, and hyperparameters all live in
/// these aliases so a later precision change (e.g. i64 -> i128 values) is a
/// one-line edit instead of a crate-wide search and replace.
pub type Value = i64;
pub type Weight = i64;

/// default scribe tick interval.
pub const DEFAULT_SCRIBE_DELAY_SECS: u64 = 1;

/// Fixed CSV header. Kept as a constant rather than threaded dynamically
/// through the scribe and the truncation policy, both of which only need
/// the column names by convention.
pub const CSV_HEADER: &str = "Time,Worker,Age,Value,Temperature,Cooling rate,Mutation prob.";
