//! The owned, transferable snapshot of a worker's search state: everything
//! needed to clone a winner into a loser on `exploit`.
//!
//! Deliberately does not carry `steps` or `value_history`: a `Reset` zeroes
//! the receiver's own step counter and refills its history from this
//! state's `value` alone.

use crate::solution::Solution;
use crate::worker::hyper::Hyperparameters;
use crate::Value;

#[derive(Debug, Clone)]
pub struct WorkerState {
    pub hyperparameters: Hyperparameters,
    pub solution: Solution,
    pub value: Value,
}
