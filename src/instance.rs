//! The multidimensional knapsack instance: immutable problem data shared
//! read-only by every worker, the coordinator, and the scribe.
//!
//! File format: whitespace-delimited integers in the order `n m v_opt`,
//! then `n` item values, then `m*n` weights given row-major by knapsack
//! (knapsack k's weight for every item, in order), then `m` capacities.
//! Weights are stored and indexed directly as `weights[k][i]`, without
//! transposing into a column-major layout.

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::{Value, Weight};

#[derive(Debug, Clone)]
pub struct Instance {
    values: Vec<Value>,
    /// `weights[k][i]` is knapsack k's weight for item i.
    weights: Vec<Vec<Weight>>,
    capacities: Vec<Weight>,
    /// informational only; not used by the core search.
    optimum_hint: Value,
}

impl Instance {
    pub fn n(&self) -> usize {
        self.values.len()
    }

    pub fn m(&self) -> usize {
        self.capacities.len()
    }

    pub fn value(&self, item: usize) -> Value {
        self.values[item]
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn weight(&self, knapsack: usize, item: usize) -> Weight {
        self.weights[knapsack][item]
    }

    pub fn capacity(&self, knapsack: usize) -> Weight {
        self.capacities[knapsack]
    }

    pub fn capacities(&self) -> &[Weight] {
        &self.capacities
    }

    pub fn optimum_hint(&self) -> Value {
        self.optimum_hint
    }

    /// Sum of the weight column for `item` across every knapsack.
    pub fn weight_column(&self, item: usize) -> impl Iterator<Item = Weight> + '_ {
        (0..self.m()).map(move |k| self.weights[k][item])
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut text = String::new();
        std::fs::File::open(path)
            .with_context(|| format!("opening instance file {}", path.display()))?
            .read_to_string(&mut text)
            .with_context(|| format!("reading instance file {}", path.display()))?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut numbers = text.split_ascii_whitespace();

        let mut next = move || -> Result<i64> {
            let tok = numbers.next().context("instance file ended unexpectedly")?;
            tok.parse::<i64>()
                .with_context(|| format!("not an integer: {tok:?}"))
        };

        let n = next()? as usize;
        let m = next()? as usize;
        let optimum_hint = next()?;

        if n == 0 {
            bail!("instance declares zero items");
        }
        if m == 0 {
            bail!("instance declares zero knapsacks");
        }

        let values = (0..n).map(|_| next()).collect::<Result<Vec<_>>>()?;

        let weights = (0..m)
            .map(|_| (0..n).map(|_| next()).collect::<Result<Vec<_>>>())
            .collect::<Result<Vec<_>>>()?;

        let capacities = (0..m).map(|_| next()).collect::<Result<Vec<_>>>()?;

        Ok(Self {
            values,
            weights,
            capacities,
            optimum_hint,
        })
    }
}
