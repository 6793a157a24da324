//! The simulated-annealing search worker: hyperparameters, current bitmask
//! solution, rolling value history, and the step loop (neighbor / repair /
//! accept / cool / record).

use std::collections::VecDeque;
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::instance::Instance;
use crate::message::Report;
use crate::snapshot::SlotSummary;
use crate::solution::Solution;
use crate::worker::hyper::{Hyperparameters, Scales};
use crate::worker::state::WorkerState;
use crate::{Value, Weight};

pub struct SaWorker {
    instance: Arc<Instance>,
    rng: SmallRng,
    hyperparameters: Hyperparameters,
    solution: Solution,
    /// `allocations[k]` is the current total weight loaded into knapsack
    /// `k` by `solution`. Maintained incrementally so neither `step` nor
    /// `repair` needs an `O(n*m)` full recompute.
    allocations: Vec<Weight>,
    value: Value,
    steps: u64,
    value_history: VecDeque<Value>,
    horizon: usize,
}

impl SaWorker {
    /// `seed` must be drawn and handed in by the supervisor; this
    /// constructor seeds `SmallRng` right here, in the worker's own
    /// context, rather than accepting an already-seeded RNG passed by
    /// value from a shared parent — a copied PRNG state is the one bug
    /// class this guards against.
    pub fn new(
        instance: Arc<Instance>,
        seed: u64,
        horizon: usize,
        temperature: &crate::config::DistSpec,
        cooling_rate: &crate::config::DistSpec,
        p_mutations: &crate::config::DistSpec,
    ) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let hyperparameters =
            Hyperparameters::sample(temperature, cooling_rate, p_mutations, &mut rng);
        let mut solution = Solution::random_bernoulli(instance.n(), &mut rng);
        let mut allocations = compute_allocations(&instance, &solution);
        let mut value = compute_value(&instance, &solution);
        repair(&instance, &mut rng, &mut solution, &mut allocations, &mut value);

        Self {
            value_history: VecDeque::from(vec![value; horizon]),
            horizon,
            instance,
            rng,
            hyperparameters,
            solution,
            allocations,
            value,
            steps: 0,
        }
    }

    /// Advances one SA iteration: neighbor, repair, accept, cool, record,
    /// advance.
    pub fn step(&mut self) {
        let mut candidate = self.solution.clone();
        let mut allocations = self.allocations.clone();
        let mut candidate_value = self.value;

        let excluded: Vec<usize> = self.solution.excluded().collect();
        for item in excluded {
            if self.rng.random_bool(self.hyperparameters.p_mutations) {
                candidate.include(item);
                candidate_value += self.instance.value(item);
                for (k, w) in self.instance.weight_column(item).enumerate() {
                    allocations[k] += w;
                }
            }
        }

        repair(
            &self.instance,
            &mut self.rng,
            &mut candidate,
            &mut allocations,
            &mut candidate_value,
        );

        if candidate_value >= self.value {
            self.solution = candidate;
            self.allocations = allocations;
            self.value = candidate_value;
        }

        self.hyperparameters.cool();

        self.value_history.pop_front();
        self.value_history.push_back(self.value);

        self.steps += 1;
    }

    /// An immutable copy of state sufficient for a sibling's `reset`.
    pub fn snapshot(&self) -> WorkerState {
        WorkerState {
            hyperparameters: self.hyperparameters,
            solution: self.solution.clone(),
            value: self.value,
        }
    }

    /// Adopts `template`'s hyperparameters and solution, zeroes `steps`,
    /// and refills `value_history` from the template's value — a `Reset`
    /// does not carry history across.
    pub fn reset(&mut self, template: &WorkerState) {
        self.hyperparameters = template.hyperparameters;
        self.solution = template.solution.clone();
        self.allocations = compute_allocations(&self.instance, &self.solution);
        self.value = template.value;
        self.steps = 0;
        self.value_history = VecDeque::from(vec![template.value; self.horizon]);
    }

    /// Multiplicatively jitters every hyperparameter.
    pub fn perturb(&mut self, scales: &Scales) {
        self.hyperparameters = self.hyperparameters.perturb(scales, &mut self.rng);
    }

    pub fn report(&self) -> Report {
        Report {
            steps: self.steps,
            value_history: self.value_history.iter().copied().collect(),
        }
    }

    pub fn summary(&self) -> SlotSummary {
        SlotSummary {
            steps: self.steps,
            value: self.value,
            temperature: self.hyperparameters.temperature,
            cooling_rate: self.hyperparameters.cooling_rate,
            p_mutations: self.hyperparameters.p_mutations,
        }
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn value(&self) -> Value {
        self.value
    }

    pub fn solution(&self) -> &Solution {
        &self.solution
    }
}

fn compute_value(instance: &Instance, solution: &Solution) -> Value {
    solution.included().map(|i| instance.value(i)).sum()
}

fn compute_allocations(instance: &Instance, solution: &Solution) -> Vec<Weight> {
    let mut allocations = vec![0; instance.m()];
    for item in solution.included() {
        for (k, w) in instance.weight_column(item).enumerate() {
            allocations[k] += w;
        }
    }
    allocations
}

fn is_feasible(instance: &Instance, allocations: &[Weight]) -> bool {
    (0..instance.m()).all(|k| allocations[k] <= instance.capacity(k))
}

/// While `candidate` violates any capacity, remove included items in an
/// order drawn once at the start of this call (the permutation is fixed for
/// the whole repair, not re-drawn per violating iteration). Terminates
/// because removing every included item reaches the empty, always-feasible
/// solution. Maintains `value` incrementally so callers never need a second
/// `O(n)` pass afterward.
fn repair(
    instance: &Instance,
    rng: &mut SmallRng,
    candidate: &mut Solution,
    allocations: &mut [Weight],
    value: &mut Value,
) {
    if is_feasible(instance, allocations) {
        return;
    }
    let mut order: Vec<usize> = candidate.included().collect();
    order.shuffle(rng);

    let mut cursor = 0;
    while !is_feasible(instance, allocations) {
        let item = order[cursor];
        cursor += 1;
        if candidate.is_included(item) {
            candidate.exclude(item);
            *value -= instance.value(item);
            for (k, w) in instance.weight_column(item).enumerate() {
                allocations[k] -= w;
            }
        }
    }
}

/// Re-exports `repair` for `benches/benchmarks.rs`, which lives outside this
/// crate and can't otherwise reach a private `fn`. Gated behind the
/// `benchmark` feature so ordinary builds keep `repair` private.
#[cfg(feature = "benchmark")]
pub fn repair_bench(
    instance: &Instance,
    rng: &mut SmallRng,
    candidate: &mut Solution,
    allocations: &mut [Weight],
    value: &mut Value,
) {
    repair(instance, rng, candidate, allocations, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DistSpec;

    fn toy_instance() -> Arc<Instance> {
        Arc::new(Instance::parse("4 1 15\n10 6 8 7\n5 3 4 2\n7").unwrap())
    }

    fn const_worker(seed: u64) -> SaWorker {
        SaWorker::new(
            toy_instance(),
            seed,
            5,
            &DistSpec::Const { value: 50.0 },
            &DistSpec::Const { value: 0.01 },
            &DistSpec::Const { value: 0.0 },
        )
    }

    #[test]
    fn fresh_worker_has_feasible_initial_solution() {
        let worker = const_worker(1);
        let allocations = compute_allocations(&worker.instance, &worker.solution);
        assert!(is_feasible(&worker.instance, &allocations));
        assert_eq!(worker.value, compute_value(&worker.instance, &worker.solution));
    }

    #[test]
    fn repair_on_fully_included_solution_is_feasible_and_positive_value() {
        let instance = toy_instance();
        let mut rng = SmallRng::seed_from_u64(9);
        let mut solution = Solution::empty(4);
        for i in 0..4 {
            solution.include(i);
        }
        let mut allocations = compute_allocations(&instance, &solution);
        let mut value = compute_value(&instance, &solution);
        repair(&instance, &mut rng, &mut solution, &mut allocations, &mut value);
        assert!(is_feasible(&instance, &allocations));
        assert!(value > 0);
        assert_eq!(value, compute_value(&instance, &solution));
    }

    #[test]
    fn repair_on_already_feasible_candidate_is_a_no_op() {
        let instance = toy_instance();
        let mut rng = SmallRng::seed_from_u64(5);
        let mut solution = Solution::empty(4);
        solution.include(0);
        solution.include(3);
        let mut allocations = compute_allocations(&instance, &solution);
        let mut value = compute_value(&instance, &solution);
        let before = solution.clone();
        repair(&instance, &mut rng, &mut solution, &mut allocations, &mut value);
        assert_eq!(solution, before);
        assert_eq!(value, 17);
    }

    #[test]
    fn greedy_accept_is_monotone_nondecreasing() {
        let mut worker = const_worker(3);
        let mut last = worker.value;
        for _ in 0..500 {
            worker.step();
            assert!(worker.value >= last);
            last = worker.value;
        }
    }

    #[test]
    fn value_history_length_is_fixed_at_horizon() {
        let mut worker = const_worker(4);
        for _ in 0..20 {
            worker.step();
            assert_eq!(worker.value_history.len(), worker.horizon);
            assert_eq!(*worker.value_history.back().unwrap(), worker.value);
        }
    }

    #[test]
    fn reset_zeroes_steps_and_adopts_template() {
        let mut a = const_worker(11);
        for _ in 0..50 {
            a.step();
        }
        let template = a.snapshot();
        let mut loser = const_worker(13);
        loser.reset(&template);
        assert_eq!(loser.steps, 0);
        assert_eq!(loser.value, template.value);
        assert_eq!(loser.solution, template.solution);
        assert_eq!(loser.hyperparameters, template.hyperparameters);
        assert!(loser.value_history.iter().all(|&v| v == template.value));
    }

    #[test]
    fn no_op_self_exploit_preserves_state() {
        let mut worker = const_worker(21);
        for _ in 0..10 {
            worker.step();
        }
        let before = worker.snapshot();
        worker.reset(&before);
        assert_eq!(worker.solution, before.solution);
        assert_eq!(worker.hyperparameters, before.hyperparameters);
        assert_eq!(worker.value, before.value);
    }

    #[test]
    fn toy_instance_reaches_optimum_with_high_probability() {
        let mut worker = SaWorker::new(
            toy_instance(),
            99,
            10,
            &DistSpec::Const { value: 50.0 },
            &DistSpec::Const { value: 0.001 },
            &DistSpec::Const { value: 0.3 },
        );
        for _ in 0..1000 {
            worker.step();
        }
        assert_eq!(worker.value, 17);
    }
}
