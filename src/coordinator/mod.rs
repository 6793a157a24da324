//! The PBT coordinator: samples worker pairs, pulls histories over the
//! message channels, runs the configured selection policy, and issues
//! exploit/explore. Runs as a central async loop driving per-worker
//! channels; unlike the search workers, the coordinator is not spawned onto
//! the blocking pool, since its own work (sampling, waiting on replies,
//! light arithmetic) is I/O- and wait-bound rather than CPU-bound.

pub mod policy;
pub mod stats;
pub mod trunc;
pub mod velo;
pub mod welch;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::{Policy, SelectionConfig};
use crate::message::{Command, Reply, WorkerHandle};
use crate::snapshot::PopulationSnapshot;
use policy::Decision;

/// Every worker self-perturbs on `Reset` using its own configured scales
/// (`worker::WorkerConfig::scales`), so the coordinator itself never needs
/// a copy of the explore scales; it only ever issues `Reset`.
pub struct Coordinator {
    handles: Vec<WorkerHandle>,
    snapshot: Arc<PopulationSnapshot>,
    selection: SelectionConfig,
    rng: SmallRng,
    dead: HashSet<usize>,
    inactivity: u64,
}

impl Coordinator {
    pub fn new(
        handles: Vec<WorkerHandle>,
        snapshot: Arc<PopulationSnapshot>,
        selection: SelectionConfig,
        seed: u64,
    ) -> Self {
        Self {
            handles,
            snapshot,
            selection,
            rng: SmallRng::seed_from_u64(seed),
            dead: HashSet::new(),
            inactivity: 0,
        }
    }

    pub async fn run(mut self, running: Arc<AtomicBool>) {
        while running.load(Ordering::Relaxed) {
            match self.selection.subr {
                Policy::Welch | Policy::Velo => self.tick_statistical().await,
                Policy::Trunc => self.tick_truncation().await,
            }
        }
    }

    fn live_indices(&self) -> Vec<usize> {
        (0..self.handles.len())
            .filter(|i| !self.dead.contains(i))
            .collect()
    }

    fn sample_distinct_pair(&mut self) -> Option<(usize, usize)> {
        let live = self.live_indices();
        if live.len() < 2 {
            return None;
        }
        let a = live[self.rng.random_range(0..live.len())];
        let mut b = live[self.rng.random_range(0..live.len())];
        while b == a {
            b = live[self.rng.random_range(0..live.len())];
        }
        Some((a, b))
    }

    async fn report(&mut self, index: usize) -> Option<(u64, Vec<crate::Value>)> {
        let handle = &mut self.handles[index];
        if handle.commands.send(Command::Report).is_err() {
            self.dead.insert(index);
            return None;
        }
        match handle.replies.recv().await {
            Some(Reply::Reported(report)) => Some((report.steps, report.value_history)),
            _ => {
                self.dead.insert(index);
                None
            }
        }
    }

    async fn send_state(&mut self, index: usize) -> Option<crate::worker::state::WorkerState> {
        let handle = &mut self.handles[index];
        if handle.commands.send(Command::SendState).is_err() {
            self.dead.insert(index);
            return None;
        }
        match handle.replies.recv().await {
            Some(Reply::State(state)) => Some(state),
            _ => {
                self.dead.insert(index);
                None
            }
        }
    }

    fn reset(&mut self, index: usize, state: crate::worker::state::WorkerState) {
        if self.handles[index].commands.send(Command::Reset(state)).is_err() {
            self.dead.insert(index);
        }
    }

    /// Applies the `[winner -> loser]` exploit: pulls the winner's state and
    /// resets the loser with it. The loser applies `explore` itself on
    /// receipt, so no separate perturb message is sent here.
    async fn exploit(&mut self, winner: usize, loser: usize) {
        if let Some(state) = self.send_state(winner).await {
            self.reset(loser, state);
        }
    }

    /// Shared body of the Welch and velocity policies: sample a pair,
    /// pull both histories, run the policy's statistical test, honor the
    /// protected age, and rescue a stalled population via an unconditional
    /// self-reset once too many consecutive comparisons yield no decision.
    async fn tick_statistical(&mut self) {
        let Some((a, b)) = self.sample_distinct_pair() else {
            tokio::task::yield_now().await;
            return;
        };
        let (Some((a_steps, a_history)), Some((b_steps, b_history))) =
            (self.report(a).await, self.report(b).await)
        else {
            return;
        };

        let decision = match self.selection.subr {
            Policy::Welch => welch::decide(a, &a_history, b, &b_history, self.selection.p),
            Policy::Velo => velo::decide(a, &a_history, b, &b_history, 1.0 - self.selection.p),
            Policy::Trunc => unreachable!("trunc is handled by tick_truncation"),
        };

        match decision {
            Decision::NoDecision => {
                self.inactivity += 1;
                if self.inactivity > self.selection.inactiv {
                    self.exploit(a, a).await;
                    self.inactivity = 0;
                }
            }
            Decision::Pick { winner, loser } => {
                self.inactivity = 0;
                let winner_steps = if winner == a { a_steps } else { b_steps };
                if winner_steps >= self.selection.n_protected {
                    self.exploit(winner, loser).await;
                }
            }
        }
    }

    /// The truncation policy reads the Snapshot directly rather than
    /// requesting full histories: it only needs each worker's current
    /// scalar value, which the Snapshot already publishes every step.
    async fn tick_truncation(&mut self) {
        let summaries = self.snapshot.read_all();
        if let Some((winner, loser)) =
            trunc::propose(&summaries, self.selection.trunc, self.selection.n_protected, &mut self.rng)
        {
            if !self.dead.contains(&winner) && !self.dead.contains(&loser) {
                self.exploit(winner, loser).await;
            }
        } else {
            tokio::task::yield_now().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{worker_link, Report, WorkerEnd};
    use crate::solution::Solution;
    use crate::worker::hyper::Hyperparameters;
    use crate::worker::state::WorkerState;
    use std::sync::Mutex;

    fn dummy_state(value: i64) -> WorkerState {
        WorkerState {
            hyperparameters: Hyperparameters {
                temperature: 1.0,
                cooling_rate: 0.01,
                p_mutations: 0.1,
            },
            solution: Solution::empty(4),
            value,
        }
    }

    fn selection(subr: Policy, p: f64, inactiv: u64, n_protected: u64) -> SelectionConfig {
        SelectionConfig {
            subr,
            p,
            trunc: 0.2,
            inactiv,
            n_protected,
        }
    }

    /// Answers `Report` with a fixed `(steps, history)`, answers `SendState`
    /// with a fixed state, and records every `Reset` it receives.
    fn spawn_fake_worker(
        mut end: WorkerEnd,
        steps: u64,
        history: Vec<crate::Value>,
        state: WorkerState,
        resets: Arc<Mutex<Vec<WorkerState>>>,
    ) {
        tokio::spawn(async move {
            while let Some(command) = end.commands.recv().await {
                match command {
                    Command::Report => {
                        let _ = end.replies.send(Reply::Reported(Report {
                            steps,
                            value_history: history.clone(),
                        }));
                    }
                    Command::SendState => {
                        let _ = end.replies.send(Reply::State(state.clone()));
                    }
                    Command::Reset(received) => {
                        resets.lock().unwrap().push(received);
                    }
                }
            }
        });
    }

    #[tokio::test]
    async fn exploit_proceeds_when_only_loser_is_young() {
        let (handle_a, end_a) = worker_link(0);
        let (handle_b, end_b) = worker_link(1);

        let resets_a = Arc::new(Mutex::new(Vec::new()));
        let resets_b = Arc::new(Mutex::new(Vec::new()));

        // worker 0: mature (steps past n_protected), clearly higher value
        // history -> wins the Welch comparison regardless of sampling order.
        let history_a: Vec<crate::Value> = (0..30).map(|i| 1000 + i).collect();
        spawn_fake_worker(end_a, 50, history_a, dummy_state(1000), Arc::clone(&resets_a));
        // worker 1: young (steps below n_protected), clearly lower value
        // history -> loses.
        let history_b: Vec<crate::Value> = (0..30).collect();
        spawn_fake_worker(end_b, 0, history_b, dummy_state(10), Arc::clone(&resets_b));

        let mut coordinator = Coordinator::new(
            vec![handle_a, handle_b],
            Arc::new(PopulationSnapshot::new(2)),
            selection(Policy::Welch, 0.05, 1000, 10),
            1,
        );

        coordinator.tick_statistical().await;

        // the loser (steps=0 < n_protected=10) still gets exploited into,
        // because only the *winner's* (donor's) age is gated.
        let received = resets_b.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].value, 1000);
        assert!(resets_a.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn dead_channel_is_marked_and_skipped() {
        let (handle, end) = worker_link(0);
        drop(end);

        let mut coordinator = Coordinator::new(
            vec![handle],
            Arc::new(PopulationSnapshot::new(1)),
            selection(Policy::Welch, 0.05, 1000, 0),
            2,
        );

        assert_eq!(coordinator.report(0).await, None);
        assert!(coordinator.dead.contains(&0));
    }

    #[tokio::test]
    async fn inactivity_rescue_self_resets_after_threshold() {
        let (handle_a, end_a) = worker_link(0);
        let (handle_b, end_b) = worker_link(1);

        let resets_a = Arc::new(Mutex::new(Vec::new()));
        let resets_b = Arc::new(Mutex::new(Vec::new()));

        // identical flat histories: Welch never reaches a decision, so the
        // inactivity counter climbs every tick.
        let flat: Vec<crate::Value> = vec![5; 20];
        spawn_fake_worker(end_a, 100, flat.clone(), dummy_state(5), Arc::clone(&resets_a));
        spawn_fake_worker(end_b, 100, flat, dummy_state(5), Arc::clone(&resets_b));

        let mut coordinator = Coordinator::new(
            vec![handle_a, handle_b],
            Arc::new(PopulationSnapshot::new(2)),
            selection(Policy::Welch, 0.05, 2, 0),
            3,
        );

        for _ in 0..4 {
            coordinator.tick_statistical().await;
        }

        let total_resets = resets_a.lock().unwrap().len() + resets_b.lock().unwrap().len();
        assert!(
            total_resets >= 1,
            "expected an unconditional self-reset once inactivity exceeded the threshold"
        );
    }
}
