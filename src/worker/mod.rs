//! The SA worker and its runtime loop.
//!
//! `spawn` builds the task's owned state, hands the caller back only what it
//! needs to talk to it, and moves everything else into the spawned task. A
//! search worker is CPU-bound and must run on a real OS thread for the
//! population to search in parallel, so this uses
//! `tokio::task::spawn_blocking` — a Tokio-native primitive backed by the
//! runtime's blocking thread pool rather than a cooperative task.

pub mod hyper;
pub mod sa;
pub mod state;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::DistSpec;
use crate::instance::Instance;
use crate::message::{Command, Reply, WorkerEnd};
use crate::snapshot::PopulationSnapshot;
use crate::worker::hyper::Scales;
use crate::worker::sa::SaWorker;

/// One worker's immutable launch parameters, everything `SaWorker::new`
/// needs besides its seed.
pub struct WorkerConfig {
    pub horizon: usize,
    pub temperature_init: DistSpec,
    pub cooling_rate_init: DistSpec,
    pub p_mutations_init: DistSpec,
    pub scales: Scales,
}

/// Spawns one worker onto the blocking pool and returns its `JoinHandle`.
/// `running` is polled once per SA step; clearing it asks the worker to
/// stop at the next opportunity (cooperative shutdown). The supervisor
/// additionally lets the whole Tokio runtime drop at process exit as a
/// forced-termination backstop.
pub fn spawn(
    index: usize,
    seed: u64,
    instance: Arc<Instance>,
    config: WorkerConfig,
    snapshot: Arc<PopulationSnapshot>,
    channel: WorkerEnd,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let mut worker = SaWorker::new(
            instance,
            seed,
            config.horizon,
            &config.temperature_init,
            &config.cooling_rate_init,
            &config.p_mutations_init,
        );
        let mut channel = channel;

        while running.load(Ordering::Relaxed) {
            worker.step();
            snapshot.slot(index).write(worker.summary());

            for command in channel.drain().collect::<Vec<_>>() {
                match command {
                    Command::Report => {
                        let _ = channel.replies.send(Reply::Reported(worker.report()));
                    }
                    Command::SendState => {
                        let _ = channel.replies.send(Reply::State(worker.snapshot()));
                    }
                    Command::Reset(template) => {
                        worker.reset(&template);
                        worker.perturb(&config.scales);
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DistSpec;
    use crate::instance::Instance;
    use crate::message::worker_link;

    const TOY: &str = "4 1 15\n10 6 8 7\n5 3 4 2\n7";

    fn toy_config() -> WorkerConfig {
        WorkerConfig {
            horizon: 5,
            temperature_init: DistSpec::Const { value: 50.0 },
            cooling_rate_init: DistSpec::Const { value: 0.01 },
            p_mutations_init: DistSpec::Const { value: 0.3 },
            scales: Scales {
                temperature: 0.05,
                cooling_rate: 0.05,
                p_mutations: 0.05,
            },
        }
    }

    #[tokio::test]
    async fn spawned_worker_steps_and_answers_report() {
        let instance = Arc::new(Instance::parse(TOY).unwrap());
        let snapshot = Arc::new(PopulationSnapshot::new(1));
        let running = Arc::new(AtomicBool::new(true));
        let (mut handle, end) = worker_link(0);

        let task = spawn(
            0,
            7,
            Arc::clone(&instance),
            toy_config(),
            Arc::clone(&snapshot),
            end,
            Arc::clone(&running),
        );

        handle.commands.send(Command::Report).unwrap();
        match handle.replies.recv().await.unwrap() {
            Reply::Reported(report) => assert_eq!(report.value_history.len(), 5),
            other => panic!("expected Reported, got {other:?}"),
        }

        running.store(false, Ordering::Relaxed);
        task.await.unwrap();

        assert!(snapshot.slot(0).read().steps >= 1);
    }

    #[tokio::test]
    async fn spawned_worker_applies_reset_from_a_template() {
        let instance = Arc::new(Instance::parse(TOY).unwrap());
        let snapshot = Arc::new(PopulationSnapshot::new(1));
        let running = Arc::new(AtomicBool::new(true));
        let (mut handle, end) = worker_link(0);

        let task = spawn(
            0,
            3,
            Arc::clone(&instance),
            toy_config(),
            Arc::clone(&snapshot),
            end,
            Arc::clone(&running),
        );

        handle.commands.send(Command::SendState).unwrap();
        let template = match handle.replies.recv().await.unwrap() {
            Reply::State(state) => state,
            other => panic!("expected State, got {other:?}"),
        };

        let mut overwritten = template.clone();
        overwritten.value = template.value + 999;
        handle.commands.send(Command::Reset(overwritten.clone())).unwrap();

        handle.commands.send(Command::SendState).unwrap();
        let after_reset = match handle.replies.recv().await.unwrap() {
            Reply::State(state) => state,
            other => panic!("expected State, got {other:?}"),
        };
        assert_eq!(after_reset.solution, overwritten.solution);

        running.store(false, Ordering::Relaxed);
        task.await.unwrap();
    }
}
