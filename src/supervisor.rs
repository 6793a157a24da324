//! Wires the whole system together: loads config, builds the Instance, the
//! Population Snapshot, the worker channel pairs, the workers, the scribe,
//! and (unless running baseline, or with only one worker) the coordinator;
//! sleeps for the configured wall-clock budget, then tears everything down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rand::Rng;

use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::instance::Instance;
use crate::message::worker_link;
use crate::scribe::Scribe;
use crate::snapshot::PopulationSnapshot;
use crate::worker::hyper::Scales;
use crate::worker::{self, WorkerConfig};
use crate::DEFAULT_SCRIBE_DELAY_SECS;

pub async fn run(config: Config) -> Result<()> {
    log::info!(
        "loading instance {:?} ({} workers, baseline={}, policy={:?})",
        config.filename,
        config.n_workers,
        config.baseline,
        config.selection.subr
    );
    let instance = Arc::new(
        Instance::from_file(&config.filename)
            .with_context(|| format!("loading instance {}", config.filename))?,
    );
    let available = num_cpus::get();
    if config.n_workers > available {
        log::warn!(
            "n_workers ({}) exceeds available hardware parallelism ({available}); \
             workers will contend for OS threads",
            config.n_workers
        );
    }
    let snapshot = Arc::new(PopulationSnapshot::new(config.n_workers));
    let running = Arc::new(AtomicBool::new(true));

    let temperature_init = *config
        .inits
        .get("temperature")
        .context("config.inits missing \"temperature\"")?;
    let cooling_rate_init = *config
        .inits
        .get("cooling_rate")
        .context("config.inits missing \"cooling_rate\"")?;
    let p_mutations_init = *config
        .inits
        .get("p_mutations")
        .context("config.inits missing \"p_mutations\"")?;
    let scales = Scales::from_map(&config.scales);

    let mut seeder = rand::rng();
    let mut worker_handles = Vec::with_capacity(config.n_workers);
    let mut worker_tasks = Vec::with_capacity(config.n_workers);

    for index in 0..config.n_workers {
        let (handle, end) = worker_link(index);
        let seed: u64 = seeder.random();
        let worker_config = WorkerConfig {
            horizon: config.horizon,
            temperature_init,
            cooling_rate_init,
            p_mutations_init,
            scales,
        };
        let task = worker::spawn(
            index,
            seed,
            Arc::clone(&instance),
            worker_config,
            Arc::clone(&snapshot),
            end,
            Arc::clone(&running),
        );
        worker_handles.push(handle);
        worker_tasks.push(task);
    }

    let print_table = log::log_enabled!(log::Level::Info);
    let scribe = Scribe::start(
        &config,
        Arc::clone(&snapshot),
        Duration::from_secs(DEFAULT_SCRIBE_DELAY_SECS),
        print_table,
    )?;
    let scribe_task = tokio::spawn(scribe.run(Arc::clone(&running)));

    let coordinator_task = if !config.baseline && config.n_workers > 1 {
        let coordinator_seed: u64 = seeder.random();
        let coordinator = Coordinator::new(
            worker_handles,
            Arc::clone(&snapshot),
            config.selection.clone(),
            coordinator_seed,
        );
        Some(tokio::spawn(coordinator.run(Arc::clone(&running))))
    } else {
        log::info!("baseline mode or single worker: coordinator not started");
        None
    };

    let budget = Duration::from_secs_f64(config.time_limit * 60.0);
    log::info!("running for {:.1} minutes", config.time_limit);
    tokio::time::sleep(budget).await;

    log::info!("wall-clock budget elapsed, tearing down");
    running.store(false, Ordering::Relaxed);

    for task in worker_tasks {
        task.abort();
    }
    scribe_task.abort();
    if let Some(task) = coordinator_task {
        task.abort();
    }

    Ok(())
}
