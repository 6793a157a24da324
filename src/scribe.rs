//! The scribe: a periodic, purely observational loop that reads the
//! Population Snapshot and appends one CSV row per worker per tick. Creates
//! a timestamped `records/<unix-seconds>/` directory holding `info.json`
//! (the run's config) and `history.csv`, and optionally prints a sorted
//! table to stdout every tick.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use colored::Colorize;

use crate::config::Config;
use crate::snapshot::PopulationSnapshot;
use crate::CSV_HEADER;

pub struct Scribe {
    snapshot: Arc<PopulationSnapshot>,
    directory: PathBuf,
    delay: Duration,
    print_table: bool,
}

impl Scribe {
    /// Creates `records/<unix-seconds>/`, writes `info.json` from `config`,
    /// and opens `history.csv` with the fixed header. `delay` is the tick
    /// period; `print_table` additionally prints a sorted table to the
    /// terminal every tick, for dual stdout + file output.
    pub fn start(
        config: &Config,
        snapshot: Arc<PopulationSnapshot>,
        delay: Duration,
        print_table: bool,
    ) -> Result<Self> {
        let stamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time moves forward")
            .as_secs();
        let directory = PathBuf::from("records").join(stamp.to_string());
        std::fs::create_dir_all(&directory)
            .with_context(|| format!("creating records directory {}", directory.display()))?;

        let info_path = directory.join("info.json");
        let info = serde_json::to_string_pretty(config).context("serializing run config")?;
        std::fs::write(&info_path, info)
            .with_context(|| format!("writing {}", info_path.display()))?;

        let history_path = directory.join("history.csv");
        let mut file = File::create(&history_path)
            .with_context(|| format!("creating {}", history_path.display()))?;
        writeln!(file, "{CSV_HEADER}").context("writing CSV header")?;

        Ok(Self {
            snapshot,
            directory,
            delay,
            print_table,
        })
    }

    /// Ticks until `running` clears. Stays live even if every worker
    /// stalls: it only ever reads the Snapshot, never waits on a worker.
    pub async fn run(self, running: Arc<AtomicBool>) {
        let start = Instant::now();
        let history_path = self.directory.join("history.csv");
        let mut interval = tokio::time::interval(self.delay);

        while running.load(Ordering::Relaxed) {
            interval.tick().await;
            let elapsed_minutes = start.elapsed().as_secs_f64() / 60.0;
            let rows = self.snapshot.read_all();

            if let Err(err) = self.append_csv(&history_path, elapsed_minutes, &rows) {
                log::warn!("scribe failed to append CSV row: {err:#}");
            }
            if self.print_table {
                self.print(elapsed_minutes, &rows);
            }
        }
    }

    fn append_csv(
        &self,
        path: &std::path::Path,
        elapsed_minutes: f64,
        rows: &[crate::snapshot::SlotSummary],
    ) -> Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(path)
            .with_context(|| format!("opening {}", path.display()))?;
        for (worker, row) in rows.iter().enumerate() {
            writeln!(
                file,
                "{elapsed_minutes},{worker},{},{},{},{},{}",
                row.steps, row.value, row.temperature, row.cooling_rate, row.p_mutations
            )?;
        }
        Ok(())
    }

    fn print(&self, elapsed_minutes: f64, rows: &[crate::snapshot::SlotSummary]) {
        let mut ranked: Vec<(usize, &crate::snapshot::SlotSummary)> = rows.iter().enumerate().collect();
        ranked.sort_by_key(|(_, row)| std::cmp::Reverse(row.value));

        println!("{}", format!("-- t = {elapsed_minutes:.2} min --").bold());
        for (worker, row) in ranked {
            println!(
                "  worker {:>3}  age {:>8}  value {:>10}  T {:>10.3}  cr {:>8.5}  pm {:>6.3}",
                worker.to_string().cyan(),
                row.steps,
                row.value.to_string().green(),
                row.temperature,
                row.cooling_rate,
                row.p_mutations
            );
        }
    }
}
