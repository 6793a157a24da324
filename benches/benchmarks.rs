criterion::criterion_main!(benches);
criterion::criterion_group! {
    name = benches;
    config = criterion::Criterion::default()
        .without_plots()
        .noise_threshold(3.0)
        .significance_level(0.01)
        .sample_size(10)
        .measurement_time(std::time::Duration::from_secs(1));
    targets =
        stepping_sa_worker,
        repairing_infeasible_candidate,
        fitting_theil_sen,
        running_welchs_t_test,
}

fn stepping_sa_worker(c: &mut criterion::Criterion) {
    let instance = random_instance(200, 5);
    c.bench_function("advance one SA step (n=200, m=5)", |b| {
        let mut worker = SaWorker::new(
            instance.clone(),
            1,
            50,
            &DistSpec::Unilog { lo: 3.0, hi: 6.0 },
            &DistSpec::Unilog { lo: -4.0, hi: -2.0 },
            &DistSpec::Expit { lo: 0.01, hi: 0.99 },
        );
        b.iter(|| worker.step());
    });
}

fn repairing_infeasible_candidate(c: &mut criterion::Criterion) {
    let instance = random_instance(500, 10);
    c.bench_function("repair a fully-included candidate (n=500, m=10)", |b| {
        b.iter_batched(
            || {
                let mut rng = SmallRng::seed_from_u64(7);
                let mut solution = Solution::empty(instance.n());
                let mut allocations = vec![0i64; instance.m()];
                let mut value = 0i64;
                for i in 0..instance.n() {
                    solution.include(i);
                    value += instance.value(i);
                    for (k, w) in instance.weight_column(i).enumerate() {
                        allocations[k] += w;
                    }
                }
                (rng, solution, allocations, value)
            },
            |(mut rng, mut solution, mut allocations, mut value)| {
                repair_bench(&instance, &mut rng, &mut solution, &mut allocations, &mut value);
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

fn fitting_theil_sen(c: &mut criterion::Criterion) {
    let history: Vec<i64> = (0..200).map(|i| i % 37).collect();
    c.bench_function("fit Theil-Sen on a 200-point history", |b| {
        b.iter(|| pbt_knapsack::coordinator::stats::theil_sen(&history, 0.95))
    });
}

fn running_welchs_t_test(c: &mut criterion::Criterion) {
    let a: Vec<i64> = (0..200).map(|i| i % 37).collect();
    let b_hist: Vec<i64> = (0..200).map(|i| (i % 41) + 5).collect();
    c.bench_function("run Welch's t-test on two 200-point histories", |bencher| {
        bencher.iter(|| pbt_knapsack::coordinator::stats::welchs_t_test(&a, &b_hist))
    });
}

fn random_instance(n: usize, m: usize) -> std::sync::Arc<Instance> {
    let mut lines = vec![format!("{n} {m} 0")];
    lines.push((1..=n).map(|v| v.to_string()).collect::<Vec<_>>().join(" "));
    for _ in 0..m {
        lines.push((1..=n).map(|i| (i % 13 + 1).to_string()).collect::<Vec<_>>().join(" "));
    }
    lines.push((0..m).map(|_| (n * 4).to_string()).collect::<Vec<_>>().join(" "));
    std::sync::Arc::new(Instance::parse(&lines.join("\n")).expect("well-formed generated instance"))
}

use rand::rngs::SmallRng;
use rand::SeedableRng;

use pbt_knapsack::config::DistSpec;
use pbt_knapsack::instance::Instance;
use pbt_knapsack::solution::Solution;
use pbt_knapsack::worker::sa::{repair_bench, SaWorker};
