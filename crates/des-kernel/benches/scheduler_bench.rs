//! Scheduler Benchmark Suite
//!
//! Compares the four backends on the workloads that decide which one to pick.
//!
//! # Scenarios
//!
//! 1. **Hold model**: steady population of N events; each dispatch schedules
//!    one replacement at `now + exp(mean)`. Classic priority queue benchmark.
//!
//! 2. **Cancellation heavy**: half of the scheduled events are removed before
//!    they fire. Penalises the O(n) `remove` of heap and list.
//!
//! 3. **Simultaneous events**: everything at the same timestamp. Worst case
//!    for the calendar width estimate.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use des_kernel::{SchedulerKind, Simulator, SimulatorConfig, Time};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ============================================================================
// Helper Functions
// ============================================================================

fn simulator(kind: SchedulerKind) -> Simulator {
    Simulator::with_config(SimulatorConfig::new().with_scheduler(kind))
}

/// Exponential delay with the given mean, in nanoseconds
fn exp_delay(rng: &mut StdRng, mean_ns: f64) -> Time {
    let u: f64 = rng.gen_range(f64::EPSILON..1.0);
    Time::from_nanos((-u.ln() * mean_ns) as i64)
}

fn hold(sim: &mut Simulator, rng: Rc<RefCell<StdRng>>, left: Rc<Cell<u64>>) {
    if left.get() == 0 {
        return;
    }
    left.set(left.get() - 1);
    let delay = exp_delay(&mut rng.borrow_mut(), 1_000.0);
    sim.schedule(delay, move |sim| hold(sim, rng, left));
}

fn run_hold_model(kind: SchedulerKind, population: usize, dispatches: u64) -> u64 {
    let mut sim = simulator(kind);
    let rng = Rc::new(RefCell::new(StdRng::seed_from_u64(42)));
    let left = Rc::new(Cell::new(dispatches));
    for _ in 0..population {
        let delay = exp_delay(&mut rng.borrow_mut(), 1_000.0);
        let (rng, left) = (Rc::clone(&rng), Rc::clone(&left));
        sim.schedule(delay, move |sim| hold(sim, rng, left));
    }
    sim.run();
    sim.event_count()
}

fn run_cancellation_heavy(kind: SchedulerKind, events: usize) -> u64 {
    let mut sim = simulator(kind);
    let mut rng = StdRng::seed_from_u64(7);
    let ids: Vec<_> = (0..events)
        .map(|_| sim.schedule(exp_delay(&mut rng, 10_000.0), |_| {}))
        .collect();
    for id in ids.iter().step_by(2) {
        sim.remove(id);
    }
    sim.run();
    sim.event_count()
}

fn run_simultaneous(kind: SchedulerKind, events: usize) -> u64 {
    let mut sim = simulator(kind);
    for _ in 0..events {
        sim.schedule(Time::from_micros(1), |_| {});
    }
    sim.run();
    sim.event_count()
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_hold_model(c: &mut Criterion) {
    let mut group = c.benchmark_group("hold_model");

    for population in [100, 1_000, 10_000] {
        for kind in SchedulerKind::ALL {
            // the list backend is quadratic; keep it out of the large case
            if kind == SchedulerKind::List && population > 1_000 {
                continue;
            }
            group.bench_with_input(
                BenchmarkId::new(kind.as_str(), population),
                &population,
                |b, &population| {
                    b.iter(|| black_box(run_hold_model(kind, population, 10_000)));
                },
            );
        }
    }

    group.finish();
}

fn bench_cancellation_heavy(c: &mut Criterion) {
    let mut group = c.benchmark_group("cancellation_heavy");

    for kind in SchedulerKind::ALL {
        group.bench_function(kind.as_str(), |b| {
            b.iter(|| black_box(run_cancellation_heavy(kind, 2_000)));
        });
    }

    group.finish();
}

fn bench_simultaneous(c: &mut Criterion) {
    let mut group = c.benchmark_group("simultaneous");

    for kind in SchedulerKind::ALL {
        group.bench_function(kind.as_str(), |b| {
            b.iter(|| black_box(run_simultaneous(kind, 2_000)));
        });
    }

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_hold_model,
    bench_cancellation_heavy,
    bench_simultaneous
);

criterion_main!(benches);
