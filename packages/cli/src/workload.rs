//! Seeded synthetic workload
//!
//! Every random choice is drawn up front, before the simulator exists, so the
//! same seed produces the same schedule on every backend. Delays sit on a
//! millisecond grid to force timestamp ties.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{bail, Result};
use des_kernel::{SchedulerKind, Simulator, SimulatorConfig, Time};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Tag bit marking a chained follow-up event
const FOLLOW_UP: u64 = 1 << 63;

#[derive(Debug, Clone, Copy)]
struct Planned {
    delay_ms: i64,
    follow_up_ms: Option<i64>,
    cancel: bool,
}

/// Workload parameters
#[derive(Debug, Clone)]
pub struct Workload {
    plans: Vec<Planned>,
    stop: Option<Time>,
}

/// What one run produced
#[derive(Debug)]
pub struct Report {
    pub scheduler: &'static str,
    /// `(dispatch time, tag)` in invocation order
    pub trace: Vec<(Time, u64)>,
    pub executed: u64,
    pub cancelled: usize,
    pub pending: usize,
    pub end: Time,
}

impl Workload {
    pub fn generate(events: usize, seed: u64, stop: Option<Time>) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let plans = (0..events)
            .map(|_| Planned {
                delay_ms: rng.gen_range(0..100),
                follow_up_ms: rng.gen_bool(0.3).then(|| rng.gen_range(0..50)),
                cancel: rng.gen_bool(0.1),
            })
            .collect();
        Self { plans, stop }
    }

    pub fn run(&self, config: SimulatorConfig) -> Report {
        let trace = Rc::new(RefCell::new(Vec::with_capacity(self.plans.len())));
        let mut sim = Simulator::with_config(config);

        let mut cancelled = 0;
        let mut ids = Vec::with_capacity(self.plans.len());
        for (tag, plan) in (0_u64..).zip(&self.plans) {
            let trace = Rc::clone(&trace);
            let follow_up = plan.follow_up_ms;
            let id = sim.schedule(Time::from_millis(plan.delay_ms), move |sim| {
                record(&trace, sim, tag);
                if let Some(ms) = follow_up {
                    sim.schedule(Time::from_millis(ms), move |sim| {
                        record(&trace, sim, tag | FOLLOW_UP)
                    });
                }
            });
            ids.push((id, plan.cancel));
        }
        for (id, cancel) in &ids {
            if *cancel {
                sim.cancel(id);
                cancelled += 1;
            }
        }

        if let Some(stop) = self.stop {
            sim.stop_at(stop);
        }
        sim.run();

        let report = Report {
            scheduler: sim.scheduler_name(),
            trace: trace.borrow().clone(),
            executed: sim.event_count(),
            cancelled,
            pending: sim.pending_events(),
            end: sim.now(),
        };
        sim.destroy();
        report
    }

    /// Run on the heap backend, then on every other backend, failing at the
    /// first trace that differs from the heap's
    pub fn compare(&self, base: SimulatorConfig) -> Result<Vec<Report>> {
        let reference = self.run(base.with_scheduler(SchedulerKind::Heap));
        let mut reports = Vec::with_capacity(SchedulerKind::ALL.len());
        for kind in SchedulerKind::ALL {
            if kind == SchedulerKind::Heap {
                continue;
            }
            let report = self.run(base.with_scheduler(kind));
            if report.trace != reference.trace {
                let diverged = report
                    .trace
                    .iter()
                    .zip(&reference.trace)
                    .position(|(a, b)| a != b)
                    .unwrap_or(report.trace.len().min(reference.trace.len()));
                bail!("{kind} diverges from heap at dispatch #{diverged}");
            }
            reports.push(report);
        }
        reports.insert(0, reference);
        Ok(reports)
    }
}

fn record(trace: &RefCell<Vec<(Time, u64)>>, sim: &Simulator, tag: u64) {
    trace.borrow_mut().push((sim.now(), tag));
}
