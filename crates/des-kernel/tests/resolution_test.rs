//! Resolution Tests
//!
//! The resolution is process-wide and fixed by first use, so this binary
//! holds a single test that switches to microseconds before anything else
//! touches [`Time`].

use std::cell::RefCell;
use std::rc::Rc;

use des_kernel::{
    ConfigError, ResolutionError, SchedulerKind, Simulator, SimulatorConfig, Time, TimeUnit,
};

#[test]
fn test_microsecond_resolution() {
    let config = SimulatorConfig::new().with_resolution(TimeUnit::Us);
    let mut sim = Simulator::try_with_config(config).unwrap();
    assert_eq!(Time::resolution(), TimeUnit::Us);
    assert_eq!(sim.resolution(), TimeUnit::Us);

    // whole units and rounding below the resolution
    assert_eq!(Time::from_millis(3).ticks(), 3_000);
    assert_eq!(Time::from_nanos(1_499), Time::from_micros(1));
    assert_eq!(Time::from_nanos(1_500), Time::from_micros(2));
    assert_eq!(Time::from_micros(1_500).to_string(), "+0.001500s");
    assert_eq!("2.5ms".parse::<Time>(), Ok(Time::from_micros(2_500)));

    // the same unit can be asked for again, another one cannot
    assert!(Simulator::try_with_config(config.with_scheduler(SchedulerKind::Map)).is_ok());
    assert_eq!(
        Simulator::try_with_config(SimulatorConfig::new()).map(|sim| sim.scheduler_name()),
        Err(ConfigError::Resolution(ResolutionError {
            current: TimeUnit::Us,
            requested: TimeUnit::Ns,
        }))
    );

    let order = Rc::new(RefCell::new(Vec::new()));
    let o = Rc::clone(&order);
    sim.schedule(Time::from_millis(6), move |sim| o.borrow_mut().push(("direct", sim.now())));
    let o = Rc::clone(&order);
    sim.schedule(Time::from_millis(2), move |sim| {
        sim.schedule(Time::from_millis(4), move |sim| {
            o.borrow_mut().push(("chained", sim.now()))
        });
    });
    sim.run();
    assert_eq!(
        *order.borrow(),
        vec![
            ("direct", Time::from_micros(6_000)),
            ("chained", Time::from_micros(6_000)),
        ]
    );
    sim.destroy();
}
