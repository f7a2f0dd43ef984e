//! Deadline countdowns.
//!
//! A project's deadline is local midnight of `tanggal_mulai + estimasi_durasi_hari`.
//! [`tick`] turns that into a remaining or overdue breakdown for one instant.
//! [`Ticker`] is the single once-per-second source that every visible
//! timer subscribes to; dropping a [`Subscription`] detaches it.

use std::{
    cell::RefCell,
    collections::BTreeMap,
    ops::ControlFlow,
    rc::{Rc, Weak},
    thread,
    time::Duration,
};

use jiff::{Span, Timestamp, Zoned, civil::Date, tz::TimeZone};
use serde::Serialize;

use crate::model::Project;

const MS_PER_DAY: u64 = 86_400_000;
const MS_PER_HOUR: u64 = 3_600_000;
const MS_PER_MINUTE: u64 = 60_000;
const MS_PER_SECOND: u64 = 1_000;

/// Time remaining until, or elapsed since, a deadline.
///
/// Components are always a magnitude. `expired` says which direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub expired: bool,
}

impl Countdown {
    /// Shown for projects without a start date or duration.
    pub const UNCONFIGURED: Self = Self {
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
        expired: true,
    };

    fn from_millis(ms: u64, expired: bool) -> Self {
        Self {
            days: ms / MS_PER_DAY,
            hours: ms % MS_PER_DAY / MS_PER_HOUR,
            minutes: ms % MS_PER_HOUR / MS_PER_MINUTE,
            seconds: ms % MS_PER_MINUTE / MS_PER_SECOND,
            expired,
        }
    }

    /// Two days or less left.
    pub fn is_warning(&self) -> bool {
        self.days <= 2 && !self.expired
    }

    /// Less than a day left.
    pub fn is_danger(&self) -> bool {
        self.days == 0 && !self.expired
    }

    pub fn is_overdue(&self) -> bool {
        self.expired
    }
}

/// The deadline instant: local midnight `duration_days` after `start`.
///
/// `None` when the date arithmetic leaves jiff's supported range.
pub fn deadline(start: Date, duration_days: u32, tz: &TimeZone) -> Option<Timestamp> {
    let span = Span::new().try_days(i64::from(duration_days)).ok()?;
    let end = start.checked_add(span).ok()?;
    end.to_zoned(tz.clone()).ok().map(|z| z.timestamp())
}

/// Compute the countdown for one instant.
///
/// A zero duration or a missing start date reads as expired with every
/// component zero, so unconfigured projects surface as needing attention.
pub fn tick(now: &Zoned, start: Option<Date>, duration_days: u32) -> Countdown {
    let Some(start) = start.filter(|_| duration_days > 0) else {
        return Countdown::UNCONFIGURED;
    };
    let Some(end) = deadline(start, duration_days, now.time_zone()) else {
        return Countdown::UNCONFIGURED;
    };

    let diff = end.as_millisecond() - now.timestamp().as_millisecond();
    Countdown::from_millis(diff.unsigned_abs(), diff <= 0)
}

impl Project {
    /// This project's countdown at `now`.
    ///
    /// Ignores `timer_selesai_pada`; callers decide whether a completed
    /// timer still shows its countdown.
    pub fn countdown(&self, now: &Zoned) -> Countdown {
        tick(now, self.tanggal_mulai, self.estimasi_durasi_hari)
    }
}

/// What a subscribed timer counts towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerInputs {
    pub start: Option<Date>,
    pub duration_days: u32,
}

impl TimerInputs {
    pub fn of(project: &Project) -> Self {
        Self {
            start: project.tanggal_mulai,
            duration_days: project.estimasi_durasi_hari,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    timers: BTreeMap<TimerId, TimerInputs>,
}

/// A shared ticking source for every mounted timer.
///
/// Single-threaded: subscriptions hold a weak handle back to the registry
/// and remove themselves on drop.
#[derive(Debug)]
pub struct Ticker {
    tz: TimeZone,
    registry: Rc<RefCell<Registry>>,
}

impl Ticker {
    pub const PERIOD: Duration = Duration::from_secs(1);

    pub fn new(tz: TimeZone) -> Self {
        Self {
            tz,
            registry: Rc::default(),
        }
    }

    pub fn subscribe(&self, inputs: TimerInputs) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        let id = TimerId(registry.next_id);
        registry.next_id += 1;
        registry.timers.insert(id, inputs);
        Subscription {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.registry.borrow().timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One reading per live subscription, in subscription order.
    pub fn tick(&self, now: Timestamp) -> Vec<(TimerId, Countdown)> {
        let now = now.to_zoned(self.tz.clone());
        self.registry
            .borrow()
            .timers
            .iter()
            .map(|(id, inputs)| (*id, tick(&now, inputs.start, inputs.duration_days)))
            .collect()
    }

    /// Tick every `period` until `on_tick` breaks or nothing is subscribed.
    ///
    /// The callback may drop subscriptions; they stop counting on the next tick.
    pub fn run<F>(&self, period: Duration, mut on_tick: F)
    where
        F: FnMut(&[(TimerId, Countdown)]) -> ControlFlow<()>,
    {
        while !self.is_empty() {
            let readings = self.tick(Timestamp::now());
            if on_tick(&readings).is_break() {
                break;
            }
            thread::sleep(period);
        }
    }
}

/// A timer's membership in a [`Ticker`]. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    id: TimerId,
    registry: Weak<RefCell<Registry>>,
}

impl Subscription {
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Point the timer at new inputs. Takes effect on the next tick.
    pub fn retarget(&self, inputs: TimerInputs) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().timers.insert(self.id, inputs);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().timers.remove(&self.id);
        }
    }
}
