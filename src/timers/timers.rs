use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};

#[derive(Debug, Default, Clone)]
struct InnerTimer {
    start: Option<Instant>,
    elapsed: Duration,
    subtimers: SubTimersMap,
}

impl InnerTimer {
    fn reset(&mut self) {
        self.start = None;
        self.elapsed = Duration::ZERO;
        self.subtimers.clear();
    }

    fn start(&mut self) {
        self.start = Some(Instant::now());
    }

    fn stop(&mut self) {
        if let Some(instant) = self.start.take() {
            self.elapsed += instant.elapsed();
        }
    }
}

#[derive(Debug, Default, Clone)]
struct SubTimersMap(HashMap<&'static str, InnerTimer>);

impl Deref for SubTimersMap {
    type Target = HashMap<&'static str, InnerTimer>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl DerefMut for SubTimersMap {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl SubTimersMap {
    fn reset_subtimer(&mut self, key: &'static str) {
        let t = self.entry(key).or_default();
        t.reset();
    }

    fn start_subtimer(&mut self, key: &'static str) {
        let t = self.0.entry(key).or_default();
        t.start();
    }

    fn total_time(&self) -> Duration {
        self.values().fold(Duration::ZERO, |acc, t| acc + t.elapsed)
    }

    fn log(&self, depth: usize) {
        let mut keys: Vec<_> = self.keys().copied().collect();
        keys.sort_unstable();
        for key in keys {
            let val = &self[key];
            let tabs = format!("{: <1$}", "", 4 * depth);
            log::debug!("{}{:} : {:?}", tabs, key, val.elapsed);
            val.subtimers.log(depth + 1);
        }
    }
}

/// Nested named wall-clock timers.
///
/// Each solver owns one `Timers` and exposes it by reference.  Timers are
/// started with [`start_as_current`](Timers::start_as_current) as children of
/// whichever timer is currently running, and accumulate across repeated runs
/// until reset.
#[derive(Default, Debug, Clone)]
pub struct Timers {
    stack: Vec<&'static str>,
    subtimers: SubTimersMap,
}

impl Timers {
    fn mut_active_timer(&mut self) -> Option<&mut InnerTimer> {
        let (first, rest) = self.stack.split_first()?;

        //first one gets special treatment since self is not
        //an InnerTimer and a common trait would be overkill
        let mut active_timer = self.subtimers.get_mut(first)?;

        for key in rest {
            active_timer = active_timer.subtimers.get_mut(key)?;
        }
        Some(active_timer)
    }

    /// Clear the top level timer `key` and everything nested below it.
    pub fn reset_timer(&mut self, key: &'static str) {
        self.subtimers.reset_subtimer(key);
    }

    pub fn start_as_current(&mut self, key: &'static str) {
        //starts a timer with name "str" as the current timer

        let active_timer = self.mut_active_timer();

        if let Some(active) = active_timer {
            // child of current active timer
            active.subtimers.start_subtimer(key);
        } else {
            // nothing active, create one at root
            self.subtimers.start_subtimer(key);
        }

        //append to timer call stack
        self.stack.push(key);
    }

    pub fn stop_current(&mut self) {
        if let Some(active) = self.mut_active_timer() {
            active.stop();
        }

        //remove from timer call stack
        self.stack.pop();
    }

    /// Accumulated time of the timer at `path`, e.g. `&["factorize", "fronts"]`.
    pub fn elapsed(&self, path: &[&'static str]) -> Option<Duration> {
        let (first, rest) = path.split_first()?;
        let mut timer = self.subtimers.get(first)?;
        for key in rest {
            timer = timer.subtimers.get(key)?;
        }
        Some(timer.elapsed)
    }

    pub fn total_time(&self) -> Duration {
        self.subtimers.total_time()
    }

    /// Write the timer tree to the debug log.
    pub fn log(&self) {
        self.subtimers.log(0);
    }
}

macro_rules! timeit {
    ($timer:ident => $key:literal; $($tt:tt)+) => {

        $timer.start_as_current($key);
        $(
            $tt
        )+
        $timer.stop_current();
    }
}
pub(crate) use timeit;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_timers() {
        let mut timers = Timers::default();

        timeit! {timers => "outer"; {
            timeit!{timers => "inner"; {
                std::thread::sleep(Duration::from_millis(2));
            }}
        }}

        let outer = timers.elapsed(&["outer"]).unwrap();
        let inner = timers.elapsed(&["outer", "inner"]).unwrap();
        assert!(inner >= Duration::from_millis(2));
        assert!(outer >= inner);
        assert_eq!(timers.total_time(), outer);
        assert!(timers.elapsed(&["inner"]).is_none());
        assert!(timers.elapsed(&[]).is_none());

        timers.reset_timer("outer");
        assert_eq!(timers.elapsed(&["outer"]), Some(Duration::ZERO));
        assert!(timers.elapsed(&["outer", "inner"]).is_none());
    }
}
