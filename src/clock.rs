use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Milliseconds since a clock's origin.
pub type Millis = u64;

/// Source of "now" for the sessions.
///
/// Sessions never read wall time directly so tests can drive them with
/// [`ManualClock`].
pub trait Clock {
    fn now(&self) -> Millis;
}

/// Production clock, monotonic from the moment it was created
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Millis {
        self.origin.elapsed().as_millis() as Millis
    }
}

/// Virtual clock for tests. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<Millis>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(ms: Millis) -> Self {
        let clock = Self::new();
        clock.set(ms);
        clock
    }

    pub fn set(&self, ms: Millis) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: Millis) {
        self.now.set(self.now.get().saturating_add(ms));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Millis {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Millis {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let handle = clock.clone();

        handle.advance(250);
        assert_eq!(clock.now(), 250);

        clock.set(1_000);
        assert_eq!(handle.now(), 1_000);
    }

    #[test]
    fn manual_clock_starting_at() {
        let clock = ManualClock::starting_at(42);
        assert_eq!(clock.now(), 42);
        clock.advance(8);
        assert_eq!(clock.now(), 50);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
