//! Small random pauses between operations to vary thread interleavings.

use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::{Role, TaskIndex};

/// Run-wide jitter settings; hands out one independent generator per task.
#[derive(Clone, Copy, Debug)]
pub struct JitterSource {
    max_ms: u64,
    seed: Option<u64>,
}

impl JitterSource {
    /// Pauses are drawn uniformly from `0..max_ms` milliseconds; `0` disables them.
    pub fn new(max_ms: u64, seed: Option<u64>) -> Self {
        Self { max_ms, seed }
    }

    pub fn for_task(&self, role: Role, index: TaskIndex) -> TaskJitter {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(task_seed(seed, role, index)),
            None => StdRng::from_entropy(),
        };
        TaskJitter {
            max_ms: self.max_ms,
            rng,
        }
    }
}

/// Distinct, reproducible stream per (role, index).
fn task_seed(seed: u64, role: Role, index: TaskIndex) -> u64 {
    let lane = match role {
        Role::Producer => 0,
        Role::Consumer => 1,
    };
    seed ^ (((index as u64) << 1) | lane).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

pub struct TaskJitter {
    max_ms: u64,
    rng: StdRng,
}

impl TaskJitter {
    /// Next pause length without sleeping.
    pub fn next_pause(&mut self) -> Duration {
        if self.max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(self.rng.gen_range(0..self.max_ms))
    }

    pub fn delay(&mut self) {
        let pause = self.next_pause();
        if !pause.is_zero() {
            thread::sleep(pause);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_tasks_are_reproducible() {
        let source = JitterSource::new(10, Some(42));
        let mut a = source.for_task(Role::Producer, 1);
        let mut b = source.for_task(Role::Producer, 1);
        for _ in 0..32 {
            assert_eq!(a.next_pause(), b.next_pause());
        }
    }

    #[test]
    fn pauses_stay_below_bound() {
        let source = JitterSource::new(10, None);
        let mut jitter = source.for_task(Role::Consumer, 0);
        for _ in 0..500 {
            assert!(jitter.next_pause() < Duration::from_millis(10));
        }
    }

    #[test]
    fn zero_bound_disables_pauses() {
        let mut jitter = JitterSource::new(0, Some(1)).for_task(Role::Producer, 0);
        assert_eq!(jitter.next_pause(), Duration::ZERO);
    }

    #[test]
    fn roles_get_distinct_streams() {
        assert_ne!(
            task_seed(7, Role::Producer, 0),
            task_seed(7, Role::Consumer, 0)
        );
        assert_ne!(
            task_seed(7, Role::Producer, 0),
            task_seed(7, Role::Producer, 1)
        );
    }
}
