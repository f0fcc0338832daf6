//! Terminal summary of a finished run.

use crate::buffer::Strategy;
use crate::trace::TraceAudit;

/// Best-effort process CPU user/system time (seconds) on Unix platforms.
#[cfg(unix)]
pub fn cpu_times_seconds() -> Option<(f64, f64)> {
    use libc::{RUSAGE_SELF, getrusage, rusage};
    use std::mem::MaybeUninit;
    let mut usage = MaybeUninit::<rusage>::uninit();
    let rc = unsafe { getrusage(RUSAGE_SELF, usage.as_mut_ptr()) };
    if rc != 0 {
        return None;
    }
    // getrusage filled every field on success.
    let usage = unsafe { usage.assume_init() };
    let seconds = |tv: libc::timeval| tv.tv_sec as f64 + tv.tv_usec as f64 / 1_000_000.0;
    Some((seconds(usage.ru_utime), seconds(usage.ru_stime)))
}

/// Stub on non-Unix platforms.
#[cfg(not(unix))]
pub fn cpu_times_seconds() -> Option<(f64, f64)> {
    None
}

#[derive(Clone, Debug)]
pub struct RunReport {
    pub strategy: Strategy,
    pub producers: usize,
    pub consumers: usize,
    pub capacity: usize,
    pub target: u64,
    /// Identifiers handed out to producers.
    pub produced: u64,
    pub delivered: u64,
    /// Puts refused because the buffer had already been closed.
    pub rejected: u64,
    /// Items still stored when every thread had exited.
    pub residual: usize,
    pub max_occupancy: usize,
    pub elapsed_ms: f64,
    pub cpu_user_s: Option<f64>,
    pub cpu_sys_s: Option<f64>,
}

impl RunReport {
    pub fn throughput(&self) -> f64 {
        if self.elapsed_ms > 0.0 {
            self.delivered as f64 / (self.elapsed_ms / 1000.0)
        } else {
            0.0
        }
    }

    /// Key=value summary lines, one per metric.
    pub fn summary_lines(&self) -> Vec<String> {
        let cpu = |value: Option<f64>| {
            value
                .map(|v| format!("{v:.4}"))
                .unwrap_or_else(|| "NA".to_string())
        };
        vec![
            format!("mode={}", self.strategy),
            format!(
                "producers={} consumers={} capacity={}",
                self.producers, self.consumers, self.capacity
            ),
            format!("target={}", self.target),
            format!("delivered={}", self.delivered),
            format!("produced={}", self.produced),
            format!("rejected_puts={}", self.rejected),
            format!("residual_items={}", self.residual),
            format!("max_occupancy={}", self.max_occupancy),
            format!("elapsed_ms={:.2}", self.elapsed_ms),
            format!("throughput_items_per_s={:.2}", self.throughput()),
            format!("cpu_user_s={}", cpu(self.cpu_user_s)),
            format!("cpu_sys_s={}", cpu(self.cpu_sys_s)),
        ]
    }
}

pub fn audit_lines(audit: &TraceAudit, target: u64) -> Vec<String> {
    vec![
        format!("audit_consumed={}", audit.consumed),
        format!("audit_produced={}", audit.produced),
        format!("audit_duplicates={:?}", audit.duplicates),
        format!("audit_unproduced={:?}", audit.unproduced),
        format!("audit_in_order={}", audit.in_order),
        format!("audit_passed={}", audit.passed(target)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> RunReport {
        RunReport {
            strategy: Strategy::Semaphore,
            producers: 2,
            consumers: 3,
            capacity: 10,
            target: 50,
            produced: 57,
            delivered: 50,
            rejected: 2,
            residual: 5,
            max_occupancy: 10,
            elapsed_ms: 500.0,
            cpu_user_s: None,
            cpu_sys_s: Some(0.25),
        }
    }

    #[test]
    fn summary_lists_terminal_state() {
        let lines = report().summary_lines();
        assert!(lines.contains(&"mode=semaphore".to_string()));
        assert!(lines.contains(&"delivered=50".to_string()));
        assert!(lines.contains(&"throughput_items_per_s=100.00".to_string()));
        assert!(lines.contains(&"cpu_user_s=NA".to_string()));
        assert!(lines.contains(&"cpu_sys_s=0.2500".to_string()));
    }

    #[test]
    fn zero_elapsed_has_zero_throughput() {
        let mut report = report();
        report.elapsed_ms = 0.0;
        assert_eq!(report.throughput(), 0.0);
    }

    #[cfg(unix)]
    #[test]
    fn cpu_times_are_available_on_unix() {
        let (user, sys) = cpu_times_seconds().expect("getrusage failed");
        assert!(user >= 0.0 && sys >= 0.0);
    }
}
