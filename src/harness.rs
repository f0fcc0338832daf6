//! Producer/consumer workload driver: spawns the threads, stops them at the target and joins them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Instant;

use crate::buffer::{self, BoundedBuffer};
use crate::config::RunConfig;
use crate::error::HarnessError;
use crate::jitter::{JitterSource, TaskJitter};
use crate::log_dev;
use crate::report::{RunReport, cpu_times_seconds};
use crate::trace::EventSink;
use crate::types::{EventKind, Item, ItemId, Role, TaskIndex};

/// Shared once-set flag telling every task to stop.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Set the flag; returns `true` only for the call that actually set it.
    pub fn raise(&self) -> bool {
        !self.0.swap(true, Ordering::SeqCst)
    }
}

/// Identifier allocation and delivery accounting shared by all tasks.
#[derive(Debug)]
pub struct Counters {
    target: u64,
    next_id: AtomicU64,
    claimed: AtomicU64,
    delivered: AtomicU64,
    rejected: AtomicU64,
}

impl Counters {
    pub fn new(target: u64) -> Self {
        Self {
            target,
            next_id: AtomicU64::new(0),
            claimed: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    /// Hand out the next id, or `None` once `target` ids have been issued.
    pub fn allocate_id(&self) -> Option<ItemId> {
        bounded_increment(&self.next_id, self.target)
    }

    /// Reserve one of the `target` deliveries before blocking in `get`.
    pub fn try_claim(&self) -> bool {
        bounded_increment(&self.claimed, self.target).is_some()
    }

    /// Count a completed delivery; returns the new total.
    pub fn record_delivery(&self) -> u64 {
        self.delivered.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::SeqCst);
    }

    pub fn target(&self) -> u64 {
        self.target
    }

    pub fn issued(&self) -> u64 {
        self.next_id.load(Ordering::SeqCst)
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::SeqCst)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::SeqCst)
    }

    pub fn target_reached(&self) -> bool {
        self.delivered() >= self.target
    }
}

/// Increment `counter` unless it already reached `limit`; returns the previous value.
fn bounded_increment(counter: &AtomicU64, limit: u64) -> Option<u64> {
    let mut current = counter.load(Ordering::SeqCst);
    while current < limit {
        match counter.compare_exchange(current, current + 1, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return Some(current),
            Err(next) => current = next,
        }
    }
    None
}

/// Lifecycle of a run; there is no way back to an earlier phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Created,
    Running,
    Draining,
    Joined,
    Reported,
}

/// Everything one producer or consumer thread needs, fixed at spawn time.
struct TaskContext {
    index: TaskIndex,
    role: Role,
    buffer: Arc<dyn BoundedBuffer>,
    stop: StopSignal,
    counters: Arc<Counters>,
    sink: Arc<dyn EventSink>,
    jitter: TaskJitter,
}

impl TaskContext {
    fn should_continue(&self) -> bool {
        !self.stop.is_raised() && !self.counters.target_reached()
    }

    fn notify(&self, kind: EventKind, item: Option<ItemId>) {
        self.sink.notify(self.index, self.role, kind, item);
    }

    /// Raise the stop flag; the first raiser wakes every parked task.
    fn shut_down(&self) {
        if self.stop.raise() {
            log_dev!("HARNESS", "stop raised by {} {}", self.role, self.index);
            self.buffer.close();
        }
    }

    fn run_producer(&mut self) {
        while self.should_continue() {
            let Some(id) = self.counters.allocate_id() else {
                break;
            };
            self.notify(EventKind::Request, Some(id));
            if let Err(item) = self.buffer.put(Item::new(id)) {
                self.counters.record_rejected();
                log_dev!("PRODUCER", "buffer closed, dropping item {}", item.id);
                break;
            }
            self.notify(EventKind::Done, Some(id));
            self.jitter.delay();
        }
    }

    fn run_consumer(&mut self) {
        while self.should_continue() {
            if !self.counters.try_claim() {
                break;
            }
            self.notify(EventKind::Request, None);
            let Some(item) = self.buffer.get() else {
                log_dev!("CONSUMER", "buffer closed while waiting");
                break;
            };
            self.notify(EventKind::Done, Some(item.id));
            if self.counters.record_delivery() >= self.counters.target() {
                self.shut_down();
            }
            self.jitter.delay();
        }
    }

    fn run(mut self) {
        // A panicking task must not leave its peers parked forever.
        let guard = PanicGuard {
            stop: self.stop.clone(),
            buffer: Arc::clone(&self.buffer),
        };
        match self.role {
            Role::Producer => self.run_producer(),
            Role::Consumer => self.run_consumer(),
        }
        drop(guard);
        log_dev!("HARNESS", "{} {} exiting", self.role, self.index);
    }
}

struct PanicGuard {
    stop: StopSignal,
    buffer: Arc<dyn BoundedBuffer>,
}

impl Drop for PanicGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            self.stop.raise();
            self.buffer.close();
        }
    }
}

struct Spawned {
    role: Role,
    index: TaskIndex,
    handle: thread::JoinHandle<()>,
}

/// Owns one run: the buffer, shared counters, stop flag and all task threads.
pub struct Harness {
    config: RunConfig,
    buffer: Arc<dyn BoundedBuffer>,
    sink: Arc<dyn EventSink>,
    counters: Arc<Counters>,
    stop: StopSignal,
    phase: Phase,
}

impl Harness {
    /// Validate the configuration and build the buffer; no thread is started yet.
    pub fn new(config: RunConfig, sink: Arc<dyn EventSink>) -> Result<Self, HarnessError> {
        config.validate()?;
        let buffer = buffer::build(config.strategy, config.capacity)?;
        Ok(Self {
            counters: Arc::new(Counters::new(config.target)),
            stop: StopSignal::new(),
            phase: Phase::Created,
            config,
            buffer,
            sink,
        })
    }

    #[cfg(test)]
    fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, next: Phase) {
        log_dev!("HARNESS", "phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
    }

    /// Raise the stop flag and wake every parked task.
    fn drain(&self) {
        self.stop.raise();
        self.buffer.close();
    }

    fn spawn(
        &self,
        role: Role,
        index: TaskIndex,
        jitter: &JitterSource,
    ) -> Result<Spawned, HarnessError> {
        let context = TaskContext {
            index,
            role,
            buffer: Arc::clone(&self.buffer),
            stop: self.stop.clone(),
            counters: Arc::clone(&self.counters),
            sink: Arc::clone(&self.sink),
            jitter: jitter.for_task(role, index),
        };
        let handle = thread::Builder::new()
            .name(format!("{role}-{index}"))
            .spawn(move || context.run())
            .map_err(|source| HarnessError::Spawn {
                role,
                index,
                source,
            })?;
        Ok(Spawned {
            role,
            index,
            handle,
        })
    }

    fn spawn_all(&self) -> (Vec<Spawned>, Vec<Spawned>, Option<HarnessError>) {
        let jitter = JitterSource::new(self.config.jitter_ms, self.config.seed);
        let mut producers = Vec::with_capacity(self.config.producers);
        let mut consumers = Vec::with_capacity(self.config.consumers);
        for index in 0..self.config.producers {
            match self.spawn(Role::Producer, index, &jitter) {
                Ok(task) => producers.push(task),
                Err(err) => return (producers, consumers, Some(err)),
            }
        }
        for index in 0..self.config.consumers {
            match self.spawn(Role::Consumer, index, &jitter) {
                Ok(task) => consumers.push(task),
                Err(err) => return (producers, consumers, Some(err)),
            }
        }
        (producers, consumers, None)
    }

    /// Join every task, remembering the first one that panicked.
    fn join_all(tasks: Vec<Spawned>, failure: &mut Option<HarnessError>) {
        for task in tasks {
            if task.handle.join().is_err() && failure.is_none() {
                *failure = Some(HarnessError::TaskPanicked {
                    role: task.role,
                    index: task.index,
                });
            }
        }
    }

    /// Drive the workload to the target and join every task before reporting.
    pub fn run(mut self) -> Result<RunReport, HarnessError> {
        let cpu_start = cpu_times_seconds();
        let start = Instant::now();

        let (producers, consumers, mut failure) = self.spawn_all();
        self.enter(Phase::Running);
        if failure.is_some() {
            // Partial spawn: nothing guarantees the target is reachable.
            self.drain();
        }

        // Consumers only exit once every delivery is claimed and done, or the run was stopped.
        Self::join_all(consumers, &mut failure);
        self.enter(Phase::Draining);
        self.drain();
        Self::join_all(producers, &mut failure);
        self.enter(Phase::Joined);

        if let Some(err) = failure {
            return Err(err);
        }

        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        let (cpu_user_s, cpu_sys_s) = match (cpu_start, cpu_times_seconds()) {
            (Some((user_start, sys_start)), Some((user_end, sys_end))) => {
                (Some(user_end - user_start), Some(sys_end - sys_start))
            }
            _ => (None, None),
        };
        let report = RunReport {
            strategy: self.buffer.strategy(),
            producers: self.config.producers,
            consumers: self.config.consumers,
            capacity: self.buffer.capacity(),
            target: self.config.target,
            produced: self.counters.issued(),
            delivered: self.counters.delivered(),
            rejected: self.counters.rejected(),
            residual: self.buffer.len(),
            max_occupancy: self.buffer.max_occupancy(),
            elapsed_ms,
            cpu_user_s,
            cpu_sys_s,
        };
        self.enter(Phase::Reported);
        Ok(report)
    }
}
