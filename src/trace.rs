//! Timestamped event trace: concurrent sink, CSV export and post-run audit.

use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use serde::Serialize;

use crate::error::TraceError;
use crate::types::{EventKind, ItemId, Role, TaskIndex};

/// Receiver for producer/consumer events; must be cheap and callable from any thread.
pub trait EventSink: Send + Sync {
    fn notify(&self, task: TaskIndex, role: Role, kind: EventKind, item: Option<ItemId>);
}

/// One recorded event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceEvent {
    /// Nanoseconds since the recorder was created.
    pub timestamp_ns: u64,
    pub task: TaskIndex,
    pub role: Role,
    pub kind: EventKind,
    pub item: Option<ItemId>,
}

impl TraceEvent {
    fn label(&self) -> &'static str {
        match (self.role, self.kind) {
            (Role::Producer, EventKind::Request) => "P_REQ",
            (Role::Producer, EventKind::Done) => "P_DONE",
            (Role::Consumer, EventKind::Request) => "C_REQ",
            (Role::Consumer, EventKind::Done) => "C_DONE",
        }
    }
}

#[derive(Serialize)]
struct CsvRow {
    timestamp_ns: u64,
    thread_index: TaskIndex,
    role: char,
    event: &'static str,
    item_id: i64,
}

impl From<&TraceEvent> for CsvRow {
    fn from(event: &TraceEvent) -> Self {
        Self {
            timestamp_ns: event.timestamp_ns,
            thread_index: event.task,
            role: event.role.tag(),
            event: event.label(),
            // Events without an item are written as -1.
            item_id: event.item.map(|id| id as i64).unwrap_or(-1),
        }
    }
}

/// In-memory recorder. Events are kept in the order they were stamped.
pub struct TraceRecorder {
    start: Instant,
    events: Mutex<Vec<TraceEvent>>,
}

impl TraceRecorder {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of all events recorded so far.
    pub fn events(&self) -> Vec<TraceEvent> {
        let guard = self.events.lock().expect("trace mutex poisoned");
        guard.clone()
    }

    /// Write the trace as CSV with a header row.
    pub fn write_csv<W: Write>(&self, out: W) -> Result<(), TraceError> {
        let mut writer = csv::Writer::from_writer(out);
        for event in self.events().iter() {
            writer.serialize(CsvRow::from(event))?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_csv_file(&self, path: &Path) -> Result<(), TraceError> {
        let file = File::create(path)?;
        self.write_csv(file)
    }
}

impl EventSink for TraceRecorder {
    fn notify(&self, task: TaskIndex, role: Role, kind: EventKind, item: Option<ItemId>) {
        let mut guard = self.events.lock().expect("trace mutex poisoned");
        // Stamp under the lock so vector order matches timestamp order.
        let timestamp_ns = self.start.elapsed().as_nanos() as u64;
        guard.push(TraceEvent {
            timestamp_ns,
            task,
            role,
            kind,
            item,
        });
    }
}

/// Delivery checks derived from a finished trace.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TraceAudit {
    /// Items whose `put` completed.
    pub produced: usize,
    /// Items whose `get` completed.
    pub consumed: usize,
    /// Ids consumed more than once.
    pub duplicates: Vec<ItemId>,
    /// Ids consumed without any producer having requested them.
    pub unproduced: Vec<ItemId>,
    /// Whether consumed ids appear in strictly increasing order.
    pub in_order: bool,
}

impl TraceAudit {
    pub fn from_events(events: &[TraceEvent]) -> Self {
        let mut requested = HashSet::new();
        let mut consumed_ids = Vec::new();
        let mut produced = 0;
        for event in events {
            match (event.role, event.kind, event.item) {
                (Role::Producer, EventKind::Request, Some(id)) => {
                    requested.insert(id);
                }
                (Role::Producer, EventKind::Done, Some(_)) => produced += 1,
                (Role::Consumer, EventKind::Done, Some(id)) => consumed_ids.push(id),
                _ => {}
            }
        }

        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        let mut unproduced = Vec::new();
        for &id in &consumed_ids {
            if !seen.insert(id) {
                duplicates.push(id);
            }
            // A C_DONE can be stamped before the matching P_DONE, so check against requests.
            if !requested.contains(&id) {
                unproduced.push(id);
            }
        }

        Self {
            produced,
            consumed: consumed_ids.len(),
            duplicates,
            unproduced,
            in_order: consumed_ids.windows(2).all(|pair| pair[0] < pair[1]),
        }
    }

    /// No loss, no duplication, and exactly `target` deliveries.
    pub fn passed(&self, target: u64) -> bool {
        self.consumed as u64 == target && self.duplicates.is_empty() && self.unproduced.is_empty()
    }
}
