//! Shared identifiers and the item model passed through the buffer.

use std::fmt;

/// Sequential identifier assigned to an item at production time.
pub type ItemId = u64;
/// Zero-based index of a producer or consumer thread within its role.
pub type TaskIndex = usize;

/// Unit of work carried through the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Item {
    /// Stable identifier for tracing and validation.
    pub id: ItemId,
}

impl Item {
    pub fn new(id: ItemId) -> Self {
        Self { id }
    }
}

/// Which side of the buffer a task works on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Producer,
    Consumer,
}

impl Role {
    /// Single-letter tag used in the trace (`P` / `C`).
    pub fn tag(self) -> char {
        match self {
            Role::Producer => 'P',
            Role::Consumer => 'C',
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Producer => f.write_str("producer"),
            Role::Consumer => f.write_str("consumer"),
        }
    }
}

/// Point in a put/get call that an event marks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// Emitted just before the blocking call.
    Request,
    /// Emitted once the blocking call returned.
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_tags_and_names() {
        assert_eq!(Role::Producer.tag(), 'P');
        assert_eq!(Role::Consumer.tag(), 'C');
        assert_eq!(Role::Consumer.to_string(), "consumer");
    }
}
