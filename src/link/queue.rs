//! Pending-command ring buffer.
//!
//! Fixed capacity, power of two so indices wrap with a mask. When the
//! ring is full a new push evicts the oldest unread entry instead of
//! blocking the caller — the console must stay responsive even when the
//! adapter is wedged. Evictions are counted so the engine can surface
//! the loss instead of hiding it.

use heapless::String;

use super::{COMMAND_LEN, LinkState};

/// Capacity of the pending-command ring. Power of 2 for mask wrapping.
pub const QUEUE_CAPACITY: usize = 64;

const INDEX_MASK: usize = QUEUE_CAPACITY - 1;

/// A command waiting its turn on the wire, plus the state the engine
/// should enter when it is finally sent. Immutable once enqueued.
#[derive(Debug, Clone)]
pub struct QueuedCommand {
    pub cmd: String<COMMAND_LEN>,
    pub state: LinkState,
}

/// FIFO ring of [`QueuedCommand`]s with overwrite-oldest overflow.
pub struct CommandQueue {
    slots: [Option<QueuedCommand>; QUEUE_CAPACITY],
    write: usize,
    read: usize,
    len: usize,
    dropped: u32,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
            write: 0,
            read: 0,
            len: 0,
            dropped: 0,
        }
    }

    /// Append a command. If the ring is full the oldest unread entry is
    /// evicted first; the return value is `Some(total_dropped)` in that
    /// case so the caller can log and emit the loss.
    pub fn push(&mut self, cmd: QueuedCommand) -> Option<u32> {
        let mut evicted = None;
        if self.len == QUEUE_CAPACITY {
            // Oldest entry loses; the ring never blocks the producer.
            self.slots[self.read] = None;
            self.read = (self.read + 1) & INDEX_MASK;
            self.len -= 1;
            self.dropped += 1;
            evicted = Some(self.dropped);
        }

        self.slots[self.write] = Some(cmd);
        self.write = (self.write + 1) & INDEX_MASK;
        self.len += 1;
        evicted
    }

    /// Remove and return the oldest pending command.
    pub fn pop(&mut self) -> Option<QueuedCommand> {
        if self.len == 0 {
            return None;
        }
        let cmd = self.slots[self.read].take();
        self.read = (self.read + 1) & INDEX_MASK;
        self.len -= 1;
        cmd
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total commands evicted by overflow since boot.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}
