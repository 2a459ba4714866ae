//! Books touched within the current chunk, waiting for notification.

use crate::orderbook::error::BookError;
use crate::orderbook::types::{UpdateEffect, UpdatedSides};
use crate::stats::PipelineTimestamps;

/// Receipt timestamps of one inbound chunk (ns, 0 = not available).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecvTimes {
    /// NIC hardware timestamp
    pub hw_ts: u64,
    /// Socket read
    pub socket_ts: u64,
    /// Handler start
    pub handler_ts: u64,
}

impl RecvTimes {
    /// All three timestamps set to `ts`.
    pub fn at(ts: u64) -> Self {
        Self {
            hw_ts: ts,
            socket_ts: ts,
            handler_ts: ts,
        }
    }

    /// Earliest available receipt timestamp.
    #[inline]
    pub fn receipt_ts(&self) -> u64 {
        if self.hw_ts != 0 {
            self.hw_ts
        } else {
            self.socket_ts
        }
    }
}

/// Accumulated state of one dirty book.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirtyBook {
    /// Index of the book in the connector's book set
    pub book: usize,
    /// Most severe effect seen in this chunk
    pub effect: UpdateEffect,
    /// Sides changed in this chunk
    pub sides: UpdatedSides,
    /// Venue timestamp of the latest entry
    pub exchange_ts: u64,
    /// Receipt timestamps of the latest entry
    pub recv: RecvTimes,
    /// Time the book was last updated
    pub update_ts: u64,
}

impl DirtyBook {
    /// Latency timestamps for a notification at `strategy_ts`.
    pub fn pipeline(&self, strategy_ts: u64) -> PipelineTimestamps {
        PipelineTimestamps {
            hw_ts: self.recv.hw_ts,
            socket_ts: self.recv.socket_ts,
            handler_ts: self.recv.handler_ts,
            book_ts: self.update_ts,
            strategy_ts,
        }
    }
}

/// Bounded list of dirty books in first-dirtied order.
#[derive(Debug)]
pub struct DirtyList {
    entries: Vec<DirtyBook>,
    // book index -> position in `entries`
    positions: Vec<Option<u32>>,
    capacity: usize,
}

impl DirtyList {
    /// Creates a list holding at most `capacity` books.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            positions: Vec::new(),
            capacity,
        }
    }

    /// Folds an update of `book` into the list.
    ///
    /// # Errors
    /// [`BookError::DirtyListFull`] when `book` is not dirty yet and the
    /// list is at capacity; the update is not recorded.
    pub fn mark(
        &mut self,
        book: usize,
        effect: UpdateEffect,
        sides: UpdatedSides,
        exchange_ts: u64,
        recv: RecvTimes,
        update_ts: u64,
    ) -> Result<(), BookError> {
        if let Some(Some(pos)) = self.positions.get(book) {
            let entry = &mut self.entries[*pos as usize];
            entry.effect.accumulate(effect);
            entry.sides |= sides;
            entry.exchange_ts = exchange_ts.max(entry.exchange_ts);
            entry.recv = recv;
            entry.update_ts = update_ts;
            return Ok(());
        }
        if self.entries.len() >= self.capacity {
            return Err(BookError::DirtyListFull {
                capacity: self.capacity,
            });
        }
        if self.positions.len() <= book {
            self.positions.resize(book + 1, None);
        }
        self.positions[book] = Some(self.entries.len() as u32);
        self.entries.push(DirtyBook {
            book,
            effect,
            sides,
            exchange_ts,
            recv,
            update_ts,
        });
        Ok(())
    }

    /// Dirty entry of `book`, if any.
    pub fn get(&self, book: usize) -> Option<&DirtyBook> {
        match self.positions.get(book) {
            Some(Some(pos)) => self.entries.get(*pos as usize),
            _ => None,
        }
    }

    /// Entries in first-dirtied order.
    pub fn iter(&self) -> impl Iterator<Item = &DirtyBook> + '_ {
        self.entries.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut DirtyBook> + '_ {
        self.entries.iter_mut()
    }

    /// Number of dirty books.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forgets every entry.
    pub fn clear(&mut self) {
        for entry in &self.entries {
            self.positions[entry.book] = None;
        }
        self.entries.clear();
    }
}
