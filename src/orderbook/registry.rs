//! Per-order slot table for order-log feeds.
//!
//! Orders live in a fixed-capacity arena; an id → index map resolves the
//! venue order id and a free list recycles emptied slots, so steady-state
//! updates do not allocate. When every slot is taken a `New` is rejected.

use super::error::BookError;
use super::types::BookSide;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Venue-assigned (or adapter-synthesized) order identifier, unique per book.
pub type OrderId = u64;

/// Handle of an own order request in the order-management layer.
pub type RequestId = u64;

/// State of a live order slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrderInfo {
    /// Venue order id
    pub order_id: OrderId,
    /// Resting price
    pub price: f64,
    /// Remaining quantity, always positive while live
    pub qty: f64,
    /// Side of the book the order rests on
    pub side: BookSide,
    /// Own request this order belongs to, if registered
    pub request: Option<RequestId>,
}

impl OrderInfo {
    /// True when the order was registered as one of our own.
    #[must_use]
    #[inline]
    pub fn is_own(&self) -> bool {
        self.request.is_some()
    }
}

/// Fixed-capacity table of live orders.
#[derive(Debug)]
pub struct OrderRegistry {
    slots: Vec<OrderInfo>,
    free: Vec<u32>,
    index: HashMap<OrderId, u32>,
    pending_own: HashMap<OrderId, RequestId>,
    capacity: usize,
}

impl OrderRegistry {
    /// Creates a registry able to hold `capacity` live orders.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            index: HashMap::with_capacity(capacity),
            pending_own: HashMap::new(),
            capacity,
        }
    }

    /// Maximum number of live orders.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True when no order is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Looks up a live order.
    #[must_use]
    pub fn get(&self, order_id: OrderId) -> Option<&OrderInfo> {
        self.index
            .get(&order_id)
            .map(|&idx| &self.slots[idx as usize])
    }

    pub(crate) fn get_mut(&mut self, order_id: OrderId) -> Option<&mut OrderInfo> {
        match self.index.get(&order_id) {
            Some(&idx) => Some(&mut self.slots[idx as usize]),
            None => None,
        }
    }

    /// Stores a new live order.
    ///
    /// A request registered earlier through [`Self::register_own`] is
    /// attached to the slot.
    ///
    /// # Errors
    /// [`BookError::DuplicateOrder`] if the id is already live,
    /// [`BookError::RegistryFull`] if no slot is free.
    pub fn insert(&mut self, mut info: OrderInfo) -> Result<(), BookError> {
        if self.index.contains_key(&info.order_id) {
            return Err(BookError::DuplicateOrder {
                order_id: info.order_id,
            });
        }
        if let Some(request) = self.pending_own.remove(&info.order_id) {
            info.request = Some(request);
        }
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx as usize] = info;
                idx
            }
            None if self.slots.len() < self.capacity => {
                self.slots.push(info);
                (self.slots.len() - 1) as u32
            }
            None => {
                return Err(BookError::RegistryFull {
                    capacity: self.capacity,
                    order_id: info.order_id,
                });
            }
        };
        self.index.insert(info.order_id, idx);
        trace!("registry insert {} -> slot {}", info.order_id, idx);
        Ok(())
    }

    /// Empties the slot of a live order and returns its last state.
    pub fn remove(&mut self, order_id: OrderId) -> Option<OrderInfo> {
        let idx = self.index.remove(&order_id)?;
        self.free.push(idx);
        Some(self.slots[idx as usize])
    }

    /// Marks `order_id` as belonging to the own request `request`.
    ///
    /// If the order is not live yet the association is kept until its `New`
    /// arrives. Returns `true` when a live slot was tagged immediately.
    pub fn register_own(&mut self, order_id: OrderId, request: RequestId) -> bool {
        match self.get_mut(order_id) {
            Some(info) => {
                info.request = Some(request);
                true
            }
            None => {
                debug!("order {} not live yet, parking request {}", order_id, request);
                self.pending_own.insert(order_id, request);
                false
            }
        }
    }

    /// Own request associated with `order_id`, live or still pending.
    #[must_use]
    pub fn own_request(&self, order_id: OrderId) -> Option<RequestId> {
        self.get(order_id)
            .and_then(|info| info.request)
            .or_else(|| self.pending_own.get(&order_id).copied())
    }

    /// Forgets an own-order association.
    pub fn unregister_own(&mut self, order_id: OrderId) {
        self.pending_own.remove(&order_id);
        if let Some(info) = self.get_mut(order_id) {
            info.request = None;
        }
    }

    /// Iterates over live orders in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &OrderInfo> + '_ {
        self.index.values().map(move |&idx| &self.slots[idx as usize])
    }

    /// Removes every live order on `side` whose price satisfies `pred`.
    /// Returns the number of orders removed.
    pub(crate) fn purge<F>(&mut self, side: BookSide, mut pred: F) -> usize
    where
        F: FnMut(f64) -> bool,
    {
        let doomed: Vec<OrderId> = self
            .iter()
            .filter(|info| info.side == side && pred(info.price))
            .map(|info| info.order_id)
            .collect();
        for order_id in &doomed {
            if let Some(OrderInfo {
                request: Some(request),
                ..
            }) = self.remove(*order_id)
            {
                self.pending_own.insert(*order_id, request);
            }
        }
        doomed.len()
    }

    /// Drops every live order.
    ///
    /// Own requests of live orders are parked again, together with the
    /// pending registrations, so a re-sent `New` for the same id (snapshot
    /// refresh, book correction) is still recognized as ours.
    pub fn clear(&mut self) {
        for &idx in self.index.values() {
            let info = &self.slots[idx as usize];
            if let Some(request) = info.request {
                self.pending_own.insert(info.order_id, request);
            }
        }
        self.index.clear();
        self.slots.clear();
        self.free.clear();
    }
}
