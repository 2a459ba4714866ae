//! Per-order updates for order-log feeds.
//!
//! Each order slot moves through `Empty -> Live -> Empty`. The aggregated
//! levels always receive the quantity delta of the slot, so a level holds the
//! sum of the live orders resting at its price.

use super::book::OrderBook;
use super::error::BookError;
use super::registry::{OrderId, OrderInfo, RequestId};
use super::types::{Action, BookSide, QTY_EPSILON, SeqNums, UpdateEffect, UpdatedSides};
use tracing::{debug, error, trace, warn};

/// Outcome of [`OrderBook::apply_order_update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderUpdateResult {
    /// Effect on the aggregated levels
    pub effect: UpdateEffect,
    /// Sides of the aggregated book that changed
    pub sides: UpdatedSides,
    /// New quantity of the order minus its previous quantity
    pub qty_delta: f64,
    /// The resting order as it was before this update (`None` for `New`
    /// and for ignored updates)
    pub order: Option<OrderInfo>,
}

impl OrderUpdateResult {
    /// An update that changed nothing.
    pub const NONE: OrderUpdateResult = OrderUpdateResult {
        effect: UpdateEffect::None,
        sides: UpdatedSides::empty(),
        qty_delta: 0.0,
        order: None,
    };

    /// A rejected update; the book is unchanged.
    pub const ERROR: OrderUpdateResult = OrderUpdateResult {
        effect: UpdateEffect::Error,
        sides: UpdatedSides::empty(),
        qty_delta: 0.0,
        order: None,
    };

    fn changed(effect: UpdateEffect, side: BookSide, qty_delta: f64, order: Option<OrderInfo>) -> Self {
        let sides = if effect == UpdateEffect::None {
            UpdatedSides::empty()
        } else {
            side.as_sides()
        };
        Self {
            effect,
            sides,
            qty_delta,
            order,
        }
    }
}

impl OrderBook {
    /// Apply an order-log update addressed by `order_id`.
    ///
    /// * `New` requires the slot to be empty; a duplicate is an error.
    /// * `Delete`/`Change` of an unknown order is an error when report
    ///   sequences are continuous, and silently ignored otherwise.
    /// * `Change` keeps the stored price (partial fill or quantity
    ///   restatement) unless the venue distinguishes replaces from fills
    ///   (`change_is_part_fill == false`) and a different finite price is
    ///   given; then the order is moved with a single Delete+New step.
    /// * A `Change` to zero quantity empties the slot.
    ///
    /// On `Error` neither the registry nor the levels are modified.
    pub fn apply_order_update(
        &mut self,
        order_id: OrderId,
        action: Action,
        side: BookSide,
        price: f64,
        qty: f64,
        seq: SeqNums,
    ) -> OrderUpdateResult {
        if let Err(err) = self.check_sequence(seq) {
            return OrderUpdateResult {
                effect: self.stale_effect(&err),
                ..OrderUpdateResult::NONE
            };
        }
        match self.apply_order(order_id, action, side, price, qty) {
            Ok(result) => {
                self.record_sequence(seq);
                trace!(
                    "{}: order {} {} {} {} x {} -> {} (delta {})",
                    self.symbol(),
                    order_id,
                    action,
                    side,
                    price,
                    qty,
                    result.effect,
                    result.qty_delta
                );
                result
            }
            Err(err @ BookError::RegistryFull { .. }) => {
                error!("{}: {}", self.symbol(), err);
                OrderUpdateResult::ERROR
            }
            Err(err) => {
                warn!("{}: {}", self.symbol(), err);
                OrderUpdateResult::ERROR
            }
        }
    }

    /// Tag a live (or future) order as one of our own requests.
    ///
    /// Returns `true` when the order is already live.
    ///
    /// # Errors
    /// [`BookError::RegistryDisabled`] for books without an order registry.
    pub fn register_order(
        &mut self,
        order_id: OrderId,
        request: RequestId,
    ) -> Result<bool, BookError> {
        let symbol = self.symbol().to_string();
        let registry = self
            .registry_mut()
            .ok_or(BookError::RegistryDisabled { symbol })?;
        Ok(registry.register_own(order_id, request))
    }

    fn apply_order(
        &mut self,
        order_id: OrderId,
        action: Action,
        side: BookSide,
        price: f64,
        qty: f64,
    ) -> Result<OrderUpdateResult, BookError> {
        let change_is_part_fill = self.config.change_is_part_fill;
        let continuous = self.config.continuous_rpt_seqs;
        let symbol = self.symbol().to_string();
        let registry = self
            .registry
            .as_mut()
            .ok_or(BookError::RegistryDisabled { symbol })?;
        let existing = registry.get(order_id).copied();

        match (action, existing) {
            (Action::New, Some(_)) => Err(BookError::DuplicateOrder { order_id }),
            (Action::New, None) => {
                if !price.is_finite() {
                    return Err(BookError::malformed(format!(
                        "new order {order_id} with non-finite price"
                    )));
                }
                if !qty.is_finite() || qty <= 0.0 {
                    return Err(BookError::malformed(format!(
                        "new order {order_id} with quantity {qty}"
                    )));
                }
                registry.insert(OrderInfo {
                    order_id,
                    price,
                    qty,
                    side,
                    request: None,
                })?;
                let effect = self.adjust_level(side, price, qty, false)?;
                Ok(OrderUpdateResult::changed(effect, side, qty, None))
            }
            (Action::Change | Action::Delete, None) => {
                if continuous {
                    Err(BookError::UnknownOrder { order_id, action })
                } else {
                    debug!("{} for unknown order {} ignored", action, order_id);
                    Ok(OrderUpdateResult::NONE)
                }
            }
            (Action::Delete, Some(old)) => {
                registry.remove(order_id);
                let effect = self.adjust_level(old.side, old.price, -old.qty, false)?;
                Ok(OrderUpdateResult::changed(effect, old.side, -old.qty, Some(old)))
            }
            (Action::Change, Some(old)) => {
                if side != old.side {
                    return Err(BookError::SideMismatch {
                        order_id,
                        stored: old.side,
                        requested: side,
                    });
                }
                if !qty.is_finite() || qty < 0.0 {
                    return Err(BookError::malformed(format!(
                        "change of order {order_id} to quantity {qty}"
                    )));
                }
                let qty_delta = qty - old.qty;

                if qty <= QTY_EPSILON {
                    registry.remove(order_id);
                    let effect = self.adjust_level(old.side, old.price, -old.qty, false)?;
                    return Ok(OrderUpdateResult::changed(effect, old.side, qty_delta, Some(old)));
                }

                let replace = !change_is_part_fill && price.is_finite() && price != old.price;
                if let Some(slot) = registry.get_mut(order_id) {
                    slot.qty = qty;
                    if replace {
                        slot.price = price;
                    }
                }

                let effect = if replace {
                    let mut effect = self.adjust_level(old.side, old.price, -old.qty, false)?;
                    effect.accumulate(self.adjust_level(old.side, price, qty, false)?);
                    effect
                } else {
                    self.adjust_level(old.side, old.price, qty_delta, false)?
                };
                Ok(OrderUpdateResult::changed(effect, old.side, qty_delta, Some(old)))
            }
        }
    }
}
