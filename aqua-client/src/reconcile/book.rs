use std::collections::HashSet;

use shared::types::Id;

use crate::Order;

/// What a merge did to the book
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Order was new and is now first
    Inserted,
    /// Known order took the server's status, courier and timestamp
    Updated,
    /// Nothing differed
    Unchanged,
    /// Fetched copy was older than the held one and was discarded
    Stale,
    /// Fetch failed or the push was unreadable; the book was not touched
    Dropped,
}

/// Orders held by the app, newest first, at most one entry per id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBook {
    orders: Vec<Order>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a server listing; later duplicates of an id are ignored
    pub fn from_orders(orders: Vec<Order>) -> Self {
        let mut book = Self::new();
        for order in orders {
            if book.position(order.id).is_none() {
                book.orders.push(order);
            }
        }
        book
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn get(&self, order_id: Id) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == order_id)
    }

    /// Every held order, newest first
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Non-terminal orders
    pub fn active(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(|o| o.status.is_active())
    }

    /// Delivered and cancelled orders
    pub fn history(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(|o| o.status.is_terminal())
    }

    fn position(&self, order_id: Id) -> Option<usize> {
        self.orders.iter().position(|o| o.id == order_id)
    }

    /// Merge a freshly fetched order
    ///
    /// A known order takes status, courier and `updatedAt` from `fetched`
    /// and keeps everything else; an unknown one is prepended. A fetch that
    /// is older than the held copy never overwrites it.
    pub fn merge(&mut self, fetched: Order) -> ApplyOutcome {
        let Some(idx) = self.position(fetched.id) else {
            self.orders.insert(0, fetched);
            return ApplyOutcome::Inserted;
        };

        let held = &mut self.orders[idx];
        if fetched.updated_at < held.updated_at {
            tracing::debug!(
                order_id = held.id,
                held = held.updated_at,
                fetched = fetched.updated_at,
                "Stale order copy ignored"
            );
            return ApplyOutcome::Stale;
        }
        if held.status == fetched.status
            && held.courier == fetched.courier
            && held.courier_aggregator == fetched.courier_aggregator
            && held.updated_at == fetched.updated_at
        {
            return ApplyOutcome::Unchanged;
        }

        held.status = fetched.status;
        held.courier = fetched.courier;
        held.courier_aggregator = fetched.courier_aggregator;
        held.updated_at = fetched.updated_at;
        ApplyOutcome::Updated
    }

    /// Swap the active view for a fresh server listing
    ///
    /// Locally active orders missing from `active` are removed; their final
    /// state arrives with the next history fetch or push. A listed order
    /// whose held copy is newer keeps the held copy.
    pub fn replace_active(&mut self, active: Vec<Order>) {
        let mut orders = Self::from_orders(active).orders;
        for listed in &mut orders {
            if let Some(held) = self.get(listed.id)
                && held.updated_at > listed.updated_at
            {
                *listed = held.clone();
            }
        }
        let fresh: HashSet<Id> = orders.iter().map(|o| o.id).collect();
        orders.extend(
            self.orders
                .drain(..)
                .filter(|o| o.status.is_terminal() && !fresh.contains(&o.id)),
        );
        self.orders = orders;
    }
}
