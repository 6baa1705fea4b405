// Copyright 2025 itscheems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use hashbrown::HashMap;
use serde::Serialize;
use slab::Slab;
use tracing::debug;

use crate::types::{OrderId, Price, Qty, Side, Trade};

/// Stable index of an order node in the book's arena.
type OrderHandle = usize;

/// Resting order node.
///
/// Nodes live in a slab arena and form an intrusive doubly-linked FIFO
/// queue per price level; `prev`/`next` are arena indices. `side` and
/// `price` locate the containing level so the book can reach it without
/// searching. The links are private to the book and always coherent with
/// the order's actual residence.
#[derive(Debug)]
struct OrderNode {
	order_id: OrderId,
	qty: Qty,
	side: Side,
	price: Price,
	prev: Option<OrderHandle>,
	next: Option<OrderHandle>,
}

/// Price level in the order book
///
/// A price level holds all orders at a specific price in time priority
/// order (first-in-first-out) as an intrusive list over the book's arena,
/// and caches the aggregate quantity of its queue.
#[derive(Debug, Default)]
struct Level {
	head: Option<OrderHandle>,
	tail: Option<OrderHandle>,
	total_qty: Qty,
	len: usize,
}

impl Level {
	fn is_empty(&self) -> bool {
		self.len == 0
	}
}

/// Book snapshot: per-level aggregates, best price first on each side
/// (lowest first for sells, highest first for buys).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookSnapshot {
	pub sells: Vec<(Price, Qty)>,
	pub buys: Vec<(Price, Qty)>,
}

/// Limit order book for a single instrument (single-threaded)
///
/// Deterministic, single-threaded implementation using BTreeMap for
/// price-sorted levels. All operations are designed to be called from one
/// thread (the matching loop).
///
/// Design characteristics:
/// - No concurrent access (no locks, no Arc)
/// - Price-time priority enforced
/// - Buy side: highest price first (descending order via Reverse wrapper)
/// - Sell side: lowest price first (ascending order, natural BTreeMap order)
/// - Orders are arena-allocated; the id index and the per-level queue links
///   both resolve an order in O(1)
///
/// Duplicate ids on `add` and unknown ids on `cancel`/`modify` are
/// tolerated as no-ops: the book is a sink that must not abort on garbage.
#[derive(Debug, Default)]
pub struct OrderBook {
	/// Buy side: price (high to low) -> Level
	bids: BTreeMap<Reverse<Price>, Level>,
	/// Sell side: price (low to high) -> Level
	asks: BTreeMap<Price, Level>,
	/// Arena owning every resting order
	orders: Slab<OrderNode>,
	/// Order id -> arena handle for O(1) lookup
	index: HashMap<OrderId, OrderHandle>,
}

impl OrderBook {
	pub fn new() -> Self {
		Self::default()
	}

	/// Pre-allocate capacity for the expected number of live orders.
	pub fn reserve(&mut self, orders: usize) {
		self.orders.reserve(orders);
		self.index.reserve(orders);
	}

	/// Add a resting order at `price` on `side`, at the tail of its level.
	///
	/// An id that is already live anywhere in the book is rejected as a
	/// no-op.
	pub fn add(&mut self, side: Side, order_id: OrderId, qty: Qty, price: Price) {
		if self.index.contains_key(&order_id) {
			debug!(%order_id, "rejecting duplicate order id");
			return;
		}

		let handle = self.orders.insert(OrderNode {
			order_id: order_id.clone(),
			qty,
			side,
			price,
			prev: None,
			next: None,
		});
		self.index.insert(order_id, handle);
		self.link_tail(handle);
	}

	/// Cancel a live order, removing its level if the queue empties.
	///
	/// Unknown ids are a no-op.
	pub fn cancel(&mut self, order_id: &OrderId) {
		let Some(handle) = self.index.remove(order_id) else {
			debug!(%order_id, "unable to cancel unknown order");
			return;
		};
		self.unlink(handle);
		self.orders.remove(handle);
	}

	/// Modify a live order to the given side, quantity and price.
	///
	/// An identical modify (same side, price and quantity) is a strict
	/// no-op that keeps queue position. Any other modify at the same
	/// placement reassigns the quantity AND moves the order to the tail of
	/// its queue: priority is forfeited even on a pure quantity change. A
	/// side or price change splices the order to the tail of the
	/// destination level, creating it on demand and dropping the old level
	/// if emptied; the order keeps its identity and arena handle.
	///
	/// Relocation never trades by itself; the matching layer runs a match
	/// pass first when the new terms could cross.
	pub fn modify(&mut self, side: Side, order_id: &OrderId, qty: Qty, price: Price) {
		let Some(&handle) = self.index.get(order_id) else {
			debug!(%order_id, "unable to modify unknown order");
			return;
		};

		let node = &self.orders[handle];
		if node.side == side && node.price == price {
			if node.qty == qty {
				return; // No change.
			}
			// Same placement: requantize and forfeit queue position.
			self.set_qty(handle, qty);
			self.move_to_tail(handle);
		} else {
			// New side or price: splice into the destination queue.
			self.unlink(handle);
			let node = &mut self.orders[handle];
			node.side = side;
			node.price = price;
			node.qty = qty;
			self.link_tail(handle);
		}
	}

	/// Drop both sides and the id index.
	pub fn clear(&mut self) {
		self.bids.clear();
		self.asks.clear();
		self.orders.clear();
		self.index.clear();
	}

	/// Match an aggressive order against the opposite side of the book.
	///
	/// Walks the opposite side from the best price outward (asks ascending
	/// for an aggressive buy, bids descending for an aggressive sell),
	/// stopping at the first level whose price is not compatible with
	/// `price`. Within a level orders fill FIFO. A resting order whose id
	/// equals `order_id` is skipped without trading (self-match
	/// prevention), which lets a modify re-price across the spread without
	/// trading against its own pre-modification residue.
	///
	/// One `Trade` is appended per fill, in price- then time-priority
	/// order, carrying the fill size as its single quantity. After the
	/// walk the fills are applied: fully consumed passive orders are
	/// cancelled (their level removed if emptied); partially filled ones
	/// are reduced in place and keep their queue position.
	///
	/// The aggressive order is never added to the book here; resting the
	/// residue is the caller's decision. Returns the leaves quantity.
	pub fn match_order(
		&mut self,
		side: Side,
		order_id: &OrderId,
		qty: Qty,
		price: Price,
		trades: &mut Vec<Trade>,
	) -> Qty {
		let compatible: fn(Price, Price) -> bool = match side {
			Side::Buy => |order, level| order >= level,
			Side::Sell => |order, level| order <= level,
		};

		let mut leaves = qty;
		let mut fills: Vec<(OrderHandle, Qty)> = Vec::new();

		{
			let levels: Box<dyn Iterator<Item = (Price, &Level)> + '_> = match side {
				Side::Buy => Box::new(self.asks.iter().map(|(&p, l)| (p, l))),
				Side::Sell => Box::new(self.bids.iter().map(|(&Reverse(p), l)| (p, l))),
			};

			'levels: for (level_price, level) in levels {
				if !compatible(price, level_price) {
					break;
				}

				let mut cursor = level.head;
				while let Some(handle) = cursor {
					let node = &self.orders[handle];
					cursor = node.next;

					// Prevent self-match: a modify must not trade with its
					// own pre-modification resting copy.
					if node.order_id == *order_id {
						continue;
					}

					let fill = leaves.min(node.qty);
					trades.push(Trade {
						passive_order_id: node.order_id.clone(),
						passive_price: level_price,
						aggressive_order_id: order_id.clone(),
						aggressive_price: price,
						qty: fill,
					});
					fills.push((handle, fill));

					leaves -= fill;
					if leaves.is_zero() {
						break 'levels;
					}
				}
			}
		}

		self.apply_fills(&fills);
		leaves
	}

	/// Best (highest) bid price.
	pub fn best_bid(&self) -> Option<Price> {
		self.bids.keys().next().map(|key| key.0)
	}

	/// Best (lowest) ask price.
	pub fn best_ask(&self) -> Option<Price> {
		self.asks.keys().next().copied()
	}

	/// Whether `order_id` is live in the book.
	pub fn contains(&self, order_id: &OrderId) -> bool {
		self.index.contains_key(order_id)
	}

	/// Remaining quantity of a live order.
	pub fn order_qty(&self, order_id: &OrderId) -> Option<Qty> {
		self.index
			.get(order_id)
			.map(|&handle| self.orders[handle].qty)
	}

	/// Aggregate resting quantity at a specific price level.
	pub fn level_qty(&self, side: Side, price: Price) -> Option<Qty> {
		match side {
			Side::Buy => self.bids.get(&Reverse(price)).map(|l| l.total_qty),
			Side::Sell => self.asks.get(&price).map(|l| l.total_qty),
		}
	}

	/// Total number of live orders in the book.
	pub fn order_count(&self) -> usize {
		self.index.len()
	}

	/// Per-level aggregates on one side, best price first.
	pub fn depth(&self, side: Side) -> Vec<(Price, Qty)> {
		match side {
			Side::Buy => self
				.bids
				.iter()
				.map(|(&Reverse(price), level)| (price, level.total_qty))
				.collect(),
			Side::Sell => self
				.asks
				.iter()
				.map(|(&price, level)| (price, level.total_qty))
				.collect(),
		}
	}

	/// Snapshot of both sides for printing or inspection.
	pub fn snapshot(&self) -> BookSnapshot {
		BookSnapshot {
			sells: self.depth(Side::Sell),
			buys: self.depth(Side::Buy),
		}
	}

	/// Ids at one level in queue (time priority) order. Test support.
	#[cfg(test)]
	fn queue_at(&self, side: Side, price: Price) -> Vec<OrderId> {
		let level = match side {
			Side::Buy => self.bids.get(&Reverse(price)),
			Side::Sell => self.asks.get(&price),
		};
		let mut ids = Vec::new();
		let mut cursor = level.and_then(|l| l.head);
		while let Some(handle) = cursor {
			let node = &self.orders[handle];
			ids.push(node.order_id.clone());
			cursor = node.next;
		}
		ids
	}

	fn level_mut(&mut self, side: Side, price: Price) -> Option<&mut Level> {
		match side {
			Side::Buy => self.bids.get_mut(&Reverse(price)),
			Side::Sell => self.asks.get_mut(&price),
		}
	}

	/// Append a node to the tail of the level at its (side, price),
	/// creating the level on demand and updating the cached total.
	fn link_tail(&mut self, handle: OrderHandle) {
		let (side, price, qty) = {
			let node = &self.orders[handle];
			(node.side, node.price, node.qty)
		};

		let prev_tail = {
			let level = match side {
				Side::Buy => self.bids.entry(Reverse(price)).or_default(),
				Side::Sell => self.asks.entry(price).or_default(),
			};
			level.tail
		};

		if let Some(tail) = prev_tail {
			self.orders[tail].next = Some(handle);
		}
		{
			let node = &mut self.orders[handle];
			node.prev = prev_tail;
			node.next = None;
		}

		if let Some(level) = self.level_mut(side, price) {
			if prev_tail.is_none() {
				level.head = Some(handle);
			}
			level.tail = Some(handle);
			level.len += 1;
			level.total_qty += qty;
		}
	}

	/// Detach a node from its level queue, dropping the level if emptied.
	/// The node stays in the arena and the id index.
	fn unlink(&mut self, handle: OrderHandle) {
		let (side, price, qty, prev, next) = {
			let node = &self.orders[handle];
			(node.side, node.price, node.qty, node.prev, node.next)
		};

		if let Some(prev) = prev {
			self.orders[prev].next = next;
		}
		if let Some(next) = next {
			self.orders[next].prev = prev;
		}

		let mut remove_level = false;
		if let Some(level) = self.level_mut(side, price) {
			if prev.is_none() {
				level.head = next;
			}
			if next.is_none() {
				level.tail = prev;
			}
			level.len -= 1;
			level.total_qty -= qty;
			remove_level = level.is_empty();
		}
		if remove_level {
			match side {
				Side::Buy => self.bids.remove(&Reverse(price)),
				Side::Sell => self.asks.remove(&price),
			};
		}
	}

	/// Replace a node's quantity in place; the order keeps its queue
	/// position and the level total tracks the change.
	fn set_qty(&mut self, handle: OrderHandle, qty: Qty) {
		let (side, price, old_qty) = {
			let node = &self.orders[handle];
			(node.side, node.price, node.qty)
		};
		self.orders[handle].qty = qty;
		if let Some(level) = self.level_mut(side, price) {
			level.total_qty -= old_qty;
			level.total_qty += qty;
		}
	}

	/// Move a node to the tail of its queue, forfeiting time priority.
	fn move_to_tail(&mut self, handle: OrderHandle) {
		let (side, price) = {
			let node = &self.orders[handle];
			(node.side, node.price)
		};
		let already_tail = self
			.level_mut(side, price)
			.is_none_or(|level| level.tail == Some(handle));
		if already_tail {
			return;
		}
		// The level survives the unlink since another order holds the tail.
		self.unlink(handle);
		self.link_tail(handle);
	}

	/// Apply the fills recorded by a match walk: cancel fully consumed
	/// passive orders, reduce partially filled ones in place.
	fn apply_fills(&mut self, fills: &[(OrderHandle, Qty)]) {
		for &(handle, fill) in fills {
			let remaining = self.orders[handle].qty.saturating_sub(fill);
			if remaining.is_zero() {
				self.unlink(handle);
				let node = self.orders.remove(handle);
				self.index.remove(&node.order_id);
			} else {
				self.set_qty(handle, remaining);
			}
		}
	}

	/// Check the book's structural invariants, panicking on violation.
	///
	/// - every indexed id resolves to a node whose id matches,
	/// - every level queue is non-empty, correctly linked, and its cached
	///   total equals the sum of its order quantities,
	/// - every node's (side, price) agree with the level that holds it,
	/// - arena population equals index population (no orphans),
	/// - the book is uncrossed.
	pub fn assert_invariants(&self) {
		for (order_id, &handle) in &self.index {
			let node = self
				.orders
				.get(handle)
				.unwrap_or_else(|| panic!("dangling handle for {order_id}"));
			assert_eq!(&node.order_id, order_id, "index id mismatch");
		}
		assert_eq!(self.orders.len(), self.index.len(), "orphaned arena node");

		let walk = |price: Price, side: Side, level: &Level| {
			assert!(!level.is_empty(), "empty level present at {price}");
			let mut sum = Qty::ZERO;
			let mut count = 0usize;
			let mut prev: Option<OrderHandle> = None;
			let mut cursor = level.head;
			while let Some(handle) = cursor {
				let node = &self.orders[handle];
				assert_eq!(node.side, side, "side mismatch at {price}");
				assert_eq!(node.price, price, "level back-link mismatch at {price}");
				assert_eq!(node.prev, prev, "broken prev link at {price}");
				assert!(!node.qty.is_zero(), "zero qty order at {price}");
				assert!(self.index.contains_key(&node.order_id), "unindexed order");
				sum = sum.saturating_add(node.qty);
				count += 1;
				prev = cursor;
				cursor = node.next;
			}
			assert_eq!(level.tail, prev, "broken tail link at {price}");
			assert_eq!(level.len, count, "queue length mismatch at {price}");
			assert_eq!(level.total_qty, sum, "cached qty mismatch at {price}");
		};

		for (&Reverse(price), level) in &self.bids {
			walk(price, Side::Buy, level);
		}
		for (&price, level) in &self.asks {
			walk(price, Side::Sell, level);
		}

		if let (Some(bid), Some(ask)) = (self.best_bid(), self.best_ask()) {
			assert!(bid < ask, "book is crossed: {bid} >= {ask}");
		}
	}
}
