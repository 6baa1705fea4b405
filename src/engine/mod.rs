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

use tracing::debug;

use crate::orderbook::{BookSnapshot, OrderBook};
use crate::types::{OrderId, Price, Qty, Side, Tif, Trade};

/// Matching engine applying deterministic price-time priority
///
/// A stateless policy layer over [`OrderBook`]: it owns the book and a
/// reusable trade buffer and sequences match-then-rest for incoming
/// orders. All methods run to completion on the calling thread; the
/// matching loop is the only context that may hold one of these.
///
/// Returned trade slices are valid until the next trade-producing call;
/// the buffer is cleared at the start of each such operation.
#[derive(Debug, Default)]
pub struct MatchingEngine {
	book: OrderBook,
	trades: Vec<Trade>,
}

impl MatchingEngine {
	pub fn new() -> Self {
		Self {
			book: OrderBook::new(),
			trades: Vec::with_capacity(1024),
		}
	}

	pub fn book(&self) -> &OrderBook {
		&self.book
	}

	/// Trades produced by the most recent trade-producing operation.
	pub fn trades(&self) -> &[Trade] {
		&self.trades
	}

	/// Process an incoming order: match against the opposite side, then
	/// rest or discard the residue according to `tif`.
	///
	/// A Gfd residue is added to the book at the order's limit price; an
	/// Ioc residue is discarded. If the id is already live, the match pass
	/// still runs (self-match prevention keeps the resting copy out of its
	/// own fills) and the residue add is rejected by the book.
	pub fn submit(
		&mut self,
		side: Side,
		tif: Tif,
		order_id: OrderId,
		qty: Qty,
		price: Price,
	) -> &[Trade] {
		self.trades.clear();
		let leaves = self
			.book
			.match_order(side, &order_id, qty, price, &mut self.trades);
		if leaves.is_zero() {
			// Fully filled on arrival.
			return &self.trades;
		}

		match tif {
			Tif::Gfd => self.book.add(side, order_id, leaves, price),
			Tif::Ioc => {
				debug!(%order_id, %leaves, "discarding IOC residue");
			}
		}
		&self.trades
	}

	/// Cancel a live order. Unknown ids are a no-op.
	pub fn cancel(&mut self, order_id: &OrderId) {
		self.book.cancel(order_id);
	}

	/// Modify a live order to new terms, matching first.
	///
	/// The match pass runs under the id of the order being modified, so
	/// self-match prevention skips its pre-modification resting copy. If
	/// the new terms are fully consumed by matching, the original resting
	/// order (still occupying its old slot) is cancelled; otherwise the
	/// resting order is relocated to the new placement carrying the leaves
	/// quantity.
	///
	/// A modify naming an id that is not live is a complete no-op: no
	/// match pass runs and no trades are emitted.
	pub fn modify(&mut self, order_id: &OrderId, side: Side, qty: Qty, price: Price) -> &[Trade] {
		self.trades.clear();
		if !self.book.contains(order_id) {
			debug!(%order_id, "unable to modify unknown order");
			return &self.trades;
		}

		let leaves = self
			.book
			.match_order(side, order_id, qty, price, &mut self.trades);
		if leaves.is_zero() {
			// The modified terms were fully consumed; drop the original.
			self.book.cancel(order_id);
		} else {
			self.book.modify(side, order_id, leaves, price);
		}
		&self.trades
	}

	/// Drop all orders from the book.
	pub fn clear(&mut self) {
		self.book.clear();
	}

	/// Snapshot of the current book state.
	pub fn snapshot(&self) -> BookSnapshot {
		self.book.snapshot()
	}
}
