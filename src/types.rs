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

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
	Buy,
	Sell,
}

impl Side {
	/// The side an aggressive order matches against.
	pub fn opposite(self) -> Side {
		match self {
			Side::Buy => Side::Sell,
			Side::Sell => Side::Buy,
		}
	}
}

impl fmt::Display for Side {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Side::Buy => f.write_str("BUY"),
			Side::Sell => f.write_str("SELL"),
		}
	}
}

/// Time in force
///
/// `Gfd` (good for day) orders rest on the book after matching any
/// crossing quantity. `Ioc` (immediate or cancel) orders never rest;
/// unmatched quantity is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tif {
	Gfd,
	Ioc,
}

impl fmt::Display for Tif {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Tif::Gfd => f.write_str("GFD"),
			Tif::Ioc => f.write_str("IOC"),
		}
	}
}

/// Limit price as an unsigned integer number of ticks.
///
/// A wrapper rather than a bare `u64` so prices and quantities cannot be
/// mixed up at call sites. Zero never occurs in a validated command; the
/// decoder rejects it.
#[derive(
	Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(pub u64);

impl Price {
	pub fn is_zero(self) -> bool {
		self.0 == 0
	}

	pub fn checked_add(self, rhs: Price) -> Option<Price> {
		self.0.checked_add(rhs.0).map(Price)
	}

	pub fn checked_sub(self, rhs: Price) -> Option<Price> {
		self.0.checked_sub(rhs.0).map(Price)
	}

	pub fn saturating_sub(self, rhs: Price) -> Price {
		Price(self.0.saturating_sub(rhs.0))
	}
}

impl fmt::Display for Price {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

impl FromStr for Price {
	type Err = std::num::ParseIntError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		s.parse::<u64>().map(Price)
	}
}

/// Order quantity as an unsigned integer number of units.
///
/// Zero means "fully consumed" inside the book and triggers removal;
/// commands carrying a zero quantity are rejected by the decoder.
/// Subtraction is only legal when the minuend dominates, which the book's
/// fill bookkeeping guarantees.
#[derive(
	Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Qty(pub u64);

impl Qty {
	pub const ZERO: Qty = Qty(0);

	pub fn is_zero(self) -> bool {
		self.0 == 0
	}

	pub fn min(self, rhs: Qty) -> Qty {
		Qty(self.0.min(rhs.0))
	}

	pub fn checked_add(self, rhs: Qty) -> Option<Qty> {
		self.0.checked_add(rhs.0).map(Qty)
	}

	pub fn checked_sub(self, rhs: Qty) -> Option<Qty> {
		self.0.checked_sub(rhs.0).map(Qty)
	}

	pub fn saturating_add(self, rhs: Qty) -> Qty {
		Qty(self.0.saturating_add(rhs.0))
	}

	pub fn saturating_sub(self, rhs: Qty) -> Qty {
		Qty(self.0.saturating_sub(rhs.0))
	}
}

impl std::ops::AddAssign for Qty {
	fn add_assign(&mut self, rhs: Qty) {
		debug_assert!(self.0.checked_add(rhs.0).is_some());
		self.0 = self.0.saturating_add(rhs.0);
	}
}

impl std::ops::SubAssign for Qty {
	fn sub_assign(&mut self, rhs: Qty) {
		debug_assert!(self.0 >= rhs.0);
		self.0 = self.0.saturating_sub(rhs.0);
	}
}

impl fmt::Display for Qty {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

impl FromStr for Qty {
	type Err = std::num::ParseIntError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		s.parse::<u64>().map(Qty)
	}
}

/// Opaque order identity.
///
/// Two orders are the same order iff their identifiers compare equal. The
/// identifier is an arbitrary-length token; a fixed-size inline form would
/// avoid allocations if the venue bounded the length.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
	pub fn new(value: impl Into<String>) -> Self {
		OrderId(value.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Display for OrderId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for OrderId {
	fn from(value: &str) -> Self {
		OrderId(value.to_string())
	}
}

/// Validated order-management command
///
/// This is the typed form a decoded input line takes before it enters the
/// matching pipeline. Field invariants (non-zero price/qty, non-empty id)
/// are established by the decoder; the engine trusts them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
	/// Submit a new order
	Submit {
		side: Side,
		tif: Tif,
		price: Price,
		qty: Qty,
		order_id: OrderId,
	},
	/// Cancel a live order
	Cancel { order_id: OrderId },
	/// Modify a live order; side/price/qty are the new terms
	Modify {
		order_id: OrderId,
		side: Side,
		price: Price,
		qty: Qty,
	},
	/// Emit a book snapshot
	Print,
	/// Drop all orders
	Clear,
}

/// Trade from matching a passive resting order with an aggressive order
///
/// One record per fill. `qty` is the fill size; by convention the printed
/// line shows it in both the passive and aggressive quantity columns, so a
/// trade reads symmetrically. The passive order's remaining quantity in the
/// book is unaffected by that display normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
	pub passive_order_id: OrderId,
	pub passive_price: Price,
	pub aggressive_order_id: OrderId,
	pub aggressive_price: Price,
	pub qty: Qty,
}

impl fmt::Display for Trade {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"TRADE {} {} {} {} {} {}",
			self.passive_order_id,
			self.passive_price,
			self.qty,
			self.aggressive_order_id,
			self.aggressive_price,
			self.qty,
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_price_ordering() {
		assert!(Price(900) < Price(1000));
		assert_eq!(Price(1000), Price(1000));
		assert!(Price(1010) > Price(1000));
	}

	#[test]
	fn test_qty_arithmetic() {
		let mut qty = Qty(15);
		qty -= Qty(10);
		assert_eq!(qty, Qty(5));
		assert_eq!(Qty(5).checked_sub(Qty(10)), None);
		assert_eq!(Qty(5).saturating_sub(Qty(10)), Qty::ZERO);
		assert_eq!(Qty(5).min(Qty(3)), Qty(3));
	}

	#[test]
	fn test_parse_scalars() {
		assert_eq!("1000".parse::<Price>().unwrap(), Price(1000));
		assert_eq!("10".parse::<Qty>().unwrap(), Qty(10));
		assert!("abc".parse::<Price>().is_err());
		assert!("-5".parse::<Qty>().is_err());
	}

	#[test]
	fn test_side_opposite() {
		assert_eq!(Side::Buy.opposite(), Side::Sell);
		assert_eq!(Side::Sell.opposite(), Side::Buy);
	}

	#[test]
	fn test_trade_display() {
		let trade = Trade {
			passive_order_id: "order1".into(),
			passive_price: Price(1000),
			aggressive_order_id: "order2".into(),
			aggressive_price: Price(900),
			qty: Qty(10),
		};
		assert_eq!(trade.to_string(), "TRADE order1 1000 10 order2 900 10");
	}
}
