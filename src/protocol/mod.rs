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

//! Line-oriented command protocol
//!
//! Decodes whitespace-delimited command lines into typed [`Command`]s and
//! formats trade lines and book snapshots. Command forms:
//!
//! ```text
//! BUY <tif> <price> <qty> <id>
//! SELL <tif> <price> <qty> <id>
//! CANCEL <id>
//! MODIFY <id> <side> <price> <qty>
//! PRINT
//! CLEAR
//! ```
//!
//! `<tif>` is `GFD` or `IOC`; `<price>` and `<qty>` are positive decimal
//! integers (zero is the unset sentinel and is rejected). Malformed lines
//! yield a typed error the caller skips silently: the engine is a
//! latency-critical sink that must not abort on garbage.

use std::io::{self, Write};

use crate::orderbook::BookSnapshot;
use crate::types::{Command, OrderId, Price, Qty, Side, Tif, Trade};

/// Decoding failure for a single command line
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
	#[error("empty command line")]
	EmptyLine,
	#[error("unknown command: {0}")]
	UnknownCommand(String),
	#[error("missing {0} field")]
	MissingField(&'static str),
	#[error("invalid side token: {0}")]
	InvalidSide(String),
	#[error("invalid tif token: {0}")]
	InvalidTif(String),
	#[error("invalid price: {0}")]
	InvalidPrice(String),
	#[error("invalid quantity: {0}")]
	InvalidQty(String),
	#[error("trailing tokens after command")]
	TrailingTokens,
}

/// Decode one command line into a typed message.
pub fn parse_line(line: &str) -> Result<Command, ProtocolError> {
	let mut tokens = line.split_whitespace();
	let verb = tokens.next().ok_or(ProtocolError::EmptyLine)?;

	let cmd = match verb {
		"BUY" => parse_submit(Side::Buy, &mut tokens)?,
		"SELL" => parse_submit(Side::Sell, &mut tokens)?,
		"CANCEL" => Command::Cancel {
			order_id: parse_order_id(&mut tokens)?,
		},
		"MODIFY" => {
			let order_id = parse_order_id(&mut tokens)?;
			let side = parse_side(&mut tokens)?;
			let price = parse_price(&mut tokens)?;
			let qty = parse_qty(&mut tokens)?;
			Command::Modify {
				order_id,
				side,
				price,
				qty,
			}
		}
		"PRINT" => Command::Print,
		"CLEAR" => Command::Clear,
		other => return Err(ProtocolError::UnknownCommand(other.to_string())),
	};

	if tokens.next().is_some() {
		return Err(ProtocolError::TrailingTokens);
	}
	Ok(cmd)
}

fn parse_submit<'a>(
	side: Side,
	tokens: &mut impl Iterator<Item = &'a str>,
) -> Result<Command, ProtocolError> {
	let tif = parse_tif(tokens)?;
	let price = parse_price(tokens)?;
	let qty = parse_qty(tokens)?;
	let order_id = parse_order_id(tokens)?;
	Ok(Command::Submit {
		side,
		tif,
		price,
		qty,
		order_id,
	})
}

fn parse_tif<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Result<Tif, ProtocolError> {
	let token = tokens.next().ok_or(ProtocolError::MissingField("tif"))?;
	match token {
		"GFD" => Ok(Tif::Gfd),
		"IOC" => Ok(Tif::Ioc),
		other => Err(ProtocolError::InvalidTif(other.to_string())),
	}
}

fn parse_side<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Result<Side, ProtocolError> {
	let token = tokens.next().ok_or(ProtocolError::MissingField("side"))?;
	match token {
		"BUY" => Ok(Side::Buy),
		"SELL" => Ok(Side::Sell),
		other => Err(ProtocolError::InvalidSide(other.to_string())),
	}
}

fn parse_price<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Result<Price, ProtocolError> {
	let token = tokens.next().ok_or(ProtocolError::MissingField("price"))?;
	token
		.parse::<Price>()
		.ok()
		.filter(|price| !price.is_zero())
		.ok_or_else(|| ProtocolError::InvalidPrice(token.to_string()))
}

fn parse_qty<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Result<Qty, ProtocolError> {
	let token = tokens.next().ok_or(ProtocolError::MissingField("qty"))?;
	token
		.parse::<Qty>()
		.ok()
		.filter(|qty| !qty.is_zero())
		.ok_or_else(|| ProtocolError::InvalidQty(token.to_string()))
}

fn parse_order_id<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Result<OrderId, ProtocolError> {
	let token = tokens.next().ok_or(ProtocolError::MissingField("id"))?;
	Ok(OrderId::new(token))
}

/// Write one `TRADE` line per fill, in match order.
pub fn write_trades<W: Write>(out: &mut W, trades: &[Trade]) -> io::Result<()> {
	for trade in trades {
		writeln!(out, "{trade}")?;
	}
	Ok(())
}

/// Write a book snapshot: the sell side best (lowest) price first, then
/// the buy side best (highest) price first. Empty sides print their
/// header followed by no level lines.
pub fn write_snapshot<W: Write>(out: &mut W, snapshot: &BookSnapshot) -> io::Result<()> {
	writeln!(out, "SELL:")?;
	for (price, qty) in &snapshot.sells {
		writeln!(out, "{price} {qty}")?;
	}
	writeln!(out, "BUY:")?;
	for (price, qty) in &snapshot.buys {
		writeln!(out, "{price} {qty}")?;
	}
	Ok(())
}
