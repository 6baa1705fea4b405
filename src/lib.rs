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

//! Forge Matching Engine
//!
//! A deterministic, single-instrument limit order matching engine. It
//! consumes a totally ordered stream of order-management commands, applies
//! price-time priority against an in-memory book, and emits trade lines
//! and book snapshots.
//!
//! Architecture:
//! - Single-threaded matching core for deterministic behavior
//! - Arena-allocated orders with intrusive per-level FIFO queues and an
//!   id index for O(1) cancel/modify
//! - Self-match prevention by order id during the match walk
//! - Optional producer/consumer pipeline: a decoding thread feeds the
//!   matching loop through a bounded MPSC command queue

pub mod config;
pub mod engine;
pub mod orderbook;
pub mod processor;
pub mod protocol;
pub mod queue;
pub mod types;

pub use config::EngineConfig;
pub use engine::MatchingEngine;
pub use orderbook::{BookSnapshot, OrderBook};
pub use processor::{CommandProcessor, run_threaded};
pub use protocol::ProtocolError;
pub use queue::{CommandQueue, QueueReceiver, QueueSender};
pub use types::{Command, OrderId, Price, Qty, Side, Tif, Trade};
