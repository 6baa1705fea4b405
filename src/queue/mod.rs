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

use crossbeam::channel::{Receiver, Sender, TryRecvError, bounded};

use crate::types::Command;

/// Command queue crossing the producer/consumer seam
///
/// The queue is the boundary between the decoding producer (reading and
/// parsing input) and the single-threaded matching loop. It preserves a
/// total order: the consumer observes commands exactly in enqueue order.
///
/// Properties:
/// - One producer (the command decoder), one consumer (the matching loop)
/// - Bounded capacity for backpressure; `send` blocks when full
/// - Blocking `recv` with wait/notify semantics, non-blocking `try_recv`
///
/// End-of-input is signalled by dropping the sender. The channel delivers
/// every command already enqueued before reporting disconnection, so the
/// consumer drains the queue and then exits.
pub struct CommandQueue {
	sender: Sender<Command>,
	receiver: Receiver<Command>,
}

impl CommandQueue {
	/// Create a new command queue with the specified capacity.
	pub fn new(capacity: usize) -> Self {
		let (sender, receiver) = bounded(capacity);
		Self { sender, receiver }
	}

	/// Split the queue into its sender and receiver ends.
	///
	/// The receiver must remain unique to the single matching loop.
	pub fn split(self) -> (QueueSender, QueueReceiver) {
		(
			QueueSender {
				sender: self.sender,
			},
			QueueReceiver {
				receiver: self.receiver,
			},
		)
	}
}

/// Sender end of the command queue (held by the decoding producer)
#[derive(Clone)]
pub struct QueueSender {
	sender: Sender<Command>,
}

impl QueueSender {
	/// Enqueue a command, blocking while the queue is full.
	///
	/// Commands are never reordered or dropped under backpressure; the
	/// producer waits for the matching loop to catch up.
	pub fn send(&self, cmd: Command) -> Result<(), QueueError> {
		self.sender.send(cmd).map_err(|_| QueueError::Disconnected)
	}
}

/// Receiver end of the command queue (held by the matching loop)
///
/// Not `Clone`: only one matching loop may consume.
pub struct QueueReceiver {
	receiver: Receiver<Command>,
}

impl QueueReceiver {
	/// Receive the next command, blocking until one is available.
	///
	/// Returns `Disconnected` only after the producer is gone AND every
	/// buffered command has been delivered.
	pub fn recv(&self) -> Result<Command, QueueError> {
		self.receiver.recv().map_err(|_| QueueError::Disconnected)
	}

	/// Receive the next command without blocking.
	pub fn try_recv(&self) -> Result<Command, QueueError> {
		self.receiver.try_recv().map_err(|e| match e {
			TryRecvError::Empty => QueueError::Empty,
			TryRecvError::Disconnected => QueueError::Disconnected,
		})
	}
}

/// Errors that can occur when interacting with the command queue
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
	#[error("Queue is empty")]
	Empty,
	#[error("Queue disconnected")]
	Disconnected,
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::{OrderId, Price, Qty, Side, Tif};

	fn submit(id: &str) -> Command {
		Command::Submit {
			side: Side::Buy,
			tif: Tif::Gfd,
			price: Price(1000),
			qty: Qty(10),
			order_id: OrderId::new(id),
		}
	}

	#[test]
	fn test_send_and_recv() {
		let (sender, receiver) = CommandQueue::new(10).split();

		sender.send(submit("order1")).unwrap();
		sender.send(Command::Print).unwrap();

		assert_eq!(receiver.recv().unwrap(), submit("order1"));
		assert_eq!(receiver.recv().unwrap(), Command::Print);
	}

	#[test]
	fn test_fifo_order_preserved() {
		let (sender, receiver) = CommandQueue::new(64).split();

		for i in 0..32 {
			sender.send(submit(&format!("order{i}"))).unwrap();
		}
		for i in 0..32 {
			assert_eq!(receiver.recv().unwrap(), submit(&format!("order{i}")));
		}
	}

	#[test]
	fn test_drain_after_disconnect() {
		let (sender, receiver) = CommandQueue::new(10).split();

		sender.send(submit("order1")).unwrap();
		sender.send(submit("order2")).unwrap();
		drop(sender);

		// Buffered commands survive the producer; then disconnection.
		assert!(receiver.recv().is_ok());
		assert!(receiver.try_recv().is_ok());
		assert!(matches!(receiver.recv(), Err(QueueError::Disconnected)));
	}

	#[test]
	fn test_try_recv_empty() {
		let (_sender, receiver) = CommandQueue::new(10).split();
		assert!(matches!(receiver.try_recv(), Err(QueueError::Empty)));
	}
}
