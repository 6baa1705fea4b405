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

//! Command stream drivers
//!
//! Pulls command lines from an input stream, decodes them, dispatches to
//! the matching engine, and writes trade lines and snapshots to the output
//! sink. Two pipelines are provided: an inline single-threaded loop, and a
//! producer/consumer pair where decoding and matching run on separate
//! threads joined by the command queue.

use std::io::{self, BufRead, Write};
use std::thread;

use tracing::{debug, error, info};

use crate::engine::MatchingEngine;
use crate::protocol;
use crate::queue::CommandQueue;
use crate::types::Command;

/// Inline command processor
///
/// Owns the engine and the output sink; every command is decoded and
/// executed to completion on the calling thread, so output order is
/// causally consistent with book mutations. Malformed lines are skipped
/// silently.
pub struct CommandProcessor<W: Write> {
	engine: MatchingEngine,
	out: W,
}

impl<W: Write> CommandProcessor<W> {
	pub fn new(out: W) -> Self {
		Self {
			engine: MatchingEngine::new(),
			out,
		}
	}

	/// Process the input stream to exhaustion.
	pub fn run<R: BufRead>(&mut self, input: R) -> io::Result<()> {
		for line in input.lines() {
			let line = line?;
			match protocol::parse_line(&line) {
				Ok(cmd) => self.dispatch(cmd)?,
				Err(err) => debug!(%err, line, "skipping malformed command"),
			}
		}
		self.out.flush()
	}

	/// Execute one command and write whatever it produced.
	pub fn dispatch(&mut self, cmd: Command) -> io::Result<()> {
		match cmd {
			Command::Submit {
				side,
				tif,
				price,
				qty,
				order_id,
			} => {
				let trades = self.engine.submit(side, tif, order_id, qty, price);
				protocol::write_trades(&mut self.out, trades)
			}
			Command::Cancel { order_id } => {
				self.engine.cancel(&order_id);
				Ok(())
			}
			Command::Modify {
				order_id,
				side,
				price,
				qty,
			} => {
				let trades = self.engine.modify(&order_id, side, qty, price);
				protocol::write_trades(&mut self.out, trades)
			}
			Command::Print => protocol::write_snapshot(&mut self.out, &self.engine.snapshot()),
			Command::Clear => {
				self.engine.clear();
				Ok(())
			}
		}
	}
}

/// Run the pipeline with decoding and matching on separate threads.
///
/// The calling thread is the producer: it reads and parses input, pushing
/// commands into a bounded queue (blocking under backpressure, so nothing
/// is dropped or reordered). The matching loop consumes commands strictly
/// in enqueue order and owns both the book and the output sink. When input
/// is exhausted the producer drops its sender; the consumer drains the
/// buffered commands and exits.
pub fn run_threaded<R, W>(input: R, out: W, queue_capacity: usize) -> io::Result<()>
where
	R: BufRead,
	W: Write + Send,
{
	thread::scope(|scope| {
		let (sender, receiver) = CommandQueue::new(queue_capacity).split();

		let consumer = thread::Builder::new()
			.name("matching-loop".to_string())
			.spawn_scoped(scope, move || -> io::Result<()> {
				info!("matching loop started");
				let mut processor = CommandProcessor::new(out);
				// recv keeps delivering buffered commands after the
				// producer disconnects, so this loop drains the queue
				// before it observes end-of-input.
				while let Ok(cmd) = receiver.recv() {
					processor.dispatch(cmd)?;
				}
				processor.out.flush()?;
				info!("matching loop stopped");
				Ok(())
			})?;

		for line in input.lines() {
			let line = line?;
			match protocol::parse_line(&line) {
				Ok(cmd) => {
					if sender.send(cmd).is_err() {
						// Consumer is gone; its join result carries the cause.
						break;
					}
				}
				Err(err) => debug!(%err, line, "skipping malformed command"),
			}
		}
		drop(sender); // Signal end-of-input.

		match consumer.join() {
			Ok(result) => result,
			Err(_) => {
				error!("matching loop panicked");
				Err(io::Error::other("matching loop panicked"))
			}
		}
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;

	fn run_inline(input: &str) -> String {
		let mut out = Vec::new();
		CommandProcessor::new(&mut out)
			.run(Cursor::new(input))
			.unwrap();
		String::from_utf8(out).unwrap()
	}

	#[test]
	fn test_rest_and_print() {
		let output = run_inline("BUY GFD 1000 10 order1\nPRINT\n");
		assert_eq!(output, "SELL:\nBUY:\n1000 10\n");
	}

	#[test]
	fn test_malformed_lines_are_skipped() {
		let output = run_inline(
			"BUY GFD a 5 order1\nBUY GFD 900 b order1\nNOPE\n\nBUY GFD 900 5 order1\nPRINT\n",
		);
		assert_eq!(output, "SELL:\nBUY:\n900 5\n");
	}

	#[test]
	fn test_clear_resets_book() {
		let output = run_inline("BUY GFD 1000 10 order1\nCLEAR\nPRINT\n");
		assert_eq!(output, "SELL:\nBUY:\n");
	}

	#[test]
	fn test_threaded_matches_inline_output() {
		let input = "BUY GFD 1000 10 order1\n\
			BUY GFD 1010 10 order2\n\
			SELL GFD 1000 15 order3\n\
			PRINT\n";
		let mut out = Vec::new();
		run_threaded(Cursor::new(input), &mut out, 8).unwrap();
		assert_eq!(String::from_utf8(out).unwrap(), run_inline(input));
	}
}
