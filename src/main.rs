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

//! Matching engine entry point
//!
//! Reads commands from stdin and writes trade lines and snapshots to
//! stdout. Logs go to stderr (`RUST_LOG` controls the filter) so the
//! output protocol stays clean. Pass `--threaded` or set
//! `ENGINE_THREADED=true` to run decoding and matching on separate
//! threads.

use std::io;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use forge_matching::config::EngineConfig;
use forge_matching::processor::{CommandProcessor, run_threaded};

fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with_writer(io::stderr)
		.with_ansi(false)
		.init();

	let mut config = EngineConfig::from_env().context("failed to load configuration")?;
	if std::env::args().skip(1).any(|arg| arg == "--threaded") {
		config.threaded = true;
	}

	let stdin = io::stdin().lock();

	if config.threaded {
		run_threaded(stdin, io::stdout(), config.queue_capacity).context("matching pipeline failed")?;
	} else {
		CommandProcessor::new(io::stdout().lock())
			.run(stdin)
			.context("matching pipeline failed")?;
	}

	Ok(())
}
