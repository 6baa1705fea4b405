//! End-to-end tests for the matching pipeline
//!
//! Each case feeds a command script through the full decode/match/format
//! path and compares the produced text byte for byte. These cover:
//! - Matching correctness (price-time priority, partial fills)
//! - Modify semantics (queue position, relocation, self-match prevention)
//! - TIF handling (GFD rests, IOC discards)
//! - Tolerated rejections (duplicate ids, unknown ids, malformed input)
//! - Threaded pipeline equivalence and ordering

use std::io::Cursor;

use forge_matching::processor::{CommandProcessor, run_threaded};

fn run(input: &str) -> String {
	let mut out = Vec::new();
	CommandProcessor::new(&mut out)
		.run(Cursor::new(input))
		.unwrap();
	String::from_utf8(out).unwrap()
}

#[test]
fn test_single_resting_order() {
	let output = run("BUY GFD 1000 10 order1\n\
		PRINT\n");
	assert_eq!(
		output,
		"SELL:\n\
		BUY:\n\
		1000 10\n"
	);
}

#[test]
fn test_orders_aggregate_at_one_level() {
	let output = run("BUY GFD 1000 10 order1\n\
		BUY GFD 1000 20 order2\n\
		PRINT\n");
	assert_eq!(
		output,
		"SELL:\n\
		BUY:\n\
		1000 30\n"
	);
}

#[test]
fn test_buy_levels_print_best_first() {
	let output = run("BUY GFD 1000 10 order1\n\
		BUY GFD 1001 20 order2\n\
		PRINT\n");
	assert_eq!(
		output,
		"SELL:\n\
		BUY:\n\
		1001 20\n\
		1000 10\n"
	);
}

#[test]
fn test_cross_with_residual_sell_resting() {
	let output = run("BUY GFD 1000 10 order1\n\
		SELL GFD 900 20 order2\n\
		PRINT\n");
	assert_eq!(
		output,
		"TRADE order1 1000 10 order2 900 10\n\
		SELL:\n\
		900 10\n\
		BUY:\n"
	);
}

#[test]
fn test_cross_consumes_aggregate_across_two_prices() {
	let output = run("BUY GFD 1000 10 order1\n\
		BUY GFD 1010 10 order2\n\
		SELL GFD 1000 15 order3\n");
	assert_eq!(
		output,
		"TRADE order2 1010 10 order3 1000 10\n\
		TRADE order1 1000 5 order3 1000 5\n"
	);
}

#[test]
fn test_residual_buy_rests_after_cross() {
	let output = run("BUY GFD 1000 10 order1\n\
		BUY GFD 1010 10 order2\n\
		SELL GFD 1000 15 order3\n\
		PRINT\n");
	assert_eq!(
		output,
		"TRADE order2 1010 10 order3 1000 10\n\
		TRADE order1 1000 5 order3 1000 5\n\
		SELL:\n\
		BUY:\n\
		1000 5\n"
	);
}

#[test]
fn test_modify_requantize_pushes_to_tail() {
	let output = run("BUY GFD 1000 10 order1\n\
		BUY GFD 1000 10 order2\n\
		MODIFY order1 BUY 1000 20\n\
		SELL GFD 900 20 order3\n");
	assert_eq!(
		output,
		"TRADE order2 1000 10 order3 900 10\n\
		TRADE order1 1000 10 order3 900 10\n"
	);
}

#[test]
fn test_identical_modify_keeps_queue_position() {
	// Same side, price and quantity is a strict no-op, so order1 still
	// holds the front of the queue and fills first.
	let output = run("BUY GFD 1000 10 order1\n\
		BUY GFD 1000 10 order2\n\
		MODIFY order1 BUY 1000 10\n\
		SELL GFD 1000 15 order3\n\
		PRINT\n");
	assert_eq!(
		output,
		"TRADE order1 1000 10 order3 1000 10\n\
		TRADE order2 1000 5 order3 1000 5\n\
		SELL:\n\
		BUY:\n\
		1000 5\n"
	);
}

#[test]
fn test_sweep_and_rest_across_many_levels() {
	let output = run("BUY GFD 1000 10 order1\n\
		BUY GFD 1000 15 order2\n\
		BUY GFD 900 20 order3\n\
		BUY GFD 800 15 order4\n\
		SELL GFD 1100 30 order5\n\
		SELL GFD 1200 50 order6\n\
		SELL GFD 1200 70 order7\n\
		SELL GFD 1300 60 order8\n\
		PRINT\n\
		BUY GFD 1200 160 order9\n\
		PRINT\n");
	assert_eq!(
		output,
		"SELL:\n\
		1100 30\n\
		1200 120\n\
		1300 60\n\
		BUY:\n\
		1000 25\n\
		900 20\n\
		800 15\n\
		TRADE order5 1100 30 order9 1200 30\n\
		TRADE order6 1200 50 order9 1200 50\n\
		TRADE order7 1200 70 order9 1200 70\n\
		SELL:\n\
		1300 60\n\
		BUY:\n\
		1200 10\n\
		1000 25\n\
		900 20\n\
		800 15\n"
	);
}

#[test]
fn test_ids_can_be_reused_after_full_fill() {
	let output = run("BUY GFD 1000 10 order1\n\
		BUY GFD 1000 10 order2\n\
		MODIFY order1 BUY 1000 20\n\
		SELL GFD 900 20 order3\n\
		BUY GFD 1000 10 order1\n\
		PRINT\n\
		BUY GFD 1000 10 order2\n\
		PRINT\n\
		SELL GFD 900 20 order3\n\
		PRINT\n");
	assert_eq!(
		output,
		"TRADE order2 1000 10 order3 900 10\n\
		TRADE order1 1000 10 order3 900 10\n\
		SELL:\n\
		BUY:\n\
		1000 10\n\
		SELL:\n\
		BUY:\n\
		1000 20\n\
		TRADE order1 1000 10 order3 900 10\n\
		TRADE order2 1000 10 order3 900 10\n\
		SELL:\n\
		BUY:\n"
	);
}

#[test]
fn test_side_flip_modify_never_matches_own_residue() {
	let output = run("BUY GFD 1000 10 order1\n\
		BUY GFD 1000 10 order2\n\
		MODIFY order1 SELL 1000 10\n\
		PRINT\n");
	assert_eq!(
		output,
		"TRADE order2 1000 10 order1 1000 10\n\
		SELL:\n\
		BUY:\n"
	);
}

#[test]
fn test_side_flip_modify_with_partial_fill_relocates_leaves() {
	let output = run("BUY GFD 1000 10 order1\n\
		BUY GFD 1000 5 order2\n\
		MODIFY order1 SELL 900 10\n\
		PRINT\n");
	assert_eq!(
		output,
		"TRADE order2 1000 5 order1 900 5\n\
		SELL:\n\
		900 5\n\
		BUY:\n"
	);
}

#[test]
fn test_ioc_against_empty_book_adds_nothing() {
	let output = run("BUY IOC 1000 10 order1\n\
		SELL IOC 1000 10 order2\n\
		PRINT\n");
	assert_eq!(
		output,
		"SELL:\n\
		BUY:\n"
	);
}

#[test]
fn test_ioc_exact_fill_empties_both_sides() {
	let output = run("BUY GFD 1000 10 order1\n\
		SELL IOC 1000 10 order2\n\
		PRINT\n");
	assert_eq!(
		output,
		"TRADE order1 1000 10 order2 1000 10\n\
		SELL:\n\
		BUY:\n"
	);
}

#[test]
fn test_ioc_full_fill_leaves_passive_residue() {
	let output = run("BUY GFD 1000 15 order1\n\
		SELL IOC 1000 10 order2\n\
		PRINT\n");
	assert_eq!(
		output,
		"TRADE order1 1000 10 order2 1000 10\n\
		SELL:\n\
		BUY:\n\
		1000 5\n"
	);
}

#[test]
fn test_ioc_partial_fill_residue_discarded() {
	let output = run("BUY GFD 900 5 order1\n\
		BUY GFD 1000 5 order2\n\
		SELL IOC 1000 10 order3\n\
		PRINT\n");
	assert_eq!(
		output,
		"TRADE order2 1000 5 order3 1000 5\n\
		SELL:\n\
		BUY:\n\
		900 5\n"
	);
}

#[test]
fn test_ioc_fills_across_levels_down_to_limit() {
	let output = run("BUY GFD 900 5 order1\n\
		BUY GFD 1000 5 order2\n\
		BUY GFD 1100 5 order3\n\
		SELL IOC 1000 10 order4\n\
		PRINT\n");
	assert_eq!(
		output,
		"TRADE order3 1100 5 order4 1000 5\n\
		TRADE order2 1000 5 order4 1000 5\n\
		SELL:\n\
		BUY:\n\
		900 5\n"
	);
}

#[test]
fn test_duplicate_order_id_rejected() {
	let output = run("BUY GFD 900 5 order1\n\
		BUY GFD 900 5 order1\n\
		PRINT\n");
	assert_eq!(
		output,
		"SELL:\n\
		BUY:\n\
		900 5\n"
	);
}

#[test]
fn test_cancel_unknown_order_id() {
	let output = run("CANCEL unknown\n\
		PRINT\n");
	assert_eq!(
		output,
		"SELL:\n\
		BUY:\n"
	);
}

#[test]
fn test_modify_unknown_order_id() {
	let output = run("MODIFY unknown BUY 1000 20\n\
		PRINT\n");
	assert_eq!(
		output,
		"SELL:\n\
		BUY:\n"
	);
}

#[test]
fn test_invalid_price_and_qty_produce_no_output() {
	let output = run("BUY GFD a 5 order1\n\
		BUY GFD 900 b order1\n");
	assert_eq!(output, "");
}

#[test]
fn test_buy_sweeps_two_sells_in_time_order() {
	let output = run("SELL GFD 1000 10 order1\n\
		PRINT\n\
		SELL GFD 1000 10 order2\n\
		PRINT\n\
		BUY GFD 1100 20 order3\n\
		PRINT\n");
	assert_eq!(
		output,
		"SELL:\n\
		1000 10\n\
		BUY:\n\
		SELL:\n\
		1000 20\n\
		BUY:\n\
		TRADE order1 1000 10 order3 1100 10\n\
		TRADE order2 1000 10 order3 1100 10\n\
		SELL:\n\
		BUY:\n"
	);
}

#[test]
fn test_add_then_cancel_restores_prior_state() {
	let before = run("BUY GFD 1000 10 order1\n\
		SELL GFD 1100 5 order2\n\
		PRINT\n");
	let after = run("BUY GFD 1000 10 order1\n\
		SELL GFD 1100 5 order2\n\
		BUY GFD 950 7 order3\n\
		CANCEL order3\n\
		PRINT\n");
	assert_eq!(before, after);
}

#[test]
fn test_clear_makes_history_irrelevant() {
	let fresh = run("BUY GFD 1000 10 order1\n\
		PRINT\n");
	let cleared = run("SELL GFD 800 3 orderA\n\
		BUY GFD 1200 4 orderB\n\
		CLEAR\n\
		BUY GFD 1000 10 order1\n\
		PRINT\n");
	// orderB crossed orderA before the clear; none of it is visible after.
	assert_eq!(
		cleared,
		format!("TRADE orderA 800 3 orderB 1200 3\n{fresh}")
	);
}

#[test]
fn test_threaded_pipeline_preserves_command_order() {
	let input = "BUY GFD 1000 10 order1\n\
		BUY GFD 1000 15 order2\n\
		BUY GFD 900 20 order3\n\
		SELL GFD 1100 30 order4\n\
		SELL GFD 1200 50 order5\n\
		PRINT\n\
		BUY GFD 1200 160 order6\n\
		MODIFY order3 SELL 1250 20\n\
		CANCEL order5\n\
		PRINT\n\
		CLEAR\n\
		PRINT\n";

	let mut threaded = Vec::new();
	run_threaded(Cursor::new(input), &mut threaded, 4).unwrap();

	let inline = run(input);
	assert_eq!(String::from_utf8(threaded).unwrap(), inline);
}

#[test]
fn test_threaded_pipeline_skips_garbage() {
	let input = "BUY GFD 1000 10 order1\n\
		garbage line here\n\
		PRINT\n";
	let mut out = Vec::new();
	run_threaded(Cursor::new(input), &mut out, 4).unwrap();
	assert_eq!(
		String::from_utf8(out).unwrap(),
		"SELL:\n\
		BUY:\n\
		1000 10\n"
	);
}
