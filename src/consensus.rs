// Copyright 2018 The Bittern Developers
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

//! All the rules required for the chain to reach consensus on difficulty.
//! Consensus-relevant constants and the retargeting algorithm, including
//! the Cuckoo Cycle hard fork switch, are kept together here; changing any
//! of them forks the chain.

use crate::chain::ChainEntry;
use crate::core::target::Target;

/// Cuckoo Cycle proof size (cycle length).
pub const PROOF_SIZE: usize = 42;

/// Parameters fixing the consensus rules of one network (main, test or
/// regression test). Passed explicitly to every rule that needs them; the
/// crate holds no process-wide network state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusParams {
	/// Easiest allowed target for the original double-SHA256 proof of work
	pub pow_limit: Target,
	/// Easiest allowed target once Cuckoo Cycle takes over
	pub cuckoo_pow_limit: Target,
	/// Seconds one retargeting window is expected to span
	pub pow_target_timespan: i64,
	/// Expected seconds between blocks
	pub pow_target_spacing: i64,
	/// Test networks may drop to minimum difficulty when blocks stall
	pub pow_allow_min_difficulty_blocks: bool,
	/// Regression test networks never retarget
	pub pow_no_retargeting: bool,
	/// Height of the first block mined with Cuckoo Cycle
	pub cuckoo_hardfork_height: u64,
	/// Size of the cuckoo graph: each partition holds 2^(size - 1) nodes
	/// and edge nonces range over the same power of two
	pub cuckoo_graph_size: u8,
}

impl ConsensusParams {
	/// Number of blocks between ordinary difficulty recomputations.
	pub fn difficulty_adjustment_interval(&self) -> u64 {
		(self.pow_target_timespan / self.pow_target_spacing) as u64
	}

	/// Log2 of the number of edges in the cuckoo graph, which bounds the
	/// proof nonces.
	pub fn edge_bits(&self) -> u8 {
		self.cuckoo_graph_size - 1
	}

	/// The production network.
	pub fn mainnet() -> ConsensusParams {
		ConsensusParams {
			pow_limit: Target::from_compact(0x1d00_ffff).0,
			cuckoo_pow_limit: Target::from_compact(0x2000_ffff).0,
			pow_target_timespan: 14 * 24 * 60 * 60,
			pow_target_spacing: 10 * 60,
			pow_allow_min_difficulty_blocks: false,
			pow_no_retargeting: false,
			cuckoo_hardfork_height: 483_840,
			cuckoo_graph_size: 29,
		}
	}

	/// The public test network.
	pub fn testnet() -> ConsensusParams {
		ConsensusParams {
			pow_limit: Target::from_compact(0x1d00_ffff).0,
			cuckoo_pow_limit: Target::from_compact(0x2000_ffff).0,
			pow_target_timespan: 14 * 24 * 60 * 60,
			pow_target_spacing: 10 * 60,
			pow_allow_min_difficulty_blocks: true,
			pow_no_retargeting: false,
			cuckoo_hardfork_height: 40_320,
			cuckoo_graph_size: 29,
		}
	}

	/// Local regression testing: trivial difficulty, tiny graph.
	pub fn regtest() -> ConsensusParams {
		ConsensusParams {
			pow_limit: Target::from_compact(0x207f_ffff).0,
			cuckoo_pow_limit: Target::from_compact(0x207f_ffff).0,
			pow_target_timespan: 14 * 24 * 60 * 60,
			pow_target_spacing: 10 * 60,
			pow_allow_min_difficulty_blocks: true,
			pow_no_retargeting: true,
			cuckoo_hardfork_height: 150,
			cuckoo_graph_size: 17,
		}
	}
}

/// Computes the compact difficulty target required of the block following
/// `tip`. `next_header_time` is the timestamp of the proposed block, only
/// consulted by the test-network minimum-difficulty rule.
pub fn next_required_bits(
	tip: &ChainEntry,
	next_header_time: u32,
	params: &ConsensusParams,
) -> u32 {
	let height = tip.height + 1;
	let interval = params.difficulty_adjustment_interval();
	let active_limit = if height >= params.cuckoo_hardfork_height {
		&params.cuckoo_pow_limit
	} else {
		&params.pow_limit
	};
	let active_limit_bits = active_limit.to_compact();

	if height % interval != 0 {
		if params.pow_allow_min_difficulty_blocks {
			// Special difficulty rule for test networks: a block arriving
			// more than twice the target spacing after its parent may
			// claim minimum difficulty.
			if i64::from(next_header_time) > i64::from(tip.time) + 2 * params.pow_target_spacing {
				return active_limit_bits;
			}
			// Otherwise return the last recorded non-minimum difficulty,
			// skipping over any run of min-difficulty blocks.
			let mut cursor = tip;
			while cursor.height % interval != 0 && cursor.bits == active_limit_bits {
				match cursor.prev.as_deref() {
					Some(prev) => cursor = prev,
					None => break,
				}
			}
			return cursor.bits;
		}
		if height > params.cuckoo_hardfork_height && tip.bits != active_limit_bits {
			if let Some(bits) = emergency_retarget(tip, params) {
				return bits;
			}
		}
		return tip.bits;
	}

	if height == params.cuckoo_hardfork_height {
		// the fork resets difficulty to the easiest legal target, giving
		// the new algorithm room to find its steady state
		debug!(
			"next_required_bits: cuckoo fork at height {}, difficulty reset to {:08x}",
			height, active_limit_bits
		);
		return active_limit_bits;
	}

	if params.pow_no_retargeting {
		return tip.bits;
	}

	let first = match tip.get_ancestor(height - interval) {
		Some(first) => first,
		// chain shorter than one full window, nothing to measure against
		None => return tip.bits,
	};
	retarget(tip, first, active_limit, params)
}

/// Ordinary end-of-window retarget: rescale the tip target by the ratio of
/// the time the window actually took over the time it should have taken.
fn retarget(tip: &ChainEntry, first: &ChainEntry, limit: &Target, params: &ConsensusParams) -> u32 {
	let mut actual_timespan = i64::from(tip.time) - i64::from(first.time);
	// no window may move difficulty by more than a factor of 4
	if actual_timespan < params.pow_target_timespan / 4 {
		actual_timespan = params.pow_target_timespan / 4;
	}
	if actual_timespan > params.pow_target_timespan * 4 {
		actual_timespan = params.pow_target_timespan * 4;
	}

	let (target, _, _) = Target::from_compact(tip.bits);
	// multiply before dividing, the fixed-point step loses less that way
	let new_target = target * actual_timespan as u64 / params.pow_target_timespan as u64;
	if new_target > *limit {
		limit.to_compact()
	} else {
		new_target.to_compact()
	}
}

/// Single-block difficulty relaxation after the fork: when the last seven
/// blocks all claim the same target yet their median-time span exceeds 36
/// target spacings, the next block may use a target halfway between the
/// current one and the most recent easier target on record.
fn emergency_retarget(tip: &ChainEntry, params: &ConsensusParams) -> Option<u32> {
	let anc = tip.get_ancestor(tip.height.checked_sub(6)?)?;
	if anc.bits != tip.bits {
		return None;
	}
	let span = i64::from(tip.median_time_past()) - i64::from(anc.median_time_past());
	if span <= params.pow_target_spacing * 36 {
		return None;
	}

	let (tip_target, _, _) = Target::from_compact(tip.bits);
	let mut cursor = anc;
	loop {
		let (target, _, _) = Target::from_compact(cursor.bits);
		if target > tip_target {
			let relaxed = (tip_target.clone() + target) / 2;
			let relaxed_bits = relaxed.to_compact();
			debug!(
				"emergency retarget at height {}: {:08x} -> {:08x}",
				tip.height + 1,
				tip.bits,
				relaxed_bits
			);
			return Some(relaxed_bits);
		}
		cursor = cursor.prev.as_deref()?;
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::chain::test::build_chain;

	const LIMIT_BITS: u32 = 0x1d00_ffff;
	const HARD_BITS: u32 = 0x1c0f_fff0;

	/// Params with a 10-block interval so boundary cases stay small.
	fn short_interval_params() -> ConsensusParams {
		ConsensusParams {
			pow_target_timespan: 6000,
			pow_target_spacing: 600,
			cuckoo_hardfork_height: 1_000_000,
			..ConsensusParams::mainnet()
		}
	}

	fn spaced_times(count: usize, spacing: u32, bits: u32) -> Vec<(u32, u32)> {
		(0..count).map(|i| (i as u32 * spacing, bits)).collect()
	}

	#[test]
	fn steady_state_keeps_bits() {
		// 2015 blocks at the limit, next height isn't a boundary
		let params = ConsensusParams::mainnet();
		let tip = build_chain(&spaced_times(2015, 600, LIMIT_BITS));
		assert_eq!(tip.height, 2014);
		assert_eq!(next_required_bits(&tip, 0, &params), LIMIT_BITS);
	}

	#[test]
	fn fast_window_quadruples_difficulty() {
		let params = ConsensusParams::mainnet();
		// full 2016-block window squeezed into an eighth of the expected
		// time: the clamp holds the adjustment at 4x
		let mut blocks = spaced_times(2016, 75, LIMIT_BITS);
		blocks[2015].0 = (params.pow_target_timespan / 8) as u32;
		let tip = build_chain(&blocks);
		let bits = next_required_bits(&tip, 0, &params);
		assert_eq!(bits, 0x1c3f_ffc0);
		let expected = Target::from_compact(LIMIT_BITS).0 / 4;
		assert_eq!(bits, expected.to_compact());
	}

	#[test]
	fn slow_window_caps_at_limit() {
		let params = ConsensusParams::mainnet();
		// already at the limit, a slow window can't go easier
		let mut blocks = spaced_times(2016, 4800, LIMIT_BITS);
		blocks[2015].0 = (params.pow_target_timespan * 8) as u32;
		let tip = build_chain(&blocks);
		assert_eq!(next_required_bits(&tip, 0, &params), LIMIT_BITS);
	}

	#[test]
	fn slow_window_quarters_difficulty() {
		let params = ConsensusParams::mainnet();
		let mut blocks = spaced_times(2016, 4800, HARD_BITS);
		blocks[2015].0 = (params.pow_target_timespan * 8) as u32;
		let tip = build_chain(&blocks);
		let bits = next_required_bits(&tip, 0, &params);
		let expected = Target::from_compact(HARD_BITS).0 * 4;
		assert_eq!(bits, expected.to_compact());
		assert_eq!(bits, 0x1c3f_ffc0);
	}

	#[test]
	fn fork_boundary_resets_to_cuckoo_limit() {
		let mut params = short_interval_params();
		params.cuckoo_hardfork_height = 20;
		let tip = build_chain(&spaced_times(20, 600, HARD_BITS));
		assert_eq!(tip.height, 19);
		// boundary and fork height coincide: hard reset, history ignored
		assert_eq!(
			next_required_bits(&tip, 0, &params),
			params.cuckoo_pow_limit.to_compact()
		);
	}

	#[test]
	fn no_retargeting_passes_tip_through() {
		let mut params = short_interval_params();
		params.pow_no_retargeting = true;
		let tip = build_chain(&spaced_times(10, 60_000, HARD_BITS));
		assert_eq!(next_required_bits(&tip, 0, &params), HARD_BITS);
	}

	#[test]
	fn min_difficulty_block_after_stall() {
		let mut params = short_interval_params();
		params.pow_allow_min_difficulty_blocks = true;
		let tip = build_chain(&spaced_times(15, 600, HARD_BITS));
		// new block arriving over 2 spacings late gets the limit
		let late = tip.time + 2 * 600 + 1;
		assert_eq!(next_required_bits(&tip, late, &params), LIMIT_BITS);
		// on time, ordinary rule applies
		let on_time = tip.time + 600;
		assert_eq!(next_required_bits(&tip, on_time, &params), HARD_BITS);
	}

	#[test]
	fn min_difficulty_walk_recovers_real_target() {
		let mut params = short_interval_params();
		params.pow_allow_min_difficulty_blocks = true;
		// a run of min-difficulty blocks after the boundary at height 10
		let mut blocks = spaced_times(15, 600, HARD_BITS);
		for b in blocks.iter_mut().skip(11) {
			b.1 = LIMIT_BITS;
		}
		let tip = build_chain(&blocks);
		assert_eq!(tip.bits, LIMIT_BITS);
		// the walk skips the min-difficulty run and lands on height 10
		let on_time = tip.time + 600;
		assert_eq!(next_required_bits(&tip, on_time, &params), HARD_BITS);
	}

	fn emergency_chain(seconds_per_block: u32) -> Vec<(u32, u32)> {
		// heights 0..=113 easy, then seven blocks (114..=120) at one
		// harder target
		(0..121)
			.map(|h| {
				let bits = if h >= 114 { HARD_BITS } else { 0x2000_ffff };
				(h as u32 * seconds_per_block, bits)
			})
			.collect()
	}

	#[test]
	fn emergency_retarget_relaxes_halfway() {
		let mut params = ConsensusParams::mainnet();
		params.cuckoo_hardfork_height = 100;
		// 3700s per block: median-time span over 7 blocks is 22200s,
		// above the 36-spacing threshold of 21600s
		let tip = build_chain(&emergency_chain(3700));
		let bits = next_required_bits(&tip, 0, &params);
		let halfway = (Target::from_compact(HARD_BITS).0 + Target::from_compact(0x2000_ffff).0) / 2;
		assert_eq!(bits, halfway.to_compact());
		assert_eq!(bits, 0x1f7f_ff80);
	}

	#[test]
	fn emergency_retarget_needs_strictly_slow_blocks() {
		let mut params = ConsensusParams::mainnet();
		params.cuckoo_hardfork_height = 100;
		// 3600s per block: the span is exactly 36 spacings, not more
		let tip = build_chain(&emergency_chain(3600));
		assert_eq!(next_required_bits(&tip, 0, &params), HARD_BITS);
	}

	#[test]
	fn emergency_retarget_needs_uniform_run() {
		let mut params = ConsensusParams::mainnet();
		params.cuckoo_hardfork_height = 100;
		let mut blocks = emergency_chain(3700);
		// break the run of identical targets at its oldest block
		blocks[114].1 = 0x1c0f_ff00;
		let tip = build_chain(&blocks);
		assert_eq!(next_required_bits(&tip, 0, &params), HARD_BITS);
	}

	#[test]
	fn emergency_retarget_skips_tip_at_limit() {
		let mut params = ConsensusParams::mainnet();
		params.cuckoo_hardfork_height = 100;
		// whole chain already at the post-fork limit
		let tip = build_chain(&spaced_times(121, 3700, 0x2000_ffff));
		assert_eq!(next_required_bits(&tip, 0, &params), 0x2000_ffff);
	}

	#[test]
	fn params_serde_round_trip() {
		let params = ConsensusParams::mainnet();
		let json = serde_json::to_string(&params).unwrap();
		let back: ConsensusParams = serde_json::from_str(&json).unwrap();
		assert_eq!(back.pow_limit, params.pow_limit);
		assert_eq!(back.cuckoo_hardfork_height, params.cuckoo_hardfork_height);
		assert_eq!(
			back.difficulty_adjustment_interval(),
			params.difficulty_adjustment_interval()
		);
	}
}
