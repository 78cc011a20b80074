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

//! A minimal, immutable view of the header chain, carrying just the fields
//! difficulty calculation consults. The full chain index (storage, lookup
//! by hash, reorg handling) lives outside this crate; validation builds
//! these entries from it when asking for the next required difficulty.

use std::sync::Arc;

/// Number of most recent timestamps the past median is computed over.
pub const MEDIAN_TIME_SPAN: usize = 11;

/// One block's worth of chain context: height, timestamp and claimed
/// difficulty, linked back towards genesis.
#[derive(Clone, Debug)]
pub struct ChainEntry {
	/// Height of the block in the chain, genesis being 0
	pub height: u64,
	/// Header timestamp, in seconds since the epoch
	pub time: u32,
	/// Compact difficulty target claimed by the header
	pub bits: u32,
	/// The preceding entry, absent only on genesis
	pub prev: Option<Arc<ChainEntry>>,
}

impl ChainEntry {
	/// The ancestor of this entry at the given absolute height, walking
	/// the back-links. Returns `None` when the height is above this entry
	/// or below the available history.
	pub fn get_ancestor(&self, height: u64) -> Option<&ChainEntry> {
		if height > self.height {
			return None;
		}
		let mut cursor = self;
		while cursor.height > height {
			cursor = cursor.prev.as_deref()?;
		}
		Some(cursor)
	}

	/// Median timestamp of the last 11 blocks ending at this entry, fewer
	/// near genesis. Monotonic along any chain, unlike raw header times.
	pub fn median_time_past(&self) -> u32 {
		let mut times = Vec::with_capacity(MEDIAN_TIME_SPAN);
		let mut cursor = Some(self);
		while let Some(entry) = cursor {
			if times.len() == MEDIAN_TIME_SPAN {
				break;
			}
			times.push(entry.time);
			cursor = entry.prev.as_deref();
		}
		times.sort_unstable();
		times[times.len() / 2]
	}
}
