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

//! The proof of work needs to strike a balance between fast header
//! verification to avoid DoS attacks and difficulty for block builders.
//! Headers before the hard fork carry the classic double-SHA256 proof;
//! headers after it additionally embed a Cuckoo Cycle, which keeps
//! verification cheap while pushing mining towards commodity memory
//! rather than custom hashing cores.

mod cuckoo;
mod error;
mod siphash;

pub use self::cuckoo::CuckooContext;
pub use self::error::Error;

use crate::consensus::ConsensusParams;
use crate::core::block::{BlockHeader, Proof};
use crate::core::hash::Hashed;
use crate::core::target::Target;

/// Validates the proof of work of a given header: the claimed target must
/// be well formed and within the active limit, the embedded cycle must
/// verify on post-fork headers, and the header hash must meet the target.
pub fn check_pow(header: &BlockHeader, params: &ConsensusParams) -> bool {
	let (target, negative, overflow) = Target::from_compact(header.bits);
	let limit = if header.is_cuckoo_pow() {
		&params.cuckoo_pow_limit
	} else {
		&params.pow_limit
	};
	if negative || overflow || target.is_zero() || target > *limit {
		return false;
	}

	if header.is_cuckoo_pow() {
		let ctx = CuckooContext::new(&header.pow_key(), params.edge_bits());
		if ctx.verify(&header.proof).is_err() {
			return false;
		}
	}

	// the whole-header hash is measured against the target in both
	// regimes; the cycle only gates validity
	Target::from_hash(&header.hash()) <= target
}

/// Verifies a 42-nonce cycle against raw key material, outside any header.
/// Mostly a seam for tests and diagnostic tooling; consensus goes through
/// `check_pow`.
pub fn verify_cuckoo(proof: &Proof, key: &[u8; 32], edge_bits: u8) -> Result<(), Error> {
	CuckooContext::new(key, edge_bits).verify(proof)
}
