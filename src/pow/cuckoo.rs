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

//! Verification of Cuckoo Cycle proofs, the proof of work designed by
//! John Tromp. A proof claims 42 edges of an implicit random bipartite
//! graph form a single cycle; edges are derived from a siphash keystream
//! seeded by the header, so the proof commits to the header it rides in.
//!
//! Only the verifier lives in consensus code. It runs in constant time
//! and space: two O(42) passes over the nonces and one O(42^2) walk along
//! the claimed cycle.

use crate::consensus::PROOF_SIZE;
use crate::core::block::Proof;
use crate::pow::error::Error;
use crate::pow::siphash::{set_keys, siphash24};

/// Cuckoo cycle context: the graph's siphash keys and edge range, all
/// that's needed to verify a proof.
pub struct CuckooContext {
	keys: [u64; 4],
	edge_mask: u64,
}

impl CuckooContext {
	/// Initializes a verification context from 32 bytes of key material
	/// (the single SHA-256 of the header prefix; the first 16 bytes seed
	/// siphash) and the edge bits of the graph.
	pub fn new(key: &[u8; 32], edge_bits: u8) -> CuckooContext {
		let mut seed = [0u8; 16];
		seed.copy_from_slice(&key[..16]);
		CuckooContext {
			keys: set_keys(&seed),
			edge_mask: (1u64 << edge_bits) - 1,
		}
	}

	/// Generates a node in the cuckoo graph from an edge nonce and a side
	/// selector (0 or 1). The low bit of the node id carries the side,
	/// making the graph bipartite.
	pub fn sipnode(&self, nonce: u64, uorv: u64) -> u64 {
		((siphash24(&self.keys, 2 * nonce + uorv) & self.edge_mask) << 1) | uorv
	}

	/// Verifies that the proof's ascending nonces form a single 42-cycle
	/// in the graph keyed by this context.
	pub fn verify(&self, proof: &Proof) -> Result<(), Error> {
		let nonces = &proof.nonces;
		let mut uvs = [0u64; 2 * PROOF_SIZE];
		let mut xor0 = 0u64;
		let mut xor1 = 0u64;

		for n in 0..PROOF_SIZE {
			if u64::from(nonces[n]) > self.edge_mask {
				return Err(Error::EdgeTooBig);
			}
			if n > 0 && nonces[n] <= nonces[n - 1] {
				return Err(Error::EdgesNotAscending);
			}
			uvs[2 * n] = self.sipnode(u64::from(nonces[n]), 0);
			uvs[2 * n + 1] = self.sipnode(u64::from(nonces[n]), 1);
			xor0 ^= uvs[2 * n];
			xor1 ^= uvs[2 * n + 1];
		}
		// every node must be hit an even number of times for the edges to
		// decompose into cycles at all
		if xor0 | xor1 != 0 {
			return Err(Error::EndpointsMismatch);
		}
		follow_cycle(&uvs)
	}
}

/// Walks the cycle claimed by the 84 edge endpoints (edge n's nodes at
/// positions 2n and 2n+1). From the current endpoint, the matching
/// endpoint of another edge on the same side is sought; crossing that edge
/// (index xor 1) switches sides. The walk must return to the start having
/// used every edge exactly once.
fn follow_cycle(uvs: &[u64; 2 * PROOF_SIZE]) -> Result<(), Error> {
	let mut n = 0;
	let mut i = 0;
	loop {
		let mut j = i;
		// scan the same-side endpoints of all other edges
		let mut k = i;
		loop {
			k = (k + 2) % (2 * PROOF_SIZE);
			if k == i {
				break;
			}
			if uvs[k] == uvs[i] {
				if j != i {
					return Err(Error::Branch);
				}
				j = k;
			}
		}
		if j == i {
			return Err(Error::DeadEnd);
		}
		i = j ^ 1;
		n += 1;
		if i == 0 {
			break;
		}
	}
	if n == PROOF_SIZE {
		Ok(())
	} else {
		Err(Error::CycleTooShort)
	}
}
