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

//! Block header with its embedded Cuckoo Cycle proof.
//!
//! The first 80 serialized bytes (version, previous hash, merkle root,
//! time, bits, nonce) are the classic header layout and the only bytes
//! that proof-of-work hashing commits to. Post-fork headers carry the 42
//! cycle nonces right after that prefix.

use std::fmt;

use serde::de::SeqAccess;
use serde::ser::SerializeSeq;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::consensus::PROOF_SIZE;
use crate::core::hash::{sha256, Hash, Hashed, ZERO_HASH};
use crate::core::target::Target;
use crate::ser::{self, BinWriter, Readable, Reader, Writeable, Writer};

/// Length of the serialized header prefix that hashing commits to.
pub const HEADER_PREFIX_LEN: usize = 80;

/// Version bit marking a header as mined with the post-fork Cuckoo Cycle
/// proof of work. Validation rejects headers whose flag disagrees with
/// their height relative to the fork; within this crate the flag alone
/// drives dispatch.
pub const CUCKOO_HARDFORK_VERSION_MASK: i32 = 0x4000_0000;

/// A Cuckoo Cycle proof of work: the 42 edge nonces of a cycle in the
/// graph derived from the header. Nonces are canonically sorted ascending.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Proof {
	/// The cycle's edge nonces
	pub nonces: [u32; PROOF_SIZE],
}

impl Proof {
	/// Builds a proof from the provided nonces.
	pub fn new(nonces: [u32; PROOF_SIZE]) -> Proof {
		Proof { nonces }
	}

	/// Builds a proof with all nonces zeroed out, the placeholder carried
	/// by pre-fork headers.
	pub fn zero() -> Proof {
		Proof {
			nonces: [0; PROOF_SIZE],
		}
	}
}

impl Default for Proof {
	fn default() -> Proof {
		Proof::zero()
	}
}

impl fmt::Debug for Proof {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "Cuckoo(")?;
		for (i, val) in self.nonces.iter().enumerate() {
			if i > 0 {
				write!(f, " ")?;
			}
			write!(f, "{:x}", val)?;
		}
		write!(f, ")")
	}
}

impl Writeable for Proof {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		for n in self.nonces.iter() {
			writer.write_u32(*n)?;
		}
		Ok(())
	}
}

impl Readable for Proof {
	fn read(reader: &mut dyn Reader) -> Result<Proof, ser::Error> {
		let mut nonces = [0u32; PROOF_SIZE];
		for n in nonces.iter_mut() {
			*n = reader.read_u32()?;
		}
		Ok(Proof { nonces })
	}
}

impl Serialize for Proof {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut seq = serializer.serialize_seq(Some(PROOF_SIZE))?;
		for n in self.nonces.iter() {
			seq.serialize_element(n)?;
		}
		seq.end()
	}
}

impl<'de> Deserialize<'de> for Proof {
	fn deserialize<D>(deserializer: D) -> Result<Proof, D::Error>
	where
		D: Deserializer<'de>,
	{
		struct ProofVisitor;

		impl<'de> de::Visitor<'de> for ProofVisitor {
			type Value = Proof;

			fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
				write!(formatter, "an array of {} cycle nonces", PROOF_SIZE)
			}

			fn visit_seq<A>(self, mut seq: A) -> Result<Proof, A::Error>
			where
				A: SeqAccess<'de>,
			{
				let mut nonces = [0u32; PROOF_SIZE];
				for (i, n) in nonces.iter_mut().enumerate() {
					*n = seq
						.next_element()?
						.ok_or_else(|| de::Error::invalid_length(i, &self))?;
				}
				if seq.next_element::<u32>()?.is_some() {
					return Err(de::Error::invalid_length(PROOF_SIZE + 1, &self));
				}
				Ok(Proof { nonces })
			}
		}

		deserializer.deserialize_seq(ProofVisitor)
	}
}

/// Block header, consisting of the classic 80-byte prefix followed by the
/// Cuckoo Cycle proof nonces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockHeader {
	/// Protocol version of the block
	pub version: i32,
	/// Hash of the block previous to this in the chain
	pub prev_hash: Hash,
	/// Root hash of the block's transaction merkle tree
	pub merkle_root: Hash,
	/// Timestamp at which the block was built, in seconds since the epoch
	pub time: u32,
	/// Difficulty target for the block's proof of work, in compact form
	pub bits: u32,
	/// Nonce incremented by miners to vary the header hash
	pub nonce: u32,
	/// The Cuckoo Cycle proof, all zeroes on pre-fork headers
	pub proof: Proof,
}

impl Default for BlockHeader {
	fn default() -> BlockHeader {
		BlockHeader {
			version: 1,
			prev_hash: ZERO_HASH,
			merkle_root: ZERO_HASH,
			time: 0,
			bits: 0,
			nonce: 0,
			proof: Proof::zero(),
		}
	}
}

impl BlockHeader {
	/// Whether the version marks this header as carrying the post-fork
	/// Cuckoo Cycle proof of work.
	pub fn is_cuckoo_pow(&self) -> bool {
		self.version & CUCKOO_HARDFORK_VERSION_MASK == CUCKOO_HARDFORK_VERSION_MASK
	}

	fn write_pre_pow<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		writer.write_i32(self.version)?;
		self.prev_hash.write(writer)?;
		self.merkle_root.write(writer)?;
		writer.write_u32(self.time)?;
		writer.write_u32(self.bits)?;
		writer.write_u32(self.nonce)
	}

	/// The canonical 80-byte header prefix, the exact bytes proof-of-work
	/// hashing commits to. The cycle nonces are deliberately excluded so
	/// that searching for a proof always re-keys the graph.
	pub fn pre_pow(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(HEADER_PREFIX_LEN);
		let mut writer = BinWriter::new(&mut out);
		// no serialization errors are applicable when writing to a Vec
		self.write_pre_pow(&mut writer).unwrap();
		out
	}

	/// Key material for the Cuckoo Cycle graph: a single SHA-256 of the
	/// header prefix. The first 16 bytes seed the SipHash keystream.
	pub fn pow_key(&self) -> [u8; 32] {
		sha256(&self.pre_pow())
	}

	/// Chain-work contribution of this header, the quantity fork choice
	/// sums. Zero when the claimed bits don't name a usable target.
	pub fn work(&self) -> Target {
		let (target, negative, overflow) = Target::from_compact(self.bits);
		if negative || overflow || target.is_zero() {
			Target::zero()
		} else {
			target.work()
		}
	}
}

impl Hashed for BlockHeader {
	fn bytes(&self) -> Vec<u8> {
		self.pre_pow()
	}
}

impl Writeable for BlockHeader {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		self.write_pre_pow(writer)?;
		self.proof.write(writer)
	}
}

impl Readable for BlockHeader {
	fn read(reader: &mut dyn Reader) -> Result<BlockHeader, ser::Error> {
		let version = reader.read_i32()?;
		let prev_hash = Hash::read(reader)?;
		let merkle_root = Hash::read(reader)?;
		let time = reader.read_u32()?;
		let bits = reader.read_u32()?;
		let nonce = reader.read_u32()?;
		let proof = Proof::read(reader)?;
		Ok(BlockHeader {
			version,
			prev_hash,
			merkle_root,
			time,
			bits,
			nonce,
			proof,
		})
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::ser::{deserialize, ser_vec};

	fn sample_header() -> BlockHeader {
		let mut proof = [0u32; PROOF_SIZE];
		for (i, n) in proof.iter_mut().enumerate() {
			*n = 1000 + i as u32;
		}
		BlockHeader {
			version: CUCKOO_HARDFORK_VERSION_MASK | 0x2000_0000,
			prev_hash: Hash([3; 32]),
			merkle_root: Hash([7; 32]),
			time: 1_530_000_000,
			bits: 0x1d00_ffff,
			nonce: 42,
			proof: Proof::new(proof),
		}
	}

	/// Serialization of the genesis block of the original chain must be
	/// byte-identical to the recorded network bytes, and hash to the
	/// well-known genesis hash.
	#[test]
	fn genesis_header_bytes_and_hash() {
		let genesis = BlockHeader {
			version: 1,
			prev_hash: ZERO_HASH,
			merkle_root: Hash::from_hex(
				"3ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a",
			)
			.unwrap(),
			time: 1_231_006_505,
			bits: 0x1d00_ffff,
			nonce: 2_083_236_893,
			proof: Proof::zero(),
		};
		let prefix = genesis.pre_pow();
		assert_eq!(prefix.len(), HEADER_PREFIX_LEN);
		let mut hex = String::new();
		for b in &prefix {
			hex.push_str(&format!("{:02x}", b));
		}
		assert_eq!(
			hex,
			"0100000000000000000000000000000000000000000000000000000000000000\
			 000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa\
			 4b1e5e4a29ab5f49ffff001d1dac2b7c"
		);
		// double SHA-256 of the prefix, in hash-function byte order
		assert_eq!(
			genesis.hash().to_string(),
			"6fe28c0ab6f1b372c1a6a246ae63f74f931e8365e15a089c68d6190000000000"
		);
		assert!(!genesis.is_cuckoo_pow());
		// one minimum-difficulty block's worth of chain work
		assert_eq!(genesis.work(), Target::from(0x1_0001_0001u64));
	}

	#[test]
	fn header_round_trip() {
		let header = sample_header();
		let vec = ser_vec(&header).unwrap();
		assert_eq!(vec.len(), HEADER_PREFIX_LEN + 4 * PROOF_SIZE);
		let back: BlockHeader = deserialize(&mut &vec[..]).unwrap();
		assert_eq!(back, header);
	}

	#[test]
	fn cuckoo_version_flag() {
		let mut header = sample_header();
		assert!(header.is_cuckoo_pow());
		header.version = 0x2000_0000;
		assert!(!header.is_cuckoo_pow());
	}

	#[test]
	fn pow_key_commits_to_prefix_only() {
		let mut header = sample_header();
		let key = header.pow_key();
		// tweaking the proof leaves the graph key untouched
		header.proof.nonces[0] += 1;
		assert_eq!(header.pow_key(), key);
		// tweaking the nonce re-keys the graph
		header.nonce += 1;
		assert_ne!(header.pow_key(), key);
	}

	#[test]
	fn proof_serde_round_trip() {
		let proof = sample_header().proof;
		let json = serde_json::to_string(&proof).unwrap();
		let back: Proof = serde_json::from_str(&json).unwrap();
		assert_eq!(back, proof);

		let short: Result<Proof, _> = serde_json::from_str("[1, 2, 3]");
		assert!(short.is_err());
	}
}
