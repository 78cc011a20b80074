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

//! The 256-bit proof-of-work target and its packed 32-bit "compact"
//! encoding (the header `bits` field), kept bit-compatible with Bitcoin. A
//! block is valid when its proof-of-work hash, read as a little-endian
//! 256-bit integer, is at or below the target.

use std::fmt;
use std::ops::{Add, Div, Mul};

use num::{One, ToPrimitive, Zero};
use num_bigint::BigUint;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::core::hash::Hash;

/// A 256-bit unsigned proof-of-work target.
///
/// The compact form packs a target into 32 bits as a base-256 float: the
/// high byte is an exponent (the full byte length of the number), the low
/// 23 bits are the mantissa and bit 23 is a sign marker. Negative and
/// oversized encodings never name a usable target but must be flagged
/// exactly like `arith_uint256` flags them, so `from_compact` reports
/// them to the caller instead of failing.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Target(BigUint);

impl Target {
	/// The zero target, which no hash can satisfy.
	pub fn zero() -> Target {
		Target(BigUint::zero())
	}

	/// Whether this is the zero target.
	pub fn is_zero(&self) -> bool {
		self.0.is_zero()
	}

	/// Unpacks a compact `bits` value into a target, flagging a set sign
	/// bit and an exponent that overflows 256 bits. Mirrors
	/// `arith_uint256::SetCompact`.
	pub fn from_compact(bits: u32) -> (Target, bool, bool) {
		let size = bits >> 24;
		let mut word = bits & 0x007f_ffff;
		let value = if size <= 3 {
			word >>= 8 * (3 - size);
			BigUint::from(word)
		} else {
			BigUint::from(word) << (8 * (size - 3)) as usize
		};
		let negative = word != 0 && (bits & 0x0080_0000) != 0;
		let overflow =
			word != 0 && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32));
		(Target(value), negative, overflow)
	}

	/// Packs the target back into its canonical compact form. Mirrors
	/// `arith_uint256::GetCompact` for non-negative values: a mantissa
	/// with the sign bit set is pushed down a byte with the exponent
	/// bumped to compensate.
	pub fn to_compact(&self) -> u32 {
		let mut size = (self.0.bits() + 7) / 8;
		let mut compact = if size <= 3 {
			self.0.to_u64().unwrap_or(0) << (8 * (3 - size))
		} else {
			// the shift leaves at most 24 significant bits
			(&self.0 >> ((size - 3) * 8)).to_u64().unwrap_or(0)
		};
		if compact & 0x0080_0000 != 0 {
			compact >>= 8;
			size += 1;
		}
		(compact as u32) | ((size as u32) << 24)
	}

	/// Interprets a 32-byte proof-of-work hash as a little-endian 256-bit
	/// integer, the form compared against the target.
	pub fn from_hash(hash: &Hash) -> Target {
		Target(BigUint::from_bytes_le(hash.as_bytes()))
	}

	/// Expected number of hash evaluations to find a block at this
	/// target, i.e. floor(2^256 / (target + 1)). This is the quantity
	/// summed into chain work for fork choice.
	pub fn work(&self) -> Target {
		Target((BigUint::one() << 256) / (&self.0 + BigUint::one()))
	}
}

impl From<u64> for Target {
	fn from(n: u64) -> Target {
		Target(BigUint::from(n))
	}
}

impl Add for Target {
	type Output = Target;
	fn add(self, other: Target) -> Target {
		Target(self.0 + other.0)
	}
}

impl Mul<u64> for Target {
	type Output = Target;
	fn mul(self, other: u64) -> Target {
		Target(self.0 * other)
	}
}

impl Div<u64> for Target {
	type Output = Target;
	fn div(self, other: u64) -> Target {
		Target(self.0 / other)
	}
}

impl fmt::Display for Target {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		// pad to the full 64 nibbles so targets line up in logs
		write!(f, "{:064x}", self.0)
	}
}

impl Serialize for Target {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&format!("{:x}", self.0))
	}
}

impl<'de> Deserialize<'de> for Target {
	fn deserialize<D>(deserializer: D) -> Result<Target, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		BigUint::parse_bytes(s.as_bytes(), 16)
			.map(Target)
			.ok_or_else(|| de::Error::invalid_value(de::Unexpected::Str(&s), &"a hex target"))
	}
}
