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

//! Hash Function
//!
//! Primary hash function used in the protocol: double SHA-256 over the
//! canonical serialization, as inherited from Bitcoin.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::ser::{self, Readable, Reader, Writeable, Writer};

/// A hash to uniquely (or close enough) identify one of the main blockchain
/// constructs. Stored in the internal byte order the hash function
/// produced; display follows the same order.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Eq, Ord, Hash, Default)]
pub struct Hash(pub [u8; 32]);

/// The all-zero hash, used as the previous-block reference of a genesis
/// header.
pub const ZERO_HASH: Hash = Hash([0; 32]);

impl fmt::Display for Hash {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		for b in self.0.iter() {
			write!(f, "{:02x}", b)?;
		}
		Ok(())
	}
}

impl Hash {
	/// Creates a new hash from a byte vector, which must hold exactly 32
	/// bytes.
	pub fn from_vec(v: &[u8]) -> Hash {
		let mut a = [0; 32];
		a.copy_from_slice(&v[..32]);
		Hash(a)
	}

	/// Builds a hash from its lowercase hex representation.
	pub fn from_hex(hex: &str) -> Result<Hash, ser::Error> {
		if hex.len() != 64 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
			return Err(ser::Error::CorruptedData);
		}
		let mut bytes = [0; 32];
		for (i, b) in bytes.iter_mut().enumerate() {
			*b = u8::from_str_radix(&hex[2 * i..2 * i + 2], 16)
				.map_err(|_| ser::Error::CorruptedData)?;
		}
		Ok(Hash(bytes))
	}

	/// Converts the hash to a byte slice
	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	/// Converts the hash to a byte vector
	pub fn to_vec(&self) -> Vec<u8> {
		self.0.to_vec()
	}
}

impl Writeable for Hash {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		writer.write_fixed_bytes(&self.0)
	}
}

impl Readable for Hash {
	fn read(reader: &mut dyn Reader) -> Result<Hash, ser::Error> {
		let bytes = reader.read_fixed_bytes(32)?;
		Ok(Hash::from_vec(&bytes))
	}
}

impl Serialize for Hash {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.to_string())
	}
}

impl<'de> Deserialize<'de> for Hash {
	fn deserialize<D>(deserializer: D) -> Result<Hash, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		Hash::from_hex(&s)
			.map_err(|_| de::Error::invalid_value(de::Unexpected::Str(&s), &"a 64-char hex hash"))
	}
}

/// Single SHA-256 of the provided bytes.
pub fn sha256(data: &[u8]) -> [u8; 32] {
	let mut hasher = Sha256::new();
	hasher.update(data);
	hasher.finalize().into()
}

/// Double SHA-256 of the provided bytes, the protocol hash function.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
	sha256(&sha256(data))
}

/// A trait for types that get their hash (double SHA-256) from their
/// canonical byte serialization.
pub trait Hashed {
	/// The bytes the hash commits to
	fn bytes(&self) -> Vec<u8>;

	/// Hash of the serialized form
	fn hash(&self) -> Hash {
		Hash(sha256d(&self.bytes()))
	}
}

impl Hashed for [u8] {
	fn bytes(&self) -> Vec<u8> {
		self.to_owned()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn sha256d_vector() {
		// double SHA-256 of the ascii bytes "hello"
		let h = b"hello"[..].hash();
		assert_eq!(
			h.to_string(),
			"9595c9df90075148eb06860365df33584b75bff782a510c6cd4883a419833d50"
		);
	}

	#[test]
	fn hex_round_trip() {
		let h = b"hello"[..].hash();
		assert_eq!(Hash::from_hex(&h.to_string()).unwrap(), h);
		assert!(Hash::from_hex("abc").is_err());
		assert!(Hash::from_hex(&"g".repeat(64)).is_err());
	}

	#[test]
	fn serde_as_hex_string() {
		let h = b"hello"[..].hash();
		let json = serde_json::to_string(&h).unwrap();
		assert_eq!(
			json,
			"\"9595c9df90075148eb06860365df33584b75bff782a510c6cd4883a419833d50\""
		);
		let back: Hash = serde_json::from_str(&json).unwrap();
		assert_eq!(back, h);
	}
}
