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

//! Cuckoo Cycle verification errors.

use failure::Fail;

/// Ways a claimed 42-cycle can fail verification. Consensus only cares
/// that verification failed; the distinct reasons exist for diagnostic
/// tooling and tests.
#[derive(Clone, Copy, Debug, Eq, Fail, PartialEq)]
pub enum Error {
	/// An edge nonce lies beyond the graph's edge range
	#[fail(display = "edge too big")]
	EdgeTooBig,
	/// The edge nonces aren't strictly ascending
	#[fail(display = "edges not ascending")]
	EdgesNotAscending,
	/// Some node is hit by an odd number of edges, so no set of cycles
	/// can cover the proof
	#[fail(display = "endpoints don't match up")]
	EndpointsMismatch,
	/// A node is shared by more than two edges, which a simple cycle
	/// never produces
	#[fail(display = "branch in cycle")]
	Branch,
	/// The walk reached a node no other edge touches
	#[fail(display = "cycle dead ends")]
	DeadEnd,
	/// The walk closed before using all 42 edges
	#[fail(display = "cycle too short")]
	CycleTooShort,
}
