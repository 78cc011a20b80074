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

//! Consensus proof-of-work core for Bittern.
//!
//! Bittern is a Bitcoin-derived chain that replaces the original
//! double-SHA256 proof of work with a Cuckoo Cycle proof at a configured
//! hard fork height. This crate holds the two consensus-critical pieces
//! shared by every validating node: difficulty retargeting (including the
//! fork switch and the post-fork emergency retarget) and verification of
//! the 42-nonce Cuckoo Cycle proof carried in post-fork headers.
//!
//! Everything here is a pure function over immutable inputs. Storage,
//! networking, mining and the wider validation pipeline live elsewhere and
//! call into this crate.

#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]
#![warn(missing_docs)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

pub mod chain;
pub mod consensus;
pub mod core;
pub mod pow;
pub mod ser;
