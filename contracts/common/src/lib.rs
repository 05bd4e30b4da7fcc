//! Shared types for the offline-time contract suite.
//!
//! This crate provides:
//! - [`handle`]: ciphertext handle helpers (zero sentinel, handle kinds).
//! - [`stats`]: [`AggregateResult`] and the [`StatsPeriod`] query windows.
//! - [`authorization`]: the wire form of a decryption authorization and the
//!   byte layouts that get signed for it.
//! - [`coprocessor`]: the client trait the ledger uses to reach the
//!   homomorphic coprocessor.

#![no_std]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod authorization;
pub mod coprocessor;
pub mod handle;
pub mod stats;

pub use authorization::*;
pub use coprocessor::*;
pub use handle::*;
pub use stats::*;
