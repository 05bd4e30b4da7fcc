//! Ciphertext handles.
//!
//! A handle is a 32-byte opaque reference to a value held by the coprocessor.
//! Application code only moves handles around and compares them; the value
//! behind a handle is reachable exclusively through an authorized decrypt.

use soroban_sdk::{BytesN, Env};

/// Opaque reference to an encrypted value.
pub type Handle = BytesN<32>;

/// Kind of the value a handle refers to. Encoded in the last handle byte.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum HandleKind {
    Uint64 = 1,
    Bool = 2,
}

impl HandleKind {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(HandleKind::Uint64),
            2 => Some(HandleKind::Bool),
            _ => None,
        }
    }
}

/// The "no value" sentinel.
pub fn zero_handle(env: &Env) -> Handle {
    BytesN::from_array(env, &[0u8; 32])
}

pub fn is_zero(handle: &Handle) -> bool {
    handle.to_array() == [0u8; 32]
}

/// Returns the kind tagged into `handle`, or `None` for the zero handle and
/// for bytes that were not minted by the coprocessor.
pub fn kind_of(handle: &Handle) -> Option<HandleKind> {
    if is_zero(handle) {
        return None;
    }
    HandleKind::from_tag(handle.to_array()[31])
}

/// Stamps `kind` into a 32-byte digest, producing a handle.
///
/// The tag byte is never zero, so the result can never collide with the
/// zero sentinel.
pub fn tag_handle(env: &Env, digest: &BytesN<32>, kind: HandleKind) -> Handle {
    let mut bytes = digest.to_array();
    bytes[31] = kind as u8;
    BytesN::from_array(env, &bytes)
}
