use soroban_sdk::{vec, xdr::ToXdr, Address, Bytes, Env, Vec};

use common::{is_zero, kind_of, tag_handle, FoldedStats, Handle, HandleKind};

use crate::{acl, Ciphertext, CoprocessorError, DataKey};

#[derive(Clone, Copy)]
#[repr(u8)]
pub enum Op {
    Add = 1,
    Gt = 2,
    Select = 3,
    DivScalar = 4,
    FoldTotal = 5,
    FoldMax = 6,
    FoldAverage = 7,
}

pub fn load_entry(env: &Env, handle: &Handle) -> Option<Ciphertext> {
    env.storage()
        .persistent()
        .get(&DataKey::Value(handle.clone()))
}

pub fn save_entry(env: &Env, handle: &Handle, entry: &Ciphertext) {
    let key = DataKey::Value(handle.clone());
    env.storage().persistent().set(&key, entry);
    acl::extend_entry_ttl(env, &key);
}

pub fn load(env: &Env, handle: &Handle) -> Option<u64> {
    load_entry(env, handle).map(|entry| entry.value)
}

/// Resolves an operand for `caller`. The zero handle reads as 0 of any kind.
pub fn operand(
    env: &Env,
    caller: &Address,
    handle: &Handle,
    expected: HandleKind,
) -> Result<u64, CoprocessorError> {
    if is_zero(handle) {
        return Ok(0);
    }
    if kind_of(handle) != Some(expected) {
        return Err(CoprocessorError::KindMismatch);
    }
    let entry = load_entry(env, handle).ok_or(CoprocessorError::HandleNotAllowed)?;
    if !entry.allowed.contains(caller) {
        return Err(CoprocessorError::HandleNotAllowed);
    }
    Ok(entry.value)
}

/// Stores a fresh ciphertext readable by `owner` only.
pub fn store(env: &Env, handle: &Handle, value: u64, owner: &Address) {
    save_entry(
        env,
        handle,
        &Ciphertext {
            value,
            allowed: vec![env, owner.clone()],
        },
    );
}

/// Stores the result of an operation under a handle derived from the
/// operation itself and lets `caller` use it.
///
/// The same operation over the same operands always lands on the same
/// handle, so replaying a computation is idempotent and keeps every account
/// already allowed on the result.
pub fn store_result(
    env: &Env,
    caller: &Address,
    op: Op,
    operands: &Vec<Handle>,
    scalar: u64,
    kind: HandleKind,
    value: u64,
) -> Handle {
    let handle = derive(env, caller, op, operands, scalar, kind);
    match load_entry(env, &handle) {
        Some(mut entry) => {
            if !entry.allowed.contains(caller) {
                entry.allowed.push_back(caller.clone());
            }
            entry.value = value;
            save_entry(env, &handle, &entry);
        }
        None => store(env, &handle, value, caller),
    }
    handle
}

/// Sum, maximum and integer mean of `inputs`. Intermediate values never
/// reach storage.
pub fn fold(
    env: &Env,
    caller: &Address,
    inputs: &Vec<Handle>,
) -> Result<FoldedStats, CoprocessorError> {
    if inputs.is_empty() {
        return Ok(FoldedStats::empty(env));
    }

    let mut total: u64 = 0;
    let mut max: u64 = 0;
    for handle in inputs.iter() {
        let value = operand(env, caller, &handle, HandleKind::Uint64)?;
        total = total.wrapping_add(value);
        if value > max {
            max = value;
        }
    }
    let average = total / u64::from(inputs.len());

    Ok(FoldedStats {
        total: store_result(env, caller, Op::FoldTotal, inputs, 0, HandleKind::Uint64, total),
        max: store_result(env, caller, Op::FoldMax, inputs, 0, HandleKind::Uint64, max),
        average: store_result(
            env,
            caller,
            Op::FoldAverage,
            inputs,
            0,
            HandleKind::Uint64,
            average,
        ),
    })
}

fn derive(
    env: &Env,
    caller: &Address,
    op: Op,
    operands: &Vec<Handle>,
    scalar: u64,
    kind: HandleKind,
) -> Handle {
    let mut data = Bytes::new(env);
    data.extend_from_array(b"op");
    data.extend_from_array(&[op as u8]);
    data.append(&caller.clone().to_xdr(env));
    for operand in operands.iter() {
        data.extend_from_array(&operand.to_array());
    }
    data.extend_from_array(&scalar.to_be_bytes());
    tag_handle(env, &env.crypto().sha256(&data).into(), kind)
}
