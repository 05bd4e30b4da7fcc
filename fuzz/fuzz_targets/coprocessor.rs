#![no_main]

//! Fuzz harness for the coprocessor handle algebra.
//!
//! Every handle the fuzzer creates is mirrored by its plaintext. After the
//! action stream the app hands each handle to the user, who decrypts the
//! batch; every plaintext must match the model.

use arbitrary::Arbitrary;
use common::{
    authorization_message, decrypt_request_message, DecryptRequest, DecryptionAuthorization,
    Handle,
};
use coprocessor::{CoprocessorContract, CoprocessorContractClient, CoprocessorError};
use ed25519_dalek::{Signer, SigningKey};
use libfuzzer_sys::fuzz_target;
use soroban_sdk::{testutils::Address as _, vec, Address, Bytes, BytesN, Env, Vec as SorobanVec};

#[derive(Arbitrary, Debug)]
pub enum FuzzAction {
    Input { value: u32 },
    Add { lhs: u8, rhs: u8 },
    Max { lhs: u8, rhs: u8 },
    DivScalar { lhs: u8, divisor: u8 },
    Fold { picks: [u8; 3] },
}

/// Handles decrypted per `user_decrypt` call.
const BATCH: usize = 24;

fn sign(env: &Env, key: &SigningKey, message: &Bytes) -> BytesN<64> {
    let raw: Vec<u8> = message.iter().collect();
    BytesN::from_array(env, &key.sign(&raw).to_bytes())
}

fuzz_target!(|actions: Vec<FuzzAction>| {
    let env = Env::default();
    env.mock_all_auths();

    let client = CoprocessorContractClient::new(&env, &env.register(CoprocessorContract, ()));
    let user = Address::generate(&env);
    let app = Address::generate(&env);
    let account_key = SigningKey::from_bytes(&[1u8; 32]);
    let session_key = SigningKey::from_bytes(&[2u8; 32]);
    client.register_signer(
        &user,
        &BytesN::from_array(&env, &account_key.verifying_key().to_bytes()),
    );

    let mut model: Vec<(Handle, u64)> = Vec::new();

    for action in actions.into_iter().take(48) {
        let operand = |i: u8| model[i as usize % model.len()].clone();
        match action {
            FuzzAction::Input { value } => {
                let input = client.encrypt_input(&user, &app, &u64::from(value));
                assert!(client.verify_input(&app, &user, &input.handle, &input.proof));
                model.push((input.handle, u64::from(value)));
            }
            _ if model.is_empty() => {}
            FuzzAction::Add { lhs, rhs } => {
                let ((a, x), (b, y)) = (operand(lhs), operand(rhs));
                let handle = client.add(&app, &a, &b);
                model.push((handle, x.wrapping_add(y)));
            }
            FuzzAction::Max { lhs, rhs } => {
                let ((a, x), (b, y)) = (operand(lhs), operand(rhs));
                let cond = client.gt(&app, &a, &b);
                let handle = client.select(&app, &cond, &a, &b);
                model.push((handle, x.max(y)));
            }
            FuzzAction::DivScalar { lhs, divisor } => {
                let (a, x) = operand(lhs);
                let result = client.try_div_scalar(&app, &a, &u64::from(divisor));
                if divisor == 0 {
                    assert_eq!(result, Err(Ok(CoprocessorError::DivisionByZero)));
                } else {
                    model.push((result.expect("div").expect("conversion"), x / u64::from(divisor)));
                }
            }
            FuzzAction::Fold { picks } => {
                let mut inputs = SorobanVec::new(&env);
                let mut values = Vec::new();
                for pick in picks {
                    let (handle, value) = operand(pick);
                    inputs.push_back(handle);
                    values.push(value);
                }
                let folded = client.fold_stats(&app, &inputs);
                let total = values.iter().fold(0u64, |acc, v| acc.wrapping_add(*v));
                let max = values.iter().copied().max().unwrap_or(0);
                model.push((folded.total, total));
                model.push((folded.max, max));
                model.push((folded.average, total / values.len() as u64));
            }
        }
    }

    if model.is_empty() {
        return;
    }

    let contracts = vec![&env, app.clone()];
    let public_key = BytesN::from_array(&env, &session_key.verifying_key().to_bytes());
    let start = env.ledger().timestamp();
    let message = authorization_message(&env, &user, &public_key, &contracts, start, 1);
    let authorization = DecryptionAuthorization {
        user_address: user.clone(),
        contract_addresses: contracts,
        public_key,
        signature: sign(&env, &account_key, &message),
        start_timestamp: start,
        duration_days: 1,
    };

    for chunk in model.chunks(BATCH) {
        let mut requests = SorobanVec::new(&env);
        for (handle, _) in chunk {
            client.allow(&app, handle, &user);
            requests.push_back(DecryptRequest {
                handle: handle.clone(),
                contract: app.clone(),
            });
        }
        let plaintexts = client.user_decrypt(
            &requests,
            &authorization,
            &sign(&env, &session_key, &decrypt_request_message(&env, &requests)),
        );
        for (handle, expected) in chunk {
            assert_eq!(
                plaintexts.get(handle.clone()),
                Some(*expected),
                "INVARIANT VIOLATION: handle plaintext diverged from model"
            );
        }
    }
});
