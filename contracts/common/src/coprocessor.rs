use soroban_sdk::{contractclient, Address, Bytes, Env, Vec};

use crate::handle::Handle;
use crate::stats::FoldedStats;

/// The slice of the coprocessor that ledger contracts call.
///
/// `caller` is always the invoking contract: results of an operation are
/// usable by the caller only, until it passes them on with [`allow`].
///
/// [`allow`]: CoprocessorInterface::allow
#[contractclient(name = "CoprocessorClient")]
pub trait CoprocessorInterface {
    /// Checks that `proof` binds `handle` to `user` and `contract`. On
    /// success `contract` may use `handle` in later operations.
    fn verify_input(env: Env, contract: Address, user: Address, handle: Handle, proof: Bytes)
        -> bool;

    /// Encrypted sum, maximum and integer mean of `inputs` in one call.
    /// Only the three results are persisted.
    fn fold_stats(env: Env, caller: Address, inputs: Vec<Handle>) -> FoldedStats;

    /// Lets `account` use and decrypt `handle`. `caller` must already be
    /// allowed on it.
    fn allow(env: Env, caller: Address, handle: Handle, account: Address);

    fn is_allowed(env: Env, handle: Handle, account: Address) -> bool;
}
