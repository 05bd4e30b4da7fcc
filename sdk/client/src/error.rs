use coprocessor::CoprocessorError;
use offline_ledger::ContractError;
use soroban_sdk::InvokeError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("minutes must be greater than zero")]
    InvalidMinutes,

    #[error("authorization duration must be between 1 and 365 days, got {0}")]
    InvalidDuration(u32),

    #[error("an authorization needs at least one contract address")]
    EmptyContractSet,

    #[error("signer {signer} does not match the session account {account}")]
    SignerMismatch { signer: String, account: String },

    #[error("signature request rejected: {0}")]
    SignatureRejected(String),

    #[error("operation cancelled due to network change")]
    NetworkStaleness,

    // Ledger rejections
    #[error("ledger is not initialized")]
    NotInitialized,

    #[error("ledger is already initialized")]
    AlreadyInitialized,

    #[error("only the owner may change access to their ledger")]
    Unauthorized,

    #[error("access denied: ask the owner for a grant")]
    AccessDenied,

    #[error("record index out of range")]
    IndexOutOfRange,

    #[error("encrypted input proof rejected")]
    InvalidProof,

    // Coprocessor rejections
    #[error("coprocessor rejected the call: {0:?}")]
    Coprocessor(CoprocessorError),

    #[error("malformed decryption authorization")]
    InvalidAuthorization,

    #[error("decryption authorization expired")]
    AuthorizationExpired,

    #[error("decryption authorization is not valid yet")]
    AuthorizationNotYetValid,

    #[error("contract is not covered by the decryption authorization")]
    UnauthorizedContract,

    #[error("account signer is not registered with the coprocessor")]
    SignerNotRegistered,

    #[error("invocation failed: {0}")]
    Invocation(String),

    #[error("invalid query state: expected {expected}, found {found}")]
    InvalidState {
        expected: &'static str,
        found: &'static str,
    },

    #[error("authorization storage error: {0}")]
    Storage(String),

    #[error("invalid cached authorization: {0}")]
    InvalidCachedAuthorization(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl From<ContractError> for ClientError {
    fn from(err: ContractError) -> Self {
        match err {
            ContractError::NotInitialized => ClientError::NotInitialized,
            ContractError::AlreadyInitialized => ClientError::AlreadyInitialized,
            ContractError::Unauthorized => ClientError::Unauthorized,
            ContractError::AccessDenied => ClientError::AccessDenied,
            ContractError::IndexOutOfRange => ClientError::IndexOutOfRange,
            ContractError::InvalidProof => ClientError::InvalidProof,
        }
    }
}

impl From<CoprocessorError> for ClientError {
    fn from(err: CoprocessorError) -> Self {
        match err {
            CoprocessorError::InvalidAuthorization => ClientError::InvalidAuthorization,
            CoprocessorError::AuthorizationExpired => ClientError::AuthorizationExpired,
            CoprocessorError::AuthorizationNotYetValid => ClientError::AuthorizationNotYetValid,
            CoprocessorError::UnauthorizedContract => ClientError::UnauthorizedContract,
            CoprocessorError::SignerNotRegistered => ClientError::SignerNotRegistered,
            other => ClientError::Coprocessor(other),
        }
    }
}

impl From<soroban_sdk::Error> for ClientError {
    fn from(err: soroban_sdk::Error) -> Self {
        ClientError::Invocation(format!("{err:?}"))
    }
}

/// Flattens the nested result of a generated `try_*` contract call.
pub(crate) fn invoke<T, C, E>(
    result: std::result::Result<std::result::Result<T, C>, std::result::Result<E, InvokeError>>,
) -> Result<T>
where
    C: std::fmt::Debug,
    E: Into<ClientError>,
{
    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(ClientError::Invocation(format!(
            "unexpected return value: {err:?}"
        ))),
        Err(Ok(err)) => Err(err.into()),
        Err(Err(err)) => Err(ClientError::Invocation(format!("{err:?}"))),
    }
}
