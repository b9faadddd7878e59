// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Errors raised while talking to the wallet and to the ICO contracts.

use alloy::{
    contract,
    providers::PendingTransactionError,
    transports::{RpcError, TransportErrorKind},
};
use thiserror::Error;

/// The JSON-RPC error code a wallet returns when the user declines a request (EIP-1193).
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Error)]
pub enum IcoError {
    /// The user declined the wallet request.
    #[error("the request was rejected by the user")]
    UserRejected,

    /// Neither a local key nor a bridged wallet account is available.
    #[error("no wallet found")]
    NoWalletFound,

    #[error("wrong network: expected chain id {expected}, found {actual}")]
    WrongNetwork { expected: u64, actual: u64 },

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    /// The contract reverted for a reason that has no dedicated variant.
    #[error("the contract rejected the call: {0}")]
    ContractRejected(String),

    #[error("nothing to claim: {0}")]
    NothingToClaim(String),

    #[error("transaction {0} was reverted")]
    TransactionReverted(String),

    #[error("transaction was dropped: {0}")]
    TransactionDropped(String),

    #[error("failed to read on-chain state: {0}")]
    ReadFailed(String),

    #[error("the wallet is not connected")]
    NotConnected,

    /// A mint or claim is already waiting for its receipt.
    #[error("another transaction is still pending")]
    ActionPending,

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl IcoError {
    /// Whether the error has to be shown to the user instead of only being logged.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, IcoError::WrongNetwork { .. })
    }

    /// Maps an error from a contract read.
    pub fn from_read(error: contract::Error) -> Self {
        match rpc_failure(&error) {
            Some((code, _)) if code == USER_REJECTED_CODE => IcoError::UserRejected,
            _ => IcoError::ReadFailed(error.to_string()),
        }
    }

    /// Maps an error returned while submitting a transaction.
    ///
    /// Only an error payload from the node or the wallet means the call was rejected.
    /// Transport failures mean the transaction never reached the chain.
    pub fn from_submission(error: contract::Error) -> Self {
        if let Some((code, message)) = rpc_failure(&error) {
            return classify_rpc_failure(code, message);
        }
        match error {
            contract::Error::PendingTransactionError(error) => error.into(),
            contract::Error::TransportError(error) => {
                IcoError::TransactionDropped(error.to_string())
            }
            error => IcoError::ContractRejected(error.to_string()),
        }
    }

    /// Maps an RPC error that is not attached to a contract call.
    pub fn from_rpc(error: RpcError<TransportErrorKind>) -> Self {
        match error.as_error_resp() {
            Some(payload) if payload.code == USER_REJECTED_CODE => IcoError::UserRejected,
            _ => IcoError::ReadFailed(error.to_string()),
        }
    }
}

impl From<PendingTransactionError> for IcoError {
    fn from(error: PendingTransactionError) -> Self {
        IcoError::TransactionDropped(error.to_string())
    }
}

fn rpc_failure(error: &contract::Error) -> Option<(i64, &str)> {
    match error {
        contract::Error::TransportError(error) => error
            .as_error_resp()
            .map(|payload| (payload.code, payload.message.as_ref())),
        _ => None,
    }
}

/// Classifies the error payload returned by a node or a wallet for a rejected
/// transaction submission.
///
/// The revert reasons are the ones emitted by the `MyToken` contract.
pub fn classify_rpc_failure(code: i64, message: &str) -> IcoError {
    if code == USER_REJECTED_CODE {
        return IcoError::UserRejected;
    }
    let lowercase = message.to_lowercase();
    let reason = revert_reason(message).to_string();
    if lowercase.contains("insufficient funds") || lowercase.contains("ether sent is incorrect") {
        IcoError::InsufficientFunds(reason)
    } else if lowercase.contains("already claimed") || lowercase.contains("dont own any") {
        IcoError::NothingToClaim(reason)
    } else {
        IcoError::ContractRejected(reason)
    }
}

/// Strips the node's `execution reverted:` prefix, if any.
pub fn revert_reason(message: &str) -> &str {
    message
        .strip_prefix("execution reverted:")
        .map(str::trim)
        .unwrap_or(message)
}
