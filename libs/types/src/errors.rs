//! Error taxonomy for client workflows
//!
//! `UnsupportedNetwork` is a steady state rather than a fault: workflows
//! report it so the presentation layer can disable itself, but it never
//! becomes an action-scoped failure. Every other variant is surfaced to the
//! user against the action that produced it.

use crate::account::ChainId;
use crate::amount::AmountError;
use ethers_core::types::U256;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DexError {
    /// No address set is configured for the connected chain (or no chain)
    #[error("Unsupported network (chain id {})", .chain_id.map(|id| id.to_string()).unwrap_or_else(|| "none".to_string()))]
    UnsupportedNetwork { chain_id: Option<ChainId> },

    /// Unparseable or non-positive amount
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] AmountError),

    /// Action attempted before its approval cleared
    #[error("Insufficient allowance: approved {allowance}, required {required}")]
    InsufficientAllowance { allowance: U256, required: U256 },

    /// Wallet prompt declined
    #[error("Request rejected in wallet")]
    UserRejected,

    /// On-chain precondition failed
    #[error("Contract reverted: {reason}")]
    ContractReverted { reason: String },

    /// RPC or transport failure
    #[error("Network error: {message}")]
    NetworkError { message: String },

    /// Another action of the same workflow is still submitting
    #[error("Action already in progress: {action}")]
    ActionInProgress { action: String },
}

impl DexError {
    pub fn network(message: impl Into<String>) -> Self {
        DexError::NetworkError {
            message: message.into(),
        }
    }

    pub fn reverted(reason: impl Into<String>) -> Self {
        DexError::ContractReverted {
            reason: reason.into(),
        }
    }

    /// Short stable name for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            DexError::UnsupportedNetwork { .. } => "unsupported_network",
            DexError::InvalidInput(_) => "invalid_input",
            DexError::InsufficientAllowance { .. } => "insufficient_allowance",
            DexError::UserRejected => "user_rejected",
            DexError::ContractReverted { .. } => "contract_reverted",
            DexError::NetworkError { .. } => "network_error",
            DexError::ActionInProgress { .. } => "action_in_progress",
        }
    }
}
