//! Provider/contract error classification

use dex_types::DexError;
use ethers::contract::ContractError;
use ethers::providers::{Middleware, ProviderError, RpcError};
use tracing::debug;

/// EIP-1193 "user rejected the request"
pub const USER_REJECTED_CODE: i64 = 4001;

/// Geth-style "execution reverted" error code
const EXECUTION_REVERTED_CODE: i64 = 3;

/// Classify a JSON-RPC level failure
pub fn classify_provider_error(err: &ProviderError) -> DexError {
    if let Some(response) = err.as_error_response() {
        debug!(
            "RPC error response code={} message={}",
            response.code, response.message
        );

        if response.code == USER_REJECTED_CODE {
            return DexError::UserRejected;
        }

        let message = response.message.to_lowercase();
        if response.code == EXECUTION_REVERTED_CODE || message.contains("revert") {
            return DexError::reverted(response.message.clone());
        }

        if message.contains("user rejected") || message.contains("user denied") {
            return DexError::UserRejected;
        }
    }

    DexError::network(err.to_string())
}

/// Classify a failed contract call
pub fn classify_contract_error<M: Middleware>(err: ContractError<M>) -> DexError {
    if err.is_revert() {
        let reason = err
            .decode_revert::<String>()
            .unwrap_or_else(|| "execution reverted".to_string());
        return DexError::reverted(reason);
    }

    if let Some(provider_error) = err.as_provider_error() {
        return classify_provider_error(provider_error);
    }

    DexError::network(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::providers::JsonRpcError;

    fn rpc_error(code: i64, message: &str) -> ProviderError {
        ProviderError::JsonRpcClientError(Box::new(
            ethers::providers::HttpClientError::JsonRpcError(JsonRpcError {
                code,
                message: message.to_string(),
                data: None,
            }),
        ))
    }

    #[test]
    fn test_user_rejection() {
        assert_eq!(
            classify_provider_error(&rpc_error(4001, "User rejected the request.")),
            DexError::UserRejected
        );
    }

    #[test]
    fn test_revert() {
        let err = classify_provider_error(&rpc_error(3, "execution reverted: INSUFFICIENT_LIQUIDITY"));
        assert_eq!(
            err,
            DexError::reverted("execution reverted: INSUFFICIENT_LIQUIDITY")
        );

        let err = classify_provider_error(&rpc_error(-32000, "execution reverted"));
        assert!(matches!(err, DexError::ContractReverted { .. }));
    }

    #[test]
    fn test_other_failures_are_network_errors() {
        let err = classify_provider_error(&rpc_error(-32603, "header not found"));
        assert!(matches!(err, DexError::NetworkError { .. }));

        let err = classify_provider_error(&ProviderError::CustomError("timeout".to_string()));
        assert!(matches!(err, DexError::NetworkError { .. }));
    }
}
