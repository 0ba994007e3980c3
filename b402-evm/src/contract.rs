//! Solidity interface definitions for on-chain interactions.
//!
//! Contains the minimal ABI surface needed by the facilitator:
//! - [`IB402Relayer`] — the B402 relayer's transfer and replay-state entry points
//! - [`IERC20Metadata`] — ERC-20 metadata subset for token info resolution

use alloy_sol_types::sol;

sol! {
    /// Minimal B402 relayer interface.
    ///
    /// The relayer executes an EIP-3009 style transfer on behalf of the
    /// signer and records `(authorizer, nonce)` consumption, which makes it
    /// the authoritative replay-protection ledger. Only the two functions
    /// the facilitator actually calls are declared.
    #[allow(missing_docs)]
    #[allow(clippy::too_many_arguments)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IB402Relayer {
        function transferWithAuthorization(
            address token,
            address from,
            address to,
            uint256 value,
            uint256 validAfter,
            uint256 validBefore,
            bytes32 nonce,
            uint8 v,
            bytes32 r,
            bytes32 s
        ) external;
        function authorizationState(address authorizer, bytes32 nonce) external view returns (bool);
    }
}

sol! {
    /// ERC-20 metadata subset used by the token info resolver.
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IERC20Metadata {
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
        function name() external view returns (string);
    }
}
