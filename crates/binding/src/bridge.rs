//! Bridge adapter bindings.
//!
//! Adapters live on the L2 and pull the approved token from the caller before
//! handing it to the native bridge. The OP Stack L2 adapter ignores
//! `remoteToken` and the payload, other adapters may not.

use alloy_sol_types::sol;

sol! {
    /// Common interface implemented by every bridge adapter.
    #[sol(rpc)]
    interface IBridgeAdapter {
        /// Send `amount` of `localToken` to `remoteReceiver` on the remote chain.
        ///
        /// Returns adapter specific data about the transfer (e.g. a nonce).
        function sendERC20(
            address localToken,
            address remoteToken,
            address remoteReceiver,
            uint256 amount,
            bytes calldata bridgeSpecificPayload
        ) external payable returns (bytes memory);
    }
}
