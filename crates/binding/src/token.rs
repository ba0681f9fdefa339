//! ERC20 token contract bindings.

use alloy_sol_types::sol;

sol! {
    /// Subset of the ERC20 interface needed to fund a bridge withdrawal.
    #[sol(rpc)]
    interface IERC20 {
        /// Get token balance of an account
        function balanceOf(address account) external view returns (uint256);

        /// Get allowance granted by owner to spender
        function allowance(address owner, address spender) external view returns (uint256);

        /// Approve spender to spend tokens
        function approve(address spender, uint256 amount) external returns (bool);
    }
}
