//! Contract bindings
//!
//! The exchange contract is also the LP token, so LP balances are read
//! with `balanceOf` on the exchange address.

/// ERC-20 token
pub mod erc20 {
    use ethers::prelude::abigen;

    abigen!(
        Erc20Token,
        r#"[
            function balanceOf(address owner) external view returns (uint256)
            function allowance(address owner, address spender) external view returns (uint256)
            function approve(address spender, uint256 amount) external returns (bool)
            function totalSupply() external view returns (uint256)
            function symbol() external view returns (string)
            function decimals() external view returns (uint8)
        ]"#
    );
}

/// Constant-product exchange
pub mod exchange {
    use ethers::prelude::abigen;

    abigen!(
        AmmExchange,
        r#"[
            function getReserves() external view returns (uint256, uint256)
            function totalSupply() external view returns (uint256)
            function balanceOf(address owner) external view returns (uint256)
            function swap(address tokenIn, uint256 amountIn) external returns (uint256)
            function addLiquidity(uint256 amountA, uint256 amountB) external returns (uint256)
            function removeLiquidity(uint256 liquidity) external returns (uint256, uint256)
        ]"#
    );
}

pub use erc20::Erc20Token;
pub use exchange::AmmExchange;
