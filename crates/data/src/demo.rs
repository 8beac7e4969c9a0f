//! Demonstration pools for running without a node.

use nlswap_domain::PoolSnapshot;
use primitive_types::U256;

pub const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";
pub const USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
pub const DAI: &str = "0x6b175474e89094c44da98b954eedeac495271d0f";
pub const WBTC: &str = "0x2260fac5e5542a773aa44fbcfedf7c193bc2c599";
pub const LINK: &str = "0x514910771af9ca656af840dff83e8264ecf986ca";
pub const UNI: &str = "0x1f9840a85d5af5bf1d1762f925bdaddc4201f984";
pub const USDT: &str = "0xdac17f958d2ee523a2206206994597c13d831ec7";

fn units(whole: u64, decimals: usize) -> U256 {
    U256::from(whole) * U256::exp10(decimals)
}

/// ETH/USDC, ETH/DAI, WBTC/ETH, LINK/ETH and UNI/USDT with fixed reserves.
pub fn demo_pools() -> Vec<PoolSnapshot> {
    vec![
        PoolSnapshot::from_symbols(
            "0x1234567890123456789012345678901234567890",
            (WETH, "ETH"),
            (USDC, "USDC"),
            units(10, 18),
            units(20_000, 6),
        ),
        PoolSnapshot::from_symbols(
            "0x0987654321098765432109876543210987654321",
            (WETH, "ETH"),
            (DAI, "DAI"),
            units(15, 18),
            units(30_000, 18),
        ),
        PoolSnapshot::from_symbols(
            "0xabcdef1234567890abcdef1234567890abcdef12",
            (WBTC, "WBTC"),
            (WETH, "ETH"),
            units(2, 8),
            units(60, 18),
        ),
        PoolSnapshot::from_symbols(
            "0x2345678901234567890123456789012345678901",
            (LINK, "LINK"),
            (WETH, "ETH"),
            units(500, 18),
            units(25, 18),
        ),
        PoolSnapshot::from_symbols(
            "0x3456789012345678901234567890123456789012",
            (UNI, "UNI"),
            (USDT, "USDT"),
            units(10_000, 18),
            units(50_000, 6),
        ),
    ]
}
