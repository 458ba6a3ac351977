//! Monitored router, swap function selectors, and token addresses for
//! Ethereum mainnet.

use alloy::primitives::{address, b256, Address, B256};

use crate::types::TokenInfo;

// ---------------------------------------------------------------------------
// Monitored router
// ---------------------------------------------------------------------------

/// Uniswap V2 Router02.
pub const UNISWAP_V2_ROUTER: Address = address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D");

/// Uniswap V2 factory, used for deterministic pair derivation.
pub const UNISWAP_V2_FACTORY: Address = address!("5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f");

/// keccak256 of the UniswapV2Pair creation bytecode.
pub const PAIR_INIT_CODE_HASH: B256 =
    b256!("96e8ac4277198ff8b6f785478aa9a39f403cb768dd02cbee326c3e7da348845f");

// ---------------------------------------------------------------------------
// Swap function selectors (Uniswap V2 Router02, 9 total)
// ---------------------------------------------------------------------------

pub const SEL_SWAP_EXACT_ETH_FOR_TOKENS: [u8; 4] = [0x7f, 0xf3, 0x6a, 0xb5];
pub const SEL_SWAP_ETH_FOR_EXACT_TOKENS: [u8; 4] = [0xfb, 0x3b, 0xdb, 0x41];
pub const SEL_SWAP_EXACT_ETH_FOR_TOKENS_FEE: [u8; 4] = [0xb6, 0xf9, 0xde, 0x95];
pub const SEL_SWAP_EXACT_TOKENS_FOR_ETH: [u8; 4] = [0x18, 0xcb, 0xaf, 0xe5];
pub const SEL_SWAP_TOKENS_FOR_EXACT_ETH: [u8; 4] = [0x4a, 0x25, 0xd9, 0x4a];
pub const SEL_SWAP_EXACT_TOKENS_FOR_ETH_FEE: [u8; 4] = [0x79, 0x1a, 0xc9, 0x47];
pub const SEL_SWAP_EXACT_TOKENS_FOR_TOKENS: [u8; 4] = [0x38, 0xed, 0x17, 0x39];
pub const SEL_SWAP_TOKENS_FOR_EXACT_TOKENS: [u8; 4] = [0x88, 0x03, 0xdb, 0xee];
pub const SEL_SWAP_EXACT_TOKENS_FOR_TOKENS_FEE: [u8; 4] = [0x5c, 0x11, 0xd7, 0x95];

// ---------------------------------------------------------------------------
// Token addresses (Ethereum mainnet)
// ---------------------------------------------------------------------------

/// Wrapped Ether — the base asset every monitored pool is paired against.
pub const WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");

pub const USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
pub const USDT: Address = address!("dAC17F958D2ee523a2206206994597C13D831ec7");
pub const DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");
pub const WBTC: Address = address!("2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599");
pub const UNI: Address = address!("1f9840a85d5aF5bf1D1762F925BDADdC4201F984");
pub const LINK: Address = address!("514910771AF9Ca656af840dff83E8264EcF986CA");
pub const SHIB: Address = address!("95aD61b0a150d79219dCF64E1E6Cc01f0B64C4cE");
pub const PEPE: Address = address!("6982508145454Ce325dDbE47a25d4ec3d2311933");

/// Pre-seeded metadata for well-known tokens. Checked before any external
/// provider is queried.
pub fn well_known_token(addr: &Address) -> Option<TokenInfo> {
    let (symbol, name, decimals) = match *addr {
        a if a == WETH => ("WETH", "Wrapped Ether", 18),
        a if a == USDC => ("USDC", "USD Coin", 6),
        a if a == USDT => ("USDT", "Tether USD", 6),
        a if a == DAI => ("DAI", "Dai Stablecoin", 18),
        a if a == WBTC => ("WBTC", "Wrapped BTC", 8),
        a if a == UNI => ("UNI", "Uniswap", 18),
        a if a == LINK => ("LINK", "ChainLink Token", 18),
        a if a == SHIB => ("SHIB", "SHIBA INU", 18),
        a if a == PEPE => ("PEPE", "Pepe", 18),
        _ => return None,
    };
    Some(TokenInfo::new(symbol, name, decimals, addr))
}
