//! Deterministic Uniswap V2 pair address derivation.
//!
//! Computes the pool address for a token paired against WETH entirely
//! offline: sort the pair, hash it into the CREATE2 salt, and apply the
//! factory's deterministic-deployment formula. Pure and side-effect-free.

use alloy::primitives::{keccak256, Address};

use crate::constants::{PAIR_INIT_CODE_HASH, UNISWAP_V2_FACTORY, WETH};

/// Derive the Uniswap V2 pair address for `token` against WETH.
///
/// Returns `None` for the zero address and for WETH itself (a token cannot
/// pair with itself).
pub fn derive_pair_address(token: Address) -> Option<Address> {
    if token == Address::ZERO || token == WETH {
        return None;
    }

    let (token0, token1) = if token < WETH { (token, WETH) } else { (WETH, token) };

    let mut packed = [0u8; 40];
    packed[..20].copy_from_slice(token0.as_slice());
    packed[20..].copy_from_slice(token1.as_slice());
    let salt = keccak256(packed);

    Some(UNISWAP_V2_FACTORY.create2(salt, PAIR_INIT_CODE_HASH))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
