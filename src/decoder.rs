//! Swap classifier and calldata decoder.
//!
//! Recognizes Uniswap V2 router swap calls by function selector, ABI-decodes
//! the path and amount parameters, and produces a [`SwapEvent`]. Decoding
//! failures degrade to a heuristic calldata scan rather than rejecting the
//! transaction — mempool data is adversarial and must never abort the loop.

use alloy::primitives::{Address, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::constants::*;
use crate::types::{RawTransaction, SwapEvent, SwapKind};

// ---------------------------------------------------------------------------
// ABI definitions via sol! macro
// ---------------------------------------------------------------------------

sol! {
    function swapExactETHForTokens(
        uint256 amountOutMin,
        address[] path,
        address to,
        uint256 deadline
    );

    function swapETHForExactTokens(
        uint256 amountOut,
        address[] path,
        address to,
        uint256 deadline
    );

    function swapExactETHForTokensSupportingFeeOnTransferTokens(
        uint256 amountOutMin,
        address[] path,
        address to,
        uint256 deadline
    );

    function swapExactTokensForETH(
        uint256 amountIn,
        uint256 amountOutMin,
        address[] path,
        address to,
        uint256 deadline
    );

    function swapTokensForExactETH(
        uint256 amountOut,
        uint256 amountInMax,
        address[] path,
        address to,
        uint256 deadline
    );

    function swapExactTokensForETHSupportingFeeOnTransferTokens(
        uint256 amountIn,
        uint256 amountOutMin,
        address[] path,
        address to,
        uint256 deadline
    );

    function swapExactTokensForTokens(
        uint256 amountIn,
        uint256 amountOutMin,
        address[] path,
        address to,
        uint256 deadline
    );

    function swapTokensForExactTokens(
        uint256 amountOut,
        uint256 amountInMax,
        address[] path,
        address to,
        uint256 deadline
    );

    function swapExactTokensForTokensSupportingFeeOnTransferTokens(
        uint256 amountIn,
        uint256 amountOutMin,
        address[] path,
        address to,
        uint256 deadline
    );
}

// ---------------------------------------------------------------------------
// Signature registry
// ---------------------------------------------------------------------------

/// Direction tag of a registered swap signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapTag {
    /// Native asset in, token out.
    Buy,
    /// Token in, native asset out.
    Sell,
    /// Token to token.
    Swap,
}

/// A registered swap function signature, keyed by 4-byte selector.
#[derive(Debug, Clone, Copy)]
pub struct SwapSignature {
    pub selector: [u8; 4],
    pub name: &'static str,
    pub tag: SwapTag,
}

/// The fixed, enumerable set of recognized swap calls.
pub const SWAP_SIGNATURES: [SwapSignature; 9] = [
    SwapSignature {
        selector: SEL_SWAP_EXACT_ETH_FOR_TOKENS,
        name: "swapExactETHForTokens",
        tag: SwapTag::Buy,
    },
    SwapSignature {
        selector: SEL_SWAP_ETH_FOR_EXACT_TOKENS,
        name: "swapETHForExactTokens",
        tag: SwapTag::Buy,
    },
    SwapSignature {
        selector: SEL_SWAP_EXACT_ETH_FOR_TOKENS_FEE,
        name: "swapExactETHForTokensSupportingFeeOnTransferTokens",
        tag: SwapTag::Buy,
    },
    SwapSignature {
        selector: SEL_SWAP_EXACT_TOKENS_FOR_ETH,
        name: "swapExactTokensForETH",
        tag: SwapTag::Sell,
    },
    SwapSignature {
        selector: SEL_SWAP_TOKENS_FOR_EXACT_ETH,
        name: "swapTokensForExactETH",
        tag: SwapTag::Sell,
    },
    SwapSignature {
        selector: SEL_SWAP_EXACT_TOKENS_FOR_ETH_FEE,
        name: "swapExactTokensForETHSupportingFeeOnTransferTokens",
        tag: SwapTag::Sell,
    },
    SwapSignature {
        selector: SEL_SWAP_EXACT_TOKENS_FOR_TOKENS,
        name: "swapExactTokensForTokens",
        tag: SwapTag::Swap,
    },
    SwapSignature {
        selector: SEL_SWAP_TOKENS_FOR_EXACT_TOKENS,
        name: "swapTokensForExactTokens",
        tag: SwapTag::Swap,
    },
    SwapSignature {
        selector: SEL_SWAP_EXACT_TOKENS_FOR_TOKENS_FEE,
        name: "swapExactTokensForTokensSupportingFeeOnTransferTokens",
        tag: SwapTag::Swap,
    },
];

/// Look up a registered signature by selector.
pub fn lookup_signature(selector: [u8; 4]) -> Option<&'static SwapSignature> {
    SWAP_SIGNATURES.iter().find(|s| s.selector == selector)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Attempt to decode a pending transaction as a router swap.
///
/// Returns `None` if:
/// - The `to` address is missing, unparseable, or not the monitored router
/// - The calldata is not valid hex or shorter than 4 bytes
/// - The function selector is not in the registry
///
/// These are all expected cases — the vast majority of mempool transactions
/// are not swaps on the monitored router. ABI decoding failure past the
/// selector is *not* a rejection: the event is still emitted with a
/// best-effort token address from a heuristic calldata scan.
pub fn decode_transaction(raw: &RawTransaction) -> Option<SwapEvent> {
    let to: Address = raw.to.as_deref()?.trim().parse().ok()?;
    if to != UNISWAP_V2_ROUTER {
        return None;
    }

    let input = raw.input.trim();
    let calldata = hex::decode(input.strip_prefix("0x").unwrap_or(input)).ok()?;
    if calldata.len() < 4 {
        return None;
    }

    let selector: [u8; 4] = calldata[..4].try_into().expect("slice is exactly 4 bytes");
    let sig = lookup_signature(selector)?;

    let eth_value = wei_to_ether(parse_wei_hex(&raw.value));

    let (token, kind) = decode_params(sig, &calldata, eth_value)
        .unwrap_or_else(|| fallback_decode(sig, &calldata, eth_value));

    Some(SwapEvent::new(raw, kind, token))
}

/// Decode the registered parameter layout for a recognized selector.
///
/// Returns the normalized token address and the tagged amounts, or `None`
/// when the ABI payload is malformed (caller falls back to the heuristic).
fn decode_params(
    sig: &SwapSignature,
    calldata: &[u8],
    eth_value: Decimal,
) -> Option<(Option<Address>, SwapKind)> {
    match sig.selector {
        // --- ETH-input: msg.value is the amount in, path[1] is the token ---
        SEL_SWAP_EXACT_ETH_FOR_TOKENS => {
            let call = swapExactETHForTokensCall::abi_decode(calldata).ok()?;
            let token = call.path.get(1).copied()?;
            Some((normalize_token(token), SwapKind::Buy { amount: eth_value }))
        }
        SEL_SWAP_ETH_FOR_EXACT_TOKENS => {
            let call = swapETHForExactTokensCall::abi_decode(calldata).ok()?;
            let token = call.path.get(1).copied()?;
            Some((normalize_token(token), SwapKind::Buy { amount: eth_value }))
        }
        SEL_SWAP_EXACT_ETH_FOR_TOKENS_FEE => {
            let call =
                swapExactETHForTokensSupportingFeeOnTransferTokensCall::abi_decode(calldata)
                    .ok()?;
            let token = call.path.get(1).copied()?;
            Some((normalize_token(token), SwapKind::Buy { amount: eth_value }))
        }

        // --- Token-input, ETH-output: path[0] is the token ---
        SEL_SWAP_EXACT_TOKENS_FOR_ETH => {
            let call = swapExactTokensForETHCall::abi_decode(calldata).ok()?;
            let token = call.path.first().copied()?;
            Some((
                normalize_token(token),
                SwapKind::Sell {
                    amount: wei_to_ether(call.amountOutMin),
                    token_amount: wei_to_ether(call.amountIn),
                },
            ))
        }
        SEL_SWAP_EXACT_TOKENS_FOR_ETH_FEE => {
            let call =
                swapExactTokensForETHSupportingFeeOnTransferTokensCall::abi_decode(calldata)
                    .ok()?;
            let token = call.path.first().copied()?;
            Some((
                normalize_token(token),
                SwapKind::Sell {
                    amount: wei_to_ether(call.amountOutMin),
                    token_amount: wei_to_ether(call.amountIn),
                },
            ))
        }
        SEL_SWAP_TOKENS_FOR_EXACT_ETH => {
            let call = swapTokensForExactETHCall::abi_decode(calldata).ok()?;
            let token = call.path.first().copied()?;
            Some((
                normalize_token(token),
                SwapKind::Sell {
                    amount: wei_to_ether(call.amountOut),
                    token_amount: wei_to_ether(call.amountInMax),
                },
            ))
        }

        // --- Token to token: path[0] is the sold token ---
        SEL_SWAP_EXACT_TOKENS_FOR_TOKENS => {
            let call = swapExactTokensForTokensCall::abi_decode(calldata).ok()?;
            let token = call.path.first().copied()?;
            Some((
                normalize_token(token),
                SwapKind::Swap {
                    amount: wei_to_ether(call.amountIn),
                },
            ))
        }
        SEL_SWAP_EXACT_TOKENS_FOR_TOKENS_FEE => {
            let call =
                swapExactTokensForTokensSupportingFeeOnTransferTokensCall::abi_decode(calldata)
                    .ok()?;
            let token = call.path.first().copied()?;
            Some((
                normalize_token(token),
                SwapKind::Swap {
                    amount: wei_to_ether(call.amountIn),
                },
            ))
        }
        SEL_SWAP_TOKENS_FOR_EXACT_TOKENS => {
            let call = swapTokensForExactTokensCall::abi_decode(calldata).ok()?;
            let token = call.path.first().copied()?;
            Some((
                normalize_token(token),
                SwapKind::Swap {
                    amount: wei_to_ether(call.amountInMax),
                },
            ))
        }

        _ => None,
    }
}

/// Best-effort decoding when the ABI payload is malformed.
///
/// Amounts are read from the fixed head words where each selector's layout
/// puts them: exact-in variants lead with the input amount, exact-out
/// variants with the output amount. The token address comes from a
/// word-aligned scan of the body.
fn fallback_decode(
    sig: &SwapSignature,
    calldata: &[u8],
    eth_value: Decimal,
) -> (Option<Address>, SwapKind) {
    let token = heuristic_token_scan(calldata);
    let head = |index| wei_to_ether(word_u256(calldata, index).unwrap_or(U256::ZERO));
    let kind = match sig.tag {
        SwapTag::Buy => SwapKind::Buy { amount: eth_value },
        SwapTag::Sell => {
            // swapTokensForExactETH: (amountOut, amountInMax, ...)
            // the exact-in variants: (amountIn, amountOutMin, ...)
            let (eth_word, token_word) = if sig.selector == SEL_SWAP_TOKENS_FOR_EXACT_ETH {
                (0, 1)
            } else {
                (1, 0)
            };
            SwapKind::Sell {
                amount: head(eth_word),
                token_amount: head(token_word),
            }
        }
        SwapTag::Swap => {
            // swapTokensForExactTokens carries the input amount second.
            let input_word = if sig.selector == SEL_SWAP_TOKENS_FOR_EXACT_TOKENS {
                1
            } else {
                0
            };
            SwapKind::Swap {
                amount: head(input_word),
            }
        }
    };
    (token, kind)
}

/// Scan the calldata body for a 32-byte word that looks like an ABI-encoded
/// address: 12 zero bytes followed by 20 bytes of address.
///
/// The top bytes of the candidate must be populated so that small integer
/// words are not mistaken for addresses, and the base-asset wrapper is
/// skipped since it never identifies the traded token.
fn heuristic_token_scan(calldata: &[u8]) -> Option<Address> {
    for word in calldata[4..].chunks_exact(32) {
        if word[..12] != [0u8; 12] {
            continue;
        }
        if word[12..16] == [0u8; 4] {
            continue;
        }
        let candidate = Address::from_slice(&word[12..]);
        if candidate != Address::ZERO && candidate != WETH {
            return Some(candidate);
        }
    }
    None
}

/// Read the n-th 32-byte head word after the selector.
fn word_u256(calldata: &[u8], index: usize) -> Option<U256> {
    let start = 4 + index * 32;
    let word = calldata.get(start..start + 32)?;
    Some(U256::from_be_slice(word))
}

/// The all-zero address means "unknown", never a valid token.
fn normalize_token(addr: Address) -> Option<Address> {
    (addr != Address::ZERO).then_some(addr)
}

// ---------------------------------------------------------------------------
// Amount conversion
// ---------------------------------------------------------------------------

const WEI_PER_ETHER: Decimal = dec!(1_000_000_000_000_000_000);

/// Parse a hex wei value ("0x..." or bare hex) into a U256. Unparseable
/// input counts as zero — value is display data, not a rejection criterion.
pub fn parse_wei_hex(value: &str) -> U256 {
    let v = value.trim();
    let v = v.strip_prefix("0x").unwrap_or(v);
    if v.is_empty() {
        return U256::ZERO;
    }
    U256::from_str_radix(v, 16).unwrap_or(U256::ZERO)
}

/// Convert a wei amount to ether. Values too large for `Decimal` collapse
/// to zero rather than erroring, matching the best-effort amount policy.
pub fn wei_to_ether(wei: U256) -> Decimal {
    wei.to_string()
        .parse::<Decimal>()
        .map(|d| d / WEI_PER_ETHER)
        .unwrap_or(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const RECIPIENT: Address = Address::new([0x11; 20]);

    fn raw_tx(to: &str, input: String, value: &str) -> RawTransaction {
        RawTransaction {
            hash: "0xaabbccddeeff00112233445566778899aabbccddeeff00112233445566778899"
                .to_string(),
            from: "0x1111111111111111111111111111111111111111".to_string(),
            to: Some(to.to_string()),
            input,
            value: value.to_string(),
        }
    }

    fn router() -> String {
        format!("0x{}", hex::encode(UNISWAP_V2_ROUTER))
    }

    fn to_hex(data: Vec<u8>) -> String {
        format!("0x{}", hex::encode(data))
    }

    fn buy_calldata(token: Address) -> String {
        let call = swapExactETHForTokensCall {
            amountOutMin: U256::ZERO,
            path: vec![WETH, token],
            to: RECIPIENT,
            deadline: U256::from(4_000_000_000u64),
        };
        to_hex(call.abi_encode())
    }

    fn sell_calldata(token: Address, amount_in: U256, min_out: U256) -> String {
        let call = swapExactTokensForETHCall {
            amountIn: amount_in,
            amountOutMin: min_out,
            path: vec![token, WETH],
            to: RECIPIENT,
            deadline: U256::from(4_000_000_000u64),
        };
        to_hex(call.abi_encode())
    }

    #[test]
    fn test_rejects_non_router_recipient() {
        let raw = raw_tx(
            "0x2222222222222222222222222222222222222222",
            buy_calldata(PEPE),
            "0x0",
        );
        assert!(decode_transaction(&raw).is_none());
    }

    #[test]
    fn test_router_match_is_case_insensitive() {
        let raw = raw_tx(&router().to_uppercase().replace("0X", "0x"), buy_calldata(PEPE), "0x0");
        assert!(decode_transaction(&raw).is_some());
    }

    #[test]
    fn test_rejects_unknown_selector() {
        let mut data = vec![0xde, 0xad, 0xbe, 0xef];
        data.extend_from_slice(&[0u8; 64]);
        let raw = raw_tx(&router(), to_hex(data), "0x0");
        assert!(decode_transaction(&raw).is_none());
    }

    #[test]
    fn test_rejects_short_calldata() {
        let raw = raw_tx(&router(), "0x7ff3".to_string(), "0x0");
        assert!(decode_transaction(&raw).is_none());
    }

    #[test]
    fn test_rejects_missing_to() {
        let mut raw = raw_tx(&router(), buy_calldata(PEPE), "0x0");
        raw.to = None;
        assert!(decode_transaction(&raw).is_none());
    }

    #[test]
    fn test_decodes_buy_with_token_and_value() {
        // 1 ETH in wei.
        let raw = raw_tx(&router(), buy_calldata(PEPE), "0xde0b6b3a7640000");
        let event = decode_transaction(&raw).expect("recognized buy");

        assert_eq!(event.kind, SwapKind::Buy { amount: Decimal::ONE });
        assert_eq!(event.token_address, Some(PEPE));
        assert_eq!(event.to_address, router());
    }

    #[test]
    fn test_decodes_sell_amounts_and_token() {
        // 1000 tokens in, 0.25 ETH minimum out.
        let amount_in = U256::from(1000u64) * U256::from(10u64).pow(U256::from(18));
        let min_out = U256::from(250_000_000_000_000_000u128);
        let raw = raw_tx(&router(), sell_calldata(SHIB, amount_in, min_out), "0x0");
        let event = decode_transaction(&raw).expect("recognized sell");

        assert_eq!(
            event.kind,
            SwapKind::Sell {
                amount: dec!(0.25),
                token_amount: dec!(1000),
            }
        );
        assert_eq!(event.token_address, Some(SHIB));
    }

    #[test]
    fn test_decodes_token_to_token_swap() {
        let call = swapExactTokensForTokensCall {
            amountIn: U256::from(5u64) * U256::from(10u64).pow(U256::from(18)),
            amountOutMin: U256::ZERO,
            path: vec![UNI, WETH, USDC],
            to: RECIPIENT,
            deadline: U256::from(4_000_000_000u64),
        };
        let raw = raw_tx(&router(), to_hex(call.abi_encode()), "0x0");
        let event = decode_transaction(&raw).expect("recognized swap");

        assert_eq!(event.kind, SwapKind::Swap { amount: dec!(5) });
        assert_eq!(event.token_address, Some(UNI));
    }

    #[test]
    fn test_zero_token_address_is_unknown() {
        let raw = raw_tx(&router(), buy_calldata(Address::ZERO), "0x0");
        let event = decode_transaction(&raw).expect("still a recognized buy");
        assert_eq!(event.token_address, None);
    }

    #[test]
    fn test_malformed_calldata_falls_back_to_heuristic() {
        // Sell selector with a broken ABI body: amountIn head word, a junk
        // word, then a bare address word.
        let mut data = SEL_SWAP_EXACT_TOKENS_FOR_ETH.to_vec();
        let amount_in = U256::from(5u64) * U256::from(10u64).pow(U256::from(18));
        data.extend_from_slice(&amount_in.to_be_bytes::<32>());
        data.extend_from_slice(&[0xff; 32]);
        let mut addr_word = [0u8; 32];
        addr_word[12..].copy_from_slice(PEPE.as_slice());
        data.extend_from_slice(&addr_word);

        let raw = raw_tx(&router(), to_hex(data), "0x0");
        let event = decode_transaction(&raw).expect("emitted despite malformed body");

        assert_eq!(event.kind.label(), "sell");
        assert_eq!(event.token_address, Some(PEPE));
        assert_eq!(
            event.kind,
            SwapKind::Sell {
                amount: Decimal::ZERO,
                token_amount: dec!(5),
            }
        );
    }

    #[test]
    fn test_fallback_exact_out_sell_keeps_head_word_order() {
        // swapTokensForExactETH leads with amountOut, then amountInMax.
        let mut data = SEL_SWAP_TOKENS_FOR_EXACT_ETH.to_vec();
        let amount_out = U256::from(250_000_000_000_000_000u128);
        let amount_in_max = U256::from(5u64) * U256::from(10u64).pow(U256::from(18));
        data.extend_from_slice(&amount_out.to_be_bytes::<32>());
        data.extend_from_slice(&amount_in_max.to_be_bytes::<32>());
        data.extend_from_slice(&[0xff; 32]);
        let mut addr_word = [0u8; 32];
        addr_word[12..].copy_from_slice(PEPE.as_slice());
        data.extend_from_slice(&addr_word);

        let raw = raw_tx(&router(), to_hex(data), "0x0");
        let event = decode_transaction(&raw).expect("emitted despite malformed body");

        assert_eq!(
            event.kind,
            SwapKind::Sell {
                amount: dec!(0.25),
                token_amount: dec!(5),
            }
        );
        assert_eq!(event.token_address, Some(PEPE));
    }

    #[test]
    fn test_fallback_exact_out_swap_reads_input_amount() {
        // swapTokensForExactTokens leads with amountOut, then amountInMax.
        let mut data = SEL_SWAP_TOKENS_FOR_EXACT_TOKENS.to_vec();
        let amount_out = U256::from(7u64) * U256::from(10u64).pow(U256::from(18));
        let amount_in_max = U256::from(3u64) * U256::from(10u64).pow(U256::from(18));
        data.extend_from_slice(&amount_out.to_be_bytes::<32>());
        data.extend_from_slice(&amount_in_max.to_be_bytes::<32>());
        data.extend_from_slice(&[0xff; 32]);
        let mut addr_word = [0u8; 32];
        addr_word[12..].copy_from_slice(UNI.as_slice());
        data.extend_from_slice(&addr_word);

        let raw = raw_tx(&router(), to_hex(data), "0x0");
        let event = decode_transaction(&raw).expect("emitted despite malformed body");

        assert_eq!(event.kind, SwapKind::Swap { amount: dec!(3) });
        assert_eq!(event.token_address, Some(UNI));
    }

    #[test]
    fn test_heuristic_skips_base_asset_and_small_integers() {
        let mut data = SEL_SWAP_EXACT_TOKENS_FOR_ETH.to_vec();
        // A small integer word must not look like an address.
        data.extend_from_slice(&U256::from(12345u64).to_be_bytes::<32>());
        // The wrapper address is never the traded token.
        let mut weth_word = [0u8; 32];
        weth_word[12..].copy_from_slice(WETH.as_slice());
        data.extend_from_slice(&weth_word);

        assert_eq!(heuristic_token_scan(&data), None);
    }

    #[test]
    fn test_registry_covers_all_selectors_once() {
        for sig in &SWAP_SIGNATURES {
            let found = lookup_signature(sig.selector).expect("registered");
            assert_eq!(found.name, sig.name);
        }
        assert!(lookup_signature([0, 0, 0, 0]).is_none());
    }

    #[test]
    fn test_wei_parsing() {
        assert_eq!(parse_wei_hex("0x0"), U256::ZERO);
        assert_eq!(parse_wei_hex(""), U256::ZERO);
        assert_eq!(parse_wei_hex("not-hex"), U256::ZERO);
        assert_eq!(
            parse_wei_hex("0xde0b6b3a7640000"),
            U256::from(1_000_000_000_000_000_000u128)
        );
        assert_eq!(wei_to_ether(U256::from(500_000_000_000_000_000u128)), dec!(0.5));
    }
}
