//! Core types for the mempool monitor.

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Raw feed input
// ---------------------------------------------------------------------------

/// A pending transaction as delivered inside a subscription notification.
///
/// All fields are hex strings straight off the wire. Mempool data is
/// untrusted, so every field is optional at the serde level and validated
/// during decoding.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTransaction {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub value: String,
}

// ---------------------------------------------------------------------------
// Swap kind
// ---------------------------------------------------------------------------

/// The kind of a recognized swap, carrying the variant-specific amounts.
///
/// Serializes flattened into [`SwapEvent`] as a `swap_type` tag plus the
/// amount fields, so the persisted shape is `{"swap_type": "sell",
/// "amount": "...", "token_amount": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "swap_type", rename_all = "lowercase")]
pub enum SwapKind {
    /// Native asset in, token out. `amount` is the ETH value sent.
    Buy {
        #[serde(with = "rust_decimal::serde::str")]
        amount: Decimal,
    },
    /// Token in, native asset out. `amount` is the decoded minimum ETH
    /// output; `token_amount` is the input token quantity, assumed 18
    /// decimals until display formatting.
    Sell {
        #[serde(with = "rust_decimal::serde::str")]
        amount: Decimal,
        #[serde(with = "rust_decimal::serde::str")]
        token_amount: Decimal,
    },
    /// Token-to-token swap. `amount` is the decoded input token quantity.
    Swap {
        #[serde(with = "rust_decimal::serde::str")]
        amount: Decimal,
    },
}

impl SwapKind {
    /// The `swap_type` tag as stored.
    pub fn label(&self) -> &'static str {
        match self {
            SwapKind::Buy { .. } => "buy",
            SwapKind::Sell { .. } => "sell",
            SwapKind::Swap { .. } => "swap",
        }
    }

    /// The primary display amount.
    pub fn amount(&self) -> Decimal {
        match self {
            SwapKind::Buy { amount }
            | SwapKind::Sell { amount, .. }
            | SwapKind::Swap { amount } => *amount,
        }
    }
}

// ---------------------------------------------------------------------------
// Swap event
// ---------------------------------------------------------------------------

/// The pipeline's central record: created by the decoder, enriched with
/// token metadata and a derived pool address, then persisted and notified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapEvent {
    /// Generated id, unique per detection.
    pub id: String,
    pub tx_hash: String,
    pub from_address: String,
    pub to_address: String,
    #[serde(flatten)]
    pub kind: SwapKind,
    /// Decoded token contract, absent when decoding could not recover one.
    pub token_address: Option<Address>,
    pub token_symbol: Option<String>,
    pub token_name: Option<String>,
    /// Derived Uniswap V2 pair against WETH.
    pub pool_address: Option<Address>,
    /// Point of detection, not of chain inclusion.
    pub timestamp: DateTime<Utc>,
}

impl SwapEvent {
    /// Build a fresh event from a raw transaction and decoding output.
    pub fn new(raw: &RawTransaction, kind: SwapKind, token_address: Option<Address>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tx_hash: raw.hash.to_lowercase(),
            from_address: raw.from.to_lowercase(),
            to_address: raw.to.as_deref().unwrap_or_default().to_lowercase(),
            kind,
            token_address,
            token_symbol: None,
            token_name: None,
            pool_address: None,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Token metadata
// ---------------------------------------------------------------------------

/// Best-effort token metadata. Derived data, never authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    /// Canonical lowercase address, or the invalid input verbatim for
    /// diagnostics when validation failed.
    pub address: String,
}

impl TokenInfo {
    pub fn new(symbol: &str, name: &str, decimals: u8, addr: &Address) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            decimals,
            address: format!("0x{}", hex::encode(addr)),
        }
    }

    /// Generic placeholder for an address that failed validation.
    pub fn unknown(address: &str) -> Self {
        Self {
            symbol: "UNKNOWN".to_string(),
            name: "Unknown Token".to_string(),
            decimals: 18,
            address: address.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
