//! Token metadata resolution waterfall.
//!
//! Maps a token contract address to symbol/name/decimals. Resolution order:
//! base-asset sentinel, address-format validation, static well-known table,
//! ordered external providers, deterministic synthetic fallback. Never fails;
//! every path returns a usable [`TokenInfo`].

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use alloy::primitives::Address;
use lru::LruCache;
use tracing::debug;

use crate::constants::{well_known_token, WETH};
use crate::types::TokenInfo;

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// An external metadata provider. Each is unreliable, swappable, and
/// individually optional — any failure means "try the next one".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataProvider {
    CoinGecko,
    Ethplorer,
}

impl MetadataProvider {
    pub fn name(&self) -> &'static str {
        match self {
            MetadataProvider::CoinGecko => "coingecko",
            MetadataProvider::Ethplorer => "ethplorer",
        }
    }

    fn url(&self, address: &str) -> String {
        match self {
            MetadataProvider::CoinGecko => format!(
                "https://api.coingecko.com/api/v3/coins/ethereum/contract/{address}"
            ),
            MetadataProvider::Ethplorer => {
                format!("https://api.ethplorer.io/getTokenInfo/{address}?apiKey=freekey")
            }
        }
    }

    /// Extract (symbol, name, decimals) from a provider response body.
    fn parse(&self, body: &serde_json::Value) -> Option<(String, String, Option<u8>)> {
        let symbol = body.get("symbol")?.as_str()?.trim().to_uppercase();
        let name = body.get("name")?.as_str()?.trim().to_string();
        if symbol.is_empty() || name.is_empty() {
            return None;
        }

        let decimals = match self {
            // CoinGecko's contract endpoint does not carry decimals in a
            // stable place; default applies.
            MetadataProvider::CoinGecko => None,
            // Ethplorer returns decimals as a string.
            MetadataProvider::Ethplorer => body
                .get("decimals")
                .and_then(|d| d.as_str().and_then(|s| s.parse().ok()).or_else(|| {
                    d.as_u64().and_then(|n| u8::try_from(n).ok())
                })),
        };

        Some((symbol, name, decimals))
    }
}

/// The default provider order.
pub const DEFAULT_PROVIDERS: [MetadataProvider; 2] =
    [MetadataProvider::CoinGecko, MetadataProvider::Ethplorer];

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Cached, ordered metadata resolution for token addresses.
pub struct TokenResolver {
    client: reqwest::Client,
    providers: Vec<MetadataProvider>,
    /// Bounded cache so long-idle entries eventually evict.
    cache: Mutex<LruCache<String, TokenInfo>>,
}

impl TokenResolver {
    /// Build a resolver with an explicit provider order. An empty provider
    /// list degrades straight to the synthetic fallback.
    pub fn new(providers: Vec<MetadataProvider>, cache_size: usize, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("failed to build HTTP client");
        let capacity = NonZeroUsize::new(cache_size.max(1)).expect("capacity is at least 1");
        Self {
            client,
            providers,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn with_defaults(cache_size: usize, timeout_secs: u64) -> Self {
        Self::new(DEFAULT_PROVIDERS.to_vec(), cache_size, timeout_secs)
    }

    /// Resolve metadata for a token address. Always returns a best-effort
    /// result; provider errors are logged at low severity and skipped.
    pub async fn resolve(&self, address: &str) -> TokenInfo {
        // 1. Base-asset sentinel.
        let trimmed = address.trim();
        if trimmed.eq_ignore_ascii_case(&format!("0x{}", hex::encode(WETH))) {
            return TokenInfo::new("WETH", "Wrapped Ether", 18, &WETH);
        }

        // 2. Format validation.
        let parsed: Address = match validate_address(trimmed) {
            Some(addr) => addr,
            None => return TokenInfo::unknown(trimmed),
        };
        let key = format!("0x{}", hex::encode(parsed));

        // Cache before any external call.
        if let Some(info) = self.cache.lock().expect("token cache lock poisoned").get(&key) {
            return info.clone();
        }

        // 3. Static well-known table.
        if let Some(info) = well_known_token(&parsed) {
            self.remember(key, &info);
            return info;
        }

        // 4. Provider waterfall, first non-empty symbol and name wins.
        for provider in &self.providers {
            match self.query_provider(*provider, &key).await {
                Some((symbol, name, decimals)) => {
                    let info = TokenInfo {
                        symbol,
                        name,
                        decimals: decimals.unwrap_or(18),
                        address: key.clone(),
                    };
                    self.remember(key, &info);
                    return info;
                }
                None => continue,
            }
        }

        // 5. Deterministic synthetic placeholder.
        let info = synthetic_token(&key);
        self.remember(key, &info);
        info
    }

    async fn query_provider(
        &self,
        provider: MetadataProvider,
        address: &str,
    ) -> Option<(String, String, Option<u8>)> {
        let url = provider.url(address);
        let resp = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                debug!(provider = provider.name(), error = %e, "metadata request failed");
                return None;
            }
        };

        if !resp.status().is_success() {
            // Rate limits and not-found both land here; neither is an error
            // for the pipeline.
            debug!(
                provider = provider.name(),
                status = %resp.status(),
                "metadata provider returned non-success"
            );
            return None;
        }

        let body: serde_json::Value = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                debug!(provider = provider.name(), error = %e, "metadata body unparseable");
                return None;
            }
        };

        provider.parse(&body)
    }

    fn remember(&self, key: String, info: &TokenInfo) {
        self.cache
            .lock()
            .expect("token cache lock poisoned")
            .put(key, info.clone());
    }
}

/// Accept exactly a 0x-prefixed 20-byte hex string.
fn validate_address(address: &str) -> Option<Address> {
    let hex_part = address.strip_prefix("0x")?;
    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    address.parse().ok()
}

/// Synthesize a placeholder derived from the address bytes, so the same
/// unknown address always maps to the same symbol and name.
fn synthetic_token(lowercase_address: &str) -> TokenInfo {
    let short = &lowercase_address[2..8];
    TokenInfo {
        symbol: format!("TKN-{}", short.to_uppercase()),
        name: format!(
            "Unknown Token {}…{}",
            &lowercase_address[..8],
            &lowercase_address[lowercase_address.len() - 4..]
        ),
        decimals: 18,
        address: lowercase_address.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
