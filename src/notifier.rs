//! Telegram notification formatting and delivery.
//!
//! Renders an enriched swap into a MarkdownV2 message and sends it through
//! the Bot API. If the markup delivery fails, retries once with all markup
//! stripped before reporting failure.

use std::cmp::Ordering;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::stats::StatsSnapshot;
use crate::types::{SwapEvent, SwapKind, TokenInfo};

/// Characters that MarkdownV2 requires escaping in free text.
const MARKDOWN_SPECIALS: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Outbound delivery channel for swap notifications.
pub struct Notifier {
    client: reqwest::Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl Notifier {
    pub fn new(api_base: &str, bot_token: &str, chat_id: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
        }
    }

    /// Format and deliver a swap notification. Returns whether any delivery
    /// attempt succeeded.
    pub async fn notify_swap(&self, event: &SwapEvent, token: &TokenInfo) -> bool {
        self.send(&format_swap_message(event, token)).await
    }

    /// Deliver a MarkdownV2 message, falling back to plain text once.
    pub async fn send(&self, text: &str) -> bool {
        match self.post(text, Some("MarkdownV2")).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "markdown delivery failed, retrying as plain text");
                match self.post(&strip_markup(text), None).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(error = %e, "plain-text delivery failed");
                        false
                    }
                }
            }
        }
    }

    async fn post(&self, text: &str, parse_mode: Option<&str>) -> anyhow::Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let mut body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
            "disable_web_page_preview": false,
        });
        if let Some(mode) = parse_mode {
            body["parse_mode"] = serde_json::Value::String(mode.to_string());
        }

        let resp = self.client.post(&url).json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            anyhow::bail!("sendMessage returned {status}: {detail}");
        }
        debug!("notification delivered");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Render an enriched swap event as a MarkdownV2 message.
pub fn format_swap_message(event: &SwapEvent, token: &TokenInfo) -> String {
    let (icon, action) = match event.kind {
        SwapKind::Buy { .. } => ("🟢", "TOKEN BUY"),
        SwapKind::Sell { .. } => ("🔴", "TOKEN SELL"),
        SwapKind::Swap { .. } => ("🔄", "TOKEN SWAP"),
    };

    let amount_lines = match &event.kind {
        SwapKind::Buy { amount } => {
            format!("💰 *ETH In:* {} ETH", escape_markdown(&display_amount(*amount)))
        }
        SwapKind::Sell {
            amount,
            token_amount,
        } => format!(
            "💰 *Min ETH Out:* {} ETH\n📦 *Token In:* {} {}",
            escape_markdown(&display_amount(*amount)),
            escape_markdown(&display_amount(display_token_amount(
                *token_amount,
                token.decimals
            ))),
            escape_markdown(&token.symbol),
        ),
        SwapKind::Swap { amount } => format!(
            "💰 *Token In:* {} {}",
            escape_markdown(&display_amount(*amount)),
            escape_markdown(&token.symbol),
        ),
    };

    let pool_line = match event.pool_address {
        Some(pool) => format!("`0x{}`", hex::encode(pool)),
        None => escape_markdown("not available"),
    };

    format!(
        "{icon} *{action}*\n\n\
         🏷️ *Token:* {name} \\({symbol}\\)\n\
         📄 *Contract:* `{contract}`\n\
         🌊 *Pool:* {pool_line}\n\
         {amount_lines}\n\
         👤 *From:* `{from}`\n\
         🔗 *Tx:* `{tx}`\n\
         ⏰ *Time:* {time}\n\n\
         📊 [DexView](https://dexview.com/eth/{contract})\n\
         🔍 [Etherscan](https://etherscan.io/tx/{tx_full})",
        name = escape_markdown(&token.name),
        symbol = escape_markdown(&token.symbol),
        contract = token.address,
        from = shorten(&event.from_address),
        tx = shorten(&event.tx_hash),
        time = escape_markdown(&event.timestamp.format("%H:%M:%S UTC").to_string()),
        tx_full = event.tx_hash,
    )
}

/// Session-start notice.
pub fn startup_message() -> String {
    "🤖 *MEMPOOL MONITOR STARTED*\n\n\
     ✅ Pending\\-transaction feed connecting\n\
     🎯 Watching Uniswap V2 swaps\n\
     📱 Notifications configured"
        .to_string()
}

/// Session-stop notice with the final counters.
pub fn shutdown_message(snapshot: &StatsSnapshot) -> String {
    format!(
        "🛑 *MEMPOOL MONITOR STOPPED*\n\n\
         📊 Session stats:\n\
         • Transactions observed: {}\n\
         • Swaps processed: {}\n\
         • Failures: {}\n\
         • Notifications sent: {}",
        snapshot.total_transactions,
        snapshot.successful_parses,
        snapshot.failed_parses,
        snapshot.notifications_sent,
    )
}

/// Fixed message for the test-notification operation.
pub fn test_message() -> String {
    "🧪 *INTEGRATION TEST*\n\n\
     ✅ Delivery channel is reachable\n\
     📱 Notifications are working"
        .to_string()
}

/// Escape free text for MarkdownV2.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKDOWN_SPECIALS.contains(&c) || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Remove markup so a failed MarkdownV2 send can retry as plain text.
pub fn strip_markup(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '*' | '_' | '`' | '[' | ']' | '(' | ')' | '~' | '\\'))
        .collect()
}

/// First 10 and last 6 characters of an address or hash.
fn shorten(s: &str) -> String {
    if s.len() <= 16 {
        return s.to_string();
    }
    format!("{}...{}", &s[..10], &s[s.len() - 6..])
}

fn display_amount(amount: Decimal) -> String {
    amount.round_dp(6).normalize().to_string()
}

/// Rescale a token amount that was decoded assuming 18 decimals to the
/// token's actual decimal count. Display-only; the stored value keeps the
/// 18-decimal assumption.
pub fn display_token_amount(amount: Decimal, decimals: u8) -> Decimal {
    let mut result = amount;
    match decimals.cmp(&18) {
        Ordering::Equal => {}
        Ordering::Less => {
            for _ in decimals..18 {
                result *= Decimal::TEN;
            }
        }
        Ordering::Greater => {
            for _ in 18..decimals {
                result /= Decimal::TEN;
            }
        }
    }
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{PEPE, SHIB};
    use crate::types::RawTransaction;
    use alloy::primitives::Address;
    use rust_decimal_macros::dec;

    fn sample_event(kind: SwapKind, token: Option<Address>) -> SwapEvent {
        let raw = RawTransaction {
            hash: "0xaabbccddeeff00112233445566778899aabbccddeeff00112233445566778899"
                .to_string(),
            from: "0x1111111111111111111111111111111111111111".to_string(),
            to: Some("0x7a250d5630b4cf539739df2c5dacb4c659f2488d".to_string()),
            ..Default::default()
        };
        SwapEvent::new(&raw, kind, token)
    }

    #[test]
    fn test_escape_markdown_specials() {
        assert_eq!(escape_markdown("a.b!c"), "a\\.b\\!c");
        assert_eq!(escape_markdown("x_y*z"), "x\\_y\\*z");
        assert_eq!(escape_markdown("plain"), "plain");
        assert_eq!(escape_markdown("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_strip_markup() {
        assert_eq!(strip_markup("*bold* _it_ `code`"), "bold it code");
        assert_eq!(strip_markup("[link](url)"), "linkurl");
    }

    #[test]
    fn test_shorten_addresses() {
        let hash = "0xaabbccddeeff00112233445566778899aabbccddeeff00112233445566778899";
        assert_eq!(shorten(hash), "0xaabbccdd...778899");
        assert_eq!(shorten("0xshort"), "0xshort");
    }

    #[test]
    fn test_buy_message_contents() {
        let event = sample_event(SwapKind::Buy { amount: dec!(0.5) }, Some(PEPE));
        let token = TokenInfo::new("PEPE", "Pepe", 18, &PEPE);
        let msg = format_swap_message(&event, &token);

        assert!(msg.contains("TOKEN BUY"));
        assert!(msg.contains("0\\.5 ETH"));
        assert!(msg.contains(&token.address));
        assert!(msg.contains("0xaabbccdd...778899"));
        assert!(msg.contains("dexview.com/eth/"));
        assert!(msg.contains("not available"));
    }

    #[test]
    fn test_sell_message_rescales_token_amount() {
        // Raw amountIn of 1 USDC (6 decimals) decoded under the 18-decimal
        // assumption is 1e-12; display must show 1.
        let event = sample_event(
            SwapKind::Sell {
                amount: dec!(0.25),
                token_amount: dec!(0.000000000001),
            },
            Some(SHIB),
        );
        let token = TokenInfo {
            symbol: "USDC".to_string(),
            name: "USD Coin".to_string(),
            decimals: 6,
            address: "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48".to_string(),
        };
        let msg = format_swap_message(&event, &token);

        assert!(msg.contains("TOKEN SELL"));
        assert!(msg.contains("0\\.25 ETH"));
        assert!(msg.contains("1 USDC"));
    }

    #[test]
    fn test_swap_message_shows_pool_when_derived() {
        let mut event = sample_event(SwapKind::Swap { amount: dec!(10) }, Some(PEPE));
        event.pool_address = Some(Address::new([0xab; 20]));
        let token = TokenInfo::new("PEPE", "Pepe", 18, &PEPE);
        let msg = format_swap_message(&event, &token);

        assert!(msg.contains("TOKEN SWAP"));
        assert!(msg.contains(&format!("`0x{}`", "ab".repeat(20))));
        assert!(!msg.contains("not available"));
    }

    #[test]
    fn test_display_token_amount_scaling() {
        assert_eq!(display_token_amount(dec!(1), 18), dec!(1));
        assert_eq!(display_token_amount(dec!(0.000000000001), 6), dec!(1));
        assert_eq!(display_token_amount(dec!(10), 19), dec!(1));
    }
}
