//! Daily swap volume and price series for charting.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use nlswap_domain::token::format_units;
use nlswap_protocols::{LedgerError, SwapEvent, SwapLogSource};
use primitive_types::U256;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

pub const DEFAULT_HISTORY_DAYS: u32 = 30;
pub const MAX_HISTORY_DAYS: u32 = 365;

/// One value per UTC day, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapHistory {
    /// ISO dates (`YYYY-MM-DD`).
    pub labels: Vec<String>,
    /// Token0 traded per day, in whole units.
    pub volume_data: Vec<f64>,
    /// Mean token1-per-token0 execution price per day; 0 on days without swaps.
    pub price_data: Vec<f64>,
    pub swap_count: usize,
}

#[derive(Default)]
struct DailyBucket {
    volume0: U256,
    price_sum: f64,
    priced: u32,
}

fn to_f64(value: U256, decimals: u8) -> f64 {
    format_units(value, decimals).parse().unwrap_or(0.0)
}

/// Execution price of a single swap in token1 per token0, if it moved both sides.
fn swap_price(event: &SwapEvent, decimals0: u8, decimals1: u8) -> Option<f64> {
    let (amount0, amount1) = if !event.amount0_in.is_zero() && !event.amount1_out.is_zero() {
        (event.amount0_in, event.amount1_out)
    } else if !event.amount1_in.is_zero() && !event.amount0_out.is_zero() {
        (event.amount0_out, event.amount1_in)
    } else {
        return None;
    };
    let base = to_f64(amount0, decimals0);
    (base > 0.0).then(|| to_f64(amount1, decimals1) / base)
}

/// Buckets `events` into the `days` UTC days ending at `now`.
///
/// Swaps outside the window are ignored and do not count towards `swap_count`.
pub fn aggregate_swaps(
    events: &[SwapEvent],
    decimals0: u8,
    decimals1: u8,
    days: u32,
    now: DateTime<Utc>,
) -> SwapHistory {
    let today = now.date_naive();
    let first_day = today - Duration::days(i64::from(days.saturating_sub(1)));

    let mut buckets: HashMap<NaiveDate, DailyBucket> = HashMap::new();
    let mut swap_count = 0;
    for event in events {
        let Some(at) = i64::try_from(event.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
        else {
            continue;
        };
        let day = at.date_naive();
        if day < first_day || day > today {
            continue;
        }
        swap_count += 1;
        let bucket = buckets.entry(day).or_default();
        bucket.volume0 = bucket.volume0.saturating_add(event.volume0());
        if let Some(price) = swap_price(event, decimals0, decimals1) {
            bucket.price_sum += price;
            bucket.priced += 1;
        }
    }

    let mut history = SwapHistory {
        labels: Vec::with_capacity(days as usize),
        volume_data: Vec::with_capacity(days as usize),
        price_data: Vec::with_capacity(days as usize),
        swap_count,
    };
    for offset in 0..days {
        let day = first_day + Duration::days(i64::from(offset));
        history.labels.push(day.format("%Y-%m-%d").to_string());
        match buckets.get(&day) {
            Some(bucket) => {
                history.volume_data.push(to_f64(bucket.volume0, decimals0));
                history.price_data.push(if bucket.priced > 0 {
                    bucket.price_sum / f64::from(bucket.priced)
                } else {
                    0.0
                });
            }
            None => {
                history.volume_data.push(0.0);
                history.price_data.push(0.0);
            }
        }
    }
    history
}

/// Fetches the swaps of `pair` over the last `days` days and aggregates them.
///
/// # Errors
/// Returns a [`LedgerError`] if the swap logs cannot be fetched.
pub async fn load_swap_history(
    source: &dyn SwapLogSource,
    pair: &str,
    decimals0: u8,
    decimals1: u8,
    days: u32,
    now: DateTime<Utc>,
) -> Result<SwapHistory, LedgerError> {
    let since = (now - Duration::days(i64::from(days))).timestamp().max(0) as u64;
    let events = source.swap_events(pair, since).await?;
    debug!(pair, events = events.len(), since, "Fetched swap events");

    let history = aggregate_swaps(&events, decimals0, decimals1, days, now);
    info!(pair, days, swaps = history.swap_count, "Built swap history");
    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use nlswap_protocols::memory::InMemoryLedger;

    const PAIR: &str = "0x1234567890123456789012345678901234567890";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn swap(
        timestamp: DateTime<Utc>,
        a0_in: u128,
        a1_in: u128,
        a0_out: u128,
        a1_out: u128,
    ) -> SwapEvent {
        SwapEvent {
            block_number: 1,
            timestamp: timestamp.timestamp() as u64,
            sender: "0x00000000000000000000000000000000000000aa".into(),
            to: "0x00000000000000000000000000000000000000aa".into(),
            amount0_in: U256::from(a0_in),
            amount1_in: U256::from(a1_in),
            amount0_out: U256::from(a0_out),
            amount1_out: U256::from(a1_out),
        }
    }

    #[test]
    fn test_buckets_by_utc_day() {
        let events = vec![
            // 1 ETH in for 2000 USDC out.
            swap(now(), 1_000_000_000_000_000_000, 0, 0, 2_000_000_000),
            // 2100 USDC in for 1 ETH out, same day.
            swap(now() - Duration::hours(3), 0, 2_100_000_000, 1_000_000_000_000_000_000, 0),
            swap(now() - Duration::days(2), 500_000_000_000_000_000, 0, 0, 990_000_000),
        ];
        let history = aggregate_swaps(&events, 18, 6, 3, now());

        assert_eq!(history.labels, vec!["2024-03-08", "2024-03-09", "2024-03-10"]);
        assert_eq!(history.volume_data, vec![0.5, 0.0, 2.0]);
        assert_eq!(history.price_data, vec![1980.0, 0.0, 2050.0]);
        assert_eq!(history.swap_count, 3);
    }

    #[test]
    fn test_ignores_swaps_outside_window() {
        let events = vec![
            swap(now() - Duration::days(10), 1_000_000_000_000_000_000, 0, 0, 2_000_000_000),
            swap(now() + Duration::days(1), 1_000_000_000_000_000_000, 0, 0, 2_000_000_000),
        ];
        let history = aggregate_swaps(&events, 18, 6, 7, now());
        assert_eq!(history.labels.len(), 7);
        assert_eq!(history.swap_count, 0);
        assert!(history.volume_data.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_unpriced_swap_counts_volume_only() {
        let events = vec![swap(now(), 1_000_000_000_000_000_000, 0, 0, 0)];
        let history = aggregate_swaps(&events, 18, 6, 1, now());
        assert_eq!(history.volume_data, vec![1.0]);
        assert_eq!(history.price_data, vec![0.0]);
        assert_eq!(history.swap_count, 1);
    }

    #[test]
    fn test_serializes_camel_case() {
        let history = aggregate_swaps(&[], 18, 6, 1, now());
        let json = serde_json::to_value(&history).unwrap();
        assert_eq!(json["labels"][0], "2024-03-10");
        assert_eq!(json["swapCount"], 0);
        assert!(json["volumeData"].is_array());
        assert!(json["priceData"].is_array());
    }

    #[tokio::test]
    async fn test_load_from_log_source() {
        let ledger = InMemoryLedger::new();
        ledger.push_swap(PAIR, swap(now(), 1_000_000_000_000_000_000, 0, 0, 2_000_000_000));
        let history = load_swap_history(&ledger, PAIR, 18, 6, 30, now()).await.unwrap();
        assert_eq!(history.labels.len(), 30);
        assert_eq!(history.labels[29], "2024-03-10");
        assert_eq!(history.swap_count, 1);
        assert_eq!(history.price_data[29], 2000.0);
    }
}
