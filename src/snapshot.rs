//! Normalizing report rows into snapshots and assembling the daily document.
//!
//! Counter cells degrade to `0` instead of failing: a negative value, text,
//! or anything above `u64::MAX` is recorded as zero and logged. Time cells are
//! sliced at fixed positions (`HH:MM:SS`) and each component is added to the
//! business-day midnight without range checks, so `25:00:00` lands on the
//! next calendar day.
use log::{info, warn};
use time::{Duration, OffsetDateTime};

use crate::calendar::{BusinessDate, EXCHANGE_OFFSET};
use crate::error::{ExtractError, Result};
use crate::record::{DailyDocument, OrderBookSnapshot};
use crate::report::{decode_rows, filter_lines, RawRow};

const COUNTER_NAMES: [&str; 7] = [
    "bid_orders",
    "bid_volume",
    "ask_orders",
    "ask_volume",
    "transaction_count",
    "trade_volume",
    "trade_value",
];

fn try_parse_counter(raw: &str) -> Option<u64> {
    let digits = raw.replace(',', "");
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Parse a counter cell such as `"3,646,951"`. Unparseable input yields `0`.
pub fn parse_counter(raw: &str) -> u64 {
    try_parse_counter(raw).unwrap_or(0)
}

/// One `HH`/`MM`/`SS` component; absent or unparseable parts count as zero.
fn time_component(raw: &str, start: usize, end: Option<usize>) -> i64 {
    let part = match end {
        Some(end) => raw.get(start..end),
        None => raw.get(start..),
    };
    part.and_then(|s| s.parse::<i8>().ok())
        .map(i64::from)
        .unwrap_or(0)
}

/// Anchor an `HH:MM:SS` cell to the business date in the exchange zone.
///
/// Components are signed, so `-1:00:00` lands on the previous day. A sum
/// outside the representable range yields the business-day midnight.
pub fn parse_time_of_day(raw: &str, date: BusinessDate) -> OffsetDateTime {
    let hours = time_component(raw, 0, Some(2));
    let minutes = time_component(raw, 3, Some(5));
    let seconds = time_component(raw, 6, None);
    let offset = Duration::hours(hours) + Duration::minutes(minutes) + Duration::seconds(seconds);
    let midnight = date.midnight();
    midnight.checked_add(offset).unwrap_or_else(|| {
        warn!("time {raw:?} on {date} is out of range, using midnight");
        midnight
    })
}

/// Convert one decoded row into a snapshot. Never fails.
pub fn normalize_row(row: &RawRow, date: BusinessDate) -> OrderBookSnapshot {
    let mut counters = [0u64; 7];
    for (idx, (slot, name)) in counters.iter_mut().zip(COUNTER_NAMES).enumerate() {
        let raw = row.field(idx + 1);
        *slot = match try_parse_counter(raw) {
            Some(v) => v,
            None => {
                warn!("row {}: {name} {raw:?} is not a u64, recording 0", row.time());
                0
            }
        };
    }
    let [
        bid_orders,
        bid_volume,
        ask_orders,
        ask_volume,
        transaction_count,
        trade_volume,
        trade_value,
    ] = counters;

    OrderBookSnapshot {
        timestamp: parse_time_of_day(row.time(), date),
        bid_orders,
        bid_volume,
        ask_orders,
        ask_volume,
        transaction_count,
        trade_volume,
        trade_value,
    }
}

/// Pair the opening and closing snapshots into the daily document.
///
/// Position decides the role: the first snapshot is the opening, the second
/// the closing. Anything other than two snapshots is a [`ExtractError::Shape`].
pub fn assemble(snapshots: Vec<OrderBookSnapshot>, date: BusinessDate) -> Result<DailyDocument> {
    let [opening, closing]: [OrderBookSnapshot; 2] = snapshots
        .try_into()
        .map_err(|rest: Vec<OrderBookSnapshot>| ExtractError::Shape { rows: rest.len() })?;

    Ok(DailyDocument {
        business_date: date,
        opening,
        closing,
        generated_at: OffsetDateTime::now_utc().to_offset(EXCHANGE_OFFSET),
    })
}

/// Run the whole pipeline over a report body.
pub fn extract_daily(report: &str, date: BusinessDate) -> Result<DailyDocument> {
    let rows = decode_rows(&filter_lines(report))?;
    let snapshots = rows.iter().map(|row| normalize_row(row, date)).collect();
    let doc = assemble(snapshots, date)?;
    info!(
        "{}: open bid/ask orders {}/{}, close transactions {} value {}",
        doc.business_date,
        doc.opening.bid_orders,
        doc.opening.ask_orders,
        doc.closing.transaction_count,
        doc.closing.trade_value
    );
    Ok(doc)
}
