use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::calendar::BusinessDate;

/// Cumulative order book statistics at one instant of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBookSnapshot {
    #[serde(with = "time::serde::timestamp")]
    pub timestamp: OffsetDateTime, // business date + row time, exchange zone
    pub bid_orders: u64,
    pub bid_volume: u64,
    pub ask_orders: u64,
    pub ask_volume: u64,
    pub transaction_count: u64,
    pub trade_volume: u64,
    pub trade_value: u64, // NT$ millions
}

/// The document delivered once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyDocument {
    pub business_date: BusinessDate,
    pub opening: OrderBookSnapshot,
    pub closing: OrderBookSnapshot,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHeader {
    pub version: u16,
    pub created_unix_ns: u128,
    pub source: String, // URL prefix or input path the archive was first fed from
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordFrame {
    Header(FileHeader),
    Document(DailyDocument),
}
