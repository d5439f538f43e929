//! TWSE daily order book snapshot extractor.
//!
//! This crate provides the pieces used by the `twse_daily` binary and the
//! `player` tool:
//!
//! - `report`: picks the header, market-open and market-close lines out of
//!   the exchange's 5-second statistics report and decodes them
//! - `snapshot`: turns decoded rows into `OrderBookSnapshot`s anchored to the
//!   business date and pairs them into a `DailyDocument`
//! - `calendar`: business dates in the exchange's home zone
//! - `record`: the delivered document and the on-disk archive schema
//! - `source`, `delivery`, `archive`: fetching the report, posting the
//!   document, and keeping a CRC-framed local copy
pub mod archive;
pub mod calendar;
pub mod delivery;
pub mod error;
pub mod record;
pub mod report;
pub mod snapshot;
pub mod source;

pub use calendar::BusinessDate;
pub use error::{ExtractError, Result};
pub use record::{DailyDocument, OrderBookSnapshot};
pub use snapshot::extract_daily;
