//! SignalScan Core: indicators, classification, mover ranking, market data, alerts.
//!
//! This crate holds everything that operates on a single scan:
//! - Domain types (bars, series, indicator snapshots, signals)
//! - Indicator engine (VWAP, EMA 9/21, RSI 6, ATR 14, volume ratio)
//! - Threshold signal classifier
//! - Composite-score mover ranking
//! - Market data providers (Yahoo intraday chart API, synthetic walk)
//! - Alert formatting and Telegram delivery
//!
//! Nothing here schedules or loops; see `signalscan-runner` for that.

pub mod classifier;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod movers;
pub mod notify;

pub use classifier::classify;
pub use domain::{Bar, Classification, EnrichedSeries, IndicatorSnapshot, Series, Signal};
pub use indicators::compute_indicators;
pub use movers::{rank_movers, MoverInput, MoverRecord};
