//! Market data acquisition: provider trait, Yahoo intraday client,
//! synthetic bars, and raw-bar canonicalization.

pub mod circuit_breaker;
pub mod ingest;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use ingest::{ingest, IngestResult};
pub use provider::{DataError, DataSource, FetchResult, Interval, MarketDataProvider, RawBar};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
