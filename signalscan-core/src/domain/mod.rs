//! Domain types for SignalScan

pub mod bar;
pub mod signal;
pub mod snapshot;

pub use bar::{Bar, Series, SeriesError};
pub use signal::{Classification, Signal};
pub use snapshot::{EnrichedSeries, IndicatorSnapshot};
