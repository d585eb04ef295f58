//! Yahoo Finance intraday data provider.
//!
//! Fetches 1m/5m OHLCV bars from Yahoo's v8 chart API. Handles retries with
//! exponential backoff, response parsing, and the shared circuit breaker.
//!
//! Yahoo has no official API and is subject to unannounced format changes.
//! Outside market hours the chart endpoint answers with an empty result,
//! which is returned as an empty series rather than an error.

use super::circuit_breaker::CircuitBreaker;
use super::ingest::ingest;
use super::provider::{DataError, DataSource, FetchResult, Interval, MarketDataProvider, RawBar};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    base_url: String,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>, timeout: Duration) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, circuit_breaker))
    }

    fn with_client(client: reqwest::blocking::Client, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        Self {
            client,
            circuit_breaker,
            base_url: DEFAULT_BASE_URL.to_string(),
            max_retries: 2,
            base_delay: Duration::from_millis(500),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retries(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    /// Build the chart API URL for a symbol, interval and time window.
    fn chart_url(
        base_url: &str,
        symbol: &str,
        interval: Interval,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> String {
        format!(
            "{base_url}/{symbol}?period1={}&period2={}&interval={interval}&includePrePost=false",
            start.timestamp(),
            end.timestamp(),
        )
    }

    /// Parse the chart API response into RawBars.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Vec<RawBar>, DataError> {
        let result = match (resp.chart.result, resp.chart.error) {
            (Some(result), _) => result,
            (None, Some(err)) if err.code == "Not Found" => {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                })
            }
            (None, Some(err)) => {
                return Err(DataError::ResponseFormatChanged(format!(
                    "{}: {}",
                    err.code, err.description
                )))
            }
            (None, None) => {
                return Err(DataError::ResponseFormatChanged(
                    "empty result with no error".into(),
                ))
            }
        };

        let Some(data) = result.into_iter().next() else {
            return Ok(Vec::new());
        };

        // No timestamps: no trades in the window
        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };

        let quote = data.indicators.quote.into_iter().next().unwrap_or_default();

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let timestamp = DateTime::from_timestamp(ts, 0).ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
            })?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            // Skip bars where all OHLCV are None (halted / no prints)
            if open.is_none()
                && high.is_none()
                && low.is_none()
                && close.is_none()
                && volume.is_none()
            {
                continue;
            }

            bars.push(RawBar {
                timestamp,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                volume: volume.unwrap_or(0),
            });
        }

        Ok(bars)
    }

    /// Execute a single HTTP request with retry and circuit breaker logic.
    fn fetch_with_retry(
        &self,
        symbol: &str,
        interval: Interval,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawBar>, DataError> {
        let url = Self::chart_url(&self.base_url, symbol, interval, start, end);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                tracing::debug!(symbol, attempt, ?delay, "retrying chart request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(&url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();

            if status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                });
            }

            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                continue;
            }

            let chart: ChartResponse = resp.json().map_err(|e| {
                DataError::ResponseFormatChanged(format!(
                    "failed to parse response for {symbol}: {e}"
                ))
            })?;

            let bars = Self::parse_response(symbol, chart)?;
            self.circuit_breaker.record_success();
            return Ok(bars);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &str,
        interval: Interval,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<FetchResult, DataError> {
        let raw = self.fetch_with_retry(symbol, interval, start, end)?;
        let ingested = ingest(symbol, raw)?;
        tracing::debug!(symbol, bars = ingested.series.len(), %interval, "fetched chart");
        Ok(FetchResult {
            series: ingested.series,
            source: DataSource::YahooFinance,
        })
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse(json: &str) -> Result<Vec<RawBar>, DataError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooProvider::parse_response("TCS.NS", resp)
    }

    #[test]
    fn chart_url_has_window_and_interval() {
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 3, 45, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 4, 4, 45, 0).unwrap();
        let url = YahooProvider::chart_url(DEFAULT_BASE_URL, "TCS.NS", Interval::FiveMinutes, start, end);
        assert!(url.starts_with("https://query2.finance.yahoo.com/v8/finance/chart/TCS.NS?"));
        assert!(url.contains(&format!("period1={}", start.timestamp())));
        assert!(url.contains(&format!("period2={}", end.timestamp())));
        assert!(url.contains("interval=5m"));
    }

    #[test]
    fn parses_quote_arrays() {
        let bars = parse(
            r#"{"chart":{"result":[{"timestamp":[1709523900,1709523960],
            "indicators":{"quote":[{"open":[10.0,10.5],"high":[11.0,11.0],
            "low":[9.5,10.0],"close":[10.5,10.8],"volume":[1200,900]}]}}],"error":null}}"#,
        )
        .unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, 10.8);
        assert_eq!(bars[0].volume, 1200);
        assert_eq!(bars[0].timestamp.timestamp(), 1709523900);
    }

    #[test]
    fn skips_all_null_bars_and_keeps_partial_as_nan() {
        let bars = parse(
            r#"{"chart":{"result":[{"timestamp":[1,2,3],
            "indicators":{"quote":[{"open":[1.0,null,null],"high":[1.0,null,2.0],
            "low":[1.0,null,1.0],"close":[1.0,null,1.5],"volume":[5,null,7]}]}}],"error":null}}"#,
        )
        .unwrap();
        assert_eq!(bars.len(), 2);
        assert!(bars[1].open.is_nan());
    }

    #[test]
    fn missing_timestamps_is_empty() {
        let bars = parse(
            r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#,
        )
        .unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let err = parse(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn other_error_is_format_change() {
        let err = parse(
            r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input"}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DataError::ResponseFormatChanged(_)));
    }

    mod http {
        use super::*;
        use std::io::{Read, Write};
        use std::net::TcpListener;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::thread;

        const CHART_OK: &str = r#"{"chart":{"result":[{"timestamp":[1709523900,1709523960],
            "indicators":{"quote":[{"open":[10.0,10.5],"high":[11.0,11.0],
            "low":[9.5,10.0],"close":[10.5,10.8],"volume":[1200,900]}]}}],"error":null}}"#;

        /// Serves one canned response per connection, in order, then stops
        /// listening. Returns the base URL and the number of requests served.
        fn serve(responses: Vec<(u16, &'static str, &'static str)>) -> (String, Arc<AtomicUsize>) {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let base = format!("http://{}", listener.local_addr().unwrap());
            let served = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&served);

            thread::spawn(move || {
                for (status, extra_headers, body) in responses {
                    let Ok((mut stream, _)) = listener.accept() else { return };
                    stream.set_read_timeout(Some(Duration::from_secs(2))).ok();
                    let mut request = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match stream.read(&mut buf) {
                            Ok(0) | Err(_) => break,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }
                    let response = format!(
                        "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\n{extra_headers}Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    counter.fetch_add(1, Ordering::SeqCst);
                    stream.write_all(response.as_bytes()).ok();
                    stream.flush().ok();
                }
            });

            (base, served)
        }

        fn provider(base: &str, cb: &Arc<CircuitBreaker>, retries: u32) -> YahooProvider {
            let client = reqwest::blocking::Client::builder()
                .no_proxy()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap();
            YahooProvider::with_client(client, Arc::clone(cb))
                .with_base_url(base)
                .with_retries(retries, Duration::from_millis(1))
        }

        fn breaker(threshold: u32) -> Arc<CircuitBreaker> {
            Arc::new(CircuitBreaker::new(Duration::from_secs(60), threshold))
        }

        fn fetch(p: &YahooProvider) -> Result<FetchResult, DataError> {
            let end = Utc.with_ymd_and_hms(2024, 3, 4, 4, 0, 0).unwrap();
            p.fetch("TCS.NS", Interval::OneMinute, end - chrono::Duration::minutes(60), end)
        }

        #[test]
        fn forbidden_trips_breaker_without_retry() {
            let (base, served) = serve(vec![(403, "", "{}")]);
            let cb = breaker(3);
            let err = fetch(&provider(&base, &cb, 2)).unwrap_err();
            assert!(matches!(err, DataError::CircuitBreakerTripped));
            assert!(!cb.is_allowed());
            assert_eq!(served.load(Ordering::SeqCst), 1);
        }

        #[test]
        fn rate_limit_retries_then_reports_retry_after() {
            let (base, served) = serve(vec![
                (429, "Retry-After: 7\r\n", "{}"),
                (429, "Retry-After: 7\r\n", "{}"),
            ]);
            let cb = breaker(3);
            let err = fetch(&provider(&base, &cb, 1)).unwrap_err();
            assert!(matches!(err, DataError::RateLimited { retry_after_secs: 7 }));
            assert_eq!(served.load(Ordering::SeqCst), 2);

            // Both 429s counted; one more failure opens the breaker
            assert!(cb.is_allowed());
            cb.record_failure();
            assert!(!cb.is_allowed());
        }

        #[test]
        fn server_error_is_retried_and_success_resets_failures() {
            let (base, served) = serve(vec![(503, "", "unavailable"), (200, "", CHART_OK)]);
            let cb = breaker(3);
            let fetched = fetch(&provider(&base, &cb, 1)).unwrap();
            assert_eq!(fetched.series.len(), 2);
            assert_eq!(fetched.source, DataSource::YahooFinance);
            assert_eq!(served.load(Ordering::SeqCst), 2);

            cb.record_failure();
            cb.record_failure();
            assert!(cb.is_allowed());
        }

        #[test]
        fn repeated_server_errors_open_breaker_mid_retry() {
            let (base, served) = serve(vec![(502, "", ""), (502, "", "")]);
            let cb = breaker(2);
            let err = fetch(&provider(&base, &cb, 3)).unwrap_err();
            assert!(matches!(err, DataError::CircuitBreakerTripped));
            assert!(!cb.is_allowed());
            assert_eq!(served.load(Ordering::SeqCst), 2);
        }

        #[test]
        fn exhausted_server_errors_report_status() {
            let (base, _) = serve(vec![(500, "", ""), (500, "", "")]);
            let cb = breaker(5);
            let err = fetch(&provider(&base, &cb, 1)).unwrap_err();
            match err {
                DataError::Other(msg) => assert!(msg.contains("HTTP 500")),
                other => panic!("expected HTTP error, got {other:?}"),
            }
            assert!(cb.is_allowed());
        }

        #[test]
        fn not_found_status_is_not_retried() {
            let (base, served) = serve(vec![(404, "", "{}"), (200, "", CHART_OK)]);
            let cb = breaker(3);
            let err = fetch(&provider(&base, &cb, 2)).unwrap_err();
            assert!(matches!(err, DataError::SymbolNotFound { ref symbol } if symbol == "TCS.NS"));
            assert_eq!(served.load(Ordering::SeqCst), 1);
            assert!(cb.is_allowed());
        }

        #[test]
        fn malformed_body_is_format_change() {
            let (base, _) = serve(vec![(200, "", "<html>consent page</html>")]);
            let cb = breaker(3);
            let err = fetch(&provider(&base, &cb, 0)).unwrap_err();
            assert!(matches!(err, DataError::ResponseFormatChanged(_)));
        }
    }

    #[test]
    fn tripped_breaker_refuses_without_network() {
        let cb = Arc::new(CircuitBreaker::new(Duration::from_secs(60), 3));
        cb.trip();
        let provider = YahooProvider::new(cb, Duration::from_secs(1)).unwrap();
        assert!(!provider.is_available());
        let now = Utc::now();
        let err = provider
            .fetch("TCS.NS", Interval::OneMinute, now - chrono::Duration::minutes(30), now)
            .unwrap_err();
        assert!(matches!(err, DataError::CircuitBreakerTripped));
    }
}
