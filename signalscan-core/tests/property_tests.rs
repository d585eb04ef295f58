//! Property tests for scanner invariants.
//!
//! Uses proptest to verify:
//! 1. BUY and SELL are mutually exclusive for every snapshot
//! 2. VWAP stays inside the window's price range
//! 3. Mover ranking is deterministic, ordered, and skips no-data symbols
//! 4. Short series classify as HOLD "insufficient data"

use std::collections::BTreeMap;

use chrono::TimeZone;
use proptest::prelude::*;

use signalscan_core::classifier::{is_buy, is_sell, REASON_INSUFFICIENT_DATA};
use signalscan_core::domain::{Bar, IndicatorSnapshot, Series, Signal};
use signalscan_core::indicators::{compute_indicators, Vwap, RSI_PERIOD};
use signalscan_core::movers::{rank_movers, MoverInput};
use signalscan_core::classify;

// ── Strategies (proptest) ────────────────────────────────────────────

fn base_bar() -> Bar {
    Bar {
        timestamp: chrono::Utc.with_ymd_and_hms(2024, 3, 4, 5, 0, 0).unwrap(),
        open: 100.0,
        high: 100.0,
        low: 100.0,
        close: 100.0,
        volume: 1_000,
    }
}

fn arb_snapshot() -> impl Strategy<Value = IndicatorSnapshot> {
    (
        50.0..150.0_f64,
        50.0..150.0_f64,
        50.0..150.0_f64,
        50.0..150.0_f64,
        0.0..=100.0_f64,
        0.0..5.0_f64,
    )
        .prop_map(|(close, vwap, ema9, ema21, rsi6, vol_ratio)| IndicatorSnapshot {
            close,
            vwap,
            ema9,
            ema21,
            rsi6,
            vol_ratio,
            ..IndicatorSnapshot::undefined(&base_bar())
        })
}

/// Consistent minute bars: open = previous close, high/low padded by a spread.
fn arb_bars(max_len: usize) -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec((50.0..150.0_f64, 0.0..3.0_f64, 0u64..100_000), 1..max_len).prop_map(
        |rows| {
            let base = chrono::Utc.with_ymd_and_hms(2024, 3, 4, 3, 45, 0).unwrap();
            let mut prev_close = rows[0].0;
            rows.into_iter()
                .enumerate()
                .map(|(i, (close, spread, volume))| {
                    let open = prev_close;
                    prev_close = close;
                    Bar {
                        timestamp: base + chrono::Duration::minutes(i as i64),
                        open,
                        high: open.max(close) + spread,
                        low: open.min(close) - spread,
                        close,
                        volume,
                    }
                })
                .collect()
        },
    )
}

fn arb_universe() -> impl Strategy<Value = BTreeMap<String, Option<MoverInput>>> {
    prop::collection::btree_map(
        "[A-Z]{2,5}",
        prop::option::of((50.0..150.0_f64, 50.0..150.0_f64, 0.0..4.0_f64, 0.0..2.0_f64)),
        0..20,
    )
    .prop_map(|m| {
        m.into_iter()
            .map(|(symbol, v)| {
                let input = v.map(|(close, window_open, vol_ratio, atr_pct)| MoverInput {
                    latest: IndicatorSnapshot {
                        close,
                        vol_ratio,
                        atr_pct,
                        ..IndicatorSnapshot::undefined(&base_bar())
                    },
                    window_open,
                });
                (symbol, input)
            })
            .collect()
    })
}

// ── 1. Mutual exclusivity ────────────────────────────────────────────

proptest! {
    #[test]
    fn buy_and_sell_never_both_hold(s in arb_snapshot()) {
        prop_assert!(!(is_buy(&s) && is_sell(&s)));

        let c = classify(&s);
        match c.signal {
            Signal::Buy => prop_assert!(is_buy(&s)),
            Signal::Sell => prop_assert!(is_sell(&s)),
            Signal::Hold => prop_assert!(!is_buy(&s) && !is_sell(&s)),
        }
    }
}

// ── 2. VWAP bounds ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn vwap_within_window_range(bars in arb_bars(80)) {
        let acc = Vwap::accumulate(&bars);
        let lo = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let hi = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        for v in acc.vwap.iter().filter(|v| !v.is_nan()) {
            prop_assert!(*v >= lo - 1e-9 && *v <= hi + 1e-9, "vwap {} outside [{}, {}]", v, lo, hi);
        }
    }

    #[test]
    fn indicators_have_no_lookahead(bars in arb_bars(60), cut in 1usize..60) {
        let cut = cut.min(bars.len());
        let full = compute_indicators(&Series::new("P", bars.clone()).unwrap());
        let prefix = compute_indicators(&Series::new("P", bars[..cut].to_vec()).unwrap());
        for (a, b) in prefix.rows.iter().zip(full.rows.iter()) {
            for (x, y) in [(a.vwap, b.vwap), (a.ema9, b.ema9), (a.rsi6, b.rsi6), (a.atr14, b.atr14)] {
                prop_assert!((x.is_nan() && y.is_nan()) || x == y);
            }
        }
    }
}

// ── 3. Ranking determinism ───────────────────────────────────────────

proptest! {
    #[test]
    fn ranking_is_deterministic_and_ordered(universe in arb_universe(), top_n in 0usize..25) {
        let a = rank_movers(&universe, top_n);
        let b = rank_movers(&universe, top_n);
        prop_assert_eq!(&a, &b);

        let with_data = universe.values().filter(|v| v.is_some()).count();
        prop_assert_eq!(a.len(), top_n.min(with_data));

        for rec in &a {
            prop_assert!(matches!(universe.get(&rec.symbol), Some(Some(_))));
        }
        for w in a.windows(2) {
            prop_assert!(
                w[0].score > w[1].score || (w[0].score == w[1].score && w[0].symbol < w[1].symbol)
            );
        }
    }
}

// ── 4. Warmup → HOLD ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn short_series_is_insufficient_data(bars in arb_bars(RSI_PERIOD + 1)) {
        let enriched = compute_indicators(&Series::new("P", bars).unwrap());
        let latest = enriched.latest().unwrap();
        prop_assert!(latest.rsi6.is_nan());
        let c = classify(latest);
        prop_assert_eq!(c.signal, Signal::Hold);
        prop_assert_eq!(c.reason, REASON_INSUFFICIENT_DATA);
    }
}
