//! Property tests for scanner invariants.
//!
//! Uses proptest to verify:
//! 1. RSI stays within [0, 100]
//! 2. Scores stay within [0, 7]; NONE always carries score 0
//! 3. The tracker fires exactly on edges of the signal sequence
//! 4. Levels bracket the swing range on the correct side
//! 5. ATR is never negative and the frame matches the series length

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use scanlab_core::domain::{PriceBar, PriceSeries, SignalDirection, SwingRange};
use scanlab_core::indicators::{Indicator, IndicatorEngine, Rsi};
use scanlab_core::levels::LevelCalculator;
use scanlab_core::scoring::SignalScorer;
use scanlab_core::state::SignalStateTracker;

// ── Strategies (proptest) ────────────────────────────────────────────

/// Random walk of bars with varied bodies and wicks, always positive.
fn arb_bars(min: usize, max: usize) -> impl Strategy<Value = Vec<PriceBar>> {
    prop::collection::vec((-3.0..3.0_f64, -1.5..1.5_f64, 0.0..2.0_f64), min..max).prop_map(
        |steps| {
            let base = NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap();
            let mut close = 100.0_f64;
            steps
                .into_iter()
                .enumerate()
                .map(|(i, (drift, body, wick))| {
                    close = (close + drift).max(5.0);
                    let open = (close - body).max(1.0);
                    PriceBar::new(
                        base + Duration::minutes(30 * i as i64),
                        open,
                        open.max(close) + wick,
                        (open.min(close) - wick).max(0.5),
                        close,
                        None,
                    )
                })
                .collect()
        },
    )
}

fn arb_direction() -> impl Strategy<Value = Option<SignalDirection>> {
    prop_oneof![
        Just(None),
        Just(Some(SignalDirection::Buy)),
        Just(Some(SignalDirection::Sell)),
    ]
}

// ── 1. RSI bounds ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_within_bounds(bars in arb_bars(2, 150)) {
        for value in Rsi::new(14).compute(&bars).into_iter().flatten() {
            prop_assert!((0.0..=100.0).contains(&value), "rsi out of range: {value}");
        }
    }
}

// ── 2. Score bounds ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn scores_bounded_and_none_is_zero(bars in arb_bars(51, 160)) {
        let series = PriceSeries::new(bars).unwrap();
        let frame = IndicatorEngine::default().compute(&series);
        let card = SignalScorer::default().score(&frame).unwrap();

        prop_assert!(card.buy_score() <= 7);
        prop_assert!(card.sell_score() <= 7);
        match card.signal.direction {
            None => {
                prop_assert_eq!(card.signal.score, 0);
                prop_assert!(card.buy_score() < 7 && card.sell_score() < 7);
            }
            Some(SignalDirection::Buy) => prop_assert_eq!(card.signal.score, card.buy_score()),
            Some(SignalDirection::Sell) => {
                prop_assert!(card.buy_score() < 7);
                prop_assert_eq!(card.signal.score, card.sell_score());
            }
        }
    }
}

// ── 3. Tracker edges ─────────────────────────────────────────────────

proptest! {
    /// An alert fires exactly when a non-NONE signal differs from the one before it.
    #[test]
    fn tracker_fires_on_edges(signals in prop::collection::vec(arb_direction(), 0..40)) {
        let tracker = SignalStateTracker::new();
        let mut previous: Option<SignalDirection> = None;
        for signal in signals {
            let fired = tracker.observe("EUR/USD", signal).should_alert();
            let expected = signal.is_some() && signal != previous;
            prop_assert_eq!(fired, expected);
            previous = signal;
            prop_assert_eq!(tracker.last("EUR/USD"), signal);
        }
    }
}

// ── 4. Level sides ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn levels_bracket_swing(low in 1.0..1000.0_f64, height in 0.0..100.0_f64) {
        let swing = SwingRange { high: low + height, low };
        let calc = LevelCalculator::default();

        let buy = calc.raw_levels(SignalDirection::Buy, &swing);
        prop_assert_eq!(buy.stop_loss, swing.low);
        prop_assert!(buy.take_profit >= swing.high);

        let sell = calc.raw_levels(SignalDirection::Sell, &swing);
        prop_assert_eq!(sell.stop_loss, swing.high);
        prop_assert!(sell.take_profit <= swing.low);
    }
}

// ── 5. Frame shape ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn frame_shape_and_atr_sign(bars in arb_bars(1, 120)) {
        let n = bars.len();
        let frame = IndicatorEngine::default().compute_bars(&bars);
        prop_assert_eq!(frame.len(), n);
        for row in frame.rows() {
            if let Some(atr) = row.atr {
                prop_assert!(atr >= 0.0);
            }
        }
        // Completeness is monotone: once complete, always complete
        if let Some(first) = frame.rows().iter().position(|r| r.is_complete()) {
            prop_assert_eq!(first, 49);
            prop_assert!(frame.rows()[first..].iter().all(|r| r.is_complete()));
        }
    }
}
