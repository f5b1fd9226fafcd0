//! Single-instrument scan: fetch → decide → de-duplicate → chart → alert.
//!
//! The scanner owns the signal tracker, the only state shared between scans.
//! Every other step is a pure function of the fetched series. A scan never
//! panics on bad input; each failure maps to one [`ScanError`] kind.

use crate::alert::{Alert, AlertSink};
use crate::chart::{ChartRef, ChartRenderer, ChartRequest};
use crate::data::{DataError, QuoteRequest, QuoteSource};
use crate::domain::{Instrument, PriceSeries, SignalDirection};
use crate::engine::{Decider, Decision};
use crate::error::ScanError;
use crate::levels::{fibonacci_retracements, LevelPair};
use crate::state::{SignalStateTracker, Transition};
use tracing::{error, info, warn};

/// What a successful scan did.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// Neither direction reached the threshold.
    NoSignal { buy_score: u8, sell_score: u8 },
    /// Same signal as last time; alert suppressed.
    Duplicate {
        direction: SignalDirection,
        score: u8,
    },
    /// New signal delivered to the alert sink.
    Alerted(Alert),
}

impl ScanOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ScanOutcome::NoSignal { .. } => "no_signal",
            ScanOutcome::Duplicate { .. } => "duplicate",
            ScanOutcome::Alerted(_) => "alerted",
        }
    }
}

pub struct Scanner {
    decider: Box<dyn Decider>,
    quotes: Box<dyn QuoteSource>,
    alerts: Box<dyn AlertSink>,
    charts: Option<Box<dyn ChartRenderer>>,
    tracker: SignalStateTracker,
    interval: String,
    output_size: usize,
    chart_bars: usize,
}

impl Scanner {
    pub fn new(
        decider: Box<dyn Decider>,
        quotes: Box<dyn QuoteSource>,
        alerts: Box<dyn AlertSink>,
    ) -> Self {
        let output_size = decider.min_bars().max(100);
        Self {
            decider,
            quotes,
            alerts,
            charts: None,
            tracker: SignalStateTracker::new(),
            interval: "30min".to_string(),
            output_size,
            chart_bars: 30,
        }
    }

    pub fn with_charts(mut self, renderer: Box<dyn ChartRenderer>) -> Self {
        self.charts = Some(renderer);
        self
    }

    pub fn with_interval(mut self, interval: impl Into<String>) -> Self {
        self.interval = interval.into();
        self
    }

    pub fn with_output_size(mut self, output_size: usize) -> Self {
        self.output_size = output_size;
        self
    }

    pub fn with_chart_bars(mut self, bars: usize) -> Self {
        self.chart_bars = bars;
        self
    }

    pub fn tracker(&self) -> &SignalStateTracker {
        &self.tracker
    }

    pub fn quote_source(&self) -> &dyn QuoteSource {
        self.quotes.as_ref()
    }

    pub fn alert_sink(&self) -> &dyn AlertSink {
        self.alerts.as_ref()
    }

    /// Scan one instrument.
    pub fn scan(&self, instrument: &Instrument) -> Result<ScanOutcome, ScanError> {
        let symbol = instrument.symbol.as_str();
        info!(symbol = %symbol, source = self.quotes.name(), "scanning");

        if !self.quotes.is_available() {
            warn!(symbol = %symbol, source = self.quotes.name(), "quote source unavailable, skipping fetch");
            return Err(DataError::Unavailable {
                provider: self.quotes.name().to_string(),
            }
            .into());
        }

        let request = QuoteRequest::new(symbol, self.interval.as_str(), self.output_size);
        let bars = self.quotes.fetch(&request)?;
        if bars.is_empty() {
            return Err(DataError::NoData {
                symbol: symbol.to_string(),
            }
            .into());
        }
        let series = PriceSeries::new(bars)?;

        let decision = match self.decider.decide(&series, instrument.degeneracy.as_ref()) {
            Ok(decision) => decision,
            Err(err @ ScanError::DegenerateLevels { .. }) => {
                info!(symbol = %symbol, error = %err, "levels too close to entry, skipping alert");
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        let buy_score = decision.card.buy_score();
        let sell_score = decision.card.sell_score();
        let Some((direction, score, levels)) = decision.signal() else {
            self.tracker.observe(symbol, None);
            info!(symbol = %symbol, buy_score, sell_score, "no signal");
            return Ok(ScanOutcome::NoSignal {
                buy_score,
                sell_score,
            });
        };

        let previous = match self.tracker.observe(symbol, Some(direction)) {
            Transition::Fire { previous, .. } => previous,
            Transition::Duplicate(direction) => {
                info!(symbol = %symbol, direction = %direction, score, "duplicate signal suppressed");
                return Ok(ScanOutcome::Duplicate { direction, score });
            }
            Transition::Cleared => {
                return Ok(ScanOutcome::NoSignal {
                    buy_score,
                    sell_score,
                })
            }
        };

        let chart = self.render_chart(instrument, &decision, direction, levels);
        let alert = Alert::new(
            instrument,
            direction,
            decision.entry,
            levels,
            score,
            self.decider.max_score(),
            decision.timestamp,
            chart,
        );

        if let Err(err) = self.alerts.deliver(alert.clone()) {
            self.tracker.restore(symbol, previous);
            error!(symbol = %symbol, sink = self.alerts.name(), error = %err, "alert delivery failed");
            return Err(err.into());
        }

        info!(
            symbol = %symbol,
            direction = %direction,
            score,
            entry = decision.entry,
            stop_loss = levels.stop_loss,
            take_profit = levels.take_profit,
            "signal alerted"
        );
        Ok(ScanOutcome::Alerted(alert))
    }

    fn render_chart(
        &self,
        instrument: &Instrument,
        decision: &Decision,
        direction: SignalDirection,
        levels: LevelPair,
    ) -> Option<ChartRef> {
        let renderer = self.charts.as_ref()?;
        let request = ChartRequest {
            symbol: instrument.symbol.clone(),
            file_stem: instrument.file_stem(),
            direction,
            rows: decision.frame.tail(self.chart_bars).to_vec(),
            entry: decision.entry,
            levels,
            retracements: fibonacci_retracements(&decision.card.swing),
        };
        match renderer.render(&request) {
            Ok(chart) => Some(chart),
            Err(err) => {
                warn!(symbol = %instrument.symbol, error = %err, "chart rendering failed, alerting without chart");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertError;
    use crate::chart::ChartError;
    use crate::domain::{PriceBar, Signal, SwingRange};
    use crate::engine::Verdict;
    use crate::error::InsufficientData;
    use crate::indicators::{make_bars, IndicatorEngine};
    use crate::levels::DegeneracyGuard;
    use crate::scoring::{FactorSet, ScoreCard};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Copy)]
    enum Script {
        Signal(SignalDirection),
        NoSignal,
        Degenerate,
    }

    /// Returns pre-programmed verdicts in order, then NoSignal.
    struct ScriptedDecider {
        script: Mutex<VecDeque<Script>>,
        guards_seen: Arc<Mutex<Vec<Option<DegeneracyGuard>>>>,
    }

    impl ScriptedDecider {
        fn new(script: &[Script]) -> Self {
            Self {
                script: Mutex::new(script.iter().copied().collect()),
                guards_seen: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl Decider for ScriptedDecider {
        fn min_bars(&self) -> usize {
            2
        }

        fn decide(
            &self,
            series: &PriceSeries,
            guard: Option<&DegeneracyGuard>,
        ) -> Result<Decision, ScanError> {
            self.guards_seen.lock().unwrap().push(guard.copied());
            if series.len() < 2 {
                return Err(InsufficientData::TooFewBars {
                    required: 2,
                    actual: series.len(),
                }
                .into());
            }
            let step = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Script::NoSignal);
            let last = *series.last().unwrap();
            let levels = LevelPair {
                stop_loss: last.close - 5.0,
                take_profit: last.close + 8.0,
            };
            let (signal, verdict) = match step {
                Script::Signal(direction) => (
                    Signal {
                        direction: Some(direction),
                        score: 7,
                    },
                    Verdict::Signal {
                        direction,
                        score: 7,
                        levels,
                    },
                ),
                Script::NoSignal => (Signal::NONE, Verdict::NoSignal),
                Script::Degenerate => {
                    return Err(ScanError::DegenerateLevels {
                        direction: SignalDirection::Buy,
                        score: 7,
                        entry: last.close,
                        stop_loss: last.close - 0.1,
                        take_profit: last.close + 0.1,
                    })
                }
            };
            Ok(Decision {
                card: ScoreCard {
                    buy: FactorSet::all_pass(),
                    sell: FactorSet::default(),
                    swing: SwingRange::of(series.bars()).unwrap(),
                    signal,
                },
                entry: last.close,
                timestamp: last.timestamp,
                frame: IndicatorEngine::default().compute(series),
                verdict,
            })
        }
    }

    struct FixedQuotes(Result<Vec<PriceBar>, DataError>);

    impl QuoteSource for FixedQuotes {
        fn name(&self) -> &str {
            "fixed"
        }

        fn fetch(&self, _request: &QuoteRequest) -> Result<Vec<PriceBar>, DataError> {
            self.0.clone()
        }
    }

    /// Refuses requests and panics if fetched anyway.
    struct BlockedQuotes;

    impl QuoteSource for BlockedQuotes {
        fn name(&self) -> &str {
            "blocked"
        }

        fn fetch(&self, _request: &QuoteRequest) -> Result<Vec<PriceBar>, DataError> {
            panic!("fetch called on an unavailable source");
        }

        fn is_available(&self) -> bool {
            false
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        alerts: Arc<Mutex<Vec<Alert>>>,
        fail: bool,
    }

    impl AlertSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        fn deliver(&self, alert: Alert) -> Result<(), AlertError> {
            if self.fail {
                return Err(AlertError::Transport("connection reset".into()));
            }
            self.alerts.lock().unwrap().push(alert);
            Ok(())
        }
    }

    struct FailingCharts;

    impl ChartRenderer for FailingCharts {
        fn render(&self, _request: &ChartRequest) -> Result<ChartRef, ChartError> {
            Err(ChartError::Empty("no rows".into()))
        }
    }

    struct PathCharts;

    impl ChartRenderer for PathCharts {
        fn render(&self, request: &ChartRequest) -> Result<ChartRef, ChartError> {
            assert_eq!(request.retracements.len(), 6);
            Ok(ChartRef::new(request.file_name("svg")))
        }
    }

    fn bars() -> Vec<PriceBar> {
        make_bars(&[100.0, 101.0, 102.0, 103.0])
    }

    fn scanner(script: &[Script], sink: RecordingSink) -> Scanner {
        Scanner::new(
            Box::new(ScriptedDecider::new(script)),
            Box::new(FixedQuotes(Ok(bars()))),
            Box::new(sink),
        )
    }

    #[test]
    fn new_signal_is_alerted() {
        let sink = RecordingSink::default();
        let scanner = scanner(&[Script::Signal(SignalDirection::Buy)], sink.clone());
        let outcome = scanner.scan(&Instrument::new("EUR/USD")).unwrap();

        let ScanOutcome::Alerted(alert) = outcome else {
            panic!("expected alert, got {outcome:?}");
        };
        assert_eq!(alert.direction, SignalDirection::Buy);
        assert_eq!(alert.entry, 103.0);
        assert_eq!(alert.take_profit, 111.0);
        assert_eq!(alert.max_score, 7);
        assert_eq!(sink.alerts.lock().unwrap().len(), 1);
        assert_eq!(scanner.tracker().last("EUR/USD"), Some(SignalDirection::Buy));
    }

    #[test]
    fn repeated_signal_is_suppressed() {
        let sink = RecordingSink::default();
        let buy = Script::Signal(SignalDirection::Buy);
        let scanner = scanner(&[buy, buy], sink.clone());
        let inst = Instrument::new("EUR/USD");

        assert_eq!(scanner.scan(&inst).unwrap().label(), "alerted");
        assert_eq!(
            scanner.scan(&inst).unwrap(),
            ScanOutcome::Duplicate {
                direction: SignalDirection::Buy,
                score: 7
            }
        );
        assert_eq!(sink.alerts.lock().unwrap().len(), 1);
    }

    #[test]
    fn none_between_signals_rearms() {
        let sink = RecordingSink::default();
        let buy = Script::Signal(SignalDirection::Buy);
        let scanner = scanner(&[buy, Script::NoSignal, buy], sink.clone());
        let inst = Instrument::new("EUR/USD");

        scanner.scan(&inst).unwrap();
        assert_eq!(scanner.scan(&inst).unwrap().label(), "no_signal");
        assert_eq!(scanner.scan(&inst).unwrap().label(), "alerted");
        assert_eq!(sink.alerts.lock().unwrap().len(), 2);
    }

    #[test]
    fn degenerate_levels_leave_tracker_untouched() {
        let sink = RecordingSink::default();
        let scanner = scanner(
            &[Script::Degenerate, Script::Signal(SignalDirection::Buy)],
            sink.clone(),
        );
        let inst = Instrument::new("XAU/USD");

        let err = scanner.scan(&inst).unwrap_err();
        assert_eq!(err.kind(), "degenerate_levels");
        assert_eq!(scanner.tracker().last("XAU/USD"), None);
        // Next cycle the same signal still fires
        assert_eq!(scanner.scan(&inst).unwrap().label(), "alerted");
    }

    #[test]
    fn failed_delivery_restores_tracker() {
        let sink = RecordingSink {
            fail: true,
            ..RecordingSink::default()
        };
        let scanner = scanner(&[Script::Signal(SignalDirection::Sell)], sink);
        let err = scanner.scan(&Instrument::new("GBP/USD")).unwrap_err();
        assert_eq!(err.kind(), "alert_failed");
        assert_eq!(scanner.tracker().last("GBP/USD"), None);
    }

    #[test]
    fn upstream_failure_and_empty_response() {
        let failing = Scanner::new(
            Box::new(ScriptedDecider::new(&[])),
            Box::new(FixedQuotes(Err(DataError::NetworkUnreachable("dns".into())))),
            Box::new(RecordingSink::default()),
        );
        let err = failing.scan(&Instrument::new("EUR/USD")).unwrap_err();
        assert_eq!(err.kind(), "upstream_failure");

        let empty = Scanner::new(
            Box::new(ScriptedDecider::new(&[])),
            Box::new(FixedQuotes(Ok(Vec::new()))),
            Box::new(RecordingSink::default()),
        );
        let err = empty.scan(&Instrument::new("EUR/USD")).unwrap_err();
        assert!(matches!(
            err,
            ScanError::UpstreamFailure(DataError::NoData { .. })
        ));
    }

    #[test]
    fn unavailable_source_is_not_fetched() {
        let sink = RecordingSink::default();
        let scanner = Scanner::new(
            Box::new(ScriptedDecider::new(&[Script::Signal(SignalDirection::Buy)])),
            Box::new(BlockedQuotes),
            Box::new(sink.clone()),
        );
        let err = scanner.scan(&Instrument::new("EUR/USD")).unwrap_err();
        assert!(matches!(
            err,
            ScanError::UpstreamFailure(DataError::Unavailable { ref provider }) if provider == "blocked"
        ));
        assert!(scanner.tracker().is_empty());
        assert!(sink.alerts.lock().unwrap().is_empty());
    }

    #[test]
    fn unordered_bars_are_insufficient() {
        let mut unordered = bars();
        unordered.swap(1, 2);
        let scanner = Scanner::new(
            Box::new(ScriptedDecider::new(&[Script::Signal(SignalDirection::Buy)])),
            Box::new(FixedQuotes(Ok(unordered))),
            Box::new(RecordingSink::default()),
        );
        let err = scanner.scan(&Instrument::new("EUR/USD")).unwrap_err();
        assert!(matches!(
            err,
            ScanError::DataInsufficient(InsufficientData::NotAscending { index: 2, .. })
        ));
        assert!(scanner.tracker().is_empty());
    }

    #[test]
    fn single_bar_never_reaches_scorer() {
        let scanner = Scanner::new(
            Box::new(ScriptedDecider::new(&[Script::Signal(SignalDirection::Buy)])),
            Box::new(FixedQuotes(Ok(make_bars(&[100.0])))),
            Box::new(RecordingSink::default()),
        );
        let err = scanner.scan(&Instrument::new("EUR/USD")).unwrap_err();
        assert_eq!(err.kind(), "data_insufficient");
    }

    #[test]
    fn chart_failure_still_alerts() {
        let sink = RecordingSink::default();
        let scanner = scanner(&[Script::Signal(SignalDirection::Buy)], sink.clone())
            .with_charts(Box::new(FailingCharts));
        let outcome = scanner.scan(&Instrument::new("EUR/USD")).unwrap();
        let ScanOutcome::Alerted(alert) = outcome else {
            panic!("expected alert");
        };
        assert!(alert.chart.is_none());
    }

    #[test]
    fn chart_is_attached() {
        let sink = RecordingSink::default();
        let scanner = scanner(&[Script::Signal(SignalDirection::Sell)], sink.clone())
            .with_charts(Box::new(PathCharts))
            .with_chart_bars(2);
        scanner.scan(&Instrument::new("EUR/USD")).unwrap();
        let alerts = sink.alerts.lock().unwrap();
        assert_eq!(
            alerts[0].chart.as_ref().unwrap().path().to_str(),
            Some("EURUSD_SELL.svg")
        );
    }

    #[test]
    fn instrument_guard_is_passed_to_decider() {
        let decider = ScriptedDecider::new(&[]);
        let seen = Arc::clone(&decider.guards_seen);
        let scanner = Scanner::new(
            Box::new(decider),
            Box::new(FixedQuotes(Ok(bars()))),
            Box::new(RecordingSink::default()),
        );
        let guard = DegeneracyGuard::Relative { min_fraction: 0.001 };
        scanner
            .scan(&Instrument::new("EUR/USD").with_degeneracy(guard))
            .unwrap();
        assert_eq!(seen.lock().unwrap().as_slice(), &[Some(guard)]);
    }
}
