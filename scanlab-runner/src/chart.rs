//! SVG signal charts.
//!
//! Three stacked panels: candles with EMA(20)/EMA(50), entry, stop-loss,
//! take-profit and Fibonacci retracement lines; MACD with signal line and
//! histogram; RSI with 30/70 guides. Output is a self-contained SVG file
//! named `<STEM>_<SIGNAL>.svg`.

use scanlab_core::chart::{ChartError, ChartRef, ChartRenderer, ChartRequest};
use scanlab_core::indicators::IndicatorRow;
use std::path::PathBuf;
use tracing::debug;

const WIDTH: f64 = 1000.0;
const MARGIN_LEFT: f64 = 10.0;
const MARGIN_RIGHT: f64 = 90.0;
const PRICE_TOP: f64 = 40.0;
const PRICE_HEIGHT: f64 = 400.0;
const MACD_TOP: f64 = 460.0;
const MACD_HEIGHT: f64 = 120.0;
const RSI_TOP: f64 = 600.0;
const RSI_HEIGHT: f64 = 100.0;
const HEIGHT: f64 = 720.0;

const BULL: &str = "#26a69a";
const BEAR: &str = "#ef5350";

/// Maps values into a vertical pixel band.
#[derive(Debug, Clone, Copy)]
struct Scale {
    min: f64,
    max: f64,
    top: f64,
    height: f64,
}

impl Scale {
    fn new(min: f64, max: f64, top: f64, height: f64) -> Self {
        let (min, max) = if (max - min).abs() < f64::EPSILON {
            (min - 1.0, max + 1.0)
        } else {
            (min, max)
        };
        let pad = (max - min) * 0.05;
        Self {
            min: min - pad,
            max: max + pad,
            top,
            height,
        }
    }

    fn y(&self, value: f64) -> f64 {
        self.top + (self.max - value) / (self.max - self.min) * self.height
    }
}

struct XAxis {
    slot: f64,
}

impl XAxis {
    fn new(n: usize) -> Self {
        Self {
            slot: (WIDTH - MARGIN_LEFT - MARGIN_RIGHT) / n as f64,
        }
    }

    fn center(&self, i: usize) -> f64 {
        MARGIN_LEFT + self.slot * (i as f64 + 0.5)
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.filter(|v| v.is_finite()).fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Polyline segments over the defined values; gaps break the line.
fn polylines(values: &[Option<f64>], x: &XAxis, scale: &Scale, color: &str) -> String {
    let mut out = String::new();
    let mut points: Vec<String> = Vec::new();
    let flush = |points: &mut Vec<String>, out: &mut String| {
        if points.len() > 1 {
            out.push_str(&format!(
                "<polyline fill=\"none\" stroke=\"{color}\" stroke-width=\"1.5\" points=\"{}\"/>\n",
                points.join(" ")
            ));
        }
        points.clear();
    };
    for (i, v) in values.iter().enumerate() {
        match v {
            Some(v) if v.is_finite() => {
                points.push(format!("{:.1},{:.1}", x.center(i), scale.y(*v)))
            }
            _ => flush(&mut points, &mut out),
        }
    }
    flush(&mut points, &mut out);
    out
}

fn hline(scale: &Scale, value: f64, color: &str, dash: bool, label: &str) -> String {
    let y = scale.y(value);
    let dash = if dash { " stroke-dasharray=\"4 3\"" } else { "" };
    format!(
        "<line x1=\"{MARGIN_LEFT}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"{color}\" stroke-width=\"1\"{dash}/>\n\
         <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"11\" fill=\"{color}\">{label}</text>\n",
        WIDTH - MARGIN_RIGHT,
        WIDTH - MARGIN_RIGHT + 4.0,
        y + 4.0
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Render the chart document without touching the filesystem.
pub fn render_svg(request: &ChartRequest) -> Result<String, ChartError> {
    let rows: &[IndicatorRow] = &request.rows;
    if rows.is_empty() {
        return Err(ChartError::Empty(format!("no bars for {}", request.symbol)));
    }
    let x = XAxis::new(rows.len());

    let price_values = rows
        .iter()
        .flat_map(|r| [r.bar.high, r.bar.low])
        .chain(rows.iter().filter_map(|r| r.ema_fast))
        .chain(rows.iter().filter_map(|r| r.ema_slow))
        .chain([
            request.entry,
            request.levels.stop_loss,
            request.levels.take_profit,
        ])
        .chain(request.retracements.iter().map(|f| f.price));
    let (lo, hi) = min_max(price_values)
        .ok_or_else(|| ChartError::Empty(format!("no finite prices for {}", request.symbol)))?;
    let price = Scale::new(lo, hi, PRICE_TOP, PRICE_HEIGHT);

    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{HEIGHT}\" viewBox=\"0 0 {WIDTH} {HEIGHT}\" font-family=\"sans-serif\">\n\
         <rect width=\"100%\" height=\"100%\" fill=\"#ffffff\"/>\n\
         <text x=\"{MARGIN_LEFT}\" y=\"24\" font-size=\"16\" font-weight=\"bold\">{} {} signal</text>\n",
        escape(&request.symbol),
        request.direction
    );

    // Fibonacci retracements sit behind the candles.
    for fib in &request.retracements {
        svg.push_str(&hline(
            &price,
            fib.price,
            "#b0bec5",
            true,
            &format!("{:.1}%", fib.ratio * 100.0),
        ));
    }

    // Candles
    let body_width = (x.slot * 0.6).max(1.0);
    for (i, row) in rows.iter().enumerate() {
        let bar = &row.bar;
        let color = if bar.close >= bar.open { BULL } else { BEAR };
        let cx = x.center(i);
        let top = price.y(bar.open.max(bar.close));
        let bottom = price.y(bar.open.min(bar.close));
        svg.push_str(&format!(
            "<line x1=\"{cx:.1}\" y1=\"{:.1}\" x2=\"{cx:.1}\" y2=\"{:.1}\" stroke=\"{color}\"/>\n\
             <rect x=\"{:.1}\" y=\"{top:.1}\" width=\"{body_width:.1}\" height=\"{:.1}\" fill=\"{color}\"/>\n",
            price.y(bar.high),
            price.y(bar.low),
            cx - body_width / 2.0,
            (bottom - top).max(1.0)
        ));
    }

    let ema_fast: Vec<Option<f64>> = rows.iter().map(|r| r.ema_fast).collect();
    let ema_slow: Vec<Option<f64>> = rows.iter().map(|r| r.ema_slow).collect();
    svg.push_str(&polylines(&ema_fast, &x, &price, "#1e88e5"));
    svg.push_str(&polylines(&ema_slow, &x, &price, "#fb8c00"));

    svg.push_str(&hline(&price, request.entry, "#424242", false, "Entry"));
    svg.push_str(&hline(&price, request.levels.take_profit, BULL, false, "TP"));
    svg.push_str(&hline(&price, request.levels.stop_loss, BEAR, false, "SL"));

    // MACD panel
    let macd: Vec<Option<f64>> = rows.iter().map(|r| r.macd).collect();
    let signal: Vec<Option<f64>> = rows.iter().map(|r| r.macd_signal).collect();
    let hist: Vec<Option<f64>> = rows.iter().map(|r| r.macd_hist).collect();
    let macd_range = min_max(
        macd.iter()
            .chain(&signal)
            .chain(&hist)
            .flatten()
            .copied()
            .chain([0.0]),
    )
    .unwrap_or((-1.0, 1.0));
    let macd_scale = Scale::new(macd_range.0, macd_range.1, MACD_TOP, MACD_HEIGHT);
    svg.push_str(&hline(&macd_scale, 0.0, "#9e9e9e", true, "MACD"));
    let zero = macd_scale.y(0.0);
    for (i, h) in hist.iter().enumerate() {
        if let Some(h) = h.filter(|h| h.is_finite()) {
            let y = macd_scale.y(h);
            svg.push_str(&format!(
                "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{body_width:.1}\" height=\"{:.1}\" fill=\"{}\" opacity=\"0.6\"/>\n",
                x.center(i) - body_width / 2.0,
                y.min(zero),
                (y - zero).abs().max(0.5),
                if h >= 0.0 { BULL } else { BEAR }
            ));
        }
    }
    svg.push_str(&polylines(&macd, &x, &macd_scale, "#1e88e5"));
    svg.push_str(&polylines(&signal, &x, &macd_scale, "#fb8c00"));

    // RSI panel on a fixed 0..100 scale
    let rsi_scale = Scale {
        min: 0.0,
        max: 100.0,
        top: RSI_TOP,
        height: RSI_HEIGHT,
    };
    svg.push_str(&hline(&rsi_scale, 70.0, "#9e9e9e", true, "70"));
    svg.push_str(&hline(&rsi_scale, 30.0, "#9e9e9e", true, "30"));
    let rsi: Vec<Option<f64>> = rows.iter().map(|r| r.rsi).collect();
    svg.push_str(&polylines(&rsi, &x, &rsi_scale, "#8e24aa"));

    svg.push_str("</svg>\n");
    Ok(svg)
}

/// Writes charts into a directory, overwriting the previous chart for the
/// same instrument and direction.
pub struct SvgChartRenderer {
    output_dir: PathBuf,
}

impl SvgChartRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl ChartRenderer for SvgChartRenderer {
    fn render(&self, request: &ChartRequest) -> Result<ChartRef, ChartError> {
        let svg = render_svg(request)?;
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(request.file_name("svg"));
        std::fs::write(&path, svg)?;
        debug!(symbol = %request.symbol, path = %path.display(), "chart written");
        Ok(ChartRef::new(path))
    }
}
