//! ScanLab CLI — scheduled scans, offline evaluation and config checks.
//!
//! Commands:
//! - `scan` — run scan cycles on a schedule (or once) and deliver alerts
//! - `evaluate` — score one CSV series and print the decision
//! - `check-config` — parse and validate a config file

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use scanlab_core::domain::PriceSeries;
use scanlab_core::scoring::FactorSet;
use scanlab_core::{Decider, Decision, DecisionEngine, EngineConfig, ScanError, Verdict};
use scanlab_runner::quotes::read_bars;
use scanlab_runner::{
    build_scanner, run_cycle, run_scheduled, CycleReport, MarketCalendar, Schedule, ScannerConfig,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "scanlab",
    about = "ScanLab — multi-instrument signal scanner with chat alerts"
)]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the configured instruments every interval until Ctrl-C.
    Scan {
        /// Path to a TOML config file.
        #[arg(long, default_value = "scanlab.toml")]
        config: PathBuf,

        /// Run a single cycle and exit.
        #[arg(long, default_value_t = false)]
        once: bool,

        /// Print each cycle report as JSON on stdout.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Evaluate the last bar of a CSV series (datetime,open,high,low,close[,volume]).
    Evaluate {
        /// CSV file to evaluate.
        #[arg(long)]
        csv: PathBuf,

        /// Config whose [engine] section to use. Defaults to built-in settings.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the decision as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Parse and validate a config file.
    CheckConfig {
        #[arg(long, default_value = "scanlab.toml")]
        config: PathBuf,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    // A missing .env is fine; the environment may already carry the secrets.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Commands::Scan { config, once, json } => run_scan(&config, once, json),
        Commands::Evaluate { csv, config, json } => run_evaluate(&csv, config.as_deref(), json),
        Commands::CheckConfig { config } => run_check_config(&config),
    }
}

fn load_config(path: &Path) -> Result<ScannerConfig> {
    ScannerConfig::from_file(path).with_context(|| format!("loading {}", path.display()))
}

fn print_report(report: &CycleReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
    }
    Ok(())
}

fn run_scan(config_path: &Path, once: bool, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let calendar = MarketCalendar::from_config(&config.calendar)?;
    let scanner = build_scanner(&config)?;

    if once {
        let report = run_cycle(
            &scanner,
            &calendar,
            &config.instruments,
            config.schedule.parallel,
            Utc::now(),
        );
        print_report(&report, json)?;
        // Dropping the scanner drains the alert queue.
        drop(scanner);
        return Ok(());
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            if stop.swap(true, Ordering::SeqCst) {
                warn!("second interrupt, exiting immediately");
                std::process::exit(130);
            }
            info!("interrupt received, finishing current cycle");
        })
        .context("installing Ctrl-C handler")?;
    }

    let schedule = Schedule::from_config(&config.schedule);
    let mut print_error = None;
    run_scheduled(
        &scanner,
        &calendar,
        &config.instruments,
        schedule,
        &stop,
        |report| {
            if let Err(e) = print_report(report, json) {
                print_error.get_or_insert(e);
                stop.store(true, Ordering::SeqCst);
            }
        },
    );
    drop(scanner);

    match print_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn factor_line(label: &str, factors: &FactorSet, max_score: u8) -> String {
    let failing = factors.failing();
    if failing.is_empty() {
        format!("  {label:<4} {}/{max_score}  all factors pass", factors.score())
    } else {
        format!(
            "  {label:<4} {}/{max_score}  failing: {}",
            factors.score(),
            failing.join(", ")
        )
    }
}

fn print_decision(decision: &Decision, max_score: u8) {
    println!("Bar:    {}", decision.timestamp.format("%Y-%m-%d %H:%M"));
    println!("Entry:  {}", decision.entry);
    if let Some(row) = decision.frame.last() {
        let fmt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.5}"));
        println!(
            "EMA20 {}  EMA50 {}  RSI {}  MACD hist {}  ATR {}",
            fmt(row.ema_fast),
            fmt(row.ema_slow),
            fmt(row.rsi),
            fmt(row.macd_hist),
            fmt(row.atr)
        );
    }
    println!("Swing:  high {}  low {}", decision.card.swing.high, decision.card.swing.low);
    println!("Scores:");
    println!("{}", factor_line("BUY", &decision.card.buy, max_score));
    println!("{}", factor_line("SELL", &decision.card.sell, max_score));
    match &decision.verdict {
        Verdict::Signal {
            direction,
            score,
            levels,
        } => {
            println!("Signal: {direction} ({score}/{max_score})");
            println!("  TP {}", levels.take_profit);
            println!("  SL {}", levels.stop_loss);
        }
        Verdict::NoSignal => println!("Signal: NONE"),
    }
}

fn run_evaluate(csv: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    let engine_config = match config_path {
        Some(path) => load_config(path)?.engine,
        None => EngineConfig::default(),
    };
    let engine = DecisionEngine::new(engine_config);

    let bars = read_bars(csv).with_context(|| format!("reading {}", csv.display()))?;
    let series = PriceSeries::new(bars)?;
    info!(path = %csv.display(), bars = series.len(), "evaluating series");

    match engine.decide(&series, None) {
        Ok(decision) => {
            if json {
                let signal = decision.signal().map(|(direction, score, levels)| {
                    serde_json::json!({
                        "direction": direction,
                        "score": score,
                        "stop_loss": levels.stop_loss,
                        "take_profit": levels.take_profit,
                    })
                });
                let out = serde_json::json!({
                    "timestamp": decision.timestamp,
                    "entry": decision.entry,
                    "card": decision.card,
                    "signal": signal,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print_decision(&decision, engine.max_score());
            }
            Ok(())
        }
        Err(ScanError::DegenerateLevels {
            direction,
            score,
            entry,
            stop_loss,
            take_profit,
        }) => {
            println!(
                "Signal: {direction} ({score}/{}) rejected: levels too close to entry {entry} (SL {stop_loss}, TP {take_profit})",
                engine.max_score()
            );
            Ok(())
        }
        Err(e) => bail!("cannot evaluate {}: {e}", csv.display()),
    }
}

fn run_check_config(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    println!("Config OK: {}", path.display());
    println!(
        "  {} instruments, every {} min{}",
        config.instruments.len(),
        config.schedule.interval_minutes,
        if config.schedule.parallel {
            ", parallel"
        } else {
            ""
        }
    );
    println!(
        "  quotes: {:?} {} x{}",
        config.quotes.provider, config.quotes.interval, config.quotes.output_size
    );
    println!("  alerts: {:?}", config.alerts.sink);
    println!(
        "  engine warm-up: {} bars, min score {}",
        config.engine.min_bars(),
        config.engine.scoring.min_score
    );
    for inst in &config.instruments {
        println!(
            "  - {}{}",
            inst.symbol,
            if inst.always_open { " (always open)" } else { "" }
        );
    }
    Ok(())
}
