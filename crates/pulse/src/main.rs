//! Headless feed simulator.
//!
//! Drives a [`ChartEngine`] with a random-walk tick stream at 60 frames per
//! second of simulated time and reports what the engine produced.
//!
//! Usage: pulse-sim [seed.csv] [--seconds N] [--tick-ms N] [--seed N]

use std::env;

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pulse::{ChartEngine, EngineConfig, Notification, SeedCandle, Tick};
use pulse_config::Config;
use pulse_data::{CsvLoader, DataSource};

/// Simulated seconds when `--seconds` is not given.
const DEFAULT_SECONDS: i64 = 300;

/// Milliseconds between ticks when `--tick-ms` is not given.
const DEFAULT_TICK_MS: i64 = 450;

/// Synthetic history length when no CSV is given.
const SYNTHETIC_CANDLES: i64 = 120;

/// Start of the simulated clock (2023-11-14 22:13:20 UTC).
const START_MS: i64 = 1_700_000_000_000;

const FRAME_MS: i64 = 16;

struct Args {
    csv: Option<String>,
    seconds: i64,
    tick_ms: i64,
    seed: u64,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        csv: None,
        seconds: DEFAULT_SECONDS,
        tick_ms: DEFAULT_TICK_MS,
        seed: 7,
    };
    let mut it = env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--seconds" => args.seconds = next_number(&mut it, "--seconds")?,
            "--tick-ms" => args.tick_ms = next_number(&mut it, "--tick-ms")?.max(1),
            "--seed" => args.seed = next_number(&mut it, "--seed")? as u64,
            flag if flag.starts_with("--") => bail!("unknown flag {flag}"),
            path => args.csv = Some(path.to_string()),
        }
    }
    Ok(args)
}

fn next_number(it: &mut impl Iterator<Item = String>, flag: &str) -> Result<i64> {
    let value = it.next().with_context(|| format!("{flag} needs a value"))?;
    value
        .parse()
        .with_context(|| format!("{flag} expects a number, got '{value}'"))
}

/// Random-walk history ending just before `START_MS`.
fn synthetic_seed(rng: &mut StdRng, period_secs: i64) -> Vec<SeedCandle> {
    let first = START_MS / 1000 - SYNTHETIC_CANDLES * period_secs;
    let mut price: f64 = 1.1000;
    (0..SYNTHETIC_CANDLES)
        .map(|i| {
            let open = price;
            let close = open + rng.random_range(-0.0008..=0.0008);
            let high = open.max(close) + rng.random_range(0.0..0.0003);
            let low = open.min(close) - rng.random_range(0.0..0.0003);
            price = close;
            SeedCandle::new(first + i * period_secs, open, high, low, close)
        })
        .collect()
}

fn run() -> Result<()> {
    env_logger::init();

    let args = parse_args()?;
    let config = Config::load_default();
    let engine_config = EngineConfig::try_from(&config).context("invalid configuration")?;
    let mut engine = ChartEngine::new(engine_config)?;
    let mut rng = StdRng::seed_from_u64(args.seed);

    match &args.csv {
        Some(path) => engine.load_history_result(CsvLoader::new(path).load()),
        None => {
            let seed = synthetic_seed(&mut rng, engine.timeframe().millis() / 1000);
            engine.load_history(&seed);
        }
    }
    engine.resize(1280.0, 720.0);

    let mut price = engine.store().last_close().unwrap_or(1.1);
    let mut next_tick = START_MS;
    let end = START_MS + args.seconds * 1000;
    let (mut ticks, mut rejected, mut frames, mut ops) = (0usize, 0usize, 0usize, 0usize);
    let (mut closed, mut rollovers) = (0usize, 0usize);

    let mut now = START_MS;
    while now < end {
        while next_tick <= now {
            price += rng.random_range(-0.0002..=0.0002);
            ticks += 1;
            if engine.on_tick(&Tick::new(price, next_tick)).is_err() {
                rejected += 1;
            }
            next_tick += rng.random_range(args.tick_ms / 2..=args.tick_ms * 3 / 2).max(1);
        }

        engine.step(FRAME_MS as f64, now);
        ops += engine.plan_frame().len();
        frames += 1;

        for note in engine.drain_notifications() {
            match note {
                Notification::CandleClosed { candle } => {
                    closed += 1;
                    log::info!(
                        "closed {} O {:.5} H {:.5} L {:.5} C {:.5}",
                        candle.bucket_start,
                        candle.open,
                        candle.high,
                        candle.low,
                        candle.close
                    );
                }
                Notification::TimestampsAdvanced { deadline, expiration } => {
                    rollovers += 1;
                    log::info!("timeline advanced: deadline {deadline} expiration {expiration}");
                }
                Notification::PriceUpdated { .. } => {}
                other => log::debug!("{}", other.name()),
            }
        }
        now += FRAME_MS;
    }

    println!("symbol      {} {}", engine.symbol(), engine.timeframe());
    println!("ticks       {ticks} ({rejected} rejected)");
    println!("frames      {frames} ({:.1} ops/frame)", ops as f64 / frames.max(1) as f64);
    println!("closed      {closed} candles, {} in history", engine.store().closed_candles().len());
    println!("rollovers   {rollovers}");
    match engine.visual_price() {
        Some(visual) => println!("price       {price:.5} (visual {visual:.5})"),
        None => println!("price       {price:.5}"),
    }
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
