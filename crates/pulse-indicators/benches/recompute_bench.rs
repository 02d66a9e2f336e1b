//! Benchmarks for full indicator recomputation and live peeks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use pulse_core::Candle;
use pulse_indicators::{
    Bollinger, BollingerConfig, Indicator, Macd, MacdConfig, Rsi, RsiConfig, Sma, SmaConfig,
};

fn generate_candles(count: usize) -> Vec<Candle> {
    let mut candles = Vec::with_capacity(count);
    let mut price = 1.1_f64;

    for i in 0..count {
        let trend = (i as f64 * 0.01).sin() * 0.001;
        let volatility = (i as f64 * 0.1).sin() * 0.0005;

        let open = price;
        let close = (open + trend * 0.1 + volatility).max(0.01);
        let wick = volatility.abs() * 0.5 + 0.0001;

        candles.push(Candle::new(
            i as i64 * 60_000,
            open,
            open.max(close) + wick,
            open.min(close) - wick,
            close,
        ));

        price = close;
    }

    candles
}

fn bench_recompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("recompute");

    for size in [100, 500, 5000].iter() {
        let candles = generate_candles(*size);

        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("sma20", size), &candles, |b, candles| {
            let mut sma = Sma::new(SmaConfig::default());
            b.iter(|| sma.calculate(black_box(candles)));
        });
        group.bench_with_input(BenchmarkId::new("bollinger20", size), &candles, |b, candles| {
            let mut bb = Bollinger::new(BollingerConfig::default());
            b.iter(|| bb.calculate(black_box(candles)));
        });
        group.bench_with_input(BenchmarkId::new("macd", size), &candles, |b, candles| {
            let mut macd = Macd::new(MacdConfig::default());
            b.iter(|| macd.calculate(black_box(candles)));
        });
    }

    group.finish();
}

fn bench_live_peek(c: &mut Criterion) {
    let candles = generate_candles(500);
    let (history, live) = candles.split_at(499);

    let mut rsi = Rsi::new(RsiConfig::default());
    rsi.calculate(history);
    let mut bb = Bollinger::new(BollingerConfig::default());
    bb.calculate(history);

    c.bench_function("peek_rsi", |b| b.iter(|| rsi.peek(black_box(&live[0]))));
    c.bench_function("peek_bollinger", |b| b.iter(|| bb.peek(black_box(&live[0]))));
}

criterion_group!(benches, bench_recompute, bench_live_peek);
criterion_main!(benches);
