mod common;

use approx::assert_relative_eq;
use common::{compounding, dates, flat_series, gold_silver_inputs, ohlc_series, random_walk};
use metal_forecast::{
    Asset, ForecastConfig, ForecastError, ForecastInputs, Forecaster, PriceSeries, PriceUnit,
    Regime,
};
use rstest::rstest;

#[rstest]
#[case(1)]
#[case(2)]
#[case(3)]
#[case(99)]
#[case(2024)]
fn test_result_invariants(#[case] seed: u64) {
    let result = Forecaster::default()
        .forecast(&gold_silver_inputs(150, seed))
        .unwrap();

    assert!((0.0..=100.0).contains(&result.confidence));
    assert!(result.low <= result.predicted_price && result.predicted_price <= result.high);
    assert!((0.0..=100.0).contains(&result.breakdown.rsi));
    assert!(result.breakdown.atr >= 0.0);
    if let Some(beta) = result.breakdown.beta_clamped {
        assert!((0.1..=5.0).contains(&beta));
    }
    for rho in [
        result.breakdown.correlation_fast,
        result.breakdown.correlation_slow,
        result.breakdown.dxy_correlation,
    ]
    .into_iter()
    .flatten()
    {
        assert!((-1.0..=1.0).contains(&rho));
    }
    if result.regime_change {
        assert!(result.confidence <= 50.0);
    }
    assert_relative_eq!(
        result.change_pct,
        (result.predicted_price - result.spot_price) / result.spot_price * 100.0,
        epsilon = 1e-9
    );
    assert_eq!(result.confidence_report.factors.len(), 6);
    assert_eq!(result.horizon_days, 7);
}

#[test]
fn test_forecast_is_idempotent() {
    let inputs = gold_silver_inputs(200, 5);
    let forecaster = Forecaster::default();

    let first = forecaster.forecast(&inputs).unwrap();
    let second = forecaster.forecast(&inputs).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first.to_json_pretty().unwrap(),
        second.to_json_pretty().unwrap()
    );
}

#[test]
fn test_uptrend_against_flat_secondary() {
    let n = 80;
    let inputs = ForecastInputs::new(
        Asset::Gold,
        Asset::Silver,
        flat_series(&compounding(100.0, 0.01, n), PriceUnit::PerGram),
        flat_series(&vec![25.0; n], PriceUnit::PerTroyOunce),
        flat_series(&random_walk(104.0, 0.004, n, 12), PriceUnit::IndexPoints),
    );
    let result = Forecaster::default().forecast(&inputs).unwrap();
    let b = &result.breakdown;

    assert_eq!(b.secondary_momentum, 0.0);
    assert!(b.beta_fallback);
    assert_eq!(b.correlation_slow, None);
    assert_eq!(b.pressure_multiplier, 0.0);
    assert_eq!(result.expected_move, 0.0);
    assert_eq!(result.ratio_pressure, 0.0);
    assert_eq!(result.predicted_price, result.spot_price);
    assert!((result.predicted_price - result.spot_price).abs() <= b.atr * 7f64.sqrt());

    // Flat index sits on its average: not above it, so BEAR
    assert_eq!(result.regime, Regime::Bear);
    assert!(!result.regime_change);
}

fn with_lengths(primary: usize, secondary: usize, dxy: usize, index: usize) -> ForecastInputs {
    let n = primary.max(secondary).max(dxy).max(index);
    let base = gold_silver_inputs(n, 31);
    // Keep the most recent bars of each series so the dates still overlap
    let tail = |s: &PriceSeries, len: usize| {
        PriceSeries::new(s.unit(), s.bars()[n - len..].to_vec()).unwrap()
    };
    ForecastInputs::new(
        base.primary_asset,
        base.secondary_asset,
        tail(&base.primary, primary),
        tail(&base.secondary, secondary),
        tail(&base.dxy, dxy),
    )
    .with_market_index(tail(base.market_index(), index))
}

#[rstest]
#[case(with_lengths(14, 100, 100, 100), 15, 14, "14-period RSI/ATR seed")]
#[case(with_lengths(100, 40, 100, 100), 61, 40, "60-day beta/correlation")]
#[case(with_lengths(100, 100, 10, 100), 15, 10, "14-day currency-index")]
#[case(with_lengths(100, 100, 100, 50), 51, 50, "50-day market index")]
fn test_insufficient_data_names_the_window(
    #[case] inputs: ForecastInputs,
    #[case] need: usize,
    #[case] have: usize,
    #[case] window: &str,
) {
    let err = Forecaster::default().forecast(&inputs).unwrap_err();
    match &err {
        ForecastError::InsufficientData {
            required,
            available,
            ..
        } => {
            assert_eq!(*required, need);
            assert_eq!(*available, have);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    let msg = err.to_string();
    assert!(msg.contains(window), "{}", msg);
    assert!(msg.contains(&format!("short by {}", need - have)), "{}", msg);
}

#[test]
fn test_primary_must_be_a_metal() {
    let mut inputs = gold_silver_inputs(100, 4);
    inputs.primary_asset = Asset::Sp500;
    assert!(matches!(
        Forecaster::default().forecast(&inputs),
        Err(ForecastError::ValidationError(_))
    ));

    let mut inputs = gold_silver_inputs(100, 4);
    inputs.secondary_asset = Asset::Gold;
    assert!(matches!(
        Forecaster::default().forecast(&inputs),
        Err(ForecastError::ValidationError(_))
    ));
}

#[test]
fn test_missing_currency_dates_become_notes() {
    let n = 120;
    let mut inputs = gold_silver_inputs(n, 8);
    let d = dates(n);
    let closes = random_walk(104.0, 0.004, n, 60);
    let (dd, dc): (Vec<_>, Vec<_>) = d
        .into_iter()
        .zip(closes)
        .enumerate()
        .filter(|(i, _)| i % 7 != 0)
        .map(|(_, x)| x)
        .unzip();
    inputs.dxy = PriceSeries::from_closes(PriceUnit::IndexPoints, &dd, &dc).unwrap();

    let result = Forecaster::default().forecast(&inputs).unwrap();
    assert_eq!(result.notes.len(), 1);
    assert_eq!(result.notes[0].pair, "primary/currency index");
    assert_eq!(result.notes[0].dropped_left, 18);
}

#[test]
fn test_market_index_defaults_to_secondary() {
    let inputs = gold_silver_inputs(120, 14);
    let without = ForecastInputs {
        market_index: None,
        ..inputs.clone()
    };
    assert_eq!(without.market_index(), &without.secondary);

    let result = Forecaster::default().forecast(&without).unwrap();
    let closes = without.secondary.closes();
    assert_eq!(result.regime_info.index_value, closes[closes.len() - 1]);
}

#[test]
fn test_custom_horizon_scales_range() {
    let mut config = ForecastConfig::default();
    config.windows.horizon_days = 5;
    let result = Forecaster::new(config)
        .unwrap()
        .forecast(&gold_silver_inputs(120, 21))
        .unwrap();

    assert_eq!(result.horizon_days, 5);
    assert_relative_eq!(
        result.high - result.low,
        2.0 * result.breakdown.atr * 5f64.sqrt(),
        epsilon = 1e-9
    );
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = ForecastConfig::default();
    config.prediction.clamp.normal = 0.3;
    assert!(matches!(
        Forecaster::new(config),
        Err(ForecastError::ConfigError(_))
    ));
}

#[test]
fn test_result_serializes_for_display() {
    let inputs = ForecastInputs::new(
        Asset::Copper,
        Asset::Sp500,
        ohlc_series(&random_walk(0.009, 0.012, 90, 3), 0.005),
        flat_series(&random_walk(5000.0, 0.01, 90, 4), PriceUnit::IndexPoints),
        flat_series(&random_walk(104.0, 0.004, 90, 5), PriceUnit::IndexPoints),
    );
    let result = Forecaster::default().forecast(&inputs).unwrap();
    let json: serde_json::Value = serde_json::from_str(&result.to_json_pretty().unwrap()).unwrap();

    assert_eq!(json["primary"], "Copper");
    assert_eq!(json["secondary"], "S&P 500");
    assert_eq!(json["confidence_report"]["weight_table"], "copper");
    assert!(["BULL", "BEAR", "SIDEWAYS"].contains(&json["regime"].as_str().unwrap()));
    assert!(json["breakdown"]["clamp_tier"].is_string());
}
