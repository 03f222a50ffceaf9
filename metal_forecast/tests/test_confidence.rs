use approx::assert_relative_eq;
use metal_forecast::confidence::score;
use metal_forecast::cross_asset::{BetaEstimate, CrossAssetMetrics};
use metal_forecast::{
    Asset, ClampTier, Factor, ForecastConfig, PredictionBreakdown, Regime, RegimeInfo,
    WeightTableKind,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;
use std::collections::BTreeMap;

fn metrics(rho_slow: Option<f64>, dxy: Option<f64>) -> CrossAssetMetrics {
    let mut correlation_window = BTreeMap::new();
    correlation_window.insert(10, rho_slow);
    correlation_window.insert(60, rho_slow);
    CrossAssetMetrics {
        beta: BetaEstimate {
            window: 60,
            raw: Some(1.0),
            clamped: Some(1.0),
        },
        correlation_window,
        correlation_fast: rho_slow,
        correlation_slow: rho_slow,
        dxy_correlation: dxy,
        notes: vec![],
    }
}

fn regime(regime: Regime, regime_change: bool) -> RegimeInfo {
    RegimeInfo {
        regime,
        regime_change,
        index_value: 100.0,
        index_ma: 99.0,
        correlation_divergence: 0.0,
    }
}

fn breakdown(rsi: f64, volatility_pct: f64, ratio_deviation: f64) -> PredictionBreakdown {
    PredictionBreakdown {
        spot_price: 100.0,
        rsi,
        atr: volatility_pct,
        volatility_pct,
        secondary_avg_short: 1.0,
        secondary_avg_long: 1.0,
        secondary_momentum: 0.0,
        beta_raw: Some(1.0),
        beta_clamped: Some(1.0),
        beta_fallback: false,
        beta_effective: 1.0,
        raw_move: 0.0,
        clamp_tier: ClampTier::Normal,
        clamp_bound: 0.10,
        correlation_fast: None,
        correlation_slow: None,
        dxy_correlation: None,
        ratio_current: 1.0,
        ratio_average: 1.0,
        ratio_deviation,
        pressure_multiplier: 0.0,
        primary_momentum_short: 0.01,
        primary_momentum_long: 0.01,
        bearish_filter: false,
        range_half_width: 1.0,
    }
}

#[test]
fn test_ideal_inputs_score_full() {
    let report = score(
        Asset::Silver,
        Asset::Gold,
        &metrics(Some(0.85), Some(-0.6)),
        &regime(Regime::Bull, false),
        &breakdown(50.0, 1.0, 0.01),
        &ForecastConfig::default(),
    );

    assert_eq!(report.weight_table, WeightTableKind::Standard);
    assert_eq!(report.max_points, 110.0);
    assert_eq!(report.points, 110.0);
    assert_eq!(report.confidence, 100.0);
    assert!(!report.capped);
    assert_eq!(report.factors.len(), 6);
    assert!(report.factors.iter().all(|f| f.score == f.max));
}

#[test]
fn test_copper_uses_its_own_table() {
    let report = score(
        Asset::Copper,
        Asset::Sp500,
        &metrics(Some(0.85), Some(-0.6)),
        &regime(Regime::Bear, false),
        &breakdown(50.0, 1.0, 0.01),
        &ForecastConfig::default(),
    );

    assert_eq!(report.weight_table, WeightTableKind::Copper);
    assert_eq!(report.max_points, 100.0);
    assert_eq!(report.factor(Factor::DxyHealth).unwrap().max, 5.0);
    assert_eq!(report.confidence, 100.0);
}

#[test]
fn test_regime_change_caps_confidence() {
    let config = ForecastConfig::default();
    let capped = score(
        Asset::Gold,
        Asset::Silver,
        &metrics(Some(0.9), Some(-0.8)),
        &regime(Regime::Sideways, true),
        &breakdown(50.0, 1.0, 0.0),
        &config,
    );
    assert_eq!(capped.confidence, 50.0);
    assert!(capped.capped);
    // Raw sub-scores are still reported in full
    assert_eq!(capped.points, 110.0);

    // Already below the cap: untouched
    let low = score(
        Asset::Gold,
        Asset::Silver,
        &metrics(Some(0.1), Some(0.3)),
        &regime(Regime::Bull, true),
        &breakdown(90.0, 6.0, 0.3),
        &config,
    );
    assert!(low.confidence < 50.0);
    assert!(!low.capped);
}

#[rstest]
#[case(Regime::Bull, Asset::Gold, 0.3, true)]
#[case(Regime::Bull, Asset::Sp500, 0.0, false)]
#[case(Regime::Bear, Asset::Sp500, 0.3, true)]
#[case(Regime::Bear, Asset::Gold, 0.0, false)]
#[case(Regime::Sideways, Asset::Silver, 0.09, true)]
#[case(Regime::Sideways, Asset::Silver, -0.11, false)]
fn test_regime_fit(
    #[case] label: Regime,
    #[case] secondary: Asset,
    #[case] deviation: f64,
    #[case] fits: bool,
) {
    let report = score(
        Asset::Platinum,
        secondary,
        &metrics(Some(0.5), Some(-0.2)),
        &regime(label, false),
        &breakdown(50.0, 1.0, deviation),
        &ForecastConfig::default(),
    );
    let fit = report.factor(Factor::RegimeFit).unwrap();
    assert_eq!(fit.score, if fits { 15.0 } else { 0.0 });
    assert!(!fit.rationale.is_empty());
}

#[test]
fn test_partial_credit_sums() {
    let report = score(
        Asset::Gold,
        Asset::Silver,
        &metrics(Some(0.35), Some(-0.25)),
        &regime(Regime::Bull, false),
        &breakdown(75.0, 3.0, 0.10),
        &ForecastConfig::default(),
    );

    // 25 + 7.5 + 0 + 5 + 5 + 5
    assert_relative_eq!(report.points, 47.5, epsilon = 1e-9);
    assert_relative_eq!(report.confidence, 47.5 / 110.0 * 100.0, epsilon = 1e-9);
}

#[test]
fn test_undefined_correlations_score_zero() {
    let report = score(
        Asset::Gold,
        Asset::Silver,
        &metrics(None, None),
        &regime(Regime::Bull, false),
        &breakdown(50.0, 1.0, 0.0),
        &ForecastConfig::default(),
    );
    assert_eq!(report.factor(Factor::Correlation).unwrap().score, 0.0);
    assert_eq!(report.factor(Factor::DxyHealth).unwrap().score, 0.0);
}

#[test]
fn test_confidence_bounds_on_random_inputs() {
    let mut rng = StdRng::seed_from_u64(2024);
    let config = ForecastConfig::default();
    let regimes = [Regime::Bull, Regime::Bear, Regime::Sideways];
    let metals = [Asset::Gold, Asset::Silver, Asset::Platinum, Asset::Copper];

    for _ in 0..500 {
        let change = rng.gen_bool(0.3);
        let report = score(
            metals[rng.gen_range(0..metals.len())],
            Asset::Sp500,
            &metrics(Some(rng.gen_range(-1.0..=1.0)), Some(rng.gen_range(-1.0..=1.0))),
            &regime(regimes[rng.gen_range(0..3)], change),
            &breakdown(
                rng.gen_range(0.0..=100.0),
                rng.gen_range(0.0..15.0),
                rng.gen_range(-0.5..0.5),
            ),
            &config,
        );

        assert!((0.0..=100.0).contains(&report.confidence));
        for f in &report.factors {
            assert!(f.score >= 0.0 && f.score <= f.max, "{:?}", f);
        }
        if change {
            assert!(report.confidence <= 50.0);
        }
    }
}
