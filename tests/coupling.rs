use market_fx_wasm::domain::chart::{LayerConfig, LayerTuning, MarketLayer, RefPriceFeed};
use market_fx_wasm::domain::market_data::{PriceProcess, ProcessTuning, SeededRandom, SequenceRandom};

/// Process with every stochastic and directional term switched off except
/// the coupling nudge, so the follower's path is deterministic.
fn quiet_tuning() -> LayerTuning {
    let process = ProcessTuning {
        shock_scale: 0.0,
        prefill_shock_scale: 0.0,
        mean_reversion: 0.0,
        trend_weight: 0.0,
        drift_target_base: 0.0,
        drift_target_spread: 0.0,
        bear_base_probability: 0.0,
        bear_trend_bonus: 0.0,
        bear_trend_slope: 0.0,
        ..ProcessTuning::default()
    };
    LayerTuning { process, ..LayerTuning::default() }
}

fn follower(initial_price: f64) -> MarketLayer<SequenceRandom> {
    let config = LayerConfig { initial_price, ..LayerConfig::default() };
    MarketLayer::with_tuning(config, quiet_tuning(), 800.0, SequenceRandom::constant(0.25))
}

fn log_gap(layer: &MarketLayer<SequenceRandom>, reference: f64) -> f64 {
    layer.price_state().price.ln() - reference.ln()
}

fn converges_toward(reference: f64) {
    let mut layer = follower(100.0);
    layer.set_follow(move || reference);
    let initial_gap = log_gap(&layer, reference);

    let mut overshoot: f64 = 0.0;
    let mut largest_nudge: f64 = 0.0;
    let mut previous = initial_gap.abs();
    for frame in 0..5000 {
        largest_nudge = largest_nudge.max(log_gap(&layer, reference).abs() * ProcessTuning::default().follow_gain);
        layer.update(16.0, 800.0, 600.0);
        let gap = log_gap(&layer, reference);
        if gap.signum() != initial_gap.signum() {
            overshoot = overshoot.max(gap.abs());
        }
        // the stored drift has settled by now; from here the pull alone moves the price
        if frame >= 400 {
            assert!(gap.abs() <= previous, "gap grew to {gap} at frame {frame}");
        }
        if frame == 1000 {
            assert!(gap.abs() < initial_gap.abs() * 0.9, "gap {gap} after 1000 frames");
        }
        previous = gap.abs();
    }

    assert!(overshoot <= largest_nudge, "overshoot {overshoot} above nudge {largest_nudge}");
    assert!(log_gap(&layer, reference).abs() < initial_gap.abs() * 0.35);
}

#[test]
fn follower_climbs_to_a_higher_leader() {
    converges_toward(120.0);
}

#[test]
fn follower_sinks_to_a_lower_leader() {
    converges_toward(80.0);
}

#[test]
fn nudge_points_toward_the_reference() {
    let mut rng = SeededRandom::new(1);
    let process = PriceProcess::new(100.0, ProcessTuning::default(), &mut rng);
    assert!(process.follow_nudge(120.0) > 0.0);
    assert!(process.follow_nudge(80.0) < 0.0);
    assert_eq!(process.follow_nudge(100.0), 0.0);
    assert_eq!(process.follow_nudge(f64::NAN), 0.0);
    assert_eq!(process.follow_nudge(-5.0), 0.0);
}

#[test]
fn feeds_publish_without_sharing_state() {
    let mut leader = MarketLayer::new(LayerConfig::default(), 800.0, SeededRandom::new(3));
    let mut follower = MarketLayer::new(LayerConfig::default(), 800.0, SeededRandom::new(4));
    let feed: RefPriceFeed = leader.ref_price_feed();
    follower.set_follow(feed.clone());

    for _ in 0..20 {
        leader.update(16.0, 800.0, 600.0);
        assert_eq!(feed.get(), leader.ref_price());
        follower.update(16.0, 800.0, 600.0);
    }
    assert!(follower.is_following());
    assert_ne!(leader.ref_price(), follower.ref_price());
}
