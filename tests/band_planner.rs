use market_fx_wasm::domain::chart::{Band, BandPlanner};
use market_fx_wasm::domain::market_data::SeededRandom;
use quickcheck_macros::quickcheck;

#[quickcheck]
fn placed_bands_keep_their_distance(seed: u64, count: u8) -> bool {
    let planner = BandPlanner::default();
    let count = usize::from(count % 8);
    let plan = planner.plan(count, &mut SeededRandom::new(seed));
    let placed = &plan.bands[..count - plan.fallback_count];

    plan.bands.len() == count
        && placed.iter().all(|band| band.top >= 0.0 && band.bottom() <= planner.max_bottom + 1e-12)
        && placed.iter().all(|band| (0.22..=0.40).contains(&band.height))
        && placed.iter().enumerate().all(|(i, a)| {
            placed[i + 1..].iter().all(|b| !a.conflicts_with(b, planner.min_gap))
        })
}

#[test]
fn five_layers_cannot_all_fit() {
    // four bands of at least 0.22 plus three gaps already exceed 0.92
    let plan = BandPlanner::default().plan(5, &mut SeededRandom::new(77));
    assert!(plan.fallback_count >= 2);
    let fallback = &plan.bands[5 - plan.fallback_count..];
    for (offset, band) in fallback.iter().enumerate() {
        let index = 5 - plan.fallback_count + offset;
        assert!((band.top - 0.02 * index as f64).abs() < 1e-12);
        assert_eq!(band.height, 0.28);
    }
}

#[test]
fn bands_conflict_within_the_gap() {
    let upper = Band::new(0.1, 0.2);
    assert!(upper.conflicts_with(&Band::new(0.33, 0.2), 0.06));
    assert!(!upper.conflicts_with(&Band::new(0.37, 0.2), 0.06));
    assert!(Band::new(0.37, 0.2).conflicts_with(&Band::new(0.3, 0.05), 0.06));
}
