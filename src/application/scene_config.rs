use crate::domain::chart::{
    Band, BandPlanner, LayerConfig, LayerTuning, random_initial_price, random_period_ms, random_width_fraction,
};
use crate::domain::errors::{AppError, ConfigResult};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::RandomSource;
use crate::log_warn;
use serde::{Deserialize, Serialize};

/// One layer of a scene. Unset optional fields are drawn at random when the
/// scene is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerSpec {
    pub draw_candles: bool,
    pub draw_indicators: bool,
    pub depth: f64,
    pub width_fraction: Option<f64>,
    pub left_fraction: f64,
    /// Explicit band; otherwise the band planner picks one.
    pub band: Option<Band>,
    pub candle_period_ms: Option<f64>,
    pub initial_price: Option<f64>,
    /// Index of the layer whose close this one drifts toward.
    pub follows: Option<usize>,
}

impl Default for LayerSpec {
    fn default() -> Self {
        Self {
            draw_candles: false,
            draw_indicators: false,
            depth: 1.0,
            width_fraction: None,
            left_fraction: 0.0,
            band: None,
            candle_period_ms: None,
            initial_price: None,
            follows: None,
        }
    }
}

impl LayerSpec {
    pub fn candles(depth: f64) -> Self {
        Self { draw_candles: true, draw_indicators: false, depth, ..Self::default() }
    }

    pub fn line(depth: f64) -> Self {
        Self { draw_candles: false, draw_indicators: false, depth, ..Self::default() }
    }

    pub fn following(mut self, leader: usize) -> Self {
        self.follows = Some(leader);
        self
    }
}

/// Serde-loadable description of the whole animated backdrop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Fixed seed for reproducible scenes; the host draws one when absent.
    pub seed: Option<u64>,
    pub layers: Vec<LayerSpec>,
    pub max_frame_delta_ms: f64,
    pub default_frame_delta_ms: f64,
    pub tuning: LayerTuning,
}

impl Default for SceneConfig {
    /// Two candle layers, the secondary following the primary, over three
    /// faint line-only layers.
    fn default() -> Self {
        Self {
            seed: None,
            layers: vec![
                LayerSpec::candles(1.0),
                LayerSpec::candles(0.35).following(0),
                LayerSpec::line(0.2),
                LayerSpec::line(0.15),
                LayerSpec::line(0.12),
            ],
            max_frame_delta_ms: 50.0,
            default_frame_delta_ms: 16.0,
            tuning: LayerTuning::default(),
        }
    }
}

impl SceneConfig {
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let scene: SceneConfig = serde_json::from_str(json)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.max_frame_delta_ms.is_finite() && self.max_frame_delta_ms > 0.0) {
            return Err(AppError::ConfigError(format!(
                "max_frame_delta_ms must be positive, got {}",
                self.max_frame_delta_ms
            )));
        }
        if !(self.default_frame_delta_ms.is_finite() && self.default_frame_delta_ms > 0.0) {
            return Err(AppError::ConfigError(format!(
                "default_frame_delta_ms must be positive, got {}",
                self.default_frame_delta_ms
            )));
        }
        for (index, spec) in self.layers.iter().enumerate() {
            if let Some(leader) = spec.follows {
                if leader >= self.layers.len() {
                    return Err(AppError::ValidationError(format!(
                        "layer {index} follows layer {leader}, but the scene has {} layers",
                        self.layers.len()
                    )));
                }
                if leader == index {
                    return Err(AppError::ValidationError(format!("layer {index} cannot follow itself")));
                }
            }
        }
        Ok(())
    }

    /// `(follower, leader)` pairs in layer order.
    pub fn follow_links(&self) -> Vec<(usize, usize)> {
        self.layers
            .iter()
            .enumerate()
            .filter_map(|(follower, spec)| spec.follows.map(|leader| (follower, leader)))
            .collect()
    }

    /// Resolves every [`LayerSpec`] into a concrete, validated [`LayerConfig`],
    /// drawing the unset fields from `rng`.
    pub fn layer_configs<R: RandomSource + ?Sized>(&self, rng: &mut R) -> ConfigResult<Vec<LayerConfig>> {
        self.validate()?;

        let unplaced = self.layers.iter().filter(|spec| spec.band.is_none()).count();
        let plan = BandPlanner::default().plan(unplaced, &mut *rng);
        if plan.fallback_count > 0 {
            log_warn!(
                LogComponent::Application("SceneConfig"),
                "{} of {} bands fell back to stacked placement",
                plan.fallback_count,
                unplaced
            );
        }
        let mut planned = plan.bands.into_iter();

        let mut configs = Vec::with_capacity(self.layers.len());
        for spec in &self.layers {
            let band = match spec.band {
                Some(band) => band,
                None => planned.next().unwrap_or_default(),
            };
            let config = LayerConfig {
                width_fraction: spec.width_fraction.unwrap_or_else(|| random_width_fraction(&mut *rng)),
                left_fraction: spec.left_fraction,
                band,
                draw_candles: spec.draw_candles,
                draw_indicators: spec.draw_indicators,
                depth: spec.depth,
                candle_period_ms: spec.candle_period_ms.unwrap_or_else(|| random_period_ms(&mut *rng)),
                initial_price: spec.initial_price.unwrap_or_else(|| random_initial_price(&mut *rng)),
            };
            config.validate()?;
            configs.push(config.sanitized());
        }
        Ok(configs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market_data::SeededRandom;

    #[test]
    fn default_scene_is_valid() {
        let scene = SceneConfig::default();
        assert!(scene.validate().is_ok());
        assert_eq!(scene.follow_links(), vec![(1, 0)]);
    }

    #[test]
    fn resolved_layers_keep_their_ranges() {
        let mut rng = SeededRandom::new(5);
        let configs = SceneConfig::default().layer_configs(&mut rng).expect("default scene resolves");
        assert_eq!(configs.len(), 5);
        for config in &configs {
            assert!((0.6..0.8).contains(&config.width_fraction));
            assert!((900.0..1200.0).contains(&config.candle_period_ms));
            assert!((100.0..110.0).contains(&config.initial_price));
        }
        assert!(configs[0].draw_candles && configs[1].draw_candles);
        assert!(!configs[2].draw_candles);
    }

    #[test]
    fn self_follow_is_rejected() {
        let scene = SceneConfig { layers: vec![LayerSpec::line(1.0).following(0)], ..SceneConfig::default() };
        assert!(matches!(scene.validate(), Err(AppError::ValidationError(_))));
    }
}
