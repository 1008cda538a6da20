use super::scene_config::SceneConfig;
use crate::domain::chart::{MarketLayer, Surface};
use crate::domain::errors::{AppError, ConfigResult};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{RandomSource, SeededRandom};
use crate::log_info;

/// Owns the layers of a scene and drives them back to front.
pub struct EngineCompositor<R: RandomSource = SeededRandom> {
    /// Ascending depth. Equal depths keep insertion order.
    layers: Vec<MarketLayer<R>>,
}

impl<R: RandomSource> Default for EngineCompositor<R> {
    fn default() -> Self {
        Self { layers: Vec::new() }
    }
}

impl EngineCompositor<SeededRandom> {
    /// Builds every layer of `scene` with its own stream derived from `seed`
    /// and wires the follow links.
    pub fn from_scene(scene: &SceneConfig, seed: u64, surface_width: f64) -> ConfigResult<Self> {
        let mut placement = SeededRandom::derived(seed, 0);
        let configs = scene.layer_configs(&mut placement)?;
        let layers = configs
            .into_iter()
            .enumerate()
            .map(|(index, config)| {
                MarketLayer::with_tuning(config, scene.tuning, surface_width, SeededRandom::derived(seed, index as u64 + 1))
            })
            .collect();
        let compositor = Self::from_layers(layers, &scene.follow_links())?;

        log_info!(
            LogComponent::Application("EngineCompositor"),
            "scene built: {} layers, seed {}, bands {:?}",
            compositor.len(),
            seed,
            compositor.layers.iter().map(|layer| layer.config().band).collect::<Vec<_>>()
        );
        Ok(compositor)
    }
}

impl<R: RandomSource> EngineCompositor<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs each `(follower, leader)` link, indices referring to the
    /// order of `layers`, then depth-sorts.
    pub fn from_layers(mut layers: Vec<MarketLayer<R>>, links: &[(usize, usize)]) -> ConfigResult<Self> {
        for &(follower, leader) in links {
            if follower == leader || follower >= layers.len() || leader >= layers.len() {
                return Err(AppError::ValidationError(format!(
                    "invalid follow link {follower} -> {leader} for {} layers",
                    layers.len()
                )));
            }
            let feed = layers[leader].ref_price_feed();
            layers[follower].set_follow(feed);
        }

        let mut compositor = Self::new();
        for layer in layers {
            compositor.add_layer(layer);
        }
        Ok(compositor)
    }

    /// Inserts `layer` after every layer of lower or equal depth.
    pub fn add_layer(&mut self, layer: MarketLayer<R>) {
        let position = self.layers.partition_point(|existing| existing.depth() <= layer.depth());
        self.layers.insert(position, layer);
    }

    /// Updates then draws each layer in turn, farthest first.
    pub fn frame<S: Surface + ?Sized>(&mut self, dt_ms: f64, width: f64, height: f64, surface: &mut S) {
        for layer in &mut self.layers {
            layer.update(dt_ms, width, height);
            layer.draw(surface, width, height);
        }
    }

    pub fn layers(&self) -> &[MarketLayer<R>] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [MarketLayer<R>] {
        &mut self.layers
    }

    pub fn depths(&self) -> Vec<f64> {
        self.layers.iter().map(|layer| layer.depth()).collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
