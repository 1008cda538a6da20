use crate::application::{EngineCompositor, FxScene, SceneConfig, visibility_for_scroll};
use crate::domain::errors::{AppError, RenderingResult};
use crate::domain::logging::LogComponent;
use crate::infrastructure::rendering::CanvasSurface;
use crate::{log_error, log_info, log_warn};
use gloo::events::EventListener;
use gloo::render::{AnimationFrame, request_animation_frame};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use web_sys::Window;

const MAX_DEVICE_RATIO: f64 = 2.0;
const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

fn to_js(err: AppError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn browser_window() -> RenderingResult<Window> {
    web_sys::window().ok_or_else(|| AppError::RenderingError("window is not available".to_string()))
}

/// CSS viewport size of the page.
fn viewport(window: &Window) -> (f64, f64) {
    let read = |value: Result<JsValue, JsValue>| value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    (read(window.inner_width()), read(window.inner_height()))
}

fn device_ratio(window: &Window) -> f64 {
    window.device_pixel_ratio().clamp(1.0, MAX_DEVICE_RATIO)
}

fn prefers_reduced_motion(window: &Window) -> bool {
    matches!(window.match_media(REDUCED_MOTION_QUERY), Ok(Some(query)) if query.matches())
}

struct Host {
    surface: CanvasSurface,
    scene: FxScene,
    width: f64,
    height: f64,
    frame: Option<AnimationFrame>,
    listeners: Vec<EventListener>,
}

impl Host {
    fn tick(&mut self, timestamp_ms: f64) {
        self.scene.render_frame(timestamp_ms, self.width, self.height, &mut self.surface);
    }

    fn fit_to(&mut self, window: &Window) -> RenderingResult<()> {
        let (width, height) = viewport(window);
        self.width = width;
        self.height = height;
        self.surface.resize(width, height, device_ratio(window))
    }

    fn refresh_visibility(&mut self, window: &Window) {
        let scroll_y = window.scroll_y().unwrap_or(0.0);
        let visibility = visibility_for_scroll(scroll_y, self.height);
        self.scene.set_visibility(visibility);
        if let Err(err) = self.surface.canvas().style().set_property("opacity", &visibility.to_string()) {
            log_warn!(LogComponent::Presentation("MarketFxCanvas"), "opacity not applied: {:?}", err);
        }
    }

    fn is_running(&self) -> bool {
        self.frame.is_some()
    }
}

fn schedule(host: &Rc<RefCell<Host>>) {
    let weak = Rc::downgrade(host);
    let frame = request_animation_frame(move |timestamp_ms| on_frame(&weak, timestamp_ms));
    host.borrow_mut().frame = Some(frame);
}

fn on_frame(weak: &Weak<RefCell<Host>>, timestamp_ms: f64) {
    let Some(host) = weak.upgrade() else {
        return;
    };
    host.borrow_mut().tick(timestamp_ms);
    if host.borrow().is_running() {
        schedule(&host);
    }
}

/// Animated market backdrop bound to a `<canvas>` element.
#[wasm_bindgen]
pub struct MarketFxCanvas {
    host: Rc<RefCell<Host>>,
}

#[wasm_bindgen]
impl MarketFxCanvas {
    /// Binds to the canvas with id `canvas_id`. `config_json` is an optional
    /// serialized scene; the built-in five-layer scene is used otherwise.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str, config_json: Option<String>) -> Result<MarketFxCanvas, JsValue> {
        let scene_config = match config_json.as_deref() {
            Some(json) => SceneConfig::from_json(json).map_err(|err| {
                log_error!(LogComponent::Presentation("MarketFxCanvas"), "rejected scene config: {}", err);
                to_js(err)
            })?,
            None => SceneConfig::default(),
        };
        let seed = scene_config.seed.unwrap_or_else(|| (js_sys::Math::random() * (1u64 << 53) as f64) as u64);

        let window = browser_window().map_err(to_js)?;
        let (width, height) = viewport(&window);
        let surface = CanvasSurface::from_element_id(canvas_id).map_err(to_js)?;
        surface.resize(width, height, device_ratio(&window)).map_err(to_js)?;

        let compositor = EngineCompositor::from_scene(&scene_config, seed, width).map_err(to_js)?;
        let host = Host {
            surface,
            scene: FxScene::new(compositor, &scene_config),
            width,
            height,
            frame: None,
            listeners: Vec::new(),
        };
        Ok(Self { host: Rc::new(RefCell::new(host)) })
    }

    /// Starts the animation loop, or paints a single still frame when the
    /// user prefers reduced motion.
    pub fn start(&self) -> Result<(), JsValue> {
        if self.host.borrow().is_running() {
            return Ok(());
        }
        let window = browser_window().map_err(to_js)?;

        if prefers_reduced_motion(&window) {
            let mut host = self.host.borrow_mut();
            let Host { surface, scene, width, height, .. } = &mut *host;
            scene.render_static(*width, *height, surface);
            log_info!(LogComponent::Presentation("MarketFxCanvas"), "reduced motion: static backdrop");
            return Ok(());
        }

        self.host.borrow_mut().refresh_visibility(&window);
        let listeners = vec![self.resize_listener(&window), self.scroll_listener(&window)];
        self.host.borrow_mut().listeners = listeners;
        schedule(&self.host);
        log_info!(LogComponent::Presentation("MarketFxCanvas"), "animation started");
        Ok(())
    }

    /// Cancels the pending frame and detaches the listeners.
    pub fn stop(&self) {
        let mut host = self.host.borrow_mut();
        if host.frame.take().is_some() {
            host.listeners.clear();
            log_info!(LogComponent::Presentation("MarketFxCanvas"), "animation stopped");
        }
    }

    /// Re-fits the canvas to the current viewport.
    pub fn resize(&self) -> Result<(), JsValue> {
        let window = browser_window().map_err(to_js)?;
        self.host.borrow_mut().fit_to(&window).map_err(to_js)
    }

    /// Overrides the scroll-derived visibility; `0` pauses drawing.
    #[wasm_bindgen(js_name = setVisibility)]
    pub fn set_visibility(&self, visibility: f64) {
        self.host.borrow_mut().scene.set_visibility(visibility);
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.host.borrow().is_running()
    }

    #[wasm_bindgen(js_name = framesDrawn)]
    pub fn frames_drawn(&self) -> f64 {
        self.host.borrow().scene.frames_drawn() as f64
    }
}

impl MarketFxCanvas {
    fn resize_listener(&self, window: &Window) -> EventListener {
        let weak = Rc::downgrade(&self.host);
        EventListener::new(window, "resize", move |_| {
            let (Some(host), Some(window)) = (weak.upgrade(), web_sys::window()) else {
                return;
            };
            let mut host = host.borrow_mut();
            if let Err(err) = host.fit_to(&window) {
                log_error!(LogComponent::Presentation("MarketFxCanvas"), "resize failed: {}", err);
            }
            host.refresh_visibility(&window);
        })
    }

    fn scroll_listener(&self, window: &Window) -> EventListener {
        let weak = Rc::downgrade(&self.host);
        EventListener::new(window, "scroll", move |_| {
            if let (Some(host), Some(window)) = (weak.upgrade(), web_sys::window()) {
                host.borrow_mut().refresh_visibility(&window);
            }
        })
    }
}
