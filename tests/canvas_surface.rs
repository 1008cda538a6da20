#![cfg(target_arch = "wasm32")]
use market_fx_wasm::domain::chart::{Color, LayerConfig, MarketLayer, Rect, Surface};
use market_fx_wasm::domain::market_data::SeededRandom;
use market_fx_wasm::infrastructure::rendering::CanvasSurface;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::HtmlCanvasElement;
wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

fn canvas(id: &str) -> HtmlCanvasElement {
    let document = web_sys::window().and_then(|window| window.document()).expect("document");
    let canvas = document
        .create_element("canvas")
        .expect("create canvas")
        .dyn_into::<HtmlCanvasElement>()
        .expect("canvas element");
    canvas.set_id(id);
    document.body().expect("body").append_child(&canvas).expect("attach canvas");
    canvas
}

#[wasm_bindgen_test]
fn resize_scales_the_backing_store() {
    let surface = CanvasSurface::from_canvas(canvas("fx-resize")).expect("2d context");
    surface.resize(300.0, 150.0, 2.0).expect("resize");
    assert_eq!(surface.canvas().width(), 600);
    assert_eq!(surface.canvas().height(), 300);
    assert_eq!(surface.canvas().style().get_property_value("width").expect("style"), "300px");
}

#[wasm_bindgen_test]
fn paints_a_layer_without_errors() {
    canvas("fx-layer");
    let mut surface = CanvasSurface::from_element_id("fx-layer").expect("canvas by id");
    surface.resize(640.0, 400.0, 1.0).expect("resize");
    surface.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::BULL);

    let config = LayerConfig { draw_candles: true, ..LayerConfig::default() };
    let mut layer = MarketLayer::new(config, 640.0, SeededRandom::new(1));
    layer.update(16.0, 640.0, 400.0);
    layer.draw(&mut surface, 640.0, 400.0);
}

#[wasm_bindgen_test]
fn missing_elements_are_rendering_errors() {
    assert!(CanvasSurface::from_element_id("fx-missing").is_err());
}
