use market_fx_wasm::application::SceneConfig;
use market_fx_wasm::domain::logging::{LogComponent, LogLevel, get_logger, init_logger};
use market_fx_wasm::domain::market_data::SeededRandom;
use market_fx_wasm::infrastructure::services::MemoryLogger;

#[test]
fn engine_reports_through_the_installed_logger() {
    let logger = MemoryLogger::new();
    assert!(init_logger(Box::new(logger.clone())));
    assert!(!init_logger(Box::new(MemoryLogger::new())));

    get_logger().error(LogComponent::Presentation("Test"), "boom");
    // five bands of at least 0.22 never all keep their gaps
    SceneConfig::default().layer_configs(&mut SeededRandom::new(1)).expect("default scene resolves");

    let entries = logger.entries();
    assert_eq!(entries[0].level, LogLevel::Error);
    assert_eq!(entries[0].message, "boom");
    assert!(entries.iter().any(|entry| entry.level == LogLevel::Warn && entry.message.contains("stacked placement")));
    assert!(logger.lines().iter().all(|line| line.contains(" | ")));
}
