//! Market data aggregate: the synthetic price process, candle aggregation,
//! indicators and the value objects they share.

pub mod aggregator;
pub mod entities;
pub mod indicator_engine;
pub mod price_process;
pub mod random;
pub mod value_objects;

pub use aggregator::*;
pub use entities::*;
pub use indicator_engine::*;
pub use price_process::*;
pub use random::*;
pub use value_objects::*;
