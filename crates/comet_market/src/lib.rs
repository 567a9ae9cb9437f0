pub mod generator;
pub mod hub;

pub use generator::TickGenerator;
pub use hub::MarketHub;
