pub mod cache_port;
pub mod config_port;
pub mod event_port;
pub mod price_port;
