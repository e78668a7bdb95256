pub mod csv_adapter;
pub mod csv_event_adapter;
pub mod file_config_adapter;
pub mod memory_cache_adapter;
