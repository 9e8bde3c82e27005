pub mod clock;
pub mod config;
pub mod device;
pub mod logger;
pub mod store;
