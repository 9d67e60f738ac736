pub mod config;
pub mod domain;
pub mod error;
pub mod handler;
pub mod logging;
pub mod store;

pub use handler::EventHandler;
