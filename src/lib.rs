pub mod config;
pub mod error;
pub mod http_client;
pub mod mapping;
pub mod model_resolver;
pub mod protocol;
pub mod provider;
pub mod request;
pub mod server;
pub mod telemetry;
pub mod token_counter;

pub use config::Config;
pub use server::build_router;
