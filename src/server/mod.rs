mod builder;
mod handler;

pub use builder::{GatewayState, build_router};
