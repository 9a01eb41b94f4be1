mod message;
mod request;
mod response;
mod sse;
mod tool;

pub use message::*;
pub use request::*;
pub use response::*;
pub use sse::*;
pub use tool::*;
