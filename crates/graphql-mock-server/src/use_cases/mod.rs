mod mock_server;
pub mod ports;
mod register_mock;
mod resolve_request;

pub use mock_server::{MockServer, VerifyOptions};
pub use register_mock::register_mock;
pub use resolve_request::{resolve_body, resolve_request};
