mod server;

pub use server::{Axum, RunningServer};
