pub mod client;

pub use client::{ensure_success, UpstreamClient};
