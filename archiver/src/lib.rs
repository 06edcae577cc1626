pub mod api;
pub mod config;
pub mod envelope;
pub mod ingest;
mod json;
pub mod key;
pub mod notification;
pub mod prometheus;
pub mod record;
pub mod router;
pub mod server;
pub mod sinks;
