pub mod config;
pub mod http;
pub mod protocol;
pub mod room;
pub mod session;
pub mod telemetry;
pub mod util;
pub mod ws;
