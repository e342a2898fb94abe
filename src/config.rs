//! Configuration (ports, public URL, signing key, timer override)

use std::env;
use std::net::{Ipv4Addr, SocketAddr};

use rand::RngCore;

/// Socket address to bind the server to.
///
/// Reads the `PORT` env var (Fly.io) or defaults to 8080, binds to 0.0.0.0.
pub fn server_addr() -> SocketAddr {
    let port = env::var("PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(8080);
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
}

/// Base URL used when composing share links for created rooms.
pub fn public_url() -> String {
    env::var("HOST_PUBLIC_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

/// HMAC key for join tokens: `DEFUSAL_HMAC_KEY` as 64 hex chars, otherwise a
/// fresh random key (tokens then die with the process, which is fine for an
/// ephemeral match server).
pub fn hmac_key() -> [u8; 32] {
    env::var("DEFUSAL_HMAC_KEY")
        .ok()
        .and_then(|hex| hex::decode(hex).ok())
        .and_then(|v| v.try_into().ok())
        .unwrap_or_else(|| {
            let mut kb = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut kb);
            kb
        })
}

/// Optional override of the campaign's starting bomb timer, in seconds.
pub fn bomb_timer_secs() -> Option<f64> {
    env::var("BOMB_TIMER_SECS").ok().and_then(|v| v.parse::<f64>().ok())
}
