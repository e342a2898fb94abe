//! Lightweight signed join tokens.
//!
//! Token format: base64url(json).base64url(hmac_sha256(json)). The claims
//! carry the room id and player id, so reconnecting with the same token
//! rebinds the same participant.

use anyhow::Context;
use base64::Engine;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

static HMAC_KEY: OnceCell<[u8; 32]> = OnceCell::new();

/// Install the process-wide signing key. Later calls are ignored.
pub fn init_hmac_key(key: [u8; 32]) {
    HMAC_KEY.set(key).ok();
}

#[derive(Serialize, Deserialize)]
struct Claims {
    room: String,
    player: Uuid,
    iat: i64,
}

pub fn issue_token(room_id: &str, player_id: Uuid) -> anyhow::Result<String> {
    let claims = Claims {
        room: room_id.to_string(),
        player: player_id,
        iat: OffsetDateTime::now_utc().unix_timestamp(),
    };
    let payload = serde_json::to_vec(&claims)?;
    let part1 = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&payload);
    let sig = hmac_sha256(&payload)?;
    let part2 = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(sig);
    Ok(format!("{}.{}", part1, part2))
}

pub fn verify_token(token: &str) -> anyhow::Result<(String, Uuid)> {
    let mut parts = token.split('.');
    let p1 = parts.next().context("missing payload")?;
    let p2 = parts.next().context("missing sig")?;
    if parts.next().is_some() {
        anyhow::bail!("too many parts")
    }
    let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(p1)?;
    let sig = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(p2)?;
    let expected = hmac_sha256(&payload)?;
    if sig != expected {
        anyhow::bail!("bad signature")
    }
    let c: Claims = serde_json::from_slice(&payload)?;
    Ok((c.room, c.player))
}

fn hmac_sha256(data: &[u8]) -> anyhow::Result<[u8; 32]> {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;
    type HmacSha256 = Hmac<Sha256>;
    let key = HMAC_KEY.get().context("hmac key missing")?;
    let mut mac = HmacSha256::new_from_slice(key).context("bad key length")?;
    mac.update(data);
    let out = mac.finalize().into_bytes();
    Ok(out.into())
}
