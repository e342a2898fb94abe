//! ID utilities.

use ulid::Ulid;

/// Generate a short room ID using ULID, truncated for readability.
pub fn new_room_id() -> String {
    let ulid = Ulid::new().to_string();
    // 26-char ULID, take first 10 for brevity. Collisions are extremely
    // unlikely at two-player-match scale.
    ulid.chars().take(10).collect()
}
