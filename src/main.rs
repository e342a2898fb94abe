use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{self, header},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use defusal_backend::config;
use defusal_backend::http::routes::{self, AppState};
use defusal_backend::room::manager::RoomManager;
use defusal_backend::session::content::Campaign;
use defusal_backend::telemetry;
use defusal_backend::util::token;
use defusal_backend::ws;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();
    token::init_hmac_key(config::hmac_key());

    let mut campaign = Campaign::standard();
    if let Some(secs) = config::bomb_timer_secs() {
        campaign.timer_secs = secs;
    }

    let rooms = Arc::new(RoomManager::new());
    tokio::spawn(prune_stale_rooms(rooms.clone()));

    let state = AppState {
        rooms,
        campaign: Arc::new(campaign),
        public_url: config::public_url(),
    };

    let app = Router::new()
        .route("/healthz", get(routes::health))
        .route("/api/room", post(routes::create_room))
        .route("/api/room/:room_id/join", post(routes::join_room))
        .route("/api/room/:room_id/ws", get(ws::connection::ws_handler))
        .layer(
            CorsLayer::new()
                .allow_methods([http::Method::GET, http::Method::POST])
                .allow_headers([header::CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config::server_addr();
    info!("listening on http://{}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Rooms have no other teardown path; sweep abandoned ones periodically.
async fn prune_stale_rooms(rooms: Arc<RoomManager>) {
    const SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);
    const MAX_ROOM_AGE: Duration = Duration::from_secs(4 * 60 * 60);
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    interval.tick().await;
    loop {
        interval.tick().await;
        rooms.prune_old(MAX_ROOM_AGE);
    }
}
