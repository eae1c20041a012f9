use std::process::ExitCode;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use beyondworm_server::constants::{
    BOT_COUNT, FOOD_RADIUS, HEAD_SPEED, HEAD_SPRINT_SPEED, MAP_HEIGHT, MAP_WIDTH,
    MAX_COLLISION_TOLERANCE, MINIMUM_FOOD_COUNT, SEGMENT_DEFAULT_COUNT, SEGMENT_DEFAULT_RADIUS,
    SEGMENT_GROWTH_RADIUS, SEGMENT_SPACING, SPRINT_FOOD_DROP_INTERVAL_MS, TICK_RATE, TURN_RATE,
};
use beyondworm_server::engine::GameEngine;
use beyondworm_server::error::{ConfigError, ServerError};
use beyondworm_server::game_loop::{
    GameLoop, GameLoopHandle, LoopMessage, OutboundMessage, OUTBOUND_QUEUE_CAPACITY,
};
use beyondworm_server::lobby::{run_status_reporter, LobbyClient};
use beyondworm_server::scheduler::SystemClock;
use beyondworm_server::server_protocol::parse_client_message;
use beyondworm_server::server_utils::{parse_bot_archetypes, random_token};
use beyondworm_server::types::GameConfig;
use clap::Parser;
use futures_util::{Sink, SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);
const SERVER_CLOSE_CODE: u16 = 4000;

#[derive(Parser, Debug)]
#[command(author, version, about = "Authoritative worm arena server")]
struct Cli {
    #[arg(long, env = "PORT", default_value_t = 3001)]
    port: u16,
    #[arg(long, env = "BIND_HOST", default_value = "0.0.0.0")]
    host: String,
    #[arg(long, env = "LOBBY_SERVER_URL", default_value = "http://localhost:3000")]
    lobby_url: String,
    #[arg(long, env = "SERVER_ID")]
    server_id: Option<String>,
    #[arg(long, env = "PUBLIC_ADDRESS")]
    public_address: Option<String>,
    #[arg(long, env = "LOBBY_HEARTBEAT_SECS", default_value_t = 10)]
    lobby_heartbeat_secs: u64,
    #[arg(long, env = "SEED")]
    seed: Option<u32>,

    #[arg(long, env = "TICK_RATE", default_value_t = TICK_RATE)]
    tick_rate: u32,
    #[arg(long, env = "MAP_WIDTH", default_value_t = MAP_WIDTH)]
    map_width: f32,
    #[arg(long, env = "MAP_HEIGHT", default_value_t = MAP_HEIGHT)]
    map_height: f32,
    #[arg(long, env = "HEAD_SPEED", default_value_t = HEAD_SPEED)]
    head_speed: f32,
    #[arg(long, env = "HEAD_SPRINT_SPEED", default_value_t = HEAD_SPRINT_SPEED)]
    head_sprint_speed: f32,
    #[arg(long, env = "TURN_RATE", default_value_t = TURN_RATE)]
    turn_rate: f32,
    #[arg(long, env = "SEGMENT_SPACING", default_value_t = SEGMENT_SPACING)]
    segment_spacing: f32,
    #[arg(long, env = "SEGMENT_DEFAULT_COUNT", default_value_t = SEGMENT_DEFAULT_COUNT)]
    segment_default_count: usize,
    #[arg(long, env = "SEGMENT_DEFAULT_RADIUS", default_value_t = SEGMENT_DEFAULT_RADIUS)]
    segment_default_radius: f32,
    #[arg(long, env = "SEGMENT_GROWTH_RADIUS", default_value_t = SEGMENT_GROWTH_RADIUS)]
    segment_growth_radius: f32,
    #[arg(long, env = "MINIMUM_FOOD_COUNT", default_value_t = MINIMUM_FOOD_COUNT)]
    minimum_food_count: usize,
    #[arg(long, env = "FOOD_RADIUS", default_value_t = FOOD_RADIUS)]
    food_radius: f32,
    #[arg(
        long,
        env = "SPRINT_FOOD_DROP_INTERVAL_MS",
        default_value_t = SPRINT_FOOD_DROP_INTERVAL_MS
    )]
    sprint_food_drop_interval_ms: f32,
    #[arg(long, env = "COLLISION_TOLERANCE", default_value_t = MAX_COLLISION_TOLERANCE)]
    collision_tolerance: f32,
    #[arg(long, env = "BOT_COUNT", default_value_t = BOT_COUNT)]
    bot_count: usize,
    #[arg(long, env = "BOT_ARCHETYPES", default_value = "food_seeker,player_tracker")]
    bot_archetypes: String,
    #[arg(long, env = "SERVER_AUTHORITATIVE_PLAYERS")]
    server_authoritative_players: bool,
}

#[derive(Clone)]
struct AppState {
    game: GameLoopHandle,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "server stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), ServerError> {
    let config = game_config(&cli)?;
    let seed = cli.seed.unwrap_or_else(rand::random);
    let engine = GameEngine::new(config, seed);

    let server_id = cli.server_id.clone().unwrap_or_else(|| random_token(12));
    let address = cli
        .public_address
        .clone()
        .unwrap_or_else(|| format!("ws://127.0.0.1:{}/ws", cli.port));
    let lobby = LobbyClient::new(&cli.lobby_url, &server_id, &address)?;
    lobby.register().await?;

    let (game_loop, handle) = GameLoop::new(engine, SystemClock);
    tokio::spawn(game_loop.run());

    let heartbeat = Duration::from_secs(cli.lobby_heartbeat_secs.max(1));
    tokio::spawn(run_status_reporter(lobby, handle.player_count(), heartbeat));

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { game: handle });

    let bind_addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: bind_addr.clone(),
            source,
        })?;

    info!(addr = %bind_addr, seed, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)
}

fn game_config(cli: &Cli) -> Result<GameConfig, ConfigError> {
    let config = GameConfig {
        tick_rate: cli.tick_rate,
        map_width: cli.map_width,
        map_height: cli.map_height,
        head_speed: cli.head_speed,
        head_sprint_speed: cli.head_sprint_speed,
        turn_rate: cli.turn_rate,
        segment_spacing: cli.segment_spacing,
        segment_default_count: cli.segment_default_count,
        segment_default_radius: cli.segment_default_radius,
        segment_growth_radius: cli.segment_growth_radius,
        minimum_food_count: cli.minimum_food_count,
        food_radius: cli.food_radius,
        sprint_food_drop_interval_ms: cli.sprint_food_drop_interval_ms,
        collision_tolerance: cli.collision_tolerance,
        bot_count: cli.bot_count,
        bot_archetypes: parse_bot_archetypes(&cli.bot_archetypes)?,
        server_authoritative_players: cli.server_authoritative_players,
        ..GameConfig::default()
    };
    config.validate()?;
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    let players = *state.game.player_count().borrow();
    Json(json!({ "ok": true, "players": players }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: AppState, socket: WebSocket) {
    let client_id = make_id("client");
    let (tx, rx) = mpsc::channel::<OutboundMessage>(OUTBOUND_QUEUE_CAPACITY);
    let connected = state
        .game
        .send(LoopMessage::Connect {
            client_id: client_id.clone(),
            tx,
        })
        .await;
    if !connected {
        warn!(client_id = %client_id, "game loop unavailable, dropping connection");
        return;
    }

    let (ws_sender, mut ws_receiver) = socket.split();
    let mut writer = tokio::spawn(forward_outbound(rx, ws_sender));
    let mut writer_done = false;

    loop {
        let received = tokio::select! {
            received = ws_receiver.next() => received,
            _ = &mut writer => {
                debug!(client_id = %client_id, "outbound queue closed, ending connection");
                writer_done = true;
                break;
            }
        };
        let Some(Ok(message)) = received else {
            break;
        };

        let raw = match message {
            Message::Text(raw) => raw.to_string(),
            Message::Binary(raw) => match String::from_utf8(raw.to_vec()) {
                Ok(text) => text,
                Err(_) => {
                    forward_invalid(&state, &client_id, "invalid utf8 message").await;
                    continue;
                }
            },
            Message::Close(_) => break,
            _ => continue,
        };

        let delivered = match parse_client_message(&raw) {
            Some(message) => {
                state
                    .game
                    .send(LoopMessage::Command {
                        client_id: client_id.clone(),
                        message,
                    })
                    .await
            }
            None => forward_invalid(&state, &client_id, "invalid message").await,
        };
        if !delivered {
            break;
        }
    }

    state
        .game
        .send(LoopMessage::Disconnect {
            client_id: client_id.clone(),
        })
        .await;
    if !writer_done {
        let _ = writer.await;
    }
}

async fn forward_outbound<S>(mut rx: mpsc::Receiver<OutboundMessage>, mut sink: S)
where
    S: Sink<Message> + Unpin,
{
    while let Some(OutboundMessage::Text(payload)) = rx.recv().await {
        if sink.send(Message::Text(payload.into())).await.is_err() {
            return;
        }
    }
    let frame = CloseFrame {
        code: SERVER_CLOSE_CODE,
        reason: "disconnected by server".to_string().into(),
    };
    let _ = sink.send(Message::Close(Some(frame))).await;
}

async fn forward_invalid(state: &AppState, client_id: &str, reason: &str) -> bool {
    state
        .game
        .send(LoopMessage::Invalid {
            client_id: client_id.to_string(),
            reason: reason.to_string(),
        })
        .await
}

fn make_id(prefix: &str) -> String {
    let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{seq}")
}
