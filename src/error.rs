use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown bot archetype: {0}")]
    UnknownArchetype(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, Error)]
pub enum LobbyError {
    #[error("failed to build lobby http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("lobby request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("lobby at {url} answered {status}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReportRejection {
    #[error("worm {0} does not exist")]
    UnknownWorm(String),
    #[error("worm {0} is already dead")]
    DeadWorm(String),
    #[error("food {0} does not exist")]
    UnknownFood(String),
    #[error("worm {0} cannot collide with itself")]
    SelfCollision(String),
    #[error("distance {distance:.1} exceeds allowed {allowed:.1}")]
    OutOfRange { distance: f32, allowed: f32 },
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Lobby(#[from] LobbyError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server runtime failed: {0}")]
    Serve(#[source] std::io::Error),
}
