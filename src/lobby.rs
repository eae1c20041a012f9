use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::LobbyError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct LobbyClient {
    http: reqwest::Client,
    base_url: String,
    server_id: String,
    address: String,
}

impl LobbyClient {
    pub fn new(base_url: &str, server_id: &str, address: &str) -> Result<Self, LobbyError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(LobbyError::Client)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            server_id: server_id.to_string(),
            address: address.to_string(),
        })
    }

    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    pub async fn register(&self) -> Result<(), LobbyError> {
        self.post(
            "/server/register",
            json!({
                "serverId": self.server_id,
                "address": self.address,
            }),
        )
        .await?;
        info!(server_id = %self.server_id, address = %self.address, "registered with lobby");
        Ok(())
    }

    pub async fn report_status(&self, player_count: usize) -> Result<(), LobbyError> {
        self.post(
            "/server/update",
            json!({
                "serverId": self.server_id,
                "playerCount": player_count,
            }),
        )
        .await?;
        debug!(server_id = %self.server_id, player_count, "lobby status updated");
        Ok(())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: Value) -> Result<(), LobbyError> {
        let url = self.endpoint(path);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|source| LobbyError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LobbyError::Status { url, status, body });
        }
        Ok(())
    }
}

pub async fn run_status_reporter(
    client: LobbyClient,
    mut player_count: watch::Receiver<usize>,
    heartbeat: Duration,
) {
    let mut interval = tokio::time::interval(heartbeat);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            changed = player_count.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = interval.tick() => {}
        }
        let count = *player_count.borrow_and_update();
        if let Err(err) = client.report_status(count).await {
            warn!(error = %err, player_count = count, "lobby status update failed");
        }
    }
    debug!(server_id = %client.server_id, "lobby reporter stopped");
}
