use std::collections::HashMap;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::engine::GameEngine;
use crate::scheduler::{Clock, TickScheduler};
use crate::server_protocol::{
    encode_error, encode_event, encode_init, encode_snapshot, ParsedClientMessage,
};
use crate::server_utils::sanitize_nickname;

pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;
pub const INBOX_CAPACITY: usize = 1024;

#[derive(Clone, Debug, PartialEq)]
pub enum OutboundMessage {
    Text(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueuePolicy {
    DropOnFull,
    DisconnectOnFull,
}

#[derive(Debug)]
pub enum LoopMessage {
    Connect {
        client_id: String,
        tx: mpsc::Sender<OutboundMessage>,
    },
    Command {
        client_id: String,
        message: ParsedClientMessage,
    },
    Invalid { client_id: String, reason: String },
    Disconnect { client_id: String },
}

#[derive(Clone, Debug)]
pub struct GameLoopHandle {
    tx: mpsc::Sender<LoopMessage>,
    player_count: watch::Receiver<usize>,
}

impl GameLoopHandle {
    pub async fn send(&self, message: LoopMessage) -> bool {
        self.tx.send(message).await.is_ok()
    }

    pub fn player_count(&self) -> watch::Receiver<usize> {
        self.player_count.clone()
    }
}

pub struct GameLoop<C: Clock> {
    engine: GameEngine,
    scheduler: TickScheduler<C>,
    clients: HashMap<String, mpsc::Sender<OutboundMessage>>,
    inbox: mpsc::Receiver<LoopMessage>,
    player_count: watch::Sender<usize>,
}

impl<C: Clock> GameLoop<C> {
    pub fn new(engine: GameEngine, clock: C) -> (Self, GameLoopHandle) {
        let interval = std::time::Duration::from_millis(engine.config.tick_interval_ms());
        let (tx, inbox) = mpsc::channel(INBOX_CAPACITY);
        let (count_tx, count_rx) = watch::channel(engine.player_count());
        let game_loop = Self {
            engine,
            scheduler: TickScheduler::new(interval, clock),
            clients: HashMap::new(),
            inbox,
            player_count: count_tx,
        };
        let handle = GameLoopHandle {
            tx,
            player_count: count_rx,
        };
        (game_loop, handle)
    }

    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub async fn run(mut self) {
        info!(
            tick_rate = self.engine.config.tick_rate,
            seed = self.engine.seed(),
            "game loop started"
        );
        loop {
            let deadline = tokio::time::Instant::from_std(self.scheduler.next_deadline());
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => self.tick(),
                received = self.inbox.recv() => match received {
                    Some(message) => self.handle_message(message),
                    None => break,
                },
            }
        }
        info!(tick = self.engine.tick(), "game loop stopped");
    }

    pub fn tick(&mut self) {
        let dt = self.scheduler.begin_tick();
        self.engine.step(dt);
        self.publish();
        self.publish_player_count();
    }

    pub fn handle_message(&mut self, message: LoopMessage) {
        match message {
            LoopMessage::Connect { client_id, tx } => {
                debug!(client_id = %client_id, "client connected");
                self.clients.insert(client_id, tx);
            }
            LoopMessage::Command { client_id, message } => {
                if self.clients.contains_key(&client_id) {
                    self.apply_command(&client_id, message);
                }
            }
            LoopMessage::Invalid { client_id, reason } => {
                self.send_to(&client_id, encode_error(&reason), QueuePolicy::DisconnectOnFull);
            }
            LoopMessage::Disconnect { client_id } => {
                self.drop_client(&client_id);
            }
        }
        self.publish_player_count();
    }

    fn apply_command(&mut self, client_id: &str, message: ParsedClientMessage) {
        match message {
            ParsedClientMessage::Join { nickname } => {
                let nickname = sanitize_nickname(&nickname);
                let Some(init) = self.engine.join(client_id, &nickname) else {
                    return;
                };
                match encode_init(&init) {
                    Ok(payload) => self.send_to(client_id, payload, QueuePolicy::DisconnectOnFull),
                    Err(err) => warn!(client_id, error = %err, "failed to encode init"),
                }
            }
            ParsedClientMessage::SetTargetDirection { x, y } => {
                self.engine.set_target_direction(client_id, x, y);
            }
            ParsedClientMessage::SprintStart => self.engine.set_sprinting(client_id, true),
            ParsedClientMessage::SprintStop => self.engine.set_sprinting(client_id, false),
            ParsedClientMessage::ReportFoodEaten { food_id } => {
                if let Err(rejection) = self.engine.report_food_eaten(client_id, &food_id) {
                    debug!(client_id, food_id = %food_id, %rejection, "food report rejected");
                }
            }
            ParsedClientMessage::ReportCollision { collider_worm_id } => {
                if let Err(rejection) = self.engine.report_collision(client_id, &collider_worm_id)
                {
                    debug!(
                        client_id,
                        collider_id = %collider_worm_id,
                        %rejection,
                        "collision report rejected"
                    );
                }
            }
        }
    }

    fn publish(&mut self) {
        for event in self.engine.drain_events() {
            match encode_event(&event) {
                Ok(payload) => self.broadcast(payload, QueuePolicy::DisconnectOnFull),
                Err(err) => warn!(error = %err, "failed to encode event"),
            }
        }
        match encode_snapshot(&self.engine.build_snapshot()) {
            Ok(payload) => self.broadcast(payload, QueuePolicy::DropOnFull),
            Err(err) => warn!(error = %err, "failed to encode snapshot"),
        }
    }

    fn publish_player_count(&self) {
        let count = self.engine.player_count();
        self.player_count.send_if_modified(|current| {
            if *current == count {
                return false;
            }
            *current = count;
            true
        });
    }

    fn send_to(&mut self, client_id: &str, payload: String, policy: QueuePolicy) {
        let send_failed = match self.clients.get(client_id) {
            Some(tx) => tx.try_send(OutboundMessage::Text(payload)).is_err(),
            None => false,
        };
        if send_failed {
            self.on_send_failure(client_id, policy);
        }
    }

    fn broadcast(&mut self, payload: String, policy: QueuePolicy) {
        let mut failed_clients = Vec::new();
        for (client_id, tx) in &self.clients {
            if tx.try_send(OutboundMessage::Text(payload.clone())).is_err() {
                failed_clients.push(client_id.clone());
            }
        }
        for client_id in failed_clients {
            self.on_send_failure(&client_id, policy);
        }
    }

    fn on_send_failure(&mut self, client_id: &str, policy: QueuePolicy) {
        match policy {
            QueuePolicy::DropOnFull => {
                debug!(client_id, "outbound queue full, message dropped");
            }
            QueuePolicy::DisconnectOnFull => {
                warn!(client_id, "outbound queue unavailable, disconnecting client");
                self.drop_client(client_id);
            }
        }
    }

    fn drop_client(&mut self, client_id: &str) {
        if self.clients.remove(client_id).is_some() {
            debug!(client_id, "client dropped");
        }
        self.engine.disconnect(client_id);
    }
}
