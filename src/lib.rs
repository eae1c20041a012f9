pub mod constants;
pub mod engine;
pub mod error;
pub mod game_loop;
pub mod geometry;
pub mod lobby;
pub mod rng;
pub mod scheduler;
pub mod server_protocol;
pub mod server_utils;
pub mod strategy;
pub mod types;
