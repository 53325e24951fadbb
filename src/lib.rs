pub mod auth;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod filter;
pub mod lifecycle;
pub mod models;
pub mod notify;
pub mod roles;
pub mod routes;
pub mod s3;
pub mod schedule;
pub mod schema;
pub mod state;
pub mod storage;
pub mod store;
pub mod workflow;

pub use engine::{EngineError, JobEngine};
pub use state::AppState;
