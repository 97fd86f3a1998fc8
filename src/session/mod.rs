//! Recording sessions: configuration, the polling loop and its outputs.

pub mod config;
pub mod csv_writer;
pub mod queue;
pub mod runner;

pub use config::AppConfig;
pub use runner::{
    frames_processed, is_session_running, request_abort, start_session, SessionHandle,
    SessionOptions, VehicleInfo,
};
