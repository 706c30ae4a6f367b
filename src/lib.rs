pub mod config;
pub mod error;
pub mod qna;
pub mod telemetry;
