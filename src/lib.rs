#![doc = "The `taskdesk` library crate."]
#![doc = ""]
#![doc = "Domain models, storage backends, session authentication, routing and error"]
#![doc = "handling for the taskdesk service. The binary (`main.rs`) wires them together."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

pub use crate::config::Config;
pub use crate::error::AppError;
pub use crate::state::AppState;
