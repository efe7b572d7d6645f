// Server module - JSON-lines request/response interface over stdio
#![allow(unused_imports)]

pub mod config;
pub mod error;
pub mod handler;
pub mod lines;
pub mod protocol;
pub mod server;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use handler::{Handler, Reply};
pub use protocol::{Operation, Response, ResponseKind};
pub use server::Server;
