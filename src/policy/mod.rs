// Policy module - execution guardrails loaded from YAML
#![allow(unused_imports)]

pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use config::{Overrides, PolicyConfig};
pub use error::{PolicyError, Result};
pub use store::PolicyStore;
pub use types::{GlobalPolicy, LimitTable, Policy, ToolPolicy};
