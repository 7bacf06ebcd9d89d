pub mod config;
pub mod dedup;
pub mod errors;
pub mod format;
pub mod generate;
pub mod models;
pub mod prompts;
pub mod provider;
pub mod stats;

pub use config::*;
pub use dedup::*;
pub use errors::*;
pub use format::*;
pub use generate::*;
pub use models::*;
pub use prompts::*;
pub use provider::*;
pub use stats::*;
