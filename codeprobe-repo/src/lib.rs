//! codeprobe repo - remote repository access
//!
//! GitHub contents-API client, file tree discovery and key file selection

pub mod api;
pub mod memory;
pub mod priority;
pub mod tree;

pub use api::{ApiClientConfig, GitHubApiClient};
pub use memory::InMemorySource;
pub use priority::*;
pub use tree::*;
