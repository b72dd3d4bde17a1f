//! User directory lookups for Parley.
//!
//! A `UserDirectory` answers paginated user searches. Two backends ship:
//! `InMemoryDirectory` over a fixed dataset and `HttpDirectory` for a
//! remote `/users/search` endpoint. `SearchUsersTool` exposes either one
//! to the model as the `search_users` tool.

mod error;
mod http;
mod memory;
mod tool;
mod types;

use async_trait::async_trait;

pub use error::DirectoryError;
pub use http::HttpDirectory;
pub use memory::InMemoryDirectory;
pub use tool::{SearchUsersOutput, SearchUsersTool, SEARCH_USERS_TOOL};
pub use types::{User, UserPage, UserQuery, DEFAULT_LIMIT, MAX_LIMIT};

/// Source of user records.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn search(&self, query: &UserQuery) -> Result<UserPage, DirectoryError>;
}
