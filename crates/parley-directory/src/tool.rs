//! `search_users` tool backed by a `UserDirectory`.

use std::sync::Arc;

use async_trait::async_trait;
use parley_ai::{ParamType, ParameterSpec, Tool, ToolError, ToolSpec};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{DirectoryError, User, UserDirectory, UserQuery, DEFAULT_LIMIT, MAX_LIMIT};

pub const SEARCH_USERS_TOOL: &str = "search_users";

/// What the model sees after a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchUsersOutput {
    pub summary: String,
    pub total: usize,
    pub returned: usize,
    pub users: Vec<User>,
}

pub struct SearchUsersTool {
    directory: Arc<dyn UserDirectory>,
}

impl SearchUsersTool {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl Tool for SearchUsersTool {
    type Input = UserQuery;
    type Output = SearchUsersOutput;

    fn spec(&self) -> ToolSpec {
        ToolSpec::new(SEARCH_USERS_TOOL, "Search for users by name, email, or role.")
            .with_parameter(ParameterSpec::new(
                "query",
                ParamType::String,
                "Free text search across name and email",
            ))
            .with_parameter(ParameterSpec::new(
                "role",
                ParamType::String,
                "Filter by role (e.g., admin, developer, PM)",
            ))
            .with_parameter(
                ParameterSpec::new(
                    "limit",
                    ParamType::Integer,
                    format!("Max results (<={MAX_LIMIT})"),
                )
                .with_default(DEFAULT_LIMIT),
            )
            .with_parameter(
                ParameterSpec::new("offset", ParamType::Integer, "Pagination offset")
                    .with_default(0),
            )
    }

    async fn run(&self, input: UserQuery) -> Result<SearchUsersOutput, ToolError> {
        let page = self.directory.search(&input).await.map_err(|e| match e {
            DirectoryError::InvalidQuery(msg) => ToolError::InvalidArguments(msg),
            other => ToolError::Execution(other.to_string()),
        })?;

        info!(total = page.total, returned = page.items.len(), "search_users");
        Ok(SearchUsersOutput {
            summary: format!("Found {} users", page.total),
            total: page.total,
            returned: page.items.len(),
            users: page.items,
        })
    }
}
