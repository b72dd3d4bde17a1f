//! In-memory directory over a fixed user list.

use async_trait::async_trait;
use tracing::debug;

use crate::{DirectoryError, User, UserDirectory, UserPage, UserQuery};

const DEMO_USERS: &str = include_str!("../data/users.json");

pub struct InMemoryDirectory {
    users: Vec<User>,
}

impl InMemoryDirectory {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }

    /// Directory seeded with the bundled 100-user demo dataset.
    pub fn demo() -> Result<Self, DirectoryError> {
        let users: Vec<User> = serde_json::from_str(DEMO_USERS)
            .map_err(|e| DirectoryError::Parse(format!("demo dataset: {e}")))?;
        Ok(Self::new(users))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn matches(user: &User, needle: Option<&str>, role: Option<&str>) -> bool {
        let text_ok = needle.map_or(true, |n| {
            user.name.to_lowercase().contains(n) || user.email.to_lowercase().contains(n)
        });
        let role_ok = role.map_or(true, |r| user.role.eq_ignore_ascii_case(r));
        text_ok && role_ok
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn search(&self, query: &UserQuery) -> Result<UserPage, DirectoryError> {
        query.validate()?;
        let needle = query.query_filter().map(str::to_lowercase);
        let role = query.role_filter();

        let matched: Vec<&User> = self
            .users
            .iter()
            .filter(|u| Self::matches(u, needle.as_deref(), role))
            .collect();
        let total = matched.len();
        let items: Vec<User> = matched
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect();

        debug!(total, returned = items.len(), "In-memory user search");
        Ok(UserPage { total, items })
    }
}
