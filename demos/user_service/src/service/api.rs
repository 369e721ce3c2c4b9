use std::collections::BTreeMap;
use std::error::Error;

use http::{Extensions, StatusCode};
use tracing::debug;

use super::model::{
    ApiError, CreateUser, DeleteUser, Done, GetUser, NewUser, SearchUsers, UpdateUser, User,
    UserList,
};

/// In-memory user registry.
#[derive(Debug, Default)]
pub struct Service {
    users: BTreeMap<i64, User>,
    last_id: i64,
}

impl Service {
    pub fn new() -> Self {
        Self::default()
    }

    fn not_found(id: i64) -> ApiError {
        ApiError::new(StatusCode::NOT_FOUND, format!("user {id} not found"))
    }

    /// Register a user and answer its id.
    ///
    /// apigen:api {"url": "/users", "method": "POST"}
    pub fn create(&mut self, _ctx: &Extensions, params: CreateUser) -> Result<NewUser, ApiError> {
        if self.users.values().any(|u| u.name == params.name) {
            return Err(ApiError::new(
                StatusCode::CONFLICT,
                format!("user {} exists", params.name),
            ));
        }
        self.last_id += 1;
        let id = self.last_id;
        self.users.insert(
            id,
            User {
                id,
                name: params.name,
                skill: params.skill,
                latency: params.latency,
            },
        );
        debug!(id, "user created");
        Ok(NewUser { id })
    }

    /// apigen:api {"url": "/users", "method": "GET", "auth": true}
    pub fn get(&self, _ctx: &Extensions, params: &GetUser) -> Result<Box<User>, ApiError> {
        self.users
            .get(&params.id)
            .cloned()
            .map(Box::new)
            .ok_or_else(|| Self::not_found(params.id))
    }

    /// apigen:api {"url": "/users", "method": "PUT", "auth": true}
    pub fn update(&mut self, _ctx: &Extensions, params: UpdateUser) -> Result<Done, ApiError> {
        let user = self
            .users
            .get_mut(&params.id)
            .ok_or_else(|| Self::not_found(params.id))?;
        user.name = params.name;
        user.skill = params.skill;
        user.latency = params.latency;
        Ok(Done {})
    }

    /// Deleting a missing user succeeds.
    ///
    /// apigen:api {"url": "/users", "method": "DELETE", "auth": true}
    pub fn delete(&mut self, _ctx: &Extensions, params: DeleteUser) -> Result<Done, ApiError> {
        if self.users.remove(&params.id).is_some() {
            debug!(id = params.id, "user deleted");
        }
        Ok(Done {})
    }

    /// apigen:api {"url": "/users/search"}
    pub fn search(
        &self,
        _ctx: &Extensions,
        mut params: SearchUsers,
    ) -> Result<UserList, Box<dyn Error + Send + Sync>> {
        if params.query.contains('*') {
            return Err("wildcard queries are not supported".into());
        }

        let needle = params.query.to_lowercase();
        let mut users: Vec<User> = self
            .users
            .values()
            .filter(|u| u.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        if users.is_empty() {
            return Err(Box::new(ApiError::new(
                StatusCode::NOT_FOUND,
                format!("no users match {:?}", params.query),
            )));
        }

        match params.order_by.as_str() {
            "skill" => users.sort_by(|a, b| b.skill.total_cmp(&a.skill)),
            _ => users.sort_by(|a, b| a.name.cmp(&b.name)),
        }
        users.truncate(usize::try_from(params.limit).unwrap_or(usize::MAX));

        params.matched = users.iter().map(|u| u.id).collect();
        debug!(matched = ?params.matched, "search done");
        Ok(UserList { users })
    }
}
