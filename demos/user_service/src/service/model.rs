use std::fmt;

use apigen_macros::ApiParams;
use http::StatusCode;
use serde::Serialize;

/// Error answered to the client with its own status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub http_status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(http_status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            http_status,
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.http_status, self.message)
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Default, ApiParams)]
pub struct CreateUser {
    #[apivalidator = "required"]
    pub name: String,
    #[apivalidator = "default=0,>=0"]
    pub skill: f64,
    #[apivalidator = "default=1,>0"]
    pub latency: f64,
}

#[derive(Debug, Default, ApiParams)]
pub struct UpdateUser {
    #[apivalidator = "required,>0"]
    pub id: i64,
    #[apivalidator = "required"]
    pub name: String,
    #[apivalidator = "required,>=0"]
    pub skill: f64,
    #[apivalidator = "required,>0"]
    pub latency: f64,
}

#[derive(Debug, Default, ApiParams)]
pub struct GetUser {
    #[apivalidator = "required,>0"]
    pub id: i64,
}

#[derive(Debug, Default, ApiParams)]
pub struct DeleteUser {
    #[apivalidator = "required,>0"]
    pub id: i64,
}

/// Substring search over user names.
#[derive(Debug, Default, ApiParams)]
pub struct SearchUsers {
    #[apivalidator = "paramname=q,min=1,max=32"]
    pub query: String,
    #[apivalidator = "default=name,enum=name|skill"]
    pub order_by: String,
    #[apivalidator = "default=10,>0,<=100"]
    pub limit: i64,
    /// Filled by the handler, never bound from the request.
    #[apivalidator = "-"]
    pub matched: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub skill: f64,
    pub latency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewUser {
    pub id: i64,
}

/// Empty response object, serialized as `{}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Done {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserList {
    pub users: Vec<User>,
}
