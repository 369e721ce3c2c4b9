//! Example user service.
//!
//! Handlers live in [`service::Service`]; request dispatch, parameter
//! binding and validation are generated from their annotations by the
//! build script.
//!
//! ```
//! use user_service::Service;
//!
//! let mut service = Service::new();
//! let req = http::Request::builder()
//!     .method("POST")
//!     .uri("/users?name=vasya&skill=10")
//!     .body(Vec::new())
//!     .unwrap();
//! let resp = service.serve_http(&req);
//! assert_eq!(resp.status(), http::StatusCode::OK);
//! ```

pub mod service;

pub use service::{ApiError, Service};
