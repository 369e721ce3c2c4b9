//! # apigen
//!
//! **apigen** generates the boilerplate of HTTP-style RPC endpoints from
//! annotated Rust declarations: request dispatch, parameter binding and
//! parameter validation.
//!
//! ## Overview
//!
//! A service is an ordinary type whose inherent methods carry an
//! `apigen:api` doc marker. Each method takes a request context and a
//! parameter struct, and returns `Result<T, E>`. Parameter struct fields
//! carry their validation rules in `#[apivalidator = "..."]` attributes:
//!
//! ```rust,ignore
//! //! apigen:package service
//!
//! #[derive(Default, ApiParams)]
//! pub struct CreateUser {
//!     #[apivalidator = "required"]
//!     pub name: String,
//!     #[apivalidator = "required,>=0"]
//!     pub skill: f64,
//! }
//!
//! impl Service {
//!     /// apigen:api {"url": "/users", "method": "POST", "auth": true}
//!     pub fn create(&mut self, ctx: &http::Extensions, params: CreateUser) -> Result<NewUser, ApiError> {
//!         // ...
//!     }
//! }
//!
//! include!(concat!(env!("OUT_DIR"), "/service_apigen.rs"));
//! ```
//!
//! The generated unit gives every service a `serve_http` entry point taking
//! an `http::Request<Vec<u8>>` and answering an `http::Response<Vec<u8>>`.
//!
//! ## Architecture
//!
//! ```text
//! spec::load → spec::scan → spec::build → generator → Printer → output
//! ```
//!
//! - **[`validator`]** - Parser of the compact rule grammar
//! - **[`spec`]** - Source loading, annotation scanning and IR assembly
//! - **[`generator`]** - Deterministic code emission
//! - **[`config`]** - Logging settings and output targets
//! - **[`logging`]** - Tracing subscriber setup
//! - **[`cli`]** - The `apigen` binary
//!
//! ## Build Script Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let files = apigen::spec::load_dir(Path::new("src/service"))?;
//!     let package = apigen::spec::parse_files(&files)?;
//!     let code = apigen::generator::gen_code(&package)?;
//!     let out = Path::new(&std::env::var("OUT_DIR")?).join("service_apigen.rs");
//!     std::fs::write(out, code)?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod spec;
pub mod validator;

pub use error::{GenerationError, ParseError};
pub use generator::gen_code;
pub use spec::{load_dir, parse_files, ApiPackage};
