//! # Generator Module
//!
//! Renders an assembled [`ApiPackage`] as one Rust source unit meant to be
//! `include!`d into the module that declares the services.
//!
//! ## Generated Structure
//!
//! ```text
//! // header
//! const APIGEN_AUTH_HEADER / APIGEN_AUTH_TOKEN
//! fn write_api_error, apigen_is_json, apigen_form_value
//!
//! impl <Service> {          // per receiver, sorted
//!     pub fn serve_http     // path -> verb dispatch
//!     fn wrapper_<method>   // bind, validate, call, respond (sorted by name)
//! }
//!
//! impl <Params> {           // per parameter struct, sorted
//!     pub fn get_from_request
//!     pub fn validate
//! }
//! ```
//!
//! The unit only uses absolute paths (`::http`, `::serde`, `::serde_json`,
//! `::url`, `::tracing`) and never declares `use` items. It expects the host
//! module to define `ApiError` with public `http_status: http::StatusCode`
//! and `message: String` fields.
//!
//! Output depends only on the package contents, never on scan order, so
//! regenerating an unchanged package is byte-identical.

mod dispatch;
mod output;
mod params;
mod printer;

#[cfg(test)]
mod tests;

use std::fmt::Write;

use tracing::info;

use crate::error::GenerationError;
use crate::spec::{ApiPackage, ServiceMethod};

pub use output::{check_output, write_output, CheckOutcome};
pub use printer::Printer;

/// Header name carrying the auth token.
pub const AUTH_HEADER: &str = "x-auth";

/// Token accepted on auth-protected routes.
pub const AUTH_TOKEN: &str = "100500";

/// Render `pkg` into a string.
///
/// # Errors
///
/// Returns [`GenerationError::Unsupported`] for a rule the field kind has no
/// semantics for. This cannot happen for a package built by
/// [`crate::spec::parse_files`].
pub fn gen_code(pkg: &ApiPackage) -> Result<String, GenerationError> {
    let mut p = Printer::new(String::new());
    write_code(&mut p, pkg)?;
    Ok(p.finish()?)
}

/// Render `pkg` into an existing printer.
pub fn write_code<W: Write>(p: &mut Printer<W>, pkg: &ApiPackage) -> Result<(), GenerationError> {
    dispatch::gen_preamble(p);

    let services: Vec<&str> = pkg.services.iter().map(|(name, _)| name).collect();
    info!(package = %pkg.package_name, services = %services.join(", "), "generate methods for services");

    for (recv, methods) in pkg.services.iter() {
        let mut methods: Vec<&ServiceMethod> = methods.iter().collect();
        methods.sort_by(|a, b| a.name.cmp(&b.name));
        dispatch::gen_service(p, recv, &methods)?;
    }

    let structs: Vec<&str> = pkg.params.resolved().map(|(name, _)| name).collect();
    info!(package = %pkg.package_name, structs = %structs.join(", "), "generate methods for param structs");

    for (name, fields) in pkg.params.resolved() {
        params::gen_params(p, name, fields)?;
    }

    Ok(p.status()?)
}
