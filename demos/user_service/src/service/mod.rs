//! User service handlers, their parameter types and the generated glue.

mod api;
mod model;

pub use api::Service;
pub use model::*;

include!(concat!(env!("OUT_DIR"), "/service_apigen.rs"));
