//! Declaration scanning and IR assembly.
//!
//! [`load`] discovers the source files of one package, [`scan`] extracts the
//! annotated methods and parameter structs from each file, and [`build`]
//! assembles them into an [`ApiPackage`] ready for the generator.
mod build;
mod load;
mod scan;
mod types;

pub use build::*;
pub use load::*;
pub use scan::{field_kind, validator_attr, API_MARKER, VALIDATOR_ATTR};
pub use types::*;
