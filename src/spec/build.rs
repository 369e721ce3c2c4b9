use tracing::{debug, info};

use super::load::SourceFile;
use super::scan::{find_param_struct_fields, find_service_methods};
use super::types::{ApiPackage, ParamFieldCollection, ServiceMethodCollection};
use crate::error::ParseError;
use crate::validator::check_rules;

/// Assemble the IR of one package from its parsed source files.
///
/// Files are visited in path order, so the result does not depend on the
/// order of `files`. Every parameter struct referenced by a method must be
/// declared in one of the files, and every field rule must apply to the
/// field's kind.
///
/// # Errors
///
/// Returns the first scanning or integrity failure, positioned at the
/// offending declaration.
pub fn parse_files(files: &[SourceFile]) -> Result<ApiPackage, ParseError> {
    let mut files: Vec<&SourceFile> = files.iter().collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));

    let Some(first) = files.first() else {
        return Ok(ApiPackage::default());
    };
    let package_name = first.package.clone();
    for file in &files {
        if file.package != package_name {
            return Err(ParseError::new(
                file.package_pos.clone(),
                format!(
                    "different package name {}, want {}",
                    file.package, package_name
                ),
            ));
        }
    }

    let mut services = ServiceMethodCollection::default();
    for file in &files {
        debug!(file = %file.path.display(), "scanning methods");
        find_service_methods(file, &mut services)?;
    }
    info!(
        package = %package_name,
        services = services.service_count(),
        methods = services.method_count(),
        "FOUND services"
    );

    let mut params = ParamFieldCollection::default();
    for (_, methods) in services.iter() {
        for m in methods {
            params.reference(&m.params.name, &m.pos);
        }
    }

    for file in &files {
        debug!(file = %file.path.display(), "scanning param structs");
        find_param_struct_fields(file, &mut params)?;
    }
    if let Some((name, pos)) = params.first_unresolved() {
        return Err(ParseError::new(
            pos.clone(),
            format!("param struct {name} not found"),
        ));
    }

    for (name, fields) in params.resolved() {
        for field in fields {
            check_rules(field.kind, &field.rules).map_err(|msg| {
                ParseError::new(field.pos.clone(), format!("{name}.{}: {msg}", field.name))
            })?;
        }
    }
    info!(
        package = %package_name,
        structs = params.struct_count(),
        fields = params.field_count(),
        "FOUND param structs"
    );

    Ok(ApiPackage {
        package_name,
        services,
        params,
    })
}
