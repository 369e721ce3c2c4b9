use std::fmt::Write;

use super::printer::{emit, Printer};
use crate::error::GenerationError;
use crate::spec::{Kind, ParamField};
use crate::validator::{check_rules, RuleKind};

/// Binding and validation of one parameter struct.
pub(super) fn gen_params<W: Write>(
    p: &mut Printer<W>,
    name: &str,
    fields: &[ParamField],
) -> Result<(), GenerationError> {
    for field in fields {
        check_rules(field.kind, &field.rules).map_err(|msg| unsupported(name, field, msg))?;
    }

    p.blank();
    emit!(p, "impl {name} {{");
    gen_get_from_request(p, name, fields)?;
    p.blank();
    gen_validate(p, name, fields)?;
    emit!(p, "}}");
    Ok(p.status()?)
}

fn unsupported(name: &str, field: &ParamField, msg: String) -> GenerationError {
    GenerationError::Unsupported {
        pos: field.pos.clone(),
        message: format!("{name}.{}: {msg}", field.name),
    }
}

/// Default operand of `field` as a value expression of its kind.
fn default_value(name: &str, field: &ParamField) -> Result<Option<String>, GenerationError> {
    let Some(raw) = field.rules.literal(RuleKind::Default) else {
        return Ok(None);
    };
    let lit = field
        .kind
        .literal(raw)
        .map_err(|msg| unsupported(name, field, msg))?;
    Ok(Some(match field.kind {
        Kind::String => format!("{lit}.to_string()"),
        _ => lit,
    }))
}

fn error(text: &str) -> String {
    format!("{text:?}.to_string()")
}

fn gen_get_from_request<W: Write>(
    p: &mut Printer<W>,
    name: &str,
    fields: &[ParamField],
) -> Result<(), GenerationError> {
    emit!(p, "pub fn get_from_request(&mut self, req: &::http::Request<Vec<u8>>) -> Result<(), String> {{");
    emit!(p, "if apigen_is_json(req) {{");
    gen_from_json_body(p, name, fields)?;
    emit!(p, "}} else {{");
    gen_from_form_or_query(p, name, fields)?;
    emit!(p, "}}");
    emit!(p, "Ok(())");
    emit!(p, "}}");
    Ok(())
}

fn gen_from_json_body<W: Write>(
    p: &mut Printer<W>,
    name: &str,
    fields: &[ParamField],
) -> Result<(), GenerationError> {
    // every field is optional so that an absent key and `null` bind alike
    emit!(p, "#[derive(::serde::Deserialize)]");
    emit!(p, "struct ApigenShadow {{");
    for field in fields {
        emit!(p, "#[serde(default, rename = {:?})]", field.api_param_name());
        emit!(p, "{}: Option<{}>,", field.name, field.kind.rust_type());
    }
    emit!(p, "}}");

    let binding = if fields.is_empty() { "_shadow" } else { "shadow" };
    emit!(p, "let {binding}: ApigenShadow = ::serde_json::from_slice(req.body()).map_err(|err| err.to_string())?;");
    for field in fields {
        if field.rules.is_required_without_default() {
            let msg = error(&format!("{} must be not empty", field.api_param_name()));
            emit!(p, "self.{0} = shadow.{0}.ok_or_else(|| {msg})?;", field.name);
        } else if let Some(value) = default_value(name, field)? {
            match field.kind {
                Kind::String => emit!(p, "self.{0} = shadow.{0}.unwrap_or_else(|| {value});", field.name),
                _ => emit!(p, "self.{0} = shadow.{0}.unwrap_or({value});", field.name),
            }
        } else {
            emit!(p, "self.{0} = shadow.{0}.unwrap_or_default();", field.name);
        }
    }
    Ok(())
}

fn gen_from_form_or_query<W: Write>(
    p: &mut Printer<W>,
    name: &str,
    fields: &[ParamField],
) -> Result<(), GenerationError> {
    for field in fields {
        let key = field.api_param_name();
        emit!(p, "{{");
        emit!(p, "let s = apigen_form_value(req, {key:?});");

        if field.rules.is_required_without_default() {
            emit!(p, "if s.is_empty() {{");
            emit!(p, "return Err({});", error(&format!("{key} must be not empty")));
            emit!(p, "}}");
        }

        let default = default_value(name, field)?;
        if let Some(value) = &default {
            emit!(p, "if s.is_empty() {{");
            emit!(p, "self.{} = {value};", field.name);
            emit!(p, "}} else {{");
        }

        match field.kind {
            Kind::String => emit!(p, "self.{} = s;", field.name),
            kind => emit!(
                p,
                "self.{} = s.parse::<{}>().map_err(|_| {})?;",
                field.name,
                kind.rust_type(),
                error(&format!("{key} must be {kind}"))
            ),
        }

        if default.is_some() {
            emit!(p, "}}");
        }
        emit!(p, "}}");
    }
    Ok(())
}

fn gen_validate<W: Write>(
    p: &mut Printer<W>,
    name: &str,
    fields: &[ParamField],
) -> Result<(), GenerationError> {
    emit!(p, "#[allow(clippy::all)]");
    emit!(p, "pub fn validate(&self) -> Result<(), String> {{");

    for field in fields {
        let key = field.api_param_name();

        if let Some(values) = field.rules.enum_values() {
            let mut checks = Vec::with_capacity(values.len());
            for v in values {
                let lit = field
                    .kind
                    .literal(v)
                    .map_err(|msg| unsupported(name, field, msg))?;
                checks.push(format!("self.{} == {lit}", field.name));
            }
            emit!(p, "if !({}) {{", checks.join(" || "));
            emit!(p, "return Err({});", error(&format!("{key} must be one of [{}]", values.join(", "))));
            emit!(p, "}}");
        }

        for rule in [RuleKind::Min, RuleKind::Max, RuleKind::Greater, RuleKind::Less] {
            let (Some(raw), Some(op)) = (field.rules.literal(rule), rule.operator()) else {
                continue;
            };
            let bound = field
                .kind
                .bound(raw)
                .map_err(|msg| unsupported(name, field, msg))?;
            match field.kind {
                Kind::String => {
                    emit!(p, "if !(self.{}.len() {op} {bound}) {{", field.name);
                    emit!(p, "return Err({});", error(&format!("{key} len must be {op} {raw}")));
                }
                _ => {
                    emit!(p, "if !(self.{} {op} {bound}) {{", field.name);
                    emit!(p, "return Err({});", error(&format!("{key} must be {op} {raw}")));
                }
            }
            emit!(p, "}}");
        }
    }

    emit!(p, "Ok(())");
    emit!(p, "}}");
    Ok(())
}
