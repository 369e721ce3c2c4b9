//! Annotation scanner.
//!
//! Walks the items of one parsed source file and extracts:
//!
//! - **service methods**: methods of inherent `impl` blocks whose doc comment
//!   carries a line starting with `apigen:api` followed by inline JSON
//!   (`{"url": "/users", "method": "POST", "auth": true}`)
//! - **parameter fields**: named fields of structs referenced by a service
//!   method, with the rules of their `#[apivalidator = "..."]` attribute

use quote::ToTokens;
use syn::spanned::Spanned;
use syn::{
    Attribute, Expr, ExprLit, Field, Fields, FnArg, GenericArgument, ImplItem, ImplItemFn, Item,
    Lit, Meta, PathArguments, Receiver, ReturnType, Type,
};
use tracing::debug;

use super::load::SourceFile;
use super::types::{
    ArgType, Kind, MethodApi, ParamField, ParamFieldCollection, ServiceMethod,
    ServiceMethodCollection, ANY_HTTP_METHOD,
};
use crate::error::ParseError;
use crate::validator::parse_tag;

/// Doc-comment marker of a generation target.
pub const API_MARKER: &str = "apigen:api";

/// Field attribute carrying the validator rules.
pub const VALIDATOR_ATTR: &str = "apivalidator";

/// Collect every annotated method of `file` into `servs`.
pub fn find_service_methods(
    file: &SourceFile,
    servs: &mut ServiceMethodCollection,
) -> Result<(), ParseError> {
    for item in &file.syntax.items {
        match item {
            Item::Fn(f) => {
                if method_api(file, &f.attrs)?.is_some() {
                    return Err(ParseError::new(
                        file.position(f.sig.ident.span()),
                        format!("{}: method must have receiver", f.sig.ident),
                    ));
                }
            }
            Item::Impl(imp) if imp.trait_.is_none() => {
                for impl_item in &imp.items {
                    let ImplItem::Fn(f) = impl_item else {
                        continue;
                    };
                    if let Some(m) = service_method(file, &imp.self_ty, f)? {
                        debug!(method = %format!("{}.{}", m.recv.name, m.name), "FOUND method");
                        servs.add(m)?;
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn service_method(
    file: &SourceFile,
    self_ty: &Type,
    f: &ImplItemFn,
) -> Result<Option<ServiceMethod>, ParseError> {
    let name = f.sig.ident.to_string();
    let Some(api) = method_api(file, &f.attrs)? else {
        debug!(method = %name, "SKIP method doesn't have {API_MARKER} mark");
        return Ok(None);
    };

    let mut inputs = f.sig.inputs.iter();
    let recv = match inputs.next() {
        Some(FnArg::Receiver(r)) => receiver(file, self_ty, r)?,
        _ => {
            return Err(ParseError::new(
                file.position(f.sig.ident.span()),
                format!("{name}: method must have receiver"),
            ))
        }
    };

    let params: Vec<&Type> = inputs
        .filter_map(|arg| match arg {
            FnArg::Typed(t) => Some(t.ty.as_ref()),
            FnArg::Receiver(_) => None,
        })
        .collect();
    // (ctx, params)
    if params.len() != 2 {
        return Err(ParseError::new(
            file.position(f.sig.paren_token.span.open()),
            format!("{name}: method must have two parameters (ctx, params)"),
        ));
    }
    let params = param_type(file, params[1])?;

    // Result<result, err>
    let (result, result_span) = match &f.sig.output {
        ReturnType::Type(_, ty) => (result_type(file, ty)?, ty.span()),
        ReturnType::Default => (None, f.sig.paren_token.span.close()),
    };
    let Some(result) = result else {
        return Err(ParseError::new(
            file.position(result_span),
            format!("{name}: method must have two results (result, err)"),
        ));
    };

    Ok(Some(ServiceMethod {
        name,
        recv,
        params,
        result,
        api,
        pos: file.position(f.sig.ident.span()),
    }))
}

/// Returns `None` when no doc line carries the marker.
fn method_api(file: &SourceFile, attrs: &[Attribute]) -> Result<Option<MethodApi>, ParseError> {
    for attr in attrs.iter().filter(|a| a.path().is_ident("doc")) {
        let Meta::NameValue(nv) = &attr.meta else {
            continue;
        };
        let Expr::Lit(ExprLit {
            lit: Lit::Str(doc), ..
        }) = &nv.value
        else {
            continue;
        };
        let text = doc.value();
        let Some(json) = text
            .lines()
            .find_map(|line| line.trim_start().strip_prefix(API_MARKER))
        else {
            continue;
        };

        let pos = file.position(attr.span());
        let mut api: MethodApi = serde_json::from_str(json)
            .map_err(|e| ParseError::new(pos.clone(), format!("{API_MARKER}: {e}")))?;
        if api.url.is_empty() {
            return Err(ParseError::new(
                pos,
                format!("{API_MARKER}: url must not be empty"),
            ));
        }
        if api.http_method.is_empty() {
            api.http_method = ANY_HTTP_METHOD.to_string();
        }
        api.http_method = api.http_method.to_uppercase();
        return Ok(Some(api));
    }
    Ok(None)
}

fn receiver(file: &SourceFile, self_ty: &Type, r: &Receiver) -> Result<ArgType, ParseError> {
    if r.colon_token.is_some() || r.reference.is_none() {
        return Err(ParseError::new(
            file.position(r.span()),
            "receiver must be &self or &mut self",
        ));
    }
    let name = plain_name(self_ty).ok_or_else(|| {
        ParseError::new(
            file.position(self_ty.span()),
            format!(
                "receiver type must be a plain named type, got `{}`",
                self_ty.to_token_stream()
            ),
        )
    })?;
    Ok(ArgType {
        name,
        is_pointer: r.mutability.is_some(),
    })
}

fn param_type(file: &SourceFile, ty: &Type) -> Result<ArgType, ParseError> {
    if let Type::Reference(r) = ty {
        if r.mutability.is_none() {
            if let Some(name) = plain_name(&r.elem) {
                return Ok(ArgType::pointer(name));
            }
        }
    } else if let Some(name) = plain_name(ty) {
        return Ok(ArgType::plain(name));
    }
    Err(ParseError::new(
        file.position(ty.span()),
        format!(
            "params type must be a plain named type or a reference to one, got `{}`",
            ty.to_token_stream()
        ),
    ))
}

/// Returns `None` when `ty` is not a two-argument `Result`.
fn result_type(file: &SourceFile, ty: &Type) -> Result<Option<ArgType>, ParseError> {
    let Some(args) = generic_types(ty, "Result") else {
        return Ok(None);
    };
    let [ok, _err] = args.as_slice() else {
        return Ok(None);
    };

    if let Some(name) = boxed(ok) {
        return Ok(Some(ArgType::pointer(name)));
    }
    if let Some(name) = plain_name(ok) {
        return Ok(Some(ArgType::plain(name)));
    }
    Err(ParseError::new(
        file.position(ok.span()),
        format!(
            "result type must be a plain named type or a Box of one, got `{}`",
            ok.to_token_stream()
        ),
    ))
}

/// Name of a single-segment path type without generic arguments.
fn plain_name(ty: &Type) -> Option<String> {
    let Type::Path(p) = ty else {
        return None;
    };
    if p.qself.is_some() || p.path.leading_colon.is_some() || p.path.segments.len() != 1 {
        return None;
    }
    let seg = &p.path.segments[0];
    match seg.arguments {
        PathArguments::None => Some(seg.ident.to_string()),
        _ => None,
    }
}

/// Type arguments of `ty` when its last path segment is `name<...>`.
fn generic_types<'a>(ty: &'a Type, name: &str) -> Option<Vec<&'a Type>> {
    let Type::Path(p) = ty else {
        return None;
    };
    let seg = p.path.segments.last()?;
    if seg.ident != name {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    Some(
        args.args
            .iter()
            .filter_map(|arg| match arg {
                GenericArgument::Type(t) => Some(t),
                _ => None,
            })
            .collect(),
    )
}

fn boxed(ty: &Type) -> Option<String> {
    match generic_types(ty, "Box")?.as_slice() {
        [inner] => plain_name(inner),
        _ => None,
    }
}

/// Collect the fields of every referenced parameter struct declared in `file`.
pub fn find_param_struct_fields(
    file: &SourceFile,
    params: &mut ParamFieldCollection,
) -> Result<(), ParseError> {
    for item in &file.syntax.items {
        let (ident, fields) = match item {
            Item::Struct(s) => (&s.ident, Some(&s.fields)),
            Item::Enum(e) => (&e.ident, None),
            Item::Union(u) => (&u.ident, None),
            Item::Type(t) => (&t.ident, None),
            _ => continue,
        };
        let name = ident.to_string();
        if !params.contains(&name) {
            debug!(name = %name, "SKIP unknown type");
            continue;
        }

        let pos = file.position(ident.span());
        let Some(fields) = fields else {
            return Err(ParseError::new(pos, format!("{name}: params must be struct")));
        };
        let Fields::Named(named) = fields else {
            return Err(ParseError::new(
                pos,
                format!("{name}: params must have named fields"),
            ));
        };

        debug!(name = %name, "FOUND struct");
        let mut found = Vec::with_capacity(named.named.len());
        for field in &named.named {
            if let Some(f) = param_field(file, field)? {
                found.push(f);
            }
        }
        params.resolve(&name, found, &pos)?;
    }
    Ok(())
}

/// Returns `None` for fields excluded with `-`.
fn param_field(file: &SourceFile, field: &Field) -> Result<Option<ParamField>, ParseError> {
    let Some(ident) = &field.ident else {
        return Ok(None);
    };
    let pos = file.position(ident.span());

    let tag = validator_attr(&field.attrs)
        .map_err(|e| ParseError::new(file.position(e.span()), e.to_string()))?;
    let rules = match parse_tag(tag.as_deref().unwrap_or_default()) {
        Ok(Some(rules)) => rules,
        Ok(None) => {
            debug!(field = %ident, "SKIP excluded field");
            return Ok(None);
        }
        Err(e) => return Err(ParseError::new(pos, e.to_string())),
    };

    let kind = field_kind(&field.ty).ok_or_else(|| {
        ParseError::new(
            file.position(field.ty.span()),
            format!("{ident}: field type must be i64, String or f64"),
        )
    })?;

    Ok(Some(ParamField {
        name: ident.to_string(),
        kind,
        rules,
        pos,
    }))
}

/// Raw value of the `#[apivalidator = "..."]` attribute, if present.
pub fn validator_attr(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let Some(attr) = attrs.iter().find(|a| a.path().is_ident(VALIDATOR_ATTR)) else {
        return Ok(None);
    };
    if let Meta::NameValue(nv) = &attr.meta {
        if let Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) = &nv.value
        {
            return Ok(Some(s.value()));
        }
    }
    Err(syn::Error::new_spanned(
        attr,
        format!("{VALIDATOR_ATTR}: expected #[{VALIDATOR_ATTR} = \"<rules>\"]"),
    ))
}

/// Kind of a declared field type accepted for binding.
pub fn field_kind(ty: &Type) -> Option<Kind> {
    plain_name(ty).and_then(|name| Kind::from_type_name(&name))
}
