//! Compile-time checks for apigen parameter structs.
//!
//! `#[derive(ApiParams)]` registers the `#[apivalidator = "..."]` field
//! attribute and rejects, with a spanned compile error:
//!
//! - enums, unions, tuple and unit structs
//! - malformed attributes and unknown rules
//! - field types other than `i64`, `String` and `f64` on bound fields
//! - rules that do not apply to the field type (`enum` on `f64`, a
//!   non-integer length bound on `String`, ...)
//!
//! The derive expands to nothing. The binding and validation code itself is
//! produced by the `apigen` generator.

use proc_macro::TokenStream;
use syn::{parse_macro_input, Data, DeriveInput, Field, Fields};

use apigen::spec::{field_kind, validator_attr};
use apigen::validator::{check_rules, parse_tag};

#[proc_macro_derive(ApiParams, attributes(apivalidator))]
pub fn derive_api_params(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match check_params(&input) {
        Ok(()) => TokenStream::new(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn check_params(input: &DeriveInput) -> syn::Result<()> {
    let name = &input.ident;
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(
            name.span(),
            format!("{name}: params must be struct"),
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new(
            name.span(),
            format!("{name}: params must have named fields"),
        ));
    };

    // Report every bad field at once
    let mut errors: Option<syn::Error> = None;
    for field in &fields.named {
        if let Err(err) = check_field(field) {
            match &mut errors {
                Some(all) => all.combine(err),
                None => errors = Some(err),
            }
        }
    }
    errors.map_or(Ok(()), Err)
}

fn check_field(field: &Field) -> syn::Result<()> {
    let Some(ident) = &field.ident else {
        return Ok(());
    };

    let tag = validator_attr(&field.attrs)?;
    let rules = match parse_tag(tag.as_deref().unwrap_or_default()) {
        Ok(Some(rules)) => rules,
        Ok(None) => return Ok(()),
        Err(err) => return Err(syn::Error::new(ident.span(), err.to_string())),
    };

    let kind = field_kind(&field.ty).ok_or_else(|| {
        syn::Error::new_spanned(
            &field.ty,
            format!("{ident}: field type must be i64, String or f64"),
        )
    })?;

    check_rules(kind, &rules).map_err(|msg| syn::Error::new(ident.span(), format!("{ident}: {msg}")))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn check(src: &str) -> Result<(), String> {
        let input: DeriveInput = syn::parse_str(src).unwrap();
        check_params(&input).map_err(|e| e.to_string())
    }

    #[test]
    fn test_valid_params() {
        check(
            r#"
            struct SearchUsers {
                #[apivalidator = "paramname=q,min=1,max=32"]
                query: String,
                #[apivalidator = "default=10,>0,<=100"]
                limit: i64,
                #[apivalidator = "-"]
                cache: Vec<String>,
                note: String,
            }
            "#,
        )
        .unwrap();
    }

    #[test]
    fn test_rejected_params() {
        assert_eq!(check("enum P { A }").unwrap_err(), "P: params must be struct");
        assert_eq!(check("struct P(i64);").unwrap_err(), "P: params must have named fields");
        assert_eq!(
            check(r#"struct P { #[apivalidator = "required,often"] x: i64 }"#).unwrap_err(),
            "often: unknown rule"
        );
        assert_eq!(
            check(r#"struct P { #[apivalidator = "required"] x: u8 }"#).unwrap_err(),
            "x: field type must be i64, String or f64"
        );
        assert_eq!(
            check(r#"struct P { #[apivalidator = "enum=1|2"] x: f64 }"#).unwrap_err(),
            "x: enum rule not applicable for float64 type"
        );
        assert!(check(r#"struct P { #[apivalidator(required)] x: i64 }"#)
            .unwrap_err()
            .starts_with("apivalidator: expected"));
    }
}
