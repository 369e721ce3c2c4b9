use std::collections::BTreeMap;
use std::fmt::Write;

use super::printer::{emit, Printer};
use super::{AUTH_HEADER, AUTH_TOKEN};
use crate::error::GenerationError;
use crate::spec::ServiceMethod;

pub(super) fn gen_preamble<W: Write>(p: &mut Printer<W>) {
    emit!(p, "// !!! Do not change this code !!!");
    emit!(p, "// The code is generated automatically by apigen tool");
    p.blank();
    emit!(p, "#[allow(dead_code)]");
    emit!(p, "const APIGEN_AUTH_HEADER: &str = {:?};", AUTH_HEADER);
    emit!(p, "#[allow(dead_code)]");
    emit!(p, "const APIGEN_AUTH_TOKEN: &str = {:?};", AUTH_TOKEN);

    p.blank();
    emit!(p, "#[allow(dead_code)]");
    emit!(p, "fn write_api_error(ae: ApiError) -> ::http::Response<Vec<u8>> {{");
    emit!(p, "let body = ::serde_json::json!({{ \"error\": ae.message }}).to_string();");
    emit!(p, "let mut resp = ::http::Response::new(body.into_bytes());");
    emit!(p, "*resp.status_mut() = ae.http_status;");
    emit!(p, "resp.headers_mut().insert(::http::header::CONTENT_TYPE, ::http::HeaderValue::from_static(\"application/json\"));");
    emit!(p, "resp");
    emit!(p, "}}");

    p.blank();
    emit!(p, "#[allow(dead_code)]");
    emit!(p, "fn apigen_content_type(req: &::http::Request<Vec<u8>>) -> &str {{");
    emit!(p, "req.headers().get(::http::header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or(\"\")");
    emit!(p, "}}");

    p.blank();
    emit!(p, "#[allow(dead_code)]");
    emit!(p, "fn apigen_is_json(req: &::http::Request<Vec<u8>>) -> bool {{");
    emit!(p, "let media_type = apigen_content_type(req).split(';').next().unwrap_or(\"\");");
    emit!(p, "media_type.trim().eq_ignore_ascii_case(\"application/json\")");
    emit!(p, "}}");

    p.blank();
    emit!(p, "#[allow(dead_code)]");
    emit!(p, "fn apigen_form_value(req: &::http::Request<Vec<u8>>, key: &str) -> String {{");
    emit!(p, "let media_type = apigen_content_type(req).split(';').next().unwrap_or(\"\");");
    emit!(p, "if media_type.trim().eq_ignore_ascii_case(\"application/x-www-form-urlencoded\") {{");
    emit!(p, "if let Some((_, v)) = ::url::form_urlencoded::parse(req.body()).find(|(k, _)| k == key) {{");
    emit!(p, "return v.into_owned();");
    emit!(p, "}}");
    emit!(p, "}}");
    emit!(p, "let query = req.uri().query().unwrap_or(\"\");");
    emit!(p, "::url::form_urlencoded::parse(query.as_bytes()).find(|(k, _)| k == key).map(|(_, v)| v.into_owned()).unwrap_or_default()");
    emit!(p, "}}");
}

/// Emit `write_api_error(ApiError { .. })` spread over lines, between `lead`
/// and `tail`.
fn api_error<W: Write>(p: &mut Printer<W>, lead: &str, status: &str, message: &str, tail: &str) {
    emit!(p, "{lead}write_api_error(ApiError {{");
    emit!(p, "http_status: ::http::StatusCode::{status},");
    emit!(p, "message: {message},");
    emit!(p, "}}){tail}");
}

fn message(text: &str) -> String {
    format!("{text:?}.to_string()")
}

fn receiver(mutable: bool) -> &'static str {
    if mutable {
        "&mut self"
    } else {
        "&self"
    }
}

/// Dispatch and wrappers of one receiver. `methods` is sorted by name.
pub(super) fn gen_service<W: Write>(
    p: &mut Printer<W>,
    recv: &str,
    methods: &[&ServiceMethod],
) -> Result<(), GenerationError> {
    let mut by_path: BTreeMap<&str, BTreeMap<&str, &ServiceMethod>> = BTreeMap::new();
    for m in methods {
        let by_verb = by_path.entry(m.api.url.as_str()).or_default();
        if by_verb.insert(m.api.http_method.as_str(), m).is_some() {
            return Err(GenerationError::Unsupported {
                pos: m.pos.clone(),
                message: format!("duplicate HTTP method {} {}", m.api.http_method, m.api.url),
            });
        }
    }

    let mutable = methods.iter().any(|m| m.recv.is_pointer);

    p.blank();
    emit!(p, "impl {recv} {{");
    emit!(p, "pub fn serve_http({}, req: &::http::Request<Vec<u8>>) -> ::http::Response<Vec<u8>> {{", receiver(mutable));
    emit!(p, "match req.uri().path() {{");

    for (path, by_verb) in &by_path {
        emit!(p, "{path:?} => {{");

        let wildcard = by_verb.values().find(|m| m.api.is_any_method());
        let concrete: Vec<(&str, &ServiceMethod)> = by_verb
            .iter()
            .filter(|(_, m)| !m.api.is_any_method())
            .map(|(verb, m)| (*verb, *m))
            .collect();

        if concrete.is_empty() {
            if let Some(m) = wildcard {
                gen_call(p, m);
            }
        } else {
            emit!(p, "let method = req.method().as_str();");
            for (i, (verb, m)) in concrete.iter().enumerate() {
                if i == 0 {
                    emit!(p, "if method.eq_ignore_ascii_case({verb:?}) {{");
                } else {
                    emit!(p, "}} else if method.eq_ignore_ascii_case({verb:?}) {{");
                }
                gen_call(p, m);
            }
            emit!(p, "}} else {{");
            match wildcard {
                Some(m) => gen_call(p, m),
                None => api_error(p, "", "NOT_ACCEPTABLE", &message("bad method"), ""),
            }
            emit!(p, "}}");
        }

        emit!(p, "}}");
    }

    api_error(p, "_ => ", "NOT_FOUND", &message("unknown method"), ",");
    emit!(p, "}}");
    emit!(p, "}}");

    for m in methods {
        gen_wrapper(p, m);
    }

    emit!(p, "}}");
    Ok(p.status()?)
}

/// Auth check, when required, followed by the wrapper call as the branch value.
fn gen_call<W: Write>(p: &mut Printer<W>, m: &ServiceMethod) {
    if m.api.auth {
        emit!(p, "if req.headers().get(APIGEN_AUTH_HEADER).and_then(|v| v.to_str().ok()) != Some(APIGEN_AUTH_TOKEN) {{");
        api_error(p, "return ", "FORBIDDEN", &message("unauthorized"), ";");
        emit!(p, "}}");
    }
    emit!(p, "self.wrapper_{}(req)", m.name);
}

fn gen_wrapper<W: Write>(p: &mut Printer<W>, m: &ServiceMethod) {
    let params = &m.params.name;
    let result = &m.result.name;

    p.blank();
    emit!(p, "fn wrapper_{}({}, req: &::http::Request<Vec<u8>>) -> ::http::Response<Vec<u8>> {{", m.name, receiver(m.recv.is_pointer));
    emit!(p, "const OP: &str = \"{}.wrapper_{}\";", m.recv.name, m.name);
    emit!(p, "let mut params = {params}::default();");

    emit!(p, "if let Err(err) = params.get_from_request(req) {{");
    api_error(p, "return ", "BAD_REQUEST", "err", ";");
    emit!(p, "}}");
    emit!(p, "if let Err(err) = params.validate() {{");
    api_error(p, "return ", "BAD_REQUEST", "err", ";");
    emit!(p, "}}");

    emit!(p, "let ctx = req.extensions();");
    let arg = if m.params.is_pointer { "&params" } else { "params" };
    emit!(p, "let res = match self.{}(ctx, {arg}) {{", m.name);
    emit!(p, "Ok(res) => res,");
    emit!(p, "Err(err) => {{");
    emit!(p, "let err: Box<dyn ::std::error::Error + Send + Sync> = err.into();");
    emit!(p, "return match err.downcast::<ApiError>() {{");
    emit!(p, "Ok(ae) => write_api_error(*ae),");
    api_error(p, "Err(err) => ", "INTERNAL_SERVER_ERROR", "err.to_string()", ",");
    emit!(p, "}};");
    emit!(p, "}}");
    emit!(p, "}};");

    emit!(p, "#[derive(::serde::Serialize)]");
    emit!(p, "struct ApigenEnvelope<'a> {{");
    emit!(p, "response: &'a {result},");
    emit!(p, "error: &'a str,");
    emit!(p, "}}");
    let value = if m.result.is_pointer { "&*res" } else { "&res" };
    emit!(p, "let envelope = ApigenEnvelope {{ response: {value}, error: \"\" }};");

    emit!(p, "match ::serde_json::to_vec(&envelope) {{");
    emit!(p, "Ok(body) => {{");
    emit!(p, "let mut resp = ::http::Response::new(body);");
    emit!(p, "resp.headers_mut().insert(::http::header::CONTENT_TYPE, ::http::HeaderValue::from_static(\"application/json\"));");
    emit!(p, "resp");
    emit!(p, "}}");
    emit!(p, "Err(err) => {{");
    emit!(p, "::tracing::error!(op = OP, error = %err, \"can't write response body\");");
    api_error(p, "", "INTERNAL_SERVER_ERROR", "err.to_string()", "");
    emit!(p, "}}");
    emit!(p, "}}");
    emit!(p, "}}");
}
