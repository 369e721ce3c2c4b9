#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::spec::{
    parse_files, ArgType, Kind, MethodApi, ParamField, ParamFieldCollection, Position,
    ServiceMethodCollection, SourceFile,
};
use crate::validator::RuleSet;

const API: &str = r#"
impl Service {
    /// apigen:api {"url": "/users", "method": "POST"}
    pub fn create(&mut self, ctx: &Extensions, params: CreateUser) -> Result<NewUser, ApiError> {
        todo!()
    }

    /// apigen:api {"url": "/users", "method": "DELETE", "auth": true}
    pub fn delete(&self, ctx: &Extensions, params: &DeleteUser) -> Result<Box<Deleted>, ApiError> {
        todo!()
    }

    /// apigen:api {"url": "/users/search"}
    pub fn search(&self, ctx: &Extensions, params: Search) -> Result<UserList, ApiError> {
        todo!()
    }
}
"#;

const MODEL: &str = r#"
pub struct CreateUser {
    #[apivalidator = "required"]
    pub name: String,
    #[apivalidator = "required,>=0"]
    pub skill: f64,
    #[apivalidator = "default=1,>0"]
    pub latency: i64,
}

pub struct DeleteUser {
    #[apivalidator = "required,>0,paramname=user_id"]
    pub id: i64,
}

pub struct Search {
    #[apivalidator = "paramname=q,min=1,max=32"]
    pub query: String,
    #[apivalidator = "default=name,enum=name|skill"]
    pub order_by: String,
    #[apivalidator = "-"]
    pub cache: Vec<String>,
}
"#;

fn files(order: &[(&str, &str)]) -> Vec<SourceFile> {
    order
        .iter()
        .map(|(path, src)| SourceFile::parse(*path, src, "service").unwrap())
        .collect()
}

fn generate() -> String {
    let pkg = parse_files(&files(&[("service/api.rs", API), ("service/model.rs", MODEL)])).unwrap();
    gen_code(&pkg).unwrap()
}

#[test]
fn test_generated_code_is_valid_rust() {
    let code = generate();
    let file = syn::parse_file(&code).expect("generated code must parse");
    // 2 consts, 4 helpers, 1 service impl, 3 param impls
    assert_eq!(file.items.len(), 10);
    assert!(code.starts_with("// !!! Do not change this code !!!\n"));
    assert!(!code.contains("\nuse "));
}

#[test]
fn test_output_is_deterministic() {
    let a = generate();
    let pkg = parse_files(&files(&[("service/model.rs", MODEL), ("service/api.rs", API)])).unwrap();
    let b = gen_code(&pkg).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_output_ignores_declaration_order() {
    let api = r#"
impl Service {
    /// apigen:api {"url": "/users/search"}
    pub fn search(&self, ctx: &Extensions, params: Search) -> Result<UserList, ApiError> {
        todo!()
    }

    /// apigen:api {"url": "/users", "method": "DELETE", "auth": true}
    pub fn delete(&self, ctx: &Extensions, params: &DeleteUser) -> Result<Box<Deleted>, ApiError> {
        todo!()
    }

    /// apigen:api {"url": "/users", "method": "POST"}
    pub fn create(&mut self, ctx: &Extensions, params: CreateUser) -> Result<NewUser, ApiError> {
        todo!()
    }
}
"#;
    let model_start = MODEL.find("pub struct DeleteUser").unwrap();
    let search_start = MODEL.find("pub struct Search").unwrap();
    let model = format!(
        "{}{}{}",
        &MODEL[search_start..],
        &MODEL[model_start..search_start],
        &MODEL[..model_start],
    );

    let pkg = parse_files(&files(&[("service/api.rs", api), ("service/model.rs", &model)])).unwrap();
    assert_eq!(gen_code(&pkg).unwrap(), generate());
}

#[test]
fn test_raw_identifier_binding() {
    let api = r#"
impl Service {
    /// apigen:api {"url": "/items"}
    pub fn list(&self, ctx: &Extensions, params: Filter) -> Result<Items, ApiError> {
        todo!()
    }
}

pub struct Filter {
    #[apivalidator = "required,max=8"]
    pub r#type: String,
}
"#;
    let pkg = parse_files(&files(&[("service/api.rs", api)])).unwrap();
    let code = gen_code(&pkg).unwrap();
    syn::parse_file(&code).unwrap();
    assert!(code.contains("#[serde(default, rename = \"type\")]"));
    assert!(code.contains("r#type: Option<String>,"));
    assert!(code.contains("let s = apigen_form_value(req, \"type\");"));
    assert!(code.contains("self.r#type = s;"));
    assert!(code.contains("return Err(\"type must be not empty\".to_string());"));
    assert!(code.contains("if !(self.r#type.len() <= 8) {"));
    assert!(!code.contains("\"r#type"));
}

#[test]
fn test_generated_locals_do_not_clash_with_host_types() {
    let api = r#"
impl Service {
    /// apigen:api {"url": "/wrap"}
    pub fn wrap(&self, ctx: &Extensions, params: Shadow) -> Result<Envelope, ApiError> {
        todo!()
    }
}

pub struct Shadow {
    pub id: i64,
}
"#;
    let pkg = parse_files(&files(&[("service/api.rs", api)])).unwrap();
    let code = gen_code(&pkg).unwrap();
    syn::parse_file(&code).unwrap();
    assert!(code.contains("response: &'a Envelope,"));
    assert!(code.contains("let mut params = Shadow::default();"));
    assert!(!code.contains("struct Envelope"));
    assert!(!code.contains("struct Shadow"));
}

#[test]
fn test_dispatch_shape() {
    let code = generate();
    assert!(code.contains(
        "pub fn serve_http(&mut self, req: &::http::Request<Vec<u8>>) -> ::http::Response<Vec<u8>> {"
    ));
    // verbs sorted, matched case-insensitively
    let delete = code.find("if method.eq_ignore_ascii_case(\"DELETE\") {").unwrap();
    let post = code.find("} else if method.eq_ignore_ascii_case(\"POST\") {").unwrap();
    assert!(delete < post);
    assert!(code.contains("http_status: ::http::StatusCode::NOT_ACCEPTABLE,"));
    assert!(code.contains("message: \"bad method\".to_string(),"));
    assert!(code.contains("_ => write_api_error(ApiError {"));
    assert!(code.contains("message: \"unknown method\".to_string(),"));

    // wildcard path has no verb match
    let search = code.find("\"/users/search\" => {").unwrap();
    let tail = &code[search..];
    let call = tail.find("self.wrapper_search(req)").unwrap();
    assert!(!tail[..call].contains("let method"));

    // auth precedes the protected call only
    let auth = code
        .find("if req.headers().get(APIGEN_AUTH_HEADER).and_then(|v| v.to_str().ok()) != Some(APIGEN_AUTH_TOKEN) {")
        .unwrap();
    assert!(delete < auth && auth < post);
    assert_eq!(code.matches("APIGEN_AUTH_TOKEN").count(), 2);
}

#[test]
fn test_wrapper_shape() {
    let code = generate();
    assert!(code.contains("fn wrapper_create(&mut self, req: &::http::Request<Vec<u8>>)"));
    assert!(code.contains("fn wrapper_delete(&self, req: &::http::Request<Vec<u8>>)"));
    assert!(code.contains("const OP: &str = \"Service.wrapper_create\";"));
    assert!(code.contains("let mut params = DeleteUser::default();"));
    assert!(code.contains("let res = match self.delete(ctx, &params) {"));
    assert!(code.contains("let res = match self.create(ctx, params) {"));
    assert!(code.contains("response: &'a Deleted,"));
    assert!(code.contains("let envelope = ApigenEnvelope { response: &*res, error: \"\" };"));
    assert!(code.contains("let envelope = ApigenEnvelope { response: &res, error: \"\" };"));
    assert!(code.contains("return match err.downcast::<ApiError>() {"));
}

#[test]
fn test_binding_code() {
    let code = generate();
    // every shadow field is optional; required ones are checked on copy
    assert!(code.contains("skill: Option<f64>,"));
    assert!(code.contains("latency: Option<i64>,"));
    assert!(code.contains(
        "self.skill = shadow.skill.ok_or_else(|| \"skill must be not empty\".to_string())?;"
    ));
    // absent or null: the literal default, else the zero value
    assert!(code.contains("self.latency = shadow.latency.unwrap_or(1);"));
    assert!(code.contains("self.order_by = shadow.order_by.unwrap_or_else(|| \"name\".to_string());"));
    assert!(code.contains("self.query = shadow.query.unwrap_or_default();"));
    // external names
    assert!(code.contains("#[serde(default, rename = \"user_id\")]"));
    assert!(code.contains("let s = apigen_form_value(req, \"user_id\");"));
    assert!(code.contains("let s = apigen_form_value(req, \"q\");"));
    // form parsing per kind
    assert!(code.contains(
        "self.skill = s.parse::<f64>().map_err(|_| \"skill must be float64\".to_string())?;"
    ));
    assert!(code.contains(
        "self.latency = s.parse::<i64>().map_err(|_| \"latency must be int\".to_string())?;"
    ));
    assert!(code.contains("self.query = s;"));
}

#[test]
fn test_validation_code() {
    let code = generate();
    assert!(code.contains("if !(self.skill >= 0.0) {"));
    assert!(code.contains("return Err(\"skill must be >= 0\".to_string());"));
    assert!(code.contains("if !(self.latency > 0) {"));
    assert!(code.contains("return Err(\"latency must be > 0\".to_string());"));
    assert!(code.contains("if !(self.query.len() >= 1) {"));
    assert!(code.contains("return Err(\"q len must be <= 32\".to_string());"));
    assert!(code.contains("if !(self.order_by == \"name\" || self.order_by == \"skill\") {"));
    assert!(code.contains("return Err(\"order_by must be one of [name, skill]\".to_string());"));
}

#[test]
fn test_excluded_field_is_absent() {
    let code = generate();
    assert!(!code.contains("cache"));
}

#[test]
fn test_struct_order_is_sorted() {
    let code = generate();
    let create = code.find("impl CreateUser {").unwrap();
    let delete = code.find("impl DeleteUser {").unwrap();
    let search = code.find("impl Search {").unwrap();
    let service = code.find("impl Service {").unwrap();
    assert!(service < create && create < delete && delete < search);
}

fn hand_built(rules: &str, kind: Kind) -> ApiPackage {
    let pos = Position::new("api.rs", 1, 1);
    let mut services = ServiceMethodCollection::default();
    services
        .add(ServiceMethod {
            name: "run".to_string(),
            recv: ArgType::plain("Service"),
            params: ArgType::plain("Params"),
            result: ArgType::plain("Out"),
            api: MethodApi {
                url: "/run".to_string(),
                http_method: "GET".to_string(),
                auth: false,
            },
            pos: pos.clone(),
        })
        .unwrap();
    let mut params = ParamFieldCollection::default();
    params.reference("Params", &pos);
    params
        .resolve(
            "Params",
            vec![ParamField {
                name: "ratio".to_string(),
                kind,
                rules: RuleSet::parse(rules).unwrap(),
                pos: Position::new("api.rs", 7, 5),
            }],
            &pos,
        )
        .unwrap();
    ApiPackage {
        package_name: "service".to_string(),
        services,
        params,
    }
}

#[test]
fn test_unsupported_rule_is_an_error() {
    let err = gen_code(&hand_built("enum=1|2", Kind::Float32)).unwrap_err();
    match err {
        GenerationError::Unsupported { pos, message } => {
            assert_eq!(pos, Position::new("api.rs", 7, 5));
            assert_eq!(message, "Params.ratio: enum rule not applicable for float32 type");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_float32_is_rendered() {
    let code = gen_code(&hand_built("default=0.5,<1", Kind::Float32)).unwrap();
    assert!(code.contains("ratio: Option<f32>,"));
    assert!(code.contains("self.ratio = shadow.ratio.unwrap_or(0.5);"));
    assert!(code.contains("self.ratio = 0.5;"));
    assert!(code.contains("s.parse::<f32>().map_err(|_| \"ratio must be float32\".to_string())?;"));
    assert!(code.contains("if !(self.ratio < 1.0) {"));
    syn::parse_file(&code).unwrap();
}
