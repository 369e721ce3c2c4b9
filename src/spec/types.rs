use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::error::ParseError;
use crate::validator::RuleSet;

/// Sentinel HTTP method matching any verb not otherwise handled for a path.
pub const ANY_HTTP_METHOD: &str = "*";

/// Location of a declaration in its source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    pub file: String,
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub column: usize,
}

impl Position {
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Position {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Inline JSON carried by the `apigen:api` doc marker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MethodApi {
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "method")]
    pub http_method: String,
    #[serde(default)]
    pub auth: bool,
}

impl MethodApi {
    pub fn is_any_method(&self) -> bool {
        self.http_method == ANY_HTTP_METHOD
    }
}

/// A named type, optionally taken through a pointer (`&mut self`, `&T`, `Box<T>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgType {
    pub name: String,
    pub is_pointer: bool,
}

impl ArgType {
    pub fn plain(name: impl Into<String>) -> Self {
        ArgType {
            name: name.into(),
            is_pointer: false,
        }
    }

    pub fn pointer(name: impl Into<String>) -> Self {
        ArgType {
            name: name.into(),
            is_pointer: true,
        }
    }
}

/// An annotated handler method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceMethod {
    pub name: String,
    pub recv: ArgType,
    pub params: ArgType,
    pub result: ArgType,
    pub api: MethodApi,
    pub pos: Position,
}

/// Annotated methods grouped by receiver type.
#[derive(Debug, Clone, Default)]
pub struct ServiceMethodCollection {
    items: BTreeMap<String, Vec<ServiceMethod>>,
    method_count: usize,
}

impl ServiceMethodCollection {
    /// Add a method, rejecting a second handler for the same route or name on
    /// the same receiver.
    pub fn add(&mut self, m: ServiceMethod) -> Result<(), ParseError> {
        let methods = self.items.entry(m.recv.name.clone()).or_default();
        for other in methods.iter() {
            if other.name == m.name {
                return Err(ParseError::new(
                    m.pos.clone(),
                    format!("{}.{}: duplicate method", m.recv.name, m.name),
                ));
            }
            if other.api.url == m.api.url && other.api.http_method == m.api.http_method {
                return Err(ParseError::new(
                    m.pos.clone(),
                    format!(
                        "duplicate HTTP method {} {} (already handled by {}.{})",
                        m.api.http_method, m.api.url, other.recv.name, other.name
                    ),
                ));
            }
        }
        methods.push(m);
        self.method_count += 1;
        Ok(())
    }

    /// Receiver names in sorted order with their methods in scan order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ServiceMethod])> {
        self.items.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn get(&self, recv: &str) -> Option<&[ServiceMethod]> {
        self.items.get(recv).map(Vec::as_slice)
    }

    pub fn service_count(&self) -> usize {
        self.items.len()
    }

    pub fn method_count(&self) -> usize {
        self.method_count
    }
}

/// Scalar kind of a bindable parameter field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    String,
    Int,
    Float32,
    Float64,
}

impl Kind {
    /// Map a declared Rust type name to a kind accepted by the scanner.
    ///
    /// `f32` is deliberately absent: the emitter can render it but declarations
    /// cannot request it.
    pub fn from_type_name(name: &str) -> Option<Kind> {
        match name {
            "String" => Some(Kind::String),
            "i64" => Some(Kind::Int),
            "f64" => Some(Kind::Float64),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Int => "int",
            Kind::Float32 => "float32",
            Kind::Float64 => "float64",
        }
    }

    /// Rust type used in emitted code.
    pub fn rust_type(self) -> &'static str {
        match self {
            Kind::String => "String",
            Kind::Int => "i64",
            Kind::Float32 => "f32",
            Kind::Float64 => "f64",
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, Kind::String)
    }

    /// Floats are excluded: equality against a decimal literal is not reliable.
    pub fn supports_enum(self) -> bool {
        matches!(self, Kind::String | Kind::Int)
    }

    /// Render `raw` as a Rust literal of this kind.
    ///
    /// Strings become quoted literals; numbers are normalized so the literal
    /// infers to the field type (`0` on a float field renders as `0.0`).
    pub fn literal(self, raw: &str) -> Result<String, String> {
        let invalid = || format!("{:?} is not a valid {} literal", raw, self);
        match self {
            Kind::String => Ok(format!("{raw:?}")),
            Kind::Int => raw
                .parse::<i64>()
                .map(|v| v.to_string())
                .map_err(|_| invalid()),
            Kind::Float32 => match raw.parse::<f32>() {
                Ok(v) if v.is_finite() => Ok(format!("{v:?}")),
                _ => Err(invalid()),
            },
            Kind::Float64 => match raw.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(format!("{v:?}")),
                _ => Err(invalid()),
            },
        }
    }

    /// Render the operand of a min/max/greater/less rule.
    ///
    /// Strings are bounded by their length, so the operand must be a length.
    pub fn bound(self, raw: &str) -> Result<String, String> {
        match self {
            Kind::String => raw
                .parse::<usize>()
                .map(|v| v.to_string())
                .map_err(|_| format!("{raw:?} is not a valid string length")),
            _ => self.literal(raw),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A bindable field of a parameter struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamField {
    /// Field name as written in Rust, `r#` prefix included.
    pub name: String,
    pub kind: Kind,
    pub rules: RuleSet,
    pub pos: Position,
}

impl ParamField {
    /// External binding key: the `paramname` override or the lower-cased
    /// field name without its raw-identifier prefix.
    pub fn api_param_name(&self) -> String {
        match self.rules.param_name() {
            Some(name) => name.to_string(),
            None => self.unraw_name().to_lowercase(),
        }
    }

    pub fn unraw_name(&self) -> &str {
        self.name.strip_prefix("r#").unwrap_or(&self.name)
    }
}

/// Resolution state of a parameter struct name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructState {
    /// Never referenced by a method.
    Unseen,
    /// Referenced by a method, declaration not found yet.
    Unresolved { referenced_at: Position },
    Resolved(Vec<ParamField>),
}

static UNSEEN: StructState = StructState::Unseen;

/// Parameter structs keyed by type name.
#[derive(Debug, Clone, Default)]
pub struct ParamFieldCollection {
    items: BTreeMap<String, StructState>,
    field_count: usize,
}

impl ParamFieldCollection {
    /// Mark `name` as referenced. The first reference is kept for diagnostics.
    pub fn reference(&mut self, name: &str, pos: &Position) {
        self.items
            .entry(name.to_string())
            .or_insert_with(|| StructState::Unresolved {
                referenced_at: pos.clone(),
            });
    }

    pub fn state(&self, name: &str) -> &StructState {
        self.items.get(name).unwrap_or(&UNSEEN)
    }

    pub fn contains(&self, name: &str) -> bool {
        !matches!(self.state(name), StructState::Unseen)
    }

    /// Attach the scanned fields of a referenced struct.
    pub fn resolve(
        &mut self,
        name: &str,
        fields: Vec<ParamField>,
        pos: &Position,
    ) -> Result<(), ParseError> {
        match self.items.get_mut(name) {
            Some(state @ StructState::Unresolved { .. }) => {
                self.field_count += fields.len();
                *state = StructState::Resolved(fields);
                Ok(())
            }
            Some(StructState::Resolved(_)) => Err(ParseError::new(
                pos.clone(),
                format!("{name}: param struct declared more than once"),
            )),
            _ => Err(ParseError::new(
                pos.clone(),
                format!("{name}: param struct is not referenced by any method"),
            )),
        }
    }

    /// The first referenced struct still lacking a declaration.
    pub fn first_unresolved(&self) -> Option<(&str, &Position)> {
        self.items.iter().find_map(|(name, state)| match state {
            StructState::Unresolved { referenced_at } => Some((name.as_str(), referenced_at)),
            _ => None,
        })
    }

    /// Resolved structs in sorted order.
    pub fn resolved(&self) -> impl Iterator<Item = (&str, &[ParamField])> {
        self.items.iter().filter_map(|(name, state)| match state {
            StructState::Resolved(fields) => Some((name.as_str(), fields.as_slice())),
            _ => None,
        })
    }

    pub fn struct_count(&self) -> usize {
        self.items.len()
    }

    pub fn field_count(&self) -> usize {
        self.field_count
    }
}

/// The assembled IR of one package.
#[derive(Debug, Clone, Default)]
pub struct ApiPackage {
    pub package_name: String,
    pub services: ServiceMethodCollection,
    pub params: ParamFieldCollection,
}
