use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use proc_macro2::Span;
use syn::spanned::Spanned;
use syn::{Expr, ExprLit, Lit, Meta};
use tracing::{debug, info};

use super::types::Position;
use crate::error::ParseError;

/// File name suffix of generated units, never read back as input.
pub const GENERATED_SUFFIX: &str = "_apigen.rs";

/// Inner doc marker naming the package of a file: `//! apigen:package users`.
pub const PACKAGE_MARKER: &str = "apigen:package";

/// One parsed input file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub package: String,
    /// Where the package name was declared (`1:1` when derived from the directory).
    pub package_pos: Position,
    pub syntax: syn::File,
}

impl SourceFile {
    /// Parse `source` as the content of `path`.
    ///
    /// Files without a package marker belong to `default_package`.
    pub fn parse(
        path: impl Into<PathBuf>,
        source: &str,
        default_package: &str,
    ) -> Result<Self, ParseError> {
        let path = path.into();
        let display = path.display().to_string();
        let syntax = syn::parse_file(source)
            .map_err(|e| ParseError::new(span_position(&display, e.span()), e.to_string()))?;

        let mut file = SourceFile {
            path,
            package: default_package.to_string(),
            package_pos: Position::new(display, 1, 1),
            syntax,
        };
        if let Some((name, span)) = package_marker(&file.syntax) {
            let pos = file.position(span);
            if !is_identifier(&name) {
                return Err(ParseError::new(
                    pos,
                    format!("{PACKAGE_MARKER}: invalid package name {name:?}"),
                ));
            }
            file.package = name;
            file.package_pos = pos;
        }
        Ok(file)
    }

    /// Read and parse the file at `path`.
    pub fn read(path: &Path, default_package: &str) -> anyhow::Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("can't read {}", path.display()))?;
        Ok(SourceFile::parse(path, &source, default_package)?)
    }

    /// Position of `span` within this file.
    pub fn position(&self, span: Span) -> Position {
        span_position(&self.path.display().to_string(), span)
    }
}

fn span_position(file: &str, span: Span) -> Position {
    let start = span.start();
    Position::new(file, start.line, start.column + 1)
}

fn package_marker(file: &syn::File) -> Option<(String, Span)> {
    file.attrs
        .iter()
        .filter(|a| a.path().is_ident("doc"))
        .find_map(|attr| {
            let Meta::NameValue(nv) = &attr.meta else {
                return None;
            };
            let Expr::Lit(ExprLit {
                lit: Lit::Str(doc), ..
            }) = &nv.value
            else {
                return None;
            };
            let doc = doc.value();
            let name = doc.trim().strip_prefix(PACKAGE_MARKER)?;
            Some((name.trim().to_string(), attr.span()))
        })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Positional inputs resolved to one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inputs {
    pub dir: PathBuf,
    /// File names selected within `dir`; empty selects every file.
    pub files: Vec<String>,
}

/// Resolve positional arguments: a single directory, or files that all
/// live in the same directory.
pub fn parse_args(args: &[PathBuf]) -> anyhow::Result<Inputs> {
    let mut dir: Option<PathBuf> = None;
    let mut files = Vec::new();

    for fp in args {
        let meta = match fs::metadata(fp) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                bail!("{} file not found", fp.display())
            }
            Err(e) => return Err(e).with_context(|| format!("can't stat {}", fp.display())),
        };

        if meta.is_dir() {
            if dir.is_some() {
                bail!("directory must be one");
            }
            dir = Some(fp.clone());
            continue;
        }

        let file_dir = match fp.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        match &dir {
            None => dir = Some(file_dir),
            Some(d) if *d != file_dir => bail!("all files must be in the same directory"),
            Some(_) => {}
        }
        if let Some(name) = fp.file_name() {
            files.push(name.to_string_lossy().into_owned());
        }
    }

    let Some(dir) = dir else {
        bail!("no source directory or files given");
    };
    Ok(Inputs { dir, files })
}

/// Source files of `inputs` in path order, without generated units.
pub fn discover(inputs: &Inputs) -> anyhow::Result<Vec<PathBuf>> {
    let entries = fs::read_dir(&inputs.dir)
        .with_context(|| format!("can't read directory {}", inputs.dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("can't read directory {}", inputs.dir.display()))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.ends_with(".rs") || name.ends_with(GENERATED_SUFFIX) {
            continue;
        }
        if !inputs.files.is_empty() && !inputs.files.contains(&name) {
            continue;
        }
        if entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            paths.push(inputs.dir.join(name));
        }
    }
    paths.sort();
    Ok(paths)
}

/// Package name of files without a marker: the name of their directory.
pub fn default_package_name(dir: &Path) -> String {
    let resolved = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    resolved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Parse every input file and select one package.
///
/// # Arguments
///
/// * `inputs` - Resolved positional arguments
/// * `package` - Package requested with `-p`, required when more than one is found
///
/// # Errors
///
/// Fails on unreadable or unparsable files and when no single package can be
/// selected.
pub fn load_package(inputs: &Inputs, package: Option<&str>) -> anyhow::Result<Vec<SourceFile>> {
    let default_package = default_package_name(&inputs.dir);

    let mut packages: BTreeMap<String, Vec<SourceFile>> = BTreeMap::new();
    for path in discover(inputs)? {
        let file = SourceFile::read(&path, &default_package)?;
        debug!(file = %path.display(), package = %file.package, "PARSED file");
        packages.entry(file.package.clone()).or_default().push(file);
    }
    info!(dir = %inputs.dir.display(), packages = packages.len(), "FOUND packages");

    if packages.is_empty() {
        bail!("no package was detected");
    }
    let available = packages.keys().cloned().collect::<Vec<_>>().join(", ");

    match package.filter(|p| !p.is_empty()) {
        Some(p) => match packages.remove(p) {
            Some(files) => Ok(files),
            None => bail!("{p} package not found. available: {available}"),
        },
        None if packages.len() > 1 => bail!(
            "detected more than one package: {available}. please select one of them with -p"
        ),
        None => Ok(packages.into_values().next().unwrap_or_default()),
    }
}

/// All files of the single package in `dir`.
pub fn load_dir(dir: &Path) -> anyhow::Result<Vec<SourceFile>> {
    let inputs = Inputs {
        dir: dir.to_path_buf(),
        files: Vec::new(),
    };
    load_package(&inputs, None)
}
