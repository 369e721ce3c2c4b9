#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

pub const API: &str = r#"
use http::Extensions;

pub struct Service;

impl Service {
    /// apigen:api {"url": "/users", "method": "POST"}
    pub fn create(&mut self, ctx: &Extensions, params: CreateUser) -> Result<NewUser, ApiError> {
        todo!()
    }

    /// apigen:api {"url": "/users", "method": "DELETE", "auth": true}
    pub fn delete(&mut self, ctx: &Extensions, params: &DeleteUser) -> Result<Box<Deleted>, ApiError> {
        todo!()
    }
}
"#;

pub const MODEL: &str = r#"
#[derive(Default)]
pub struct CreateUser {
    #[apivalidator = "required"]
    pub name: String,
    #[apivalidator = "default=0,>=0"]
    pub skill: f64,
}

#[derive(Default)]
pub struct DeleteUser {
    #[apivalidator = "required,>0"]
    pub id: i64,
    #[apivalidator = "-"]
    pub trace: Vec<String>,
}
"#;

/// A temporary `service` source directory holding `files`.
pub fn source_dir(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("service");
    fs::create_dir(&dir).unwrap();
    for (name, content) in files {
        fs::write(dir.join(name), content).unwrap();
    }
    (tmp, dir)
}
