use std::path::Path;
use std::{env, fs};

use apigen::spec::{load_dir, parse_files, GENERATED_SUFFIX};

fn main() -> anyhow::Result<()> {
    let dir = Path::new("src/service");
    println!("cargo:rerun-if-changed={}", dir.display());

    let files = load_dir(dir)?;
    let package = parse_files(&files)?;
    let code = apigen::gen_code(&package)?;

    let out = Path::new(&env::var("OUT_DIR")?)
        .join(format!("{}{GENERATED_SUFFIX}", package.package_name));
    fs::write(out, code)?;
    Ok(())
}
