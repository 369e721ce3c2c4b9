use std::process::ExitCode;

fn main() -> ExitCode {
    match apigen::cli::run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("apigen: {err:#}");
            ExitCode::FAILURE
        }
    }
}
