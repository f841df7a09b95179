use patch_manifest::cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    match cli::run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            for cause in err.chain().skip(1) {
                eprintln!("Caused by: {}", cause);
            }
            ExitCode::FAILURE
        }
    }
}
