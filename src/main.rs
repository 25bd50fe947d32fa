use std::process::ExitCode;

fn main() -> ExitCode {
    classmap::cli::run()
}
