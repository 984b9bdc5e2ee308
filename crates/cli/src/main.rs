use std::process::ExitCode;

fn main() -> ExitCode {
    stockcast_cli::run()
}
