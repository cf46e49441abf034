use std::process::ExitCode;

fn main() -> ExitCode {
    renewal_cli::run()
}
