use std::process::ExitCode;

fn main() -> ExitCode {
    cardwise_cli::run()
}
