use std::process::ExitCode;

fn main() -> ExitCode {
    caredesk_cli::run()
}
