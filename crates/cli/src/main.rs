use std::process::ExitCode;

fn main() -> ExitCode {
    pikabot_cli::run()
}
