use std::process::ExitCode;

fn main() -> ExitCode {
    harborcall_cli::run()
}
