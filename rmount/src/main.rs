use std::process::ExitCode;

fn main() -> ExitCode {
    match rmount::run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
