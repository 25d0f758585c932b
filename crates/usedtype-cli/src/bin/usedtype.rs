use clap::Parser;
use std::process::ExitCode;
use usedtype_cli::CliArgs;

fn main() -> ExitCode {
    // Exit 1 on usage errors; clap's default would be 2, which this tool
    // reserves for load errors.
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(if e.use_stderr() { 1 } else { 0 });
        }
    };
    ExitCode::from(usedtype_cli::run(&args))
}
