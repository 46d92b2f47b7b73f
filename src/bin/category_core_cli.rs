use std::process;

use category_core::cli::{output, run_cli, CliError};
use category_core::init;

fn main() {
    init();

    if let Err(err) = run_cli() {
        output::error(&err);
        match err {
            CliError::UnknownCommand {
                suggestion: Some(best),
                ..
            } => output::info(format!("Suggestion: `{}`?", best)),
            CliError::Usage(_) | CliError::UnknownCommand { .. } => {
                output::info("Run `category_core_cli help` for usage.")
            }
            _ => {}
        }
        process::exit(1);
    }
}
