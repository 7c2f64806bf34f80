use report_core::{cli::run_cli, init};

fn main() {
    init();

    if let Err(err) = run_cli() {
        report_core::cli::output::error(&err);
        std::process::exit(1);
    }
}
