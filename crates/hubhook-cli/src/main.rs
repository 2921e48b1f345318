use hubhook_cli::run_cli;
use tracing::error;

fn main() {
    if let Err(e) = run_cli() {
        error!("CLI error: {}", e);

        std::process::exit(e.exit_code());
    }
}
