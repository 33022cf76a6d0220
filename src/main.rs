// src/main.rs

use batchdag::{cli, logging};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    if let Err(e) = logging::init_logging(args.debug) {
        eprintln!("failed to initialise logging: {e}");
        std::process::exit(1);
    }

    let exit = batchdag::run(args).await;
    std::process::exit(exit.code());
}
