// src/main.rs

use scriptmon::{cli, logging, log_target, resolve_config, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("scriptmon error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    let cfg = resolve_config(&args)?;
    logging::init_logging(args.log_level, log_target(&args, &cfg))?;
    run(args, cfg).await
}
