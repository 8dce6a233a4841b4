use anyhow::Result;
use chess_cli::{app, AppConfig, Args};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = AppConfig::load(args.config.as_deref())?.with_overrides(&args);

    // 初始化日志
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in config.log_filter.split(',').filter(|d| !d.trim().is_empty()) {
        filter = filter.add_directive(directive.trim().parse()?);
    }
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    app::run(&args, &config).await
}
