use anyhow::Context;
use lovebird::domain::config::AppConfig;
use lovebird::kernel::config::load_config;
use lovebird_logger::{ConsoleFormat, Logger};
use lovebird_server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log = Logger::builder().name(env!("CARGO_PKG_NAME")).console_format(ConsoleFormat::from_env()).init()?;

    let cfg: AppConfig = load_config(None::<&str>).context("Critical: Configuration is malformed")?;

    Server::builder().config(cfg).build()?.run().await
}
