#[path = "quizbench/app/mod.rs"]
mod app;
#[path = "quizbench/args.rs"]
mod args;
#[path = "quizbench/config/mod.rs"]
mod config;
#[path = "quizbench/logging.rs"]
mod logging;
#[path = "quizbench/menu.rs"]
mod menu;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
