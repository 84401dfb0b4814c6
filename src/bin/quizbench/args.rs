use clap::Parser;
use std::path::PathBuf;

use crate::menu::Mode;

#[derive(Parser, Debug)]
#[command(
    name = "quizbench",
    about = "Generate quiz questions with a chat-completions model and benchmark answering them"
)]
pub struct CliArgs {
    /// Config file; defaults to ~/.config/quizbench/config.toml
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
    /// Run mode 1, 2 or 3 without showing the menu
    #[arg(long, short = 'm', value_parser = clap::value_parser!(u8).range(1..=3))]
    pub mode: Option<u8>,
    /// Number of questions to answer
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
    /// In-flight request cap for mode 3
    #[arg(long)]
    pub concurrency: Option<usize>,
    /// Record failed answers and keep going instead of stopping the batch
    #[arg(long)]
    pub continue_on_error: bool,
}

impl CliArgs {
    pub fn mode(&self) -> Option<Mode> {
        self.mode.and_then(Mode::from_number)
    }
}
