//! Plays a dialogue asset in the terminal.

mod config;
mod terminal;

use std::{path::PathBuf, str::FromStr};

use clap::Parser;
use common_store::BundledDialog;
use common_story::{DialogueGraph, Player};
use config::Config;
use miette::{IntoDiagnostic, WrapErr};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "story-player", version, about)]
struct Cli {
    /// A .json, .ron or .toml asset, or the name of a bundled dialogue
    /// such as "crossroads".
    asset: String,
    /// TOML file with the log filter, prompt and property overrides.
    #[arg(long, short)]
    config: Option<PathBuf>,
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Cannot read '{}'", path.display()))?,
        None => Config::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .with_writer(std::io::stderr)
        .init();

    let mut graph = load_graph(&cli.asset)?;
    for (name, value) in &config.properties {
        graph
            .set_property_value(name, value.clone())
            .into_diagnostic()
            .wrap_err("Cannot override property")?;
    }

    let mut player = Player::new(graph).into_diagnostic()?;
    let outcome = terminal::run(
        &mut player,
        std::io::stdin().lock(),
        std::io::stdout().lock(),
        &config.prompt,
    )
    .into_diagnostic()?;

    info!("Finished with {outcome:?}");
    Ok(())
}

fn load_graph(asset: &str) -> miette::Result<DialogueGraph> {
    if let Ok(dialog) = BundledDialog::from_str(asset) {
        debug!("Playing bundled {}", dialog.path());
        return dialog.parse().into_diagnostic();
    }

    common_store::load(asset)
        .into_diagnostic()
        .wrap_err_with(|| format!("Cannot load '{asset}'"))
}
