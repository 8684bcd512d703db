mod cli;

use admin_console::{AdminConsole, ConsoleConfig};
use anyhow::Context;
use clap::Parser;
use cli::app::App;
use std::{fs::OpenOptions, path::Path, path::PathBuf, sync::Mutex};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "admin-console", version, about = "Terminal admin console for the restaurant API")]
struct Args {
    /// API base URL, overrides ADMIN_API_URL
    #[arg(long)]
    base_url: Option<String>,

    /// Collection shown first (ingredients, roles, users, menus)
    #[arg(long, default_value = "ingredients")]
    resource: String,

    /// Log destination; the terminal belongs to the UI
    #[arg(long, default_value = "admin-console.log")]
    log_file: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(&args.log_file)?;

    let mut config = ConsoleConfig::from_env().context("read console configuration")?;
    if let Some(base_url) = &args.base_url {
        config = config.base_url(base_url);
    }

    tracing::info!(base_url = %config.base_url, "admin console starting");
    let console = AdminConsole::connect(config).context("build HTTP transport")?;

    let mut app = App::new(&console, &args.resource);
    app.run().await?;
    Ok(())
}

fn init_tracing(path: &Path) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file '{}'", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("admin_console=info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
