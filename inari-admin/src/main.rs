use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use inari_admin::{tracing::init_tracing_logs, AdminServer, DataDir, PersistentDataDir};

#[derive(Parser, Debug)]
struct Cli {
    /// Data directory holding `config.toml` and stored sessions.
    #[clap(long, default_value = "~/.inari")]
    data_dir: PathBuf,
    /// [tracing_subscriber::EnvFilter]. Overrides `RUST_LOG` and the `[logging]` config.
    #[clap(short, long)]
    tracing_env_filter: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let data_dir = PersistentDataDir::new(args.data_dir);

    match args.tracing_env_filter {
        Some(filter) => tracing_subscriber::fmt().with_env_filter(filter).init(),
        None => init_tracing_logs(data_dir.path())?,
    }

    let server = AdminServer::from_data_dir_path(data_dir.path().to_path_buf()).await?;
    tracing::info!(
        "Inari admin v{} running on http://{}",
        env!("CARGO_PKG_VERSION"),
        server.listen_socket()
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    drop(server);

    Ok(())
}
