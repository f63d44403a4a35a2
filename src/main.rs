use anyhow::Result;
use clap::Parser;
use log::info;

use binsight::{server, AppState, BuiltinModel, Classifier, ModelManager, ServerConfig};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on (overrides the PORT environment variable)
    #[arg(short, long)]
    port: Option<u16>,

    /// Force a fresh download of the model artifacts
    #[arg(long)]
    fresh: bool,

    /// Download and verify the model artifacts, then exit without serving
    #[arg(long)]
    download_only: bool,
}

async fn ensure_model_downloaded(fresh: bool) -> Result<()> {
    let manager = ModelManager::new_default()?;
    let model = BuiltinModel::WasteSiglip;

    if fresh {
        info!("Fresh download requested - removing any existing model artifacts...");
        manager.remove_download(model)?;
    }

    manager.ensure_model_downloaded(model).await?;
    Ok(())
}

/// Downloads the artifacts and builds the classifier. Any failure here,
/// including a failed download, leaves the server running in the degraded
/// `ModelState::Failed` state rather than aborting the process.
async fn load_classifier(fresh: bool) -> Result<Classifier> {
    ensure_model_downloaded(fresh).await?;
    let classifier = Classifier::builder()
        .with_model(BuiltinModel::WasteSiglip)?
        .build()?;
    Ok(classifier)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.download_only {
        ensure_model_downloaded(args.fresh).await?;
        info!("Model artifacts downloaded and verified");
        return Ok(());
    }

    let mut config = ServerConfig::from_env();
    if let Some(port) = args.port {
        config.port = port;
    }

    info!("Loading waste classifier, please wait...");
    let state = AppState::from_load_outcome(load_classifier(args.fresh).await, config);

    server::serve(state).await
}
