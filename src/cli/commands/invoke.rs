use std::path::PathBuf;

use clap::Args;
use serde_json::Value;

use crate::api::handle_event;
use crate::config::config;
use crate::state::{AppState, Backends};

#[derive(Args, Debug, Clone)]
pub struct InvokeArgs {
    #[arg(long, help = "Path to a JSON proxy event")]
    pub event: PathBuf,
}

pub async fn handle(args: InvokeArgs) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(&args.event)
        .await
        .map_err(|e| anyhow::anyhow!("failed to read {}: {}", args.event.display(), e))?;
    let event: Value = serde_json::from_str(&raw)?;

    let config = config();
    let backends = Backends::from_config(config).await;
    let state = AppState::new(config, &backends);

    let response = handle_event(&state.dispatcher, event).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
