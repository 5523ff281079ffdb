use std::time::Duration;

use clap::Args;
use serde_json::json;

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::config::config;
use crate::state::Backends;

#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    #[arg(long, help = "Sync a single member by id")]
    pub member: Option<String>,

    #[arg(long, help = "Members in flight at once (defaults to the configured value)")]
    pub concurrency: Option<usize>,

    #[arg(long = "interval-ms", help = "Minimum delay between member starts, in milliseconds")]
    pub interval_ms: Option<u64>,
}

pub async fn handle(args: SyncArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config();
    let backends = Backends::from_config(config).await;

    let batch = backends
        .batch_sync(config)
        .with_concurrency(args.concurrency.unwrap_or(config.sync.concurrency))
        .with_pace(Duration::from_millis(args.interval_ms.unwrap_or(config.sync.interval_ms)));

    match args.member {
        Some(member_id) => match batch.run_one(&member_id).await {
            Ok(outcome) => output_success(
                &output_format,
                &format!("Synced member {}", member_id),
                Some(json!({ "member_id": member_id, "outcome": outcome })),
            ),
            Err(e) => {
                output_error(&output_format, &e.to_string(), Some("SYNC_FAILED"))?;
                Err(e.into())
            }
        },
        None => {
            let report = batch.run().await?;
            output_success(
                &output_format,
                &format!("Synced {} of {} members", report.total - report.failed, report.total),
                Some(serde_json::to_value(&report)?),
            )?;
            if report.failed > 0 {
                anyhow::bail!("{} members failed to sync", report.failed);
            }
            Ok(())
        }
    }
}
