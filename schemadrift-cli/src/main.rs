// schemadrift-cli/src/main.rs

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use schemadrift_core::report::{comparison_header, fetching_line, render_collection};
use schemadrift_core::{AuditOptions, AuditSummary, Auditor};

mod cli;
mod mongo;

use cli::Cli;
use mongo::{json_to_document, MongoDriver};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .with_context(|| format!("Invalid log filter: {}", cli.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let options = AuditOptions {
        source_filter: parse_filter(&cli.source_filter).context("Invalid --source-filter")?,
        target_filter: parse_filter(&cli.target_filter).context("Invalid --target-filter")?,
        compare_counts: !cli.skip_counts,
        repair: cli.force_create_index,
    };

    let deadline = Duration::from_secs(cli.timeout_secs);
    let summary = with_deadline(deadline, run(&cli, options)).await?;

    if summary.actions_failed > 0 {
        tracing::warn!(failed = summary.actions_failed, "Some repair actions failed");
    }
    Ok(())
}

/// Bound a whole run by one deadline; expiry is fatal
async fn with_deadline<T>(deadline: Duration, run: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(deadline, run)
        .await
        .map_err(|_| anyhow!("Run did not finish within {}s", deadline.as_secs()))?
}

/// Connect both sides and print the report as collections are audited
async fn run(cli: &Cli, options: AuditOptions) -> Result<AuditSummary> {
    let source = MongoDriver::connect(&cli.source_uri, &cli.source_db)
        .await
        .with_context(|| format!("Failed to connect to source database '{}'", cli.source_db))?;
    let target = MongoDriver::connect(&cli.target_uri, &cli.target_db)
        .await
        .with_context(|| format!("Failed to connect to target database '{}'", cli.target_db))?;

    println!("{}", fetching_line(&cli.source_db, &cli.target_db));

    let auditor = Auditor::new(&source, &target, options);
    let collections = auditor
        .collections()
        .await
        .context("Failed to list collections")?;

    let options = auditor.options();
    for line in comparison_header(
        &cli.source_db,
        &options.source_filter,
        &cli.target_db,
        &options.target_filter,
    ) {
        println!("{}", line);
    }

    let hide_matching = cli.hide_matching;
    let summary = auditor
        .audit_all(&collections, |report| {
            for line in render_collection(report, hide_matching) {
                println!("{}", line);
            }
        })
        .await;

    Ok(summary)
}

/// Parse a count filter given as extended JSON
fn parse_filter(raw: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(raw).with_context(|| format!("Not valid JSON: {}", raw))?;
    if !value.is_object() {
        bail!("Filter must be a JSON object: {}", raw);
    }
    json_to_document(&value)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_filter() {
        assert_eq!(parse_filter("{}").unwrap(), json!({}));
        assert_eq!(
            parse_filter(r#"{"created": {"$gte": {"$date": "2024-01-01T00:00:00Z"}}}"#).unwrap(),
            json!({"created": {"$gte": {"$date": "2024-01-01T00:00:00Z"}}})
        );
    }

    #[tokio::test]
    async fn test_deadline_expiry_is_fatal() {
        let stalled = std::future::pending::<Result<AuditSummary>>();
        let err = with_deadline(Duration::ZERO, stalled).await.unwrap_err();
        assert_eq!(err.to_string(), "Run did not finish within 0s");
    }

    #[tokio::test]
    async fn test_deadline_passes_result_through() {
        let done = async { Ok(AuditSummary::default()) };
        let summary = with_deadline(Duration::from_secs(5), done).await.unwrap();
        assert!(summary.is_clean());

        let failed = async { Err::<AuditSummary, _>(anyhow!("Failed to list collections")) };
        assert!(with_deadline(Duration::from_secs(5), failed).await.is_err());
    }

    #[test]
    fn test_parse_filter_rejects_garbage() {
        assert!(parse_filter("{status: ").is_err());
        assert!(parse_filter("[1]").is_err());
        assert!(parse_filter(r#"{"_id": {"$oid": "nope"}}"#).is_err());
    }
}
