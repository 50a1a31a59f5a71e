// schemadrift-cli/src/cli.rs

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "schemadrift")]
#[command(about = "Schemadrift - audit and repair index drift between two MongoDB databases")]
#[command(version)]
pub struct Cli {
    /// Connection string of the source deployment
    #[arg(env = "SCHEMADRIFT_SOURCE_URI", long, default_value = "mongodb://localhost:27017")]
    pub source_uri: String,

    /// Connection string of the target deployment
    #[arg(env = "SCHEMADRIFT_TARGET_URI", long, default_value = "mongodb://localhost:27017")]
    pub target_uri: String,

    /// Source database name
    #[arg(env = "SCHEMADRIFT_SOURCE_DB", long, default_value = "source-db")]
    pub source_db: String,

    /// Target database name
    #[arg(env = "SCHEMADRIFT_TARGET_DB", long, default_value = "target-db")]
    pub target_db: String,

    /// Count filter for the source side (extended JSON)
    #[arg(env = "SCHEMADRIFT_SOURCE_FILTER", long, default_value = "{}")]
    pub source_filter: String,

    /// Count filter for the target side (extended JSON)
    #[arg(env = "SCHEMADRIFT_TARGET_FILTER", long, default_value = "{}")]
    pub target_filter: String,

    /// Only print mismatches and repair actions
    #[arg(env = "SCHEMADRIFT_HIDE_MATCHING", long)]
    pub hide_matching: bool,

    /// Drop and create indexes on the target until it matches the source
    #[arg(env = "SCHEMADRIFT_FORCE_CREATE_INDEX", long)]
    pub force_create_index: bool,

    /// Do not compare document counts
    #[arg(env = "SCHEMADRIFT_SKIP_COUNTS", long)]
    pub skip_counts: bool,

    /// Deadline for the whole run, in seconds
    #[arg(env = "SCHEMADRIFT_TIMEOUT_SECS", long, default_value_t = 60)]
    pub timeout_secs: u64,

    /// Log filter used when RUST_LOG is not set
    #[arg(env = "SCHEMADRIFT_LOG_LEVEL", long, default_value = "info")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["schemadrift"]).unwrap();
        assert_eq!(cli.source_uri, "mongodb://localhost:27017");
        assert_eq!(cli.target_uri, "mongodb://localhost:27017");
        assert_eq!(cli.source_db, "source-db");
        assert_eq!(cli.target_db, "target-db");
        assert_eq!(cli.source_filter, "{}");
        assert!(!cli.hide_matching);
        assert!(!cli.force_create_index);
        assert!(!cli.skip_counts);
        assert_eq!(cli.timeout_secs, 60);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "schemadrift",
            "--source-db",
            "prod",
            "--target-filter",
            r#"{"active": true}"#,
            "--hide-matching",
            "--force-create-index",
            "--timeout-secs",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.source_db, "prod");
        assert_eq!(cli.target_filter, r#"{"active": true}"#);
        assert!(cli.hide_matching);
        assert!(cli.force_create_index);
        assert_eq!(cli.timeout_secs, 5);
    }

    #[test]
    fn test_rejects_bad_timeout() {
        assert!(Cli::try_parse_from(["schemadrift", "--timeout-secs", "soon"]).is_err());
    }
}
