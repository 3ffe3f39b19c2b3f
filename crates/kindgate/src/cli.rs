//! Command line and environment configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `KINDGATE_ES_URL` | http://localhost:9200 | Elasticsearch node URL(s), comma-separated |
//! | `KINDGATE_ES_USERNAME` | - | Basic auth username |
//! | `KINDGATE_ES_PASSWORD` | - | Basic auth password |
//! | `KINDGATE_ES_INSECURE` | false | Skip TLS certificate validation |
//! | `KINDGATE_LOG_LEVEL` | info | Log level |
//! | `KINDGATE_CONFIG` | - | JSON file with gateway settings |
//! | `KINDGATE_REQUEST_TIMEOUT_MS` | - | Overrides the per-call engine timeout |
//! | `KINDGATE_USER` | - | Requesting user |
//! | `KINDGATE_PARTITION` | - | Partition header, comma-separated |
//! | `KINDGATE_GROUPS` | - | Data groups, comma-separated |
//! | `KINDGATE_ROOT` | false | Skip the ACL filter |

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use kindgate_search::backends::elasticsearch::{ElasticsearchAuth, ElasticsearchConfig};
use kindgate_search::tenant::IdentityContext;
use kindgate_search::types::{KindPattern, QuerySpec, SortOrder, SortSpec};
use kindgate_search::GatewayConfig;

/// Kindgate search gateway.
#[derive(Debug, Clone, Parser)]
#[command(name = "kindgate")]
#[command(about = "Multi-tenant search gateway for Elasticsearch")]
pub struct Cli {
    /// Elasticsearch node URL(s), comma-separated.
    #[arg(long, env = "KINDGATE_ES_URL", default_value = "http://localhost:9200")]
    pub es_url: String,

    /// Elasticsearch basic auth username.
    #[arg(long, env = "KINDGATE_ES_USERNAME")]
    pub es_username: Option<String>,

    /// Elasticsearch basic auth password.
    #[arg(long, env = "KINDGATE_ES_PASSWORD", hide_env_values = true)]
    pub es_password: Option<String>,

    /// Skip TLS certificate validation. Development only.
    #[arg(long, env = "KINDGATE_ES_INSECURE", default_value = "false")]
    pub es_insecure: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "KINDGATE_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// JSON file with gateway settings.
    #[arg(long, env = "KINDGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Per-call engine timeout in milliseconds.
    #[arg(long, env = "KINDGATE_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,

    /// Requesting user.
    #[arg(long, env = "KINDGATE_USER")]
    pub user: String,

    /// Partition header, comma-separated (e.g. `tenant1,common`).
    #[arg(long, env = "KINDGATE_PARTITION")]
    pub partition: String,

    /// Data groups, comma-separated.
    #[arg(long, env = "KINDGATE_GROUPS", default_value = "")]
    pub groups: String,

    /// Treat the user as root (no ACL filter).
    #[arg(long, env = "KINDGATE_ROOT", default_value = "false")]
    pub root: bool,

    /// Correlation id attached to every log event.
    #[arg(long, env = "KINDGATE_CORRELATION_ID")]
    pub correlation_id: Option<String>,

    /// What to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Runs one offset query.
    Query(QueryArgs),
    /// Opens a cursor stream and walks it within this process.
    ///
    /// Cursors live in an in-process cache, so a token printed by one run is
    /// unknown to the next.
    Cursor(CursorArgs),
}

/// Arguments shared by every search.
#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    /// Kinds to search, comma-separated.
    pub kind: String,

    /// Free-text query.
    #[arg(short, long)]
    pub query: Option<String>,

    /// Page size.
    #[arg(short, long)]
    pub limit: Option<u32>,

    /// Sort keys as `field[:asc|desc]`, comma-separated.
    #[arg(long, value_parser = parse_sort)]
    pub sort: Option<SortSpec>,

    /// Fields to return, comma-separated.
    #[arg(long = "field", value_delimiter = ',')]
    pub returned_fields: Vec<String>,

    /// Field to aggregate by.
    #[arg(long)]
    pub aggregate_by: Option<String>,

    /// Filter on ownership instead of viewer access.
    #[arg(long)]
    pub as_owner: bool,

    /// Request an exact total count.
    #[arg(long)]
    pub track_total: bool,
}

/// `query` arguments.
#[derive(Debug, Clone, Args)]
pub struct QueryArgs {
    #[command(flatten)]
    pub search: SearchArgs,

    /// Offset of the first result.
    #[arg(long)]
    pub offset: Option<u32>,

    /// Search every partition of the user and merge the results.
    #[arg(long)]
    pub federated: bool,
}

/// `cursor` arguments.
#[derive(Debug, Clone, Args)]
pub struct CursorArgs {
    #[command(flatten)]
    pub search: SearchArgs,

    /// Maximum number of pages to fetch.
    #[arg(long, default_value = "3")]
    pub pages: usize,
}

fn parse_sort(raw: &str) -> Result<SortSpec, String> {
    let mut keys = raw.split(',').map(str::trim).filter(|k| !k.is_empty());
    let parse_key = |key: &str| -> Result<(String, SortOrder), String> {
        let (field, order) = match key.rsplit_once(':') {
            Some((field, order)) => (field, order),
            None => (key, "asc"),
        };
        let order = match order.to_ascii_lowercase().as_str() {
            "asc" => SortOrder::Asc,
            "desc" => SortOrder::Desc,
            other => return Err(format!("unknown sort order '{}'", other)),
        };
        Ok((field.to_string(), order))
    };

    let (field, order) = parse_key(keys.next().ok_or("sort must name a field")?)?;
    let mut sort = SortSpec::single(field, order);
    for key in keys {
        let (field, order) = parse_key(key)?;
        sort = sort.then(field, order);
    }
    Ok(sort)
}

impl SearchArgs {
    /// Builds the query spec these arguments describe.
    pub fn to_spec(&self) -> anyhow::Result<QuerySpec> {
        let kind = KindPattern::parse(&self.kind).context("invalid kind")?;
        let mut spec = QuerySpec::new(kind)
            .with_returned_fields(self.returned_fields.iter().cloned())
            .with_query_as_owner(self.as_owner)
            .with_track_total_count(self.track_total);
        if let Some(query) = &self.query {
            spec = spec.with_query(query.clone());
        }
        if let Some(limit) = self.limit {
            spec = spec.with_limit(limit);
        }
        if let Some(sort) = &self.sort {
            spec = spec.with_sort(sort.clone());
        }
        if let Some(field) = &self.aggregate_by {
            spec = spec.with_aggregate_by(field.clone());
        }
        Ok(spec)
    }
}

impl Cli {
    /// Validates settings that clap cannot check on its own.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.es_username.is_some() != self.es_password.is_some() {
            errors.push("KINDGATE_ES_USERNAME and KINDGATE_ES_PASSWORD must be set together".to_string());
        }
        if self.user.trim().is_empty() {
            errors.push("a user is required".to_string());
        }
        if self.partition.split(',').all(|p| p.trim().is_empty()) {
            errors.push("at least one partition is required".to_string());
        }
        if let Command::Cursor(args) = &self.command {
            if args.pages == 0 {
                errors.push("--pages must be at least 1".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Loads the gateway configuration file, if any, and applies overrides.
    pub fn gateway_config(&self) -> anyhow::Result<GatewayConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                serde_json::from_str::<GatewayConfig>(&raw)
                    .with_context(|| format!("failed to parse {}", path.display()))?
            }
            None => GatewayConfig::default(),
        };
        if let Some(timeout) = self.request_timeout_ms {
            config.request_timeout_ms = timeout;
        }
        Ok(config)
    }

    /// Builds the Elasticsearch client configuration.
    pub fn elasticsearch_config(&self, gateway: &GatewayConfig) -> ElasticsearchConfig {
        let nodes: Vec<String> = self
            .es_url
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let auth = match (&self.es_username, &self.es_password) {
            (Some(username), Some(password)) => Some(ElasticsearchAuth::Basic {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        };

        ElasticsearchConfig {
            nodes,
            request_timeout_ms: gateway.request_timeout_ms,
            auth,
            disable_certificate_validation: self.es_insecure,
        }
    }

    /// Builds the requesting identity.
    pub fn identity(&self) -> anyhow::Result<IdentityContext> {
        let mut builder = IdentityContext::builder()
            .user_id(self.user.clone())
            .partition_header(&self.partition)
            .root(self.root);
        for group in self.groups.split(',').map(str::trim).filter(|g| !g.is_empty()) {
            builder = builder.data_group(group);
        }
        if let Some(id) = &self.correlation_id {
            builder = builder.correlation_id(id.clone());
        }
        builder.build().context("invalid identity")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["kindgate", "--user", "alice@example.com", "--partition", "tenant1"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_query_subcommand() {
        let cli = parse(&[
            "query",
            "tenant1:wks:wellbore:1.0.0",
            "--limit",
            "5",
            "--offset",
            "10",
            "--field",
            "id,kind",
        ]);
        let Command::Query(args) = &cli.command else {
            panic!("expected query subcommand");
        };
        assert_eq!(args.offset, Some(10));
        assert!(!args.federated);

        let spec = args.search.to_spec().unwrap();
        assert_eq!(spec.limit, Some(5));
        assert_eq!(spec.returned_fields, vec!["id", "kind"]);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_cursor_subcommand_defaults() {
        let cli = parse(&["cursor", "tenant1:wks:*:*"]);
        let Command::Cursor(args) = &cli.command else {
            panic!("expected cursor subcommand");
        };
        assert_eq!(args.pages, 3);
    }

    #[test]
    fn test_cursor_subcommand_does_not_take_a_token() {
        let argv = [
            "kindgate",
            "--user",
            "alice@example.com",
            "--partition",
            "tenant1",
            "cursor",
            "tenant1:wks:*:*",
            "--cursor",
            "ABC",
        ];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_parse_sort() {
        let sort = parse_sort("data.Depth:desc, id").unwrap();
        assert_eq!(sort, SortSpec::single("data.Depth", SortOrder::Desc).then("id", SortOrder::Asc));
        assert!(parse_sort("id:sideways").is_err());
        assert!(parse_sort("").is_err());
    }

    #[test]
    fn test_validate_rejects_half_credentials() {
        let cli = parse(&["--es-username", "elastic", "query", "tenant1:wks:*:*"]);
        let errors = cli.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_identity_from_flags() {
        let cli = parse(&["--groups", "g1@x.com, g2@x.com", "query", "tenant1:wks:*:*"]);
        let identity = cli.identity().unwrap();
        assert_eq!(identity.user_id(), "alice@example.com");
        assert_eq!(identity.data_groups().len(), 2);
        assert_eq!(identity.primary_partition().as_str(), "tenant1");
    }

    #[test]
    fn test_elasticsearch_config_from_flags() {
        let cli = parse(&[
            "--es-url",
            "http://es1:9200, http://es2:9200",
            "--request-timeout-ms",
            "5000",
            "query",
            "tenant1:wks:*:*",
        ]);
        let gateway = cli.gateway_config().unwrap();
        let es = cli.elasticsearch_config(&gateway);
        assert_eq!(es.nodes, vec!["http://es1:9200", "http://es2:9200"]);
        assert_eq!(es.request_timeout_ms, 5000);
        assert!(es.auth.is_none());
    }
}
