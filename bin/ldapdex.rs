use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ldapdex::config::{
    ENV_BASE_DN, ENV_BIND_DN, ENV_BIND_PASSWORD, ENV_LDAP_URI, ENV_TIMEOUT_SECS,
};
use ldapdex::index::PostingIndex;
use ldapdex::marshal::{make_query, QueryValue};
use ldapdex::models::GroupField;
use ldapdex::{DirectoryConfig, GroupDirectoryClient, GroupQuery, IndexSettings, LdapDirectory};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "ldapdex")]
#[command(about = "LDAP group lookups and posting list indexing", long_about = None)]
struct Args {
    /// LDAP server URI
    #[arg(long, env = ENV_LDAP_URI, default_value = "ldap://localhost:389")]
    uri: String,

    /// DN used to bind before searching
    #[arg(long, env = ENV_BIND_DN, default_value = "")]
    bind_dn: String,

    /// Password for the bind DN
    #[arg(long, env = ENV_BIND_PASSWORD, default_value = "", hide_env_values = true)]
    bind_password: String,

    /// Search base
    #[arg(long, env = ENV_BASE_DN, default_value = "")]
    base_dn: String,

    /// Search timeout in seconds
    #[arg(long, env = ENV_TIMEOUT_SECS, default_value = "10")]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List groups, or the groups a member belongs to
    Groups {
        #[arg(long)]
        member: Option<String>,

        /// Print only this column, `cn` or `dn`
        #[arg(long)]
        only: Option<String>,
    },
    /// Search groups by attribute
    Search {
        /// attribute=term, repeatable
        #[arg(long = "attr", required = true)]
        attrs: Vec<String>,

        /// Match terms exactly instead of as substrings
        #[arg(long)]
        exact: bool,

        /// Comma-separated attributes to fetch
        #[arg(long, value_delimiter = ',')]
        fetch: Vec<String>,
    },
    /// Build a marshalled query string from name=value pairs
    QueryString { pairs: Vec<String> },
    /// Index whitespace separated tokens of a file, one document per line
    IndexFile {
        path: PathBuf,

        /// Write the resulting index snapshot here
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
}

fn split_pair(pair: &str) -> Result<(String, String)> {
    match pair.split_once('=') {
        Some((name, value)) => Ok((name.to_string(), value.to_string())),
        None => bail!("expected name=value, got {:?}", pair),
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = DirectoryConfig::new(args.uri.clone(), args.base_dn.clone())
        .with_bind(args.bind_dn.clone(), args.bind_password.clone())
        .with_timeout(Duration::from_secs(args.timeout_secs));

    match args.command {
        Command::Groups { member, only } => {
            info!("Listing groups under {:?} on {}", config.groups_base(), config.uri);
            let client = GroupDirectoryClient::new(LdapDirectory::from_config(&config), config);
            match only {
                Some(name) => {
                    let Some(field) = GroupField::from_name(&name) else {
                        bail!("--only takes cn or dn, got {:?}", name);
                    };
                    for value in client.get_group_values(member.as_deref(), field) {
                        println!("{}", value);
                    }
                }
                None => {
                    for group in client.get_groups(member.as_deref()) {
                        println!("{}\t{}", group.cn, group.dn);
                    }
                }
            }
        }
        Command::Search { attrs, exact, fetch } => {
            let pairs = attrs
                .iter()
                .map(|a| split_pair(a))
                .collect::<Result<Vec<_>>>()?;
            let query = GroupQuery::from_pairs(pairs).exact(exact);
            let client = GroupDirectoryClient::new(LdapDirectory::from_config(&config), config);

            let fetch: Vec<&str> = fetch.iter().map(String::as_str).collect();
            let records = client.search_groups(&query, &fetch)?;
            for record in records {
                println!("{}", serde_json::to_string(&record.into_map())?);
            }
        }
        Command::QueryString { pairs } => {
            let pairs = pairs
                .iter()
                .map(|p| {
                    let (name, value) = split_pair(p)?;
                    let value = match value.parse::<i64>() {
                        Ok(i) => QueryValue::from(i),
                        Err(_) => QueryValue::from(value),
                    };
                    Ok((name, value))
                })
                .collect::<Result<Vec<_>>>()?;
            println!("{}", make_query(&pairs));
        }
        Command::IndexFile { path, snapshot } => {
            let bytes = fs::read(&path).with_context(|| format!("reading {:?}", path))?;
            let index = PostingIndex::new(&IndexSettings::default());

            for (line_no, line) in bytes.split(|b| *b == b'\n').enumerate() {
                for token in line
                    .split(|b| b.is_ascii_whitespace())
                    .filter(|t| !t.is_empty())
                {
                    index.insert(token, line_no as u64 + 1);
                }
            }

            info!(
                "Indexed {} rows, {} postings",
                index.row_count(),
                index.posting_count()
            );
            if index.len() as u64 != index.row_count() {
                warn!("Row counter and stored rows disagree");
            }

            match snapshot {
                Some(out) => {
                    index.save_to(&out)?;
                    info!("Snapshot written to {:?}", out);
                }
                None => {
                    for token in index.tokens() {
                        let ids = index.get(&token).unwrap_or_default();
                        println!("{}\t{:?}", token, ids);
                    }
                }
            }
        }
    }

    Ok(())
}
