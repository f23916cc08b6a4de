//! Command-line front end for a SQLite-backed agent registry.
//!
//! Records print as pretty JSON on stdout; diagnostics go to stderr.
//! Exit status: 0 success, 1 usage or I/O failure, 2 rejected card,
//! 3 immutability conflict.

use agent_registry::cli_support::{InputSource, next_value, print_json, read_document, utf8_args};
use agent_registry::logging::init_tracing;
use agent_registry::{
    Pagination, RecordFilter, RecordStatus, RecordStore, Registry, RegistryConfig, RegistryError,
    SkillId, SqliteStore,
};
use anyhow::{Context, Result, bail};
use serde_json::json;
use std::env;
use std::path::PathBuf;

const EXIT_REJECTED: i32 = 2;
const EXIT_CONFLICT: i32 = 3;

fn main() {
    init_tracing();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse(utf8_args(env::args_os().skip(1))?)?;
    let mut config = RegistryConfig::from_env();
    if let Some(path) = &cli.db_path {
        config = config.with_db_path(path);
    }

    let store = config
        .open_store()
        .with_context(|| format!("opening registry database {}", config.db_path.display()))?;

    match cli.command {
        Command::Init => {
            store.ensure_indexes().context("creating registry indexes")?;
            eprintln!("initialized {}", config.db_path.display());
            Ok(0)
        }
        Command::Publish { input, owner } => {
            let owner = owner.or(config.default_owner.clone()).with_context(|| {
                format!("publish needs --owner or {}", agent_registry::config::OWNER_ENV)
            })?;
            let candidate = read_document(&input)?;
            publish(&registry(store)?, &candidate, &owner)
        }
        Command::Get { name, version } => {
            print_json(&registry(store)?.find_by_identity(&name, &version)?)?;
            Ok(0)
        }
        Command::Latest { name } => {
            print_json(&registry(store)?.latest(&name)?)?;
            Ok(0)
        }
        Command::Versions { name, list } => {
            print_json(&registry(store)?.find_by_name(&name, &list.pagination())?)?;
            Ok(0)
        }
        Command::List { list } => {
            print_json(&registry(store)?.list_all(&list.pagination(), &list.filter)?)?;
            Ok(0)
        }
        Command::Search { skill, list } => {
            let records =
                registry(store)?.search_by_skill(&SkillId(skill), &list.pagination(), &list.filter)?;
            print_json(&records)?;
            Ok(0)
        }
    }
}

fn registry(store: SqliteStore) -> Result<Registry<SqliteStore>> {
    Registry::with_embedded_schema(store).context("compiling agent card contract")
}

fn publish(
    registry: &Registry<SqliteStore>,
    candidate: &serde_json::Value,
    owner: &str,
) -> Result<i32> {
    match registry.submit(candidate, owner) {
        Ok(record) => {
            print_json(&record)?;
            Ok(0)
        }
        Err(RegistryError::Validation { errors }) => {
            print_json(&json!({"ok": false, "stage": "schema", "errors": errors}))?;
            Ok(EXIT_REJECTED)
        }
        Err(RegistryError::TransportPolicy { errors }) => {
            print_json(&json!({"ok": false, "stage": "policy", "errors": errors}))?;
            Ok(EXIT_REJECTED)
        }
        Err(err) => {
            if let RegistryError::Conflict {
                kind,
                key,
                existing,
                attempted,
            } = &err
            {
                print_json(&json!({
                    "ok": false,
                    "code": kind.code(),
                    "key": key,
                    "existingFingerprint": existing,
                    "attemptedFingerprint": attempted,
                }))?;
                eprintln!("{err}");
                return Ok(EXIT_CONFLICT);
            }
            Err(err.into())
        }
    }
}

struct Cli {
    db_path: Option<PathBuf>,
    command: Command,
}

enum Command {
    Init,
    Publish {
        input: InputSource,
        owner: Option<String>,
    },
    Get {
        name: String,
        version: String,
    },
    Latest {
        name: String,
    },
    Versions {
        name: String,
        list: ListArgs,
    },
    List {
        list: ListArgs,
    },
    Search {
        skill: String,
        list: ListArgs,
    },
}

/// Flags shared by the list-style commands, kept raw until normalized.
#[derive(Default)]
struct ListArgs {
    limit: Option<String>,
    offset: Option<String>,
    filter: RecordFilter,
}

impl ListArgs {
    fn pagination(&self) -> Pagination {
        Pagination::from_raw(self.limit.as_deref(), self.offset.as_deref())
    }
}

impl Cli {
    fn parse(args: Vec<String>) -> Result<Self> {
        let mut args = args.into_iter();
        let mut db_path: Option<PathBuf> = None;

        let command_name = loop {
            let Some(arg) = args.next() else {
                usage();
                bail!("missing command");
            };
            match arg.as_str() {
                "--db" => db_path = Some(PathBuf::from(next_value(&mut args, "--db")?)),
                "--help" | "-h" => {
                    usage();
                    std::process::exit(0);
                }
                flag if flag.starts_with("--") => bail!("unknown flag: {flag}"),
                _ => break arg,
            }
        };

        let mut positionals: Vec<String> = Vec::new();
        let mut owner: Option<String> = None;
        let mut list = ListArgs::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => db_path = Some(PathBuf::from(next_value(&mut args, "--db")?)),
                "--limit" => list.limit = Some(next_value(&mut args, "--limit")?),
                "--offset" => list.offset = Some(next_value(&mut args, "--offset")?),
                "--owner" => owner = Some(next_value(&mut args, "--owner")?),
                "--status" => {
                    let raw = next_value(&mut args, "--status")?;
                    let status = RecordStatus::parse(&raw).with_context(|| {
                        format!("unknown status '{raw}' (expected draft|published|deprecated)")
                    })?;
                    list.filter.status = Some(status);
                }
                "--help" | "-h" => {
                    usage();
                    std::process::exit(0);
                }
                flag if flag.starts_with("--") => bail!("unknown flag: {flag}"),
                _ => positionals.push(arg),
            }
        }

        let command = match (command_name.as_str(), positionals.as_slice()) {
            ("init", []) => Command::Init,
            ("publish", [file]) => Command::Publish {
                input: InputSource::from_arg(Some(file.as_str())),
                owner,
            },
            ("get", [name, version]) => Command::Get {
                name: name.clone(),
                version: version.clone(),
            },
            ("latest", [name]) => Command::Latest { name: name.clone() },
            ("versions", [name]) => Command::Versions {
                name: name.clone(),
                list,
            },
            ("list", []) => {
                list.filter.owner = owner;
                Command::List { list }
            }
            ("search", [skill]) => {
                list.filter.owner = owner;
                Command::Search {
                    skill: skill.clone(),
                    list,
                }
            }
            ("init" | "publish" | "get" | "latest" | "versions" | "list" | "search", _) => {
                usage();
                bail!("wrong number of arguments for '{command_name}'");
            }
            (other, _) => {
                usage();
                bail!("unknown command: {other}");
            }
        };

        Ok(Self { db_path, command })
    }
}

fn usage() {
    eprintln!(
        "Usage: agent-registry [--db PATH] <command> [args]\n\n\
         Commands:\n  \
           init                          create tables and indexes\n  \
           publish FILE [--owner OWNER]  validate and publish a card ('-' reads stdin)\n  \
           get NAME VERSION              print one record or null\n  \
           latest NAME                   print the highest version or null\n  \
           versions NAME                 list versions, newest first\n  \
           list                          list records by name\n  \
           search SKILL                  list records declaring skill id SKILL\n\n\
         List options: --limit N --offset N --owner OWNER --status draft|published|deprecated\n\
         Environment: AGENT_REGISTRY_DB (default agent-registry.db), AGENT_REGISTRY_OWNER,\n\
         RUST_LOG (default warn)."
    );
}
