//! Offline command line over a JSON record snapshot.

pub mod output;
pub mod render;

use std::path::PathBuf;

use strsim::levenshtein;
use tracing::warn;
use uuid::Uuid;

use crate::config::{ConfigManager, EngineConfig};
use crate::core::move_validator::check_move;
use crate::core::record_store::RecordStore;
use crate::core::tree_builder::{Flow, TreeOptions};
use crate::domain::RecordSnapshot;
use crate::errors::EngineError;
use crate::utils::build_info;

const COMMANDS: [&str; 4] = ["tree", "check-move", "version", "help"];

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("unknown command `{command}`")]
    UnknownCommand {
        command: String,
        suggestion: Option<&'static str>,
    },
    #[error("`{0}` is not a valid id")]
    InvalidId(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub fn run_cli() -> Result<(), CliError> {
    let output = run(std::env::args().skip(1))?;
    print!("{}", output);
    Ok(())
}

/// Executes one command and returns what it prints on success.
pub fn run<I>(args: I) -> Result<String, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let Some(command) = args.next() else {
        return Ok(usage());
    };
    let rest: Vec<String> = args.collect();

    match command.as_str() {
        "tree" => tree_command(&rest),
        "check-move" => check_move_command(&rest),
        "version" => Ok(format!("{}\n", build_info::current())),
        "help" | "--help" | "-h" => Ok(usage()),
        other => Err(CliError::UnknownCommand {
            command: other.to_string(),
            suggestion: suggest(other),
        }),
    }
}

fn tree_command(args: &[String]) -> Result<String, CliError> {
    let (path, flags) = split_path(args, "tree <snapshot.json> [flags]")?;
    let mut options = TreeOptions::from(&load_config().tree);
    let mut flags = flags.iter();
    while let Some(flag) = flags.next() {
        options = match flag.as_str() {
            "--vendors" => options.with_vendors(true),
            "--no-vendors" => options.with_vendors(false),
            "--transactions" => options.with_transactions(true),
            "--no-system" => options.with_system_categories(false),
            "--no-user" => options.with_user_categories(false),
            "--flow" => {
                let value = flags
                    .next()
                    .ok_or_else(|| CliError::Usage("--flow needs a value".into()))?;
                let flow: Flow = value.parse().map_err(CliError::Usage)?;
                options.with_flow(flow)
            }
            other => return Err(CliError::Usage(format!("unknown flag `{}`", other))),
        };
    }

    let snapshot = RecordSnapshot::load(&path)?;
    let tree = RecordStore::from_snapshot(&snapshot).build_tree(&options);
    Ok(render::render_tree(&tree))
}

fn check_move_command(args: &[String]) -> Result<String, CliError> {
    let usage = "check-move <snapshot.json> <node-id> <target-id|root>";
    let (path, rest) = split_path(args, usage)?;
    let [node, target] = rest else {
        return Err(CliError::Usage(format!("usage: {}", usage)));
    };
    let node_id = parse_id(node)?;
    let target_id = match target.as_str() {
        "root" => None,
        other => Some(parse_id(other)?),
    };

    let snapshot = RecordSnapshot::load(&path)?;
    let options = TreeOptions::default()
        .with_vendors(true)
        .with_transactions(true)
        .with_system_categories(true)
        .with_user_categories(true);
    let tree = RecordStore::from_snapshot(&snapshot).build_tree(&options);
    Ok(match check_move(node_id, target_id, &tree) {
        Ok(()) => format!("{}\n", output::format_message(output::MessageKind::Success, "move allowed")),
        Err(reason) => format!(
            "{}\n",
            output::format_message(output::MessageKind::Warning, format!("move refused: {}", reason))
        ),
    })
}

fn split_path<'a>(args: &'a [String], usage: &str) -> Result<(PathBuf, &'a [String]), CliError> {
    match args.split_first() {
        Some((path, rest)) => Ok((PathBuf::from(path), rest)),
        None => Err(CliError::Usage(format!("usage: {}", usage))),
    }
}

fn parse_id(raw: &str) -> Result<Uuid, CliError> {
    Uuid::parse_str(raw).map_err(|_| CliError::InvalidId(raw.to_string()))
}

fn load_config() -> EngineConfig {
    match ConfigManager::new().and_then(|manager| manager.load()) {
        Ok(config) => config,
        Err(err) => {
            warn!("using default configuration: {}", err);
            EngineConfig::default()
        }
    }
}

/// Closest known command within an edit distance of 3.
pub fn suggest(input: &str) -> Option<&'static str> {
    COMMANDS
        .iter()
        .map(|name| (levenshtein(name, input), *name))
        .min_by_key(|(distance, _)| *distance)
        .filter(|(distance, _)| *distance <= 3)
        .map(|(_, name)| name)
}

fn usage() -> String {
    "Usage: category_core_cli <command>\n\
     Commands:\n  \
     tree <snapshot.json> [--vendors|--no-vendors] [--transactions] [--no-system] [--no-user] [--flow outflow|inflow|net]\n  \
     check-move <snapshot.json> <node-id> <target-id|root>\n  \
     version\n"
        .to_string()
}
