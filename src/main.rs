//! action-form CLI - validate, preview and replay Action App forms

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;

use action_form::error::{ActionFormError, FixSuggestion};
use action_form::host::{ConsoleFallback, HostBridge, OfflineHost};
use action_form::page::Page;
use action_form::runtime::{
    self, initial_snapshot, ActionResult, FormSession, ReplayScript, UserAction,
};
use action_form::schema::{ActionSchema, FieldRole};
use action_form::store::{FormStore, SetOutcome, Snapshot};
use action_form::FormConfig;

#[derive(Parser)]
#[command(name = "action-form")]
#[command(about = "Action App form runtime - validate, preview and replay forms")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/action-form/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an action schema file
    Validate {
        /// Path to action-schema.json (or .yaml)
        schema: PathBuf,
    },

    /// Run an offline session and print the page
    Preview {
        /// Path to action-schema.json (or .yaml)
        schema: PathBuf,

        /// Default data as a JSON object
        #[arg(long)]
        data: Option<String>,

        /// Type a value into a field (name=value), repeatable
        #[arg(long = "set", value_name = "NAME=VALUE")]
        sets: Vec<String>,

        /// Press an outcome button after the edits
        #[arg(long)]
        complete: Option<String>,

        /// Print the rendered page as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replay a scripted session against an in-process host
    Replay {
        /// Path to action-schema.json (or .yaml)
        schema: PathBuf,

        /// Path to the replay script (.yaml)
        script: PathBuf,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match load_config(cli.config.as_deref()) {
        Ok(config) => match cli.command {
            Commands::Validate { schema } => validate(&schema),
            Commands::Preview {
                schema,
                data,
                sets,
                complete,
                json,
            } => preview(&config, &schema, data.as_deref(), &sets, complete, json).await,
            Commands::Replay {
                schema,
                script,
                json,
            } => replay(&schema, &script, json).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        if let Some(suggestion) = e
            .downcast_ref::<ActionFormError>()
            .and_then(|e| e.fix_suggestion())
        {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<FormConfig> {
    let config = match path {
        Some(path) => FormConfig::load_from(path)?,
        None => FormConfig::load()?,
    };
    Ok(config.with_env())
}

fn load_schema(path: &Path) -> anyhow::Result<ActionSchema> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read schema {}", path.display()))?;
    Ok(ActionSchema::parse(&text)?)
}

fn parse_snapshot(text: &str) -> Result<Snapshot, ActionFormError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => Err(ActionFormError::SnapshotNotObject {
            actual: json_type(&other).to_string(),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn validate(path: &Path) -> anyhow::Result<()> {
    let schema = load_schema(path)?;

    println!("{} Schema '{}' is valid", "✓".green(), path.display());
    for role in [FieldRole::Input, FieldRole::Output, FieldRole::InOut] {
        println!(
            "  {}: {}",
            role.section(),
            schema.fields_with_role(role).count()
        );
    }
    println!("  outcomes: {}", schema.outcomes().join(", "));
    Ok(())
}

async fn preview(
    config: &FormConfig,
    path: &Path,
    data: Option<&str>,
    sets: &[String],
    complete: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let schema = Arc::new(load_schema(path)?);
    let defaults = match data {
        Some(text) => parse_snapshot(text)?,
        None => Snapshot::new(),
    };

    let store = FormStore::initialize(initial_snapshot(&schema, defaults))
        .with_schema(Arc::clone(&schema));
    let bridge = HostBridge::new(Arc::new(OfflineHost::new()), store)
        .with_settings(config.host_settings())
        .with_fallback(Box::new(ConsoleFallback::new(config.fallback.interactive)));
    let mut session = FormSession::new(bridge, Page::compose(&schema));
    session.start().await;

    for assignment in sets {
        let Some((name, input)) = assignment.split_once('=') else {
            bail!("--set expects NAME=VALUE, got '{}'", assignment);
        };
        if let SetOutcome::Ignored(reason) = session.edit(name.trim(), input).await? {
            println!("{} '{}' was not changed ({:?})", "!".yellow(), name.trim(), reason);
        }
    }

    let page = session.render();
    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
    } else {
        println!("{}", page);
    }

    if let Some(outcome) = complete {
        if let ActionResult::Completed(completion) =
            session.dispatch(UserAction::Complete(outcome)).await?
        {
            tracing::debug!(?completion, "Preview completed");
        }
    }
    Ok(())
}

async fn replay(schema_path: &Path, script_path: &Path, json: bool) -> anyhow::Result<()> {
    let schema = Arc::new(load_schema(schema_path)?);
    let script = ReplayScript::load(script_path)
        .with_context(|| format!("cannot load script {}", script_path.display()))?;

    println!(
        "{} Replaying {} steps against the mock host",
        "→".cyan(),
        script.steps.len()
    );
    let report = runtime::replay(schema, script).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Events:".cyan().bold());
    for event in &report.events {
        println!(
            "  #{:<3} {:>5}ms {}",
            event.id,
            event.timestamp_ms,
            serde_json::to_string(&event.kind)?
        );
    }
    println!("{}", "Host calls:".cyan().bold());
    for call in &report.calls {
        println!("  {}", serde_json::to_string(call)?);
    }
    if !report.rejected.is_empty() {
        println!("{}", "Rejected:".yellow().bold());
        for rejected in &report.rejected {
            println!("  {}", rejected);
        }
    }
    println!("{}", "Page:".cyan().bold());
    println!("{}", report.page);
    Ok(())
}
