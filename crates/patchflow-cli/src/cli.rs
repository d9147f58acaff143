//! Argument parsing, context construction and command dispatch.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use patchflow_api_models::{ApprovalStatus, ElementKind, InstallStatus, ItemId, UserRole};
use patchflow_config::{ClientConfig, load_from_env};
use patchflow_telemetry::{LogFormat, LoggingConfig, init_logging};
use uuid::Uuid;

use crate::client::{AppContext, CliError, CliResult, parse_url};
use crate::commands::lists::{handle_feedback, handle_ls, handle_review, handle_watch};
use crate::commands::session::{handle_login, handle_logout, handle_whoami};

/// Parses CLI arguments, executes the requested command, and reports failures.
/// Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    match execute(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn execute(cli: Cli) -> CliResult<()> {
    let trace_id = Uuid::new_v4().to_string();
    let config = resolve_config(&cli)?;
    let logging = LoggingConfig {
        level: &config.log_level,
        format: LogFormat::from_choice(config.log_format),
        build_sha: option_env!("PATCHFLOW_BUILD_SHA").unwrap_or("dev"),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: logging disabled: {err}");
    }
    let ctx = AppContext::new(config, cli.token, cli.output, &trace_id)?;
    tracing::debug!(trace_id, command = command_label(&cli.command), "dispatching command");
    dispatch(cli.command, &ctx).await
}

fn resolve_config(cli: &Cli) -> CliResult<ClientConfig> {
    let document = cli
        .config
        .as_ref()
        .map(|path| {
            fs::read_to_string(path).map_err(|err| {
                CliError::validation(format!("failed to read {}: {err}", path.display()))
            })
        })
        .transpose()?;
    let mut config = load_from_env(document.as_deref())
        .map_err(|err| CliError::validation(format!("invalid configuration: {err}")))?;
    if let Some(url) = &cli.api_url {
        parse_url(url).map_err(CliError::validation)?;
        config.api_base_url = url.trim_end_matches('/').to_string();
    }
    Ok(config)
}

async fn dispatch(command: Command, ctx: &AppContext) -> CliResult<()> {
    match command {
        Command::Login(args) => handle_login(ctx, args).await,
        Command::Whoami => handle_whoami(ctx).await,
        Command::Ls(args) => handle_ls(ctx, args).await,
        Command::Review(args) => handle_review(ctx, args).await,
        Command::Feedback(args) => handle_feedback(ctx, args).await,
        Command::Watch(args) => handle_watch(ctx, args).await,
        Command::Logout => handle_logout(ctx).await,
    }
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Login(_) => "login",
        Command::Whoami => "whoami",
        Command::Ls(_) => "ls",
        Command::Review(_) => "review",
        Command::Feedback(_) => "feedback",
        Command::Watch(_) => "watch",
        Command::Logout => "logout",
    }
}

#[derive(Parser)]
#[command(name = "patchflow", about = "Review and deliver patches from the terminal")]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "PATCHFLOW_CONFIG",
        help = "JSON configuration document"
    )]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "API base URL, overriding the configuration")]
    api_url: Option<String>,
    #[arg(long, global = true, env = "PATCHFLOW_TOKEN", hide_env_values = true)]
    token: Option<String>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    output: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and print the session token.
    Login(LoginArgs),
    /// Show the current user and their sections.
    Whoami,
    /// List one page of a role's list.
    Ls(ListArgs),
    /// Approve or reject an element.
    Review(ReviewArgs),
    /// Report installation feedback on a send request.
    Feedback(FeedbackArgs),
    /// Poll a list and print it again whenever it changes.
    Watch(WatchArgs),
    /// Close the server session.
    Logout,
}

#[derive(Args)]
pub(crate) struct LoginArgs {
    #[arg(long, env = "PATCHFLOW_USERNAME")]
    pub(crate) username: String,
    #[arg(
        long,
        env = "PATCHFLOW_PASSWORD",
        hide_env_values = true,
        help = "Prompted for when omitted"
    )]
    pub(crate) password: Option<String>,
}

#[derive(Args)]
pub(crate) struct ListArgs {
    #[arg(value_enum)]
    pub(crate) role: RoleArg,
    #[arg(value_enum)]
    pub(crate) kind: KindArg,
    #[arg(long, default_value_t = 1, help = "One-based page number")]
    pub(crate) page: u32,
    #[arg(long, help = "Free-text search")]
    pub(crate) search: Option<String>,
    #[arg(long, conflicts_with = "search", help = "Show already reviewed elements")]
    pub(crate) history: bool,
    #[arg(long, help = "Column to sort by, newest first")]
    pub(crate) sort: Option<String>,
    #[arg(long, requires = "sort", help = "Sort ascending instead")]
    pub(crate) asc: bool,
}

#[derive(Args)]
pub(crate) struct ReviewArgs {
    #[arg(value_enum)]
    pub(crate) kind: KindArg,
    pub(crate) id: ItemId,
    #[arg(value_enum)]
    pub(crate) decision: Decision,
}

#[derive(Args)]
pub(crate) struct FeedbackArgs {
    pub(crate) id: ItemId,
    #[arg(value_enum)]
    pub(crate) outcome: InstallOutcome,
    #[arg(long, default_value = "")]
    pub(crate) message: String,
}

#[derive(Args)]
pub(crate) struct WatchArgs {
    #[arg(value_enum)]
    pub(crate) role: RoleArg,
    #[arg(value_enum)]
    pub(crate) kind: KindArg,
    #[arg(long, help = "Stop after this many freshness checks")]
    pub(crate) checks: Option<u32>,
    #[arg(long, help = "Seconds between checks, overriding the configuration")]
    pub(crate) interval_secs: Option<u64>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum RoleArg {
    Programmer,
    TechnicalAreaManager,
    RevisionOfficeManager,
    Client,
}

impl From<RoleArg> for UserRole {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Programmer => Self::Programmer,
            RoleArg::TechnicalAreaManager => Self::TechnicalAreaManager,
            RoleArg::RevisionOfficeManager => Self::RevisionOfficeManager,
            RoleArg::Client => Self::Client,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum KindArg {
    Commits,
    SendRequests,
}

impl From<KindArg> for ElementKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Commits => Self::Commits,
            KindArg::SendRequests => Self::SendRequests,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum Decision {
    Approve,
    Reject,
}

impl From<Decision> for ApprovalStatus {
    fn from(value: Decision) -> Self {
        match value {
            Decision::Approve => Self::Approved,
            Decision::Reject => Self::Rejected,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum InstallOutcome {
    Succeeded,
    Failed,
}

impl From<InstallOutcome> for InstallStatus {
    fn from(value: InstallOutcome) -> Self {
        match value {
            InstallOutcome::Succeeded => Self::Succeeded,
            InstallOutcome::Failed => Self::Failed,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Convert a one-based page flag into a page index.
pub(crate) fn page_index(page: u32) -> CliResult<u32> {
    page.checked_sub(1)
        .ok_or_else(|| CliError::validation("pages are numbered from 1"))
}

/// Fail with a validation error unless `value` is non-blank.
pub(crate) fn require_text<'a>(field: &str, value: &'a str) -> CliResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CliError::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn list_flags_parse() {
        let cli = Cli::try_parse_from([
            "patchflow",
            "ls",
            "technical-area-manager",
            "commits",
            "--page",
            "2",
            "--sort",
            "timestamp",
            "--asc",
        ])
        .expect("valid arguments");
        let Command::Ls(args) = cli.command else {
            panic!("expected ls");
        };
        assert_eq!(UserRole::from(args.role), UserRole::TechnicalAreaManager);
        assert_eq!(ElementKind::from(args.kind), ElementKind::Commits);
        assert_eq!(page_index(args.page).expect("page"), 1);
        assert!(args.asc);
    }

    #[test]
    fn search_and_history_conflict() {
        let parsed = Cli::try_parse_from([
            "patchflow",
            "ls",
            "client",
            "send-requests",
            "--search",
            "x",
            "--history",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn page_zero_is_rejected() {
        assert!(matches!(page_index(0), Err(CliError::Validation(_))));
        assert!(matches!(
            require_text("username", "  "),
            Err(CliError::Validation(_))
        ));
        assert_eq!(require_text("username", " ada ").expect("text"), "ada");
    }

    #[test]
    fn review_decisions_map_to_statuses() {
        let cli = Cli::try_parse_from(["patchflow", "review", "send-requests", "4", "reject"])
            .expect("valid arguments");
        let Command::Review(args) = cli.command else {
            panic!("expected review");
        };
        assert_eq!(ApprovalStatus::from(args.decision), ApprovalStatus::Rejected);
        assert_eq!(args.id, 4);
    }
}
