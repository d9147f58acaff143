//! Output renderers and formatting helpers for CLI commands.

use std::fmt::Write as _;

use anyhow::anyhow;
use patchflow_api_models::{ListItem, UserInfo};
use patchflow_ui::core::logic::{ElementField, format_timestamp, render_field};
use patchflow_ui::core::navigation::NavigationSection;
use patchflow_ui::features::lists::registry::ListTarget;
use serde_json::{Value, json};

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

/// One fetched list page, ready to print.
#[derive(Debug, Clone)]
pub(crate) struct PageView {
    pub(crate) target: ListTarget,
    pub(crate) page: u32,
    pub(crate) page_count: u64,
    pub(crate) total: u64,
    pub(crate) latest_update_timestamp: u64,
    pub(crate) rows: Vec<ListItem>,
}

const TABLE_COLUMNS: [ElementField; 5] = [
    ElementField::Id,
    ElementField::ApprovalStatus,
    ElementField::Timestamp,
    ElementField::Author,
    ElementField::Title,
];

fn print_json(value: &Value) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

fn list_label(target: ListTarget) -> String {
    format!("{}/{}", target.role.as_str(), target.kind.as_str())
}

pub(crate) fn page_table(view: &PageView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}  page {}/{}  ({} items)",
        list_label(view.target),
        view.page.saturating_add(1),
        view.page_count.max(1),
        view.total
    );
    let _ = writeln!(
        out,
        "{:>6} {:<9} {:<19} {:<16} TITLE",
        "ID", "STATUS", "DATE", "AUTHOR"
    );
    for item in &view.rows {
        let cells: Vec<String> = TABLE_COLUMNS
            .iter()
            .map(|field| render_field(item, *field))
            .collect();
        let _ = writeln!(
            out,
            "{:>6} {:<9} {:<19} {:<16} {}",
            cells[0], cells[1], cells[2], cells[3], cells[4]
        );
    }
    if view.rows.is_empty() {
        out.push_str("(no elements)\n");
    }
    out
}

pub(crate) fn render_page(view: &PageView, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&json!({
            "role": view.target.role,
            "list": view.target.kind.as_str(),
            "page": view.page.saturating_add(1),
            "page_count": view.page_count,
            "total": view.total,
            "latest_update_timestamp": view.latest_update_timestamp,
            "items": view.rows,
        })),
        OutputFormat::Table => {
            print!("{}", page_table(view));
            Ok(())
        }
    }
}

pub(crate) fn render_update(
    target: ListTarget,
    previous: u64,
    latest: u64,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&json!({
            "event": "updated",
            "list": list_label(target),
            "previous": previous,
            "latest": latest,
        })),
        OutputFormat::Table => {
            println!(
                "{}: updated at {}",
                list_label(target),
                format_timestamp(latest)
            );
            Ok(())
        }
    }
}

pub(crate) fn user_summary(user: &UserInfo, sections: &[NavigationSection]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "id: {}", user.id);
    let _ = writeln!(out, "name: {}", user.name);
    let roles: Vec<&str> = user.roles.iter().map(|role| role.as_str()).collect();
    let _ = writeln!(out, "roles: {}", roles.join(", "));
    for section in sections {
        let tabs: Vec<&str> = section.tabs().iter().map(|tab| tab.segment()).collect();
        let _ = writeln!(
            out,
            "  {:<24} {} [{}]",
            section.route(),
            section.title,
            tabs.join(", ")
        );
    }
    out
}

pub(crate) fn render_user(
    user: &UserInfo,
    sections: &[NavigationSection],
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let sections: Vec<Value> = sections
                .iter()
                .map(|section| {
                    let tabs: Vec<&str> =
                        section.tabs().iter().map(|tab| tab.segment()).collect();
                    json!({"route": section.route(), "title": section.title, "tabs": tabs})
                })
                .collect();
            print_json(&json!({
                "id": user.id,
                "name": user.name,
                "roles": user.roles,
                "sections": sections,
            }))
        }
        OutputFormat::Table => {
            print!("{}", user_summary(user, sections));
            Ok(())
        }
    }
}

pub(crate) fn render_token(token: &str, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&json!({ "access_token": token })),
        OutputFormat::Table => {
            println!("{token}");
            eprintln!("export PATCHFLOW_TOKEN={token} to reuse this session");
            Ok(())
        }
    }
}

pub(crate) fn render_message(message: &str, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&json!({ "message": message })),
        OutputFormat::Table => {
            println!("{message}");
            Ok(())
        }
    }
}
