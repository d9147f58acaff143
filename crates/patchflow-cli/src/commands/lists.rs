//! `ls`, `review`, `feedback` and `watch`.

use std::rc::Rc;
use std::time::Duration;

use anyhow::anyhow;
use patchflow_api_models::{ApprovalStatus, ElementKind, UserRole};
use patchflow_ui::core::store::{LocalStore, StoreHandle};
use patchflow_ui::features::lists::checker::{CheckOutcome, Sleeper};
use patchflow_ui::features::lists::controller::ViewController;
use patchflow_ui::features::lists::dispatcher::{ListDispatcher, LoadOutcome};
use patchflow_ui::features::lists::query::{FilterDescriptor, ListQueryState, PageRequest};
use patchflow_ui::features::lists::registry::{ListSlot, ListTarget};
use patchflow_ui::features::lists::review::ItemStatus;
use tracing::{debug, warn};

use crate::cli::{FeedbackArgs, ListArgs, ReviewArgs, WatchArgs, page_index};
use crate::client::{AppContext, CliError, CliResult, ReqwestTransport, TokioSleeper};
use crate::output::{PageView, render_message, render_page, render_update};

type CliDispatcher = ListDispatcher<ReqwestTransport, LocalStore>;

fn slot_for(role: UserRole, kind: ElementKind) -> CliResult<ListSlot> {
    ListSlot::for_target(ListTarget::new(role, kind)).ok_or_else(|| {
        CliError::validation(format!(
            "the {} view has no {} list",
            role.as_str(),
            kind.as_str()
        ))
    })
}

fn dispatcher(ctx: &AppContext) -> CliResult<Rc<CliDispatcher>> {
    Ok(Rc::new(ListDispatcher::new(
        ctx.api()?,
        LocalStore::default(),
        ctx.config.page_size,
    )))
}

/// Turn a failed load into the matching CLI error.
fn load_failure(dispatcher: &CliDispatcher, page: u32) -> CliError {
    if dispatcher.store().snapshot().session.is_session_expired {
        CliError::session_expired()
    } else {
        CliError::failure(anyhow!("failed to fetch page {}", page.saturating_add(1)))
    }
}

async fn load(
    dispatcher: &CliDispatcher,
    slot: ListSlot,
    request: &PageRequest,
) -> CliResult<LoadOutcome> {
    match dispatcher.load_page(slot.target(), request).await {
        LoadOutcome::Failed => Err(load_failure(dispatcher, request.page)),
        outcome => Ok(outcome),
    }
}

fn page_view(dispatcher: &CliDispatcher, slot: ListSlot, page: u32) -> PageView {
    let state = dispatcher.store().snapshot();
    let cache = state.lists.get(slot);
    PageView {
        target: slot.target(),
        page,
        page_count: cache.page_count(dispatcher.page_size()),
        total: cache.total_items_count,
        latest_update_timestamp: cache.latest_update_timestamp,
        rows: cache.rows(page).to_vec(),
    }
}

pub(crate) async fn handle_ls(ctx: &AppContext, args: ListArgs) -> CliResult<()> {
    let slot = slot_for(args.role.into(), args.kind.into())?;
    let page = page_index(args.page)?;
    let mut query = ListQueryState::new(slot.default_filter());
    if let Some(text) = &args.search {
        query.search(text);
    } else if args.history {
        query.set_filter(FilterDescriptor::history());
    }
    if let Some(column) = &args.sort {
        query.sort(column);
        if args.asc {
            query.sort(column);
        }
    }
    let request = query.change_page(page);
    let dispatcher = dispatcher(ctx)?;
    load(&dispatcher, slot, &request).await?;
    render_page(&page_view(&dispatcher, slot, page), ctx.output)
}

/// Reviewer role for an element kind.
const fn reviewer_of(kind: ElementKind) -> UserRole {
    match kind {
        ElementKind::Commits => UserRole::TechnicalAreaManager,
        ElementKind::SendRequests => UserRole::RevisionOfficeManager,
    }
}

type CliController = ViewController<ReqwestTransport, LocalStore>;

fn controller(
    ctx: &AppContext,
    role: UserRole,
) -> CliResult<(Rc<CliDispatcher>, CliController)> {
    let dispatcher = dispatcher(ctx)?;
    let controller =
        ViewController::new(role, Rc::clone(&dispatcher), ctx.config.poll_interval);
    Ok((dispatcher, controller))
}

/// Error for an item action the server did not accept.
fn rejected(dispatcher: &CliDispatcher, what: &str) -> CliError {
    if dispatcher.store().snapshot().session.is_session_expired {
        CliError::session_expired()
    } else {
        CliError::failure(anyhow!("{what} was not accepted by the server"))
    }
}

pub(crate) async fn handle_review(ctx: &AppContext, args: ReviewArgs) -> CliResult<()> {
    let kind: ElementKind = args.kind.into();
    let (dispatcher, controller) = controller(ctx, reviewer_of(kind))?;
    let decision: ApprovalStatus = args.decision.into();
    match controller.review_item(kind, args.id, decision).await? {
        ItemStatus::Succeeded => render_message(
            &format!("{} {}: {}", kind.as_str(), args.id, decision.label()),
            ctx.output,
        ),
        _ => Err(rejected(&dispatcher, &format!("review of {}", args.id))),
    }
}

pub(crate) async fn handle_feedback(ctx: &AppContext, args: FeedbackArgs) -> CliResult<()> {
    let (dispatcher, controller) = controller(ctx, UserRole::Client)?;
    let status = controller
        .send_feedback(args.id, args.outcome.into(), args.message.trim())
        .await?;
    match status {
        ItemStatus::Succeeded => {
            render_message(&format!("feedback recorded for {}", args.id), ctx.output)
        }
        _ => Err(rejected(&dispatcher, &format!("feedback on {}", args.id))),
    }
}

async fn refresh(
    ctx: &AppContext,
    dispatcher: &CliDispatcher,
    slot: ListSlot,
    request: &PageRequest,
    (previous, latest): (u64, u64),
) -> CliResult<()> {
    render_update(slot.target(), previous, latest, ctx.output)?;
    load(dispatcher, slot, request).await?;
    render_page(&page_view(dispatcher, slot, request.page), ctx.output)
}

pub(crate) async fn handle_watch(ctx: &AppContext, args: WatchArgs) -> CliResult<()> {
    let slot = slot_for(args.role.into(), args.kind.into())?;
    let interval = args
        .interval_secs
        .map_or(ctx.config.poll_interval, Duration::from_secs);
    if interval.is_zero() {
        return Err(CliError::validation("interval must be positive"));
    }
    let dispatcher = dispatcher(ctx)?;
    let request = ListQueryState::new(slot.default_filter()).current_request();
    load(&dispatcher, slot, &request).await?;
    render_page(&page_view(&dispatcher, slot, 0), ctx.output)?;

    let sleeper = TokioSleeper;
    let task = dispatcher.start_auto_check(slot.target(), sleeper, interval);
    let handle = task.handle();
    let mut checks = 0_u32;
    let result = loop {
        if args.checks.is_some_and(|limit| checks >= limit) {
            break Ok(());
        }
        tokio::select! {
            () = sleeper.sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => break Ok(()),
        }
        checks = checks.saturating_add(1);
        match task.check_once().await {
            CheckOutcome::Updated { previous, latest } => {
                let refreshed =
                    refresh(ctx, &dispatcher, slot, &request, (previous, latest)).await;
                if refreshed.is_err() {
                    break refreshed;
                }
            }
            CheckOutcome::Unchanged => debug!(checks, "no updates"),
            CheckOutcome::Failed => warn!(checks, "freshness check failed; retrying"),
            CheckOutcome::SessionExpired => break Err(CliError::session_expired()),
        }
    };
    dispatcher.stop_auto_check(&handle);
    result
}
