//! Project tracking commands

use std::time::Instant;

use codetrail_core::{FlushReport, HostNotification};
use codetrail_domain::{
    ActivityEvent, ActivityState, CodetrailError, Result, SolutionContextInfo,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::utils::logging::{error_label, log_command_execution};
use crate::AgentContext;

/// Start tracking a project the host has opened.
///
/// The project is registered with the server when the server does not know
/// it yet. Registration is best-effort: tracking starts even when the server
/// cannot be reached.
///
/// # Errors
/// `Internal` when the id or the name is already tracked.
pub async fn start_tracking(ctx: &AgentContext, project_id: Uuid, name: &str) -> Result<()> {
    let command_name = "tracking::start_tracking";
    let start = Instant::now();

    info!(command = command_name, %project_id, name, "Starting project tracking");
    let now = ctx.now();
    let result: Result<()> =
        ctx.registry.start_tracking(project_id, name, now).map_err(Into::into);
    if result.is_ok() {
        ensure_registered(ctx, project_id, name).await;
    }

    finish(command_name, start, result)
}

/// Stop tracking a project the host has closed.
///
/// # Errors
/// `ProjectNotTracked` for unknown projects.
pub fn stop_tracking(ctx: &AgentContext, project_id: Uuid) -> Result<()> {
    let command_name = "tracking::stop_tracking";
    let start = Instant::now();

    info!(command = command_name, %project_id, "Stopping project tracking");
    let result: Result<()> =
        ctx.registry.stop_tracking(project_id, ctx.now()).map_err(Into::into);
    finish(command_name, start, result)
}

/// Forward an IDE notification to the project's state machine.
///
/// # Errors
/// `ProjectNotTracked` for unknown projects.
pub fn notify(ctx: &AgentContext, project_id: Uuid, notification: HostNotification) -> Result<()> {
    debug!(%project_id, notification = notification.label(), "Host notification");
    ctx.registry.notify(project_id, notification, ctx.now()).map_err(|err| {
        let err = CodetrailError::from(err);
        warn!(%project_id, error_type = error_label(&err), error = %err, "Notification rejected");
        err
    })
}

/// The project's live state, for status displays.
///
/// # Errors
/// `ProjectNotTracked` for unknown projects.
pub fn live_state(ctx: &AgentContext, project_id: Uuid) -> Result<ActivityState> {
    Ok(ctx.registry.live_state(project_id)?)
}

/// The project's open event, if any.
///
/// # Errors
/// `ProjectNotTracked` for unknown projects.
pub fn current_event(ctx: &AgentContext, project_id: Uuid) -> Result<Option<ActivityEvent>> {
    Ok(ctx.registry.current_event(project_id)?)
}

/// Run one flush cycle now instead of waiting for the scheduler.
pub async fn flush_now(ctx: &AgentContext) -> FlushReport {
    let command_name = "tracking::flush_now";
    let start = Instant::now();

    let report = ctx.flush.flush(ctx.now()).await;
    log_command_execution(command_name, start.elapsed(), report.storage_failures == 0);
    report
}

async fn ensure_registered(ctx: &AgentContext, project_id: Uuid, name: &str) {
    let known = ctx.client.get_solution_context(project_id).await;
    if known.is_success() {
        debug!(%project_id, "Project already registered");
        return;
    }
    if known.status_code() != Some(404) {
        warn!(
            %project_id,
            status = %known.status,
            reason = %known.reason,
            "Could not look up project, skipping registration"
        );
        return;
    }

    let solution = SolutionContextInfo {
        solution_id: project_id,
        name: name.to_string(),
        creation_time: ctx.timestamps.format(&ctx.now()),
    };
    let response = ctx.client.register_project(&solution).await;
    if response.is_success() {
        info!(%project_id, name, "Registered project");
    } else {
        warn!(
            %project_id,
            status = %response.status,
            reason = %response.reason,
            "Project registration failed"
        );
    }
}

fn finish(command_name: &str, start: Instant, result: Result<()>) -> Result<()> {
    if let Err(err) = &result {
        warn!(command = command_name, error_type = error_label(err), error = %err, "Command failed");
    }
    log_command_execution(command_name, start.elapsed(), result.is_ok());
    result
}
