//! One conversational turn: prepare the state, answer the intent, persist.
//!
//! The request/response shapes are this gateway's own; the voice
//! front-end maps its intents and session attributes onto them.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bc_domain::error::{Error, ErrorKind, Result};
use bc_domain::{CachedState, Category, DeviceAddress};
use bc_sessions::{Answer, Dialogue, SessionOrchestrator, TurnContext};

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// "Which bin is it today?"
    NextCollection,
    /// "When is the blue bin?"  Needs `slot`.
    NextOfCategory,
    /// "I missed the bin."
    Missed,
    Yes,
    No,
    /// "Get fresh data."
    GetFreshData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TurnRequest {
    pub user_id: String,
    pub device_id: String,
    #[serde(default)]
    pub consent_token: Option<String>,
    /// The device's address as fetched by the front-end.  Ignored when the
    /// server runs with a mock device.
    #[serde(default)]
    pub device_address: Option<DeviceAddress>,
    pub intent: Intent,
    /// Raw category slot ("blue", "recycling", "GREEN" ...).
    #[serde(default)]
    pub slot: Option<String>,
    /// State carried in the conversation session from the previous turn.
    #[serde(default)]
    pub session: Option<CachedState>,
}

impl TurnRequest {
    fn context(&self) -> TurnContext {
        TurnContext {
            user_id: self.user_id.clone(),
            device_id: self.device_id.clone(),
            consent_token: self.consent_token.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TurnResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<Answer>,
    /// State to send back with the next turn of this session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<CachedState>,
    pub refreshed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<TurnError>,
}

/// What the front-end needs to tell the user something went wrong.
#[derive(Debug, Serialize)]
pub struct TurnError {
    pub kind: ErrorKind,
    pub detail: String,
    pub remediation: &'static str,
    /// Ask the user to grant address permission in the companion app.
    pub consent_prompt: bool,
}

impl From<&Error> for TurnError {
    fn from(e: &Error) -> Self {
        Self {
            kind: e.kind(),
            detail: e.to_string(),
            remediation: e.remediation(),
            consent_prompt: e.needs_consent_prompt(),
        }
    }
}

impl TurnResponse {
    fn failed(e: &Error) -> Self {
        Self {
            answer: None,
            session: None,
            refreshed: false,
            error: Some(e.into()),
        }
    }
}

/// Run one turn within the configured deadline.  Errors become part of the
/// response rather than a failed request.
pub async fn run_turn(app: &AppState, req: TurnRequest, now: DateTime<Utc>) -> TurnResponse {
    let deadline = Duration::from_millis(app.config.server.turn_deadline_ms);
    let orch = Arc::new(app.orchestrator(req.device_address.clone()));

    let outcome = match tokio::time::timeout(deadline, answer(app, &orch, &req, now)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(Error::Timeout(format!(
            "turn exceeded {}ms",
            app.config.server.turn_deadline_ms
        ))),
    };

    match outcome {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(
                user_id = %req.user_id,
                intent = ?req.intent,
                kind = %e.kind(),
                error = %e,
                "turn failed"
            );
            TurnResponse::failed(&e)
        }
    }
}

async fn answer(
    app: &AppState,
    orch: &Arc<SessionOrchestrator>,
    req: &TurnRequest,
    now: DateTime<Utc>,
) -> Result<TurnResponse> {
    let ctx = req.context();
    let mut turn = orch.begin_turn(&ctx, req.session.clone(), now).await?;
    let dialogue = Dialogue::new(now, app.timezone());

    let answer = match req.intent {
        Intent::NextCollection => dialogue.next_collection(&mut turn.state),
        Intent::NextOfCategory => {
            let slot = req.slot.as_deref().unwrap_or_default();
            let category = Category::resolve_slot(slot)?;
            dialogue.next_of_category(&mut turn.state, category)
        }
        Intent::Missed => dialogue.missed(&mut turn.state),
        Intent::Yes => dialogue.yes(&mut turn.state),
        Intent::No => dialogue.no(&mut turn.state),
        Intent::GetFreshData => {
            // A refresh in `begin_turn` may have been served from the memo.
            turn.state = orch.force_refresh(&ctx, now).await?;
            turn.refreshed = true;
            Answer::Refreshed {
                events: turn.state.collections.len(),
            }
        }
    };

    orch.end_turn(&ctx, &mut turn.state).await?;

    if !turn.refreshed && orch.policy().should_refresh_in_background(&turn.state, now) {
        let orch = orch.clone();
        let state = turn.state.clone();
        let identity = turn.identity.clone();
        tokio::spawn(async move {
            if let Err(e) = orch.refresh_in_background(&ctx, &identity, &state, now).await {
                tracing::warn!(user_id = %ctx.user_id, error = %e, "background refresh failed");
            }
        });
    }

    Ok(TurnResponse {
        answer: Some(answer),
        session: Some(turn.state),
        refreshed: turn.refreshed,
        error: None,
    })
}
