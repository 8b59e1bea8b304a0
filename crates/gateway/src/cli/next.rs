//! One-shot lookups for the `[device]` address, without the HTTP server.

use std::sync::Arc;

use chrono::Utc;
use chrono_tz::Tz;

use bc_domain::config::Config;
use bc_domain::RelativeDay;
use bc_sessions::Answer;

use crate::bootstrap::build_app_state;
use crate::turn::{run_turn, Intent, TurnRequest, TurnResponse};

/// Answer `intent` as if the configured device had asked.
pub async fn run(
    config: Arc<Config>,
    intent: Intent,
    category: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let app = build_app_state(config.clone(), None)?;
    let device = &config.device;
    let req = TurnRequest {
        user_id: format!("cli:{}", device.device_id),
        device_id: device.device_id.clone(),
        consent_token: Some("cli".into()),
        device_address: Some(device.address.clone()),
        intent,
        slot: category,
        session: None,
    };

    let response = run_turn(&app, req, Utc::now()).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_plain(&response, app.timezone());
    }

    match response.error {
        Some(err) => anyhow::bail!("{}: {}", err.kind, err.detail),
        None => Ok(()),
    }
}

fn print_plain(response: &TurnResponse, tz: Tz) {
    if let Some(err) = &response.error {
        eprintln!("{}", err.remediation);
        return;
    }
    match &response.answer {
        Some(Answer::Collection(report)) => {
            let when = match report.relative {
                RelativeDay::Today => "today".to_owned(),
                RelativeDay::Tomorrow => "tomorrow".to_owned(),
                RelativeDay::Past | RelativeDay::Later => report
                    .event
                    .date()
                    .local_day(tz)
                    .format("%A %-d %B")
                    .to_string(),
            };
            let slipped = if report.event.is_slipped() { " (rescheduled)" } else { "" };
            println!("{}: {when}{slipped}", report.colours);
        }
        Some(Answer::Refreshed { events }) => println!("fetched {events} upcoming collections"),
        Some(Answer::NotKnownYet) => println!("no upcoming collection known"),
        Some(Answer::NoQuestion) | Some(Answer::Goodbye) | None => {}
    }
}
