use actix_web::http::header;
use actix_web::{web, HttpResponse, Responder};
use agent_core::{EventEnvelope, Message, Session, StreamEvent};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::state::AppState;

pub const DONE_FRAME: &str = "data: [DONE]\n\n";

#[derive(Debug, Deserialize)]
pub struct ChatStreamRequest {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Runs one turn and streams its events as SSE frames.
///
/// The body owns the event receiver, so a client disconnect drops it and
/// cancels the turn.
pub async fn handler(
    state: web::Data<AppState>,
    req: web::Json<ChatStreamRequest>,
) -> impl Responder {
    let req = req.into_inner();

    if req.messages.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "messages must not be empty"
        }));
    }

    let session_id = req
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    log::info!(
        "[{}] Stream started with {} message(s)",
        session_id,
        req.messages.len()
    );

    let session = Session::with_messages(session_id, req.messages);
    let handle = state
        .orchestrator
        .spawn_turn(session, CancellationToken::new());
    let mut events = handle.events;

    HttpResponse::Ok()
        .append_header((header::CONTENT_TYPE, "text/event-stream"))
        .append_header((header::CACHE_CONTROL, "no-cache"))
        .append_header((header::CONNECTION, "keep-alive"))
        .streaming(async_stream::stream! {
            while let Some(envelope) = events.recv().await {
                let terminal = envelope.is_terminal();

                if let Some(frame) = event_frame(&envelope) {
                    yield Ok::<_, actix_web::Error>(web::Bytes::from(frame));
                }
                if terminal {
                    yield Ok(web::Bytes::from_static(DONE_FRAME.as_bytes()));
                    break;
                }
            }
        })
}

/// `data: <json>` for every event except `done`, which only produces the
/// `[DONE]` marker.
fn event_frame(envelope: &EventEnvelope) -> Option<String> {
    if envelope.event == StreamEvent::Done {
        return None;
    }

    match serde_json::to_string(envelope) {
        Ok(json) => Some(format!("data: {}\n\n", json)),
        Err(error) => {
            log::error!("Failed to serialize stream event: {}", error);
            None
        }
    }
}
