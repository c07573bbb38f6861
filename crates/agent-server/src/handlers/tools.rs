use actix_web::{web, HttpResponse, Responder};

use crate::state::AppState;

pub async fn handler(state: web::Data<AppState>) -> impl Responder {
    let tools = state.orchestrator.registry().definitions();
    HttpResponse::Ok().json(serde_json::json!({ "tools": tools }))
}
