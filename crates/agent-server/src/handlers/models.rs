use actix_web::{web, HttpResponse, Responder};

use crate::state::AppState;

pub async fn handler(state: web::Data<AppState>) -> impl Responder {
    let provider = state.orchestrator.provider();

    match provider.list_models().await {
        Ok(models) => HttpResponse::Ok().json(serde_json::json!({
            "models": models,
            "current": provider.model(),
        })),
        Err(e) => {
            log::error!("Failed to list models: {}", e);
            HttpResponse::BadGateway().json(serde_json::json!({
                "error": format!("Failed to list models: {}", e)
            }))
        }
    }
}
