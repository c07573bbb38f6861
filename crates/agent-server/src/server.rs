use actix_web::{web, App, HttpServer};
use std::io;

use crate::handlers;
use crate::state::AppState;

pub fn app_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route(
                "/chat/stream",
                web::post().to(handlers::chat_stream::handler),
            )
            .route("/tools", web::get().to(handlers::tools::handler))
            .route("/models", web::get().to(handlers::models::handler)),
    );
}

pub async fn run_server(port: u16, state: AppState) -> io::Result<()> {
    log::info!("Listening on 0.0.0.0:{}", port);
    let state = web::Data::new(state);

    HttpServer::new(move || App::new().app_data(state.clone()).configure(app_config))
        .bind(format!("0.0.0.0:{}", port))?
        .run()
        .await
}
