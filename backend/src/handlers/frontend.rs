use actix_files::{Files, NamedFile};
use actix_web::{web, HttpRequest, HttpResponse};
use biograph_models::ErrorResponse;
use std::path::PathBuf;
use tracing::warn;

use crate::state::AppState;

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse {
        error: "Frontend not found".to_string(),
        retryable: false,
    })
}

pub async fn index(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let Some(dir) = &state.frontend_dir else {
        return not_found();
    };

    match NamedFile::open_async(dir.join("index.html")).await {
        Ok(file) => file.into_response(&req),
        Err(e) => {
            warn!("⚠️ Failed to open {}/index.html: {}", dir.display(), e);
            not_found()
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index));
}

/// Mount the frontend directory at `/static` so `index.html` can load its
/// scripts and stylesheets. Nothing is mounted without a frontend.
pub fn static_files(frontend_dir: Option<PathBuf>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        if let Some(dir) = frontend_dir {
            cfg.service(Files::new("/static", dir));
        }
    }
}
