use actix_web::{error::JsonPayloadError, web, Error, HttpRequest};

use crate::errors::QueryError;
use crate::handlers::{frontend, health, query, stats};

pub use crate::handlers::frontend::static_files;

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> Error {
    QueryError::InvalidRequest(err.to_string()).into()
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .service(
            web::scope("/api")
                .configure(query::configure)
                .configure(stats::configure),
        )
        .configure(health::configure)
        .configure(frontend::configure);
}
