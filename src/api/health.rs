use actix_web::{HttpResponse, Responder};

pub const LIVENESS_MESSAGE: &str = "Running clinic portal server";

#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses(
        (status = 200, description = "Process is up", body = String, content_type = "text/plain")
    )
)]
pub async fn liveness() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(LIVENESS_MESSAGE)
}
