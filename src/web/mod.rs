//! The form page and its submission endpoint.

mod page;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Form, Json, Router,
};
use log::info;
use serde_json::json;
use std::sync::Arc;

use crate::advisor::RecipeAdvisor;
use crate::model::RecipeForm;
use crate::presenter::Presentation;

pub use page::render as render_page;

/// Routes for the recipe form, sharing one advisor across requests
pub fn router(advisor: Arc<RecipeAdvisor>) -> Router {
    Router::new()
        .route("/", get(form_page))
        .route("/recipe", post(submit_recipe))
        .route("/health", get(health_check))
        .with_state(advisor)
}

/// Serve the form until the process is stopped
pub async fn serve(advisor: Arc<RecipeAdvisor>, address: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    info!("Serving the recipe form on http://{}", listener.local_addr()?);
    axum::serve(listener, router(advisor)).await
}

async fn form_page(State(advisor): State<Arc<RecipeAdvisor>>) -> Html<String> {
    Html(page::render(
        advisor.time_policy(),
        &RecipeForm::default(),
        None,
    ))
}

async fn submit_recipe(
    State(advisor): State<Arc<RecipeAdvisor>>,
    Form(form): Form<RecipeForm>,
) -> impl IntoResponse {
    let presentation = advisor.submit(&form).await;
    let status = match presentation {
        Presentation::Recipe { .. } => StatusCode::OK,
        Presentation::Warning { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Presentation::Failure { .. } => StatusCode::BAD_GATEWAY,
    };

    (
        status,
        Html(page::render(
            advisor.time_policy(),
            &form,
            Some(&presentation),
        )),
    )
}

async fn health_check(State(advisor): State<Arc<RecipeAdvisor>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "provider": advisor.provider_name(),
        "model": advisor.model(),
        "template": advisor.template().name(),
    }))
}
