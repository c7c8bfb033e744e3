use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{
    create_todo, delete_todo, get_todo, health, list_todos, update_todo, AppState,
};

pub fn router(state: AppState) -> Router {
    let todos = Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/:id", get(get_todo).put(update_todo).delete(delete_todo));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", todos)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
