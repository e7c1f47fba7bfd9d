//! HTTP JSON API built on axum.
//!
//! Handlers stay thin: they extract the viewer and parameters, call into
//! [`crate::core`] and wrap the result in a view from [`serializers`].

pub mod auth;
pub mod error;
pub mod ingredients;
pub mod params;
pub mod recipes;
pub mod serializers;
pub mod tags;
pub mod users;

use crate::{
    config::AppConfig,
    core::toggle::{Subject, Toggled},
    errors::Result,
};
use axum::{
    Json, Router,
    http::{
        Method, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use serializers::{RecipeShort, SubscriptionView};
use std::{sync::Arc, time::Duration};
use tokio::{
    net::TcpListener,
    signal::{self, ctrl_c},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Connection pool for all queries
    pub database: DatabaseConnection,
    pub config: Arc<AppConfig>,
}

/// Builds the application router with all routes and middleware.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/users/", get(users::list).post(users::register))
        .route("/users/me/", get(users::me))
        .route("/users/subscriptions/", get(users::subscriptions))
        .route("/users/:id/", get(users::retrieve))
        .route(
            "/users/:id/subscribe/",
            post(users::subscribe).delete(users::unsubscribe),
        )
        .route("/tags/", get(tags::list))
        .route("/tags/:id/", get(tags::retrieve))
        .route("/ingredients/", get(ingredients::list))
        .route("/ingredients/:id/", get(ingredients::retrieve))
        .route("/recipes/", get(recipes::list).post(recipes::create))
        .route(
            "/recipes/download_shopping_cart/",
            get(recipes::download_shopping_cart),
        )
        .route(
            "/recipes/:id/",
            get(recipes::retrieve)
                .patch(recipes::update)
                .delete(recipes::destroy),
        )
        .route(
            "/recipes/:id/favorite/",
            post(recipes::add_favorite).delete(recipes::remove_favorite),
        )
        .route(
            "/recipes/:id/shopping_cart/",
            post(recipes::add_to_cart).delete(recipes::remove_from_cart),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Turns a toggle outcome into a response: 201 with the subject's view when a
/// link was added, 204 with an empty body when one was removed.
pub(crate) async fn toggle_response(
    db: &DatabaseConnection,
    toggled: Toggled,
    viewer: i64,
    recipes_limit: Option<u64>,
) -> Result<Response> {
    Ok(match toggled {
        Toggled::Added(Subject::Recipe(recipe)) => {
            (StatusCode::CREATED, Json(RecipeShort::from(recipe))).into_response()
        }
        Toggled::Added(Subject::Author(author)) => {
            let view = SubscriptionView::build(db, author, Some(viewer), recipes_limit).await?;
            (StatusCode::CREATED, Json(view)).into_response()
        }
        Toggled::Removed => StatusCode::NO_CONTENT.into_response(),
    })
}

/// Binds `state.config.bind_address` and serves the API until Ctrl+C or SIGTERM.
pub async fn serve(state: AppState) -> Result<()> {
    let address = state.config.bind_address.clone();
    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
