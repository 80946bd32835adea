//! Club administration backend.
//!
//! REST API over SQLite for contacts, events and budgets, committee meetings with
//! parliamentary motions, mailing batches and a small website CMS. Contacts are
//! searchable through a Tantivy index.

mod api;
mod auth;
mod config;
mod db;
mod dedup;
mod errors;
mod metrics;
mod models;
mod procedure;
mod search;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;
use search::SearchIndex;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub search: Arc<SearchIndex>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let (text_layer, json_layer) = if config.log_json {
        (None, Some(tracing_subscriber::fmt::layer().json()))
    } else {
        (Some(tracing_subscriber::fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
        .init();

    tracing::info!("Starting club backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Index path: {:?}", config.index_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (CLUB_API_PSK). Authentication is disabled!");
    }

    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    let search = Arc::new(SearchIndex::open(&config.index_path)?);

    tracing::info!("Building contact index...");
    let contacts = repo.list_contacts().await?;
    search.rebuild(&contacts).await?;
    tracing::info!("Contact index built with {} contacts", contacts.len());

    let state = AppState {
        repo,
        search,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Overview
        .route("/datastore/revision", get(api::get_revision))
        .route("/overview", get(api::get_overview))
        // Contacts
        .route("/contacts", get(api::list_contacts).post(api::create_contact))
        .route("/contacts/search", get(api::search_contacts))
        .route("/contacts/duplicates", post(api::find_duplicates))
        .route("/contacts/import", post(api::import_contacts))
        .route(
            "/contacts/{id}",
            get(api::get_contact)
                .put(api::update_contact)
                .delete(api::delete_contact),
        )
        // Events and budget scenarios
        .route("/events", get(api::list_events).post(api::create_event))
        .route(
            "/events/{id}",
            get(api::get_event)
                .put(api::update_event)
                .delete(api::delete_event),
        )
        .route(
            "/events/{id}/scenarios",
            get(api::list_scenarios).post(api::create_scenario),
        )
        .route(
            "/scenarios/{id}",
            get(api::get_scenario)
                .put(api::update_scenario)
                .delete(api::delete_scenario),
        )
        .route("/scenarios/{id}/duplicate", post(api::duplicate_scenario))
        .route("/scenarios/{id}/metrics", get(api::get_scenario_metrics))
        // Committees
        .route(
            "/committees",
            get(api::list_committees).post(api::create_committee),
        )
        .route(
            "/committees/{id}",
            get(api::get_committee)
                .put(api::update_committee)
                .delete(api::delete_committee),
        )
        // Meetings and agendas
        .route("/meetings", get(api::list_meetings).post(api::create_meeting))
        .route(
            "/meetings/{id}",
            get(api::get_meeting)
                .put(api::update_meeting)
                .delete(api::delete_meeting),
        )
        .route("/meetings/{id}/start", post(api::start_meeting))
        .route("/meetings/{id}/adjourn", post(api::adjourn_meeting))
        .route("/meetings/{id}/cancel", post(api::cancel_meeting))
        .route("/meetings/{id}/minutes", put(api::update_minutes))
        .route(
            "/meetings/{id}/agenda",
            get(api::list_agenda).post(api::create_agenda_item),
        )
        .route("/meetings/{id}/agenda/order", put(api::reorder_agenda))
        .route(
            "/agenda/{id}",
            put(api::update_agenda_item).delete(api::delete_agenda_item),
        )
        // Motions
        .route(
            "/meetings/{id}/motions",
            get(api::list_motions).post(api::create_motion),
        )
        .route("/motions/{id}", get(api::get_motion))
        .route("/motions/{id}/actions", post(api::apply_motion_action))
        // Mailing lists and batches
        .route(
            "/lists",
            get(api::list_mailing_lists).post(api::create_mailing_list),
        )
        .route(
            "/lists/{id}",
            get(api::get_mailing_list)
                .put(api::update_mailing_list)
                .delete(api::delete_mailing_list),
        )
        .route(
            "/lists/{id}/members",
            get(api::list_members).post(api::subscribe),
        )
        .route(
            "/lists/{id}/members/{contact_id}",
            delete(api::unsubscribe),
        )
        .route("/batches", get(api::list_batches).post(api::create_batch))
        .route("/batches/{id}", get(api::get_batch))
        .route("/batches/{id}/send", post(api::send_batch))
        .route("/batches/{id}/close", post(api::close_batch))
        .route(
            "/batches/{id}/recipients/{recipient_id}",
            put(api::update_recipient),
        )
        // Website CMS
        .route("/pages", get(api::list_pages).post(api::create_page))
        .route(
            "/pages/{id}",
            get(api::get_page)
                .put(api::update_page)
                .delete(api::delete_page),
        )
        .route("/posts", get(api::list_posts).post(api::create_post))
        .route(
            "/posts/{id}",
            get(api::get_post)
                .put(api::update_post)
                .delete(api::delete_post),
        )
        .route("/posts/{id}/publish", post(api::publish_post))
        .route("/posts/{id}/unpublish", post(api::unpublish_post))
        .route("/menus", get(api::list_menus).post(api::create_menu))
        .route(
            "/menus/{id}",
            get(api::get_menu)
                .put(api::update_menu)
                .delete(api::delete_menu),
        )
        .route("/submissions", get(api::list_submissions))
        .route(
            "/submissions/{id}",
            put(api::update_submission).delete(api::delete_submission),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    // Public website, no auth
    let public_routes = Router::new()
        .route("/pages/{slug}", get(api::public_page))
        .route("/posts", get(api::public_posts))
        .route("/posts/{slug}", get(api::public_post))
        .route("/menus/{name}", get(api::public_menu))
        .route("/contact", post(api::submit_contact_form));

    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .nest("/public", public_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
