// src/routes.rs

use std::sync::Arc;

use axum::{
    Router, http::Method,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
};
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    cache::cache_middleware,
    handlers::{
        auth, category, chapter, class, dashboard, question, quiz, records, settings, subject,
        users,
    },
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// Layer ordering matters on every cached router: authentication runs
/// before the cache so a hit can never serve protected data to an
/// unauthenticated caller, and mutating routes sit behind the admin
/// check. The cache middleware itself ignores non-GET requests.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(30)
        .finish()
        .expect("invalid rate limiter configuration");
    let governor_conf = Arc::new(governor_conf);

    // Account management lives under /api/auth: public credential flows,
    // token-protected self-service, and admin-only user administration.
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/verify-otp", post(auth::verify_otp))
        .route("/reset-password", post(auth::reset_password))
        .merge(
            Router::new()
                .route("/logout", post(auth::logout))
                .route("/profile", get(auth::get_profile).put(auth::update_profile))
                .route("/change-password", put(auth::change_password))
                .layer(from_fn_with_state(state.clone(), auth_middleware)),
        )
        .merge(
            Router::new()
                .route("/users", get(users::list_users).post(users::create_user))
                .route(
                    "/users/{id}",
                    get(users::get_user)
                        .put(users::update_user)
                        .delete(users::delete_user),
                )
                .route("/admins", get(users::list_admins))
                .route("/admins/{id}", delete(users::delete_admin))
                .layer(from_fn_with_state(state.clone(), cache_middleware))
                .layer(from_fn(admin_middleware))
                .layer(from_fn_with_state(state.clone(), auth_middleware)),
        );

    let class_routes = Router::new()
        .route("/", get(class::list_classes))
        .route("/{id}", get(class::get_class))
        .layer(from_fn_with_state(state.clone(), cache_middleware))
        .merge(
            Router::new()
                .route("/", post(class::create_class))
                .route(
                    "/{id}",
                    put(class::update_class).delete(class::delete_class),
                )
                .layer(from_fn(admin_middleware)),
        )
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let subject_routes = Router::new()
        .route("/", get(subject::list_subjects))
        .route("/{id}", get(subject::get_subject))
        .route("/class/{class_id}", get(subject::list_subjects_by_class))
        .layer(from_fn_with_state(state.clone(), cache_middleware))
        .merge(
            Router::new()
                .route("/", post(subject::create_subject))
                .route(
                    "/{id}",
                    put(subject::update_subject).delete(subject::delete_subject),
                )
                .layer(from_fn(admin_middleware)),
        )
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let chapter_routes = Router::new()
        .route("/", get(chapter::list_chapters))
        .route("/{id}", get(chapter::get_chapter))
        .route(
            "/subject/{subject_id}",
            get(chapter::list_chapters_by_subject),
        )
        .layer(from_fn_with_state(state.clone(), cache_middleware))
        .merge(
            Router::new()
                .route("/", post(chapter::create_chapter))
                .route(
                    "/{id}",
                    put(chapter::update_chapter).delete(chapter::delete_chapter),
                )
                .layer(from_fn(admin_middleware)),
        )
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let category_routes = Router::new()
        .route("/", get(category::list_categories))
        .route("/{id}", get(category::get_category))
        .layer(from_fn_with_state(state.clone(), cache_middleware))
        .merge(
            Router::new()
                .route("/", post(category::create_category))
                .route(
                    "/{id}",
                    put(category::update_category).delete(category::delete_category),
                )
                .layer(from_fn(admin_middleware)),
        )
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let quiz_routes = Router::new()
        .route("/", get(quiz::list_quizzes))
        .route("/{id}", get(quiz::get_quiz))
        .route("/chapter/{chapter_id}", get(quiz::get_quiz_by_chapter))
        .layer(from_fn_with_state(state.clone(), cache_middleware))
        .route("/submit", post(quiz::submit_quiz))
        .merge(
            Router::new()
                .route("/", post(quiz::create_quiz))
                .route("/{id}", put(quiz::update_quiz).delete(quiz::delete_quiz))
                .layer(from_fn(admin_middleware)),
        )
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    // Question payloads include answers, so the whole router is admin-only.
    let question_routes = Router::new()
        .route(
            "/",
            get(question::list_questions).post(question::create_question),
        )
        .route(
            "/{id}",
            get(question::get_question)
                .put(question::update_question)
                .delete(question::delete_question),
        )
        .layer(from_fn_with_state(state.clone(), cache_middleware))
        .layer(from_fn(admin_middleware))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    // Per-user records are identity-dependent, so they bypass the cache.
    let record_routes = Router::new()
        .route("/", get(records::list_my_records))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let report_routes = Router::new()
        .route("/quiz/{quiz_id}", get(records::quiz_report))
        .layer(from_fn_with_state(state.clone(), cache_middleware))
        .layer(from_fn(admin_middleware))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let dashboard_routes = Router::new()
        .route("/stats", get(dashboard::stats))
        .route("/new-users", get(dashboard::new_users))
        .layer(from_fn_with_state(state.clone(), cache_middleware))
        .layer(from_fn(admin_middleware))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let settings_routes = Router::new()
        .route("/{kind}", get(settings::get_settings))
        .layer(from_fn_with_state(state.clone(), cache_middleware))
        .merge(
            Router::new()
                .route("/{kind}", put(settings::put_settings))
                .layer(from_fn(admin_middleware))
                .layer(from_fn_with_state(state.clone(), auth_middleware)),
        );

    Router::new()
        .route("/api/health", get(|| async { "ok" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/classes", class_routes)
        .nest("/api/subjects", subject_routes)
        .nest("/api/chapters", chapter_routes)
        .nest("/api/categories", category_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/questions", question_routes)
        .nest("/api/quiz-records", record_routes)
        .nest("/api/reports", report_routes)
        .nest("/api/dashboard", dashboard_routes)
        .nest("/api/settings", settings_routes)
        // Global middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(GovernorLayer::new(governor_conf))
        .with_state(state)
}
