use std::net::{IpAddr, SocketAddr};

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wedding_backend::{
    AppState,
    config::Config,
    middleware::{admin_middleware, auth_middleware, log_errors},
    routes,
};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    // 设置数据库连接池
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'wedding_backend';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    // 设置应用状态
    let state = AppState {
        pool,
        config: config.clone(),
    };

    // 公开路由：注册、登录、验证与找回流程
    let public_routes = Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route(
            "/auth/forgotten-password",
            post(routes::auth::forgotten_password),
        )
        .route("/auth/reset-password", post(routes::auth::reset_password))
        .route("/auth/verify-email", post(routes::auth::verify_email))
        // 注册页按注册码预览席位
        .route(
            "/groups/by-code",
            get(routes::group::find_by_registration_code),
        );

    // 需要认证的路由
    let protected_routes = Router::new()
        .route("/auth/logout", post(routes::auth::logout))
        .route("/auth/change-password", post(routes::auth::change_password))
        .route("/auth/check-token", get(routes::auth::check_token))
        .route(
            "/users/me",
            get(routes::user::get_me).patch(routes::user::patch_me),
        )
        .route(
            "/users/invitation",
            get(routes::user::get_invitation).post(routes::user::submit_invitation),
        )
        .route("/menu/all", get(routes::menu::get_all))
        .route("/menu/by-id", get(routes::menu::get_item))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // 管理路由：先过认证再查admin标记
    let admin_routes = Router::new()
        .route("/users/all", get(routes::user::all_users))
        .route("/users/find", get(routes::user::find_user))
        .route(
            "/users/by-id",
            get(routes::user::get_user)
                .patch(routes::user::patch_user)
                .delete(routes::user::delete_user),
        )
        .route("/groups/all", get(routes::group::all_groups))
        .route("/groups/create", post(routes::group::create_group))
        .route(
            "/groups/by-id",
            get(routes::group::get_group)
                .patch(routes::group::patch_group)
                .delete(routes::group::delete_group),
        )
        .route("/groups/add-guest", post(routes::group::add_guest))
        .route("/groups/remove-guest", post(routes::group::remove_guest))
        .route("/groups/relate-guest", post(routes::group::relate_guest))
        .route(
            "/groups/unrelate-guest",
            post(routes::group::unrelate_guest),
        )
        .route("/menu/create", post(routes::menu::create_item))
        .route("/menu/update", put(routes::menu::update_item))
        .route("/menu/delete", delete(routes::menu::delete_item))
        .route("/guests/update-menu", put(routes::menu::update_guest_menu))
        .layer(axum::middleware::from_fn(admin_middleware))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // 创建基础路由
    let router = Router::new().nest(
        &state.config.api_base_uri.clone(),
        Router::new()
            .merge(public_routes)
            .merge(protected_routes)
            .merge(admin_routes),
    );

    // 添加日志中间件
    let router = router.layer(axum::middleware::from_fn(log_errors));

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        let cors = CorsLayer::permissive();
        router.layer(cors)
    };

    // 添加应用状态
    let app = router.with_state(state.clone());

    // 启动服务器
    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app,
    )
    .await
    .expect("Failed to start server");
}
