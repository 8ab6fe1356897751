use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use ebank_user_service::{api, config::AppConfig, middleware, services::UserService};
use std::io;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(io::Error::other)?;

    log::info!("🚀 Starting E-Bank User Service...");
    log::info!("🌎 Region: {}", config.region);

    // Clients are created once and shared by every worker
    let service = UserService::from_config(&config)
        .await
        .map_err(io::Error::other)?;
    let service_data = web::Data::new(service);

    log::info!("🌐 Server starting on {}:{}", config.host, config.port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", config.host, config.port);

    HttpServer::new(move || {
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(service_data.clone())
            .wrap(middleware::CorsHeaders)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi)
            )
            .configure(api::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
