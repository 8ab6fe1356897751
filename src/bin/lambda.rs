use dotenv::dotenv;
use ebank_user_service::{
    config::AppConfig,
    lambda::{self, ProxyEvent, ProxyResponse},
    services::UserService,
};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env()?;

    // Resolved once per container, reused across invocations
    let service = Arc::new(UserService::from_config(&config).await?);
    log::info!("🚀 Lambda handler ready");

    lambda_runtime::run(service_fn(move |event: LambdaEvent<ProxyEvent>| {
        let service = Arc::clone(&service);
        async move { Ok::<ProxyResponse, Error>(lambda::handle_event(&service, event.payload).await) }
    }))
    .await
}
