use std::sync::Arc;

use actix_web::HttpServer;
use anyhow::Context;

use common::{
    context::ServiceState,
    entities::issue::Issue,
    error::ServiceError,
    repository::mongo_repository::MongoRepository,
    verification::verify,
};
use issues::{config::Config, create_app};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;

    let issue_repo: MongoRepository<Issue> =
        MongoRepository::new(&config.mongo_uri, &config.database, &config.collection)
            .await
            .map_err(ServiceError::into_inner)
            .context("Failed to connect to MongoDB")?;

    verify(&issue_repo.collection, true)
        .await
        .context("Issues collection verification fail")?;

    let mut state = ServiceState::new();
    state.insert::<Issue>(Arc::new(issue_repo));
    let state = Arc::new(state);

    log::info!("Starting issues service on {}:{}", config.host, config.port);
    HttpServer::new(move || create_app(state.clone()))
        .bind((config.host.as_str(), config.port))?
        .run()
        .await?;
    Ok(())
}
