use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use mongodb::Client;
use tracing::info;
use tracing_subscriber::EnvFilter;

use roomsplit::config::Config;
use roomsplit::routes;
use roomsplit::store::MongoStore;
use roomsplit::Ledger;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    info!("Using database {}", config.database);

    let client = Client::with_uri_str(&config.mongodb_uri)
        .await
        .context("failed to connect")?;
    let store = MongoStore::new(&client, &config.database);
    store.init().await.context("failed to prepare collections")?;
    info!("Connected");

    let ledger = web::Data::new(Ledger::new(store));
    let cors_origin = config.cors_origin.clone();

    info!("Listening on {}", config.bind_address);
    HttpServer::new(move || {
        let cors = match &cors_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header(),
            None => Cors::permissive(),
        };
        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(ledger.clone())
            .configure(routes::configure::<MongoStore>)
    })
    .bind(config.bind_address.as_str())?
    .run()
    .await?;

    Ok(())
}
