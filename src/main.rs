mod auth;
mod config;
mod database;
mod error;
mod handlers;
mod model;
mod query;
mod seed;

use actix_web::{middleware::Logger, web, App, HttpServer};
use auth::Auth;
use clap::Parser;
use config::Config;
use log::{error, info};
use std::io;
use std::time::Duration;

#[actix_rt::main]
async fn main() -> io::Result<()> {
    let config = Config::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter()))
        .init();

    if let Err(err) = config.validate() {
        error!("Configuration error: {}", err);
        return Err(io::Error::new(io::ErrorKind::InvalidInput, err));
    }

    let db = config.open_store().map_err(|err| {
        error!("Cannot open database at {}: {}", config.db_path.display(), err);
        io::Error::other(err)
    })?;

    if let Some(path) = &config.seed {
        let count = seed::seed_movies(&db, path).map_err(|err| {
            error!("Cannot seed movies from {}: {}", path.display(), err);
            io::Error::other(err)
        })?;
        info!("Seeded {} movie(s) from {}", count, path.display());
    }

    let tera = tera::Tera::new(&config.templates).map_err(|err| {
        error!("Cannot load templates from {}: {}", config.templates, err);
        io::Error::other(err)
    })?;

    let auth = Auth::new(
        config.secret_key.as_bytes(),
        config.bcrypt_cost,
        Duration::from_secs(config.token_ttl),
    );

    let db = web::Data::new(db);
    let tera = web::Data::new(tera);
    let auth = web::Data::new(auth);

    info!("Listening on http://{}:{}", config.host, config.port);

    let server_db = db.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(server_db.clone())
            .app_data(tera.clone())
            .app_data(auth.clone())
            .configure(handlers::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    db.flush().map_err(io::Error::other)?;
    Ok(())
}
