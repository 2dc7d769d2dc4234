use std::io;

use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::info;

use ride_sharing_api::{
    config::Config,
    configure_app,
    db::init_db_pool,
    service::log::{init_logger, LoggerMiddleware},
    AppState,
};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    init_logger();

    let config = Config::from_env().map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;
    let pool = init_db_pool(&config.database_url)
        .await
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;
    let host_addr = config.host_addr.clone();
    let state = web::Data::new(AppState::new(pool, config));

    info!("listening on {}", host_addr);
    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(LoggerMiddleware)
            .configure(move |cfg| configure_app(cfg, &state))
    })
    .bind(host_addr)?
    .run()
    .await
}
