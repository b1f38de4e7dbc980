use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::info;

use pow_diary::api::{self, AppState};
use pow_diary::config::Config;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = Config::from_env();
    let (host, port) = (config.host.clone(), config.port);

    println!("📘 Starting PoW diary API at http://{host}:{port}");
    info!(
        "sessions start at difficulty {} in {} mode (max {} iterations before relaxing)",
        config.difficulty, config.mode, config.max_iterations
    );

    let state = web::Data::new(AppState::new(config));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
