#[macro_use]
extern crate lazy_static;

use actix_files::{Files, NamedFile};
use actix_web::{
    http::{Method, StatusCode},
    middleware,
    web::{self, Data},
    App, Either, HttpResponse, HttpServer, Responder,
};
use log::info;
use sqlx::SqlitePool;
use tera::Tera;

mod config;
mod db;
mod errors;
mod menu;
mod routes;
mod settings;
mod structs;
mod utils;
mod validation;

use config::Config;

#[derive(Debug, Clone)]
pub struct AppState {
    db_pool: SqlitePool,
    http_client: reqwest::Client,
    menu_url: String,
}

lazy_static! {
    pub static ref TEMPLATES: Tera = {
        let mut tera = match Tera::new("templates/**/*") {
            Ok(t) => t,
            Err(e) => {
                log::error!("Parsing error(s): {}", e);
                ::std::process::exit(1);
            }
        };
        tera.autoescape_on(vec![".html"]);
        tera.register_filter("price", utils::price_filter);
        tera
    };
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::load()?;
    let db_pool = db::connect(&config.database_url).await?;
    let http_client = reqwest::Client::new();

    if let Some(stored) = menu::refresh_menu(&http_client, &db_pool, &config.menu_url).await {
        info!("Startup sync cached {} dishes", stored);
    } else {
        let cached = db::count_dishes(&db_pool).await.map_err(errors::AppError::from)?;
        info!("Serving {} previously cached dishes", cached);
    }

    let state = AppState {
        db_pool,
        http_client,
        menu_url: config.menu_url.clone(),
    };

    info!("Starting HTTP server on http://{}:{}/", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Compress::default())
            // register the logger last so it sees the final response
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", "static"))
            .configure(routes::configure)
            .app_data(Data::new(state.clone()))
            .default_service(web::to(default_handler))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

async fn default_handler(req_method: Method) -> Result<impl Responder, std::io::Error> {
    match req_method {
        Method::GET => {
            let file = NamedFile::open("static/404.html")?
                .customize()
                .with_status(StatusCode::NOT_FOUND);
            Ok(Either::Left(file))
        }
        _ => Ok(Either::Right(HttpResponse::MethodNotAllowed().finish())),
    }
}
