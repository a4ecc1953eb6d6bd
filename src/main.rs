use actix_web::{web, App, HttpServer, middleware::{Logger, DefaultHeaders}, cookie::Key, HttpResponse, Responder};
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use tera::Tera;
use usermaint_backend::{config::Config, routes, setup::db_setup};
use r2d2::Pool;
use clap::Parser;
use std::path::PathBuf;

/// A simple handler for the root URL.
async fn root_handler() -> impl Responder {
    HttpResponse::Ok().content_type("text/plain").body("OK")
}

#[derive(Parser, Debug)]
#[command(name = "usermaint_server", author, version, about = "Starts the user maintenance web server.")]
struct Cli {
    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file)
        .expect("FATAL: Failed to load or parse configuration.");

    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    let tera = Tera::new("templates/**/*.html").expect("Tera initialization failed");

    let db_path = config.users_db_path();
    if !db_path.exists() {
        panic!(
            "FATAL: database not found at '{}'. Run 'cargo run --bin setup_cli -- --env-file <path> db setup'",
            db_path.display()
        );
    }

    let pool = Pool::builder()
        .build(db_setup::connection_manager(&db_path))
        .expect("FATAL: Failed to create Rusqlite connection pool.");

    let session_key_bytes = hex::decode(&config.session_secret_key)
        .expect("FATAL: SESSION_SECRET_KEY in .env is not a valid hex string.");
    let session_key = Key::try_from(session_key_bytes.as_slice())
        .expect("FATAL: The decoded SESSION_SECRET_KEY is not long enough (minimum 64 bytes required).");

    let server_address = format!("{}:{}", config.web.host, config.web.port);
    log::info!("Server starting at http://{}", server_address);

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(CookieSessionStore::default(), session_key.clone())
            .cookie_secure(config.use_secure_cookies)
            .cookie_http_only(true)
            .cookie_same_site(actix_web::cookie::SameSite::Lax)
            .build();

        App::new()
            .wrap(session_mw)
            .wrap(Logger::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block"))
            )
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(tera.clone()))
            .app_data(web::Data::new(pool.clone()))
            .service(actix_files::Files::new("/static", "./static"))
            .route("/", web::get().to(root_handler))
            .configure(routes::users::config_users)
    })
    .bind(server_address)?
    .run()
    .await
}
