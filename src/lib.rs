//! CarMatch: a social and dating backend for car enthusiasts.
//!
//! The `data` feature builds the domain, persistence and service layers;
//! `server` adds the Actix-web HTTP API on top.

#[cfg(feature = "data")]
pub mod db;
#[cfg(feature = "data")]
pub mod domain;
#[cfg(feature = "data")]
pub mod dto;
#[cfg(feature = "data")]
pub mod forms;
#[cfg(feature = "data")]
pub mod models;
#[cfg(feature = "data")]
pub mod pagination;
#[cfg(feature = "data")]
pub mod repository;
#[cfg(feature = "data")]
pub mod schema;
#[cfg(feature = "data")]
pub mod services;

#[cfg(feature = "server")]
pub mod routes;

#[cfg(feature = "server")]
pub use server::{configure_api, run};

#[cfg(feature = "server")]
mod server {
    use std::path::Path;

    use actix_cors::Cors;
    use actix_files::Files;
    use actix_web::{App, HttpServer, middleware, web};

    use crate::db::{establish_connection_pool, run_migrations};
    use crate::models::config::ServerConfig;
    use crate::repository::DieselRepository;
    use crate::routes::{self, auth, events, forum, messages, users};

    /// Registers every `/api` handler. Shared by [`run`] and the route tests.
    pub fn configure_api(cfg: &mut web::ServiceConfig) {
        cfg.service(
            web::scope("/api")
                .app_data(routes::json_config())
                .app_data(routes::query_config())
                .service(routes::health)
                .service(auth::register)
                .service(auth::login)
                .service(auth::me)
                .service(users::browse_profiles)
                .service(users::update_profile)
                .service(users::upgrade_to_premium)
                .service(users::get_profile)
                .service(messages::list_messages)
                .service(messages::send_message)
                .service(messages::unread_count)
                .service(messages::list_conversations)
                .service(messages::get_conversation)
                .service(messages::mark_read)
                .service(messages::delete_message)
                .service(events::list_events)
                .service(events::create_event)
                .service(events::get_event)
                .service(events::update_event)
                .service(events::delete_event)
                .service(events::rsvp)
                .service(events::cancel_rsvp)
                .service(events::list_attendees)
                .service(forum::list_categories)
                .service(forum::create_category)
                .service(forum::list_threads)
                .service(forum::create_thread)
                .service(forum::get_thread)
                .service(forum::delete_thread)
                .service(forum::moderate_thread)
                .service(forum::create_post)
                .service(forum::update_post)
                .service(forum::delete_post),
        );
    }

    /// Builds and runs the Actix-Web HTTP server using the provided configuration.
    pub async fn run(server_config: ServerConfig) -> std::io::Result<()> {
        // Establish Diesel connection pool for the SQLite database.
        let pool = establish_connection_pool(&server_config.database_url).map_err(|e| {
            std::io::Error::other(format!("Failed to establish database connection: {e}"))
        })?;
        run_migrations(&pool).map_err(std::io::Error::other)?;

        let repo = DieselRepository::new(pool);

        let static_dir = server_config.static_dir.clone();
        let serve_static = Path::new(&static_dir).is_dir();
        if !serve_static {
            log::warn!("Static directory {static_dir} not found; serving the API only");
        }

        let bind_address = (server_config.address.clone(), server_config.port);
        log::info!("Listening on {}:{}", bind_address.0, bind_address.1);

        HttpServer::new(move || {
            let mut app = App::new()
                .wrap(Cors::permissive())
                .wrap(middleware::Compress::default())
                .wrap(middleware::Logger::default())
                .app_data(web::Data::new(repo.clone()))
                .app_data(web::Data::new(server_config.clone()))
                .configure(configure_api);
            if serve_static {
                app = app.service(Files::new("/", &static_dir).index_file("index.html"));
            }
            app
        })
        .bind(bind_address)?
        .run()
        .await
    }
}
