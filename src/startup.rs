use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::configuration::CookieSettings;
use crate::identity::IdentityProvider;
use crate::middleware::{AccessGuard, CsrfGuard};
use crate::routes::cookies::CookiePolicy;
use crate::routes::{get_current_user, health_check, login, logout, refresh, register};
use crate::session::SessionController;

pub fn run(
    listener: TcpListener,
    sessions: SessionController,
    identities: Arc<dyn IdentityProvider>,
    cookies: CookieSettings,
) -> Result<Server, std::io::Error> {
    let sessions_data = web::Data::new(sessions.clone());
    let identities_data: web::Data<dyn IdentityProvider> = web::Data::from(identities);
    let cookies_data = web::Data::new(CookiePolicy::new(cookies));

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            // Shared state
            .app_data(sessions_data.clone())
            .app_data(identities_data.clone())
            .app_data(cookies_data.clone())
            .route("/health_check", web::get().to(health_check))
            // Session lifecycle; only logout needs the CSRF header
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    .service(
                        web::resource("/logout")
                            .wrap(CsrfGuard::new(sessions.clone()))
                            .route(web::post().to(logout)),
                    ),
            )
            // Protected routes (require an access token)
            .service(
                web::scope("/api")
                    .wrap(CsrfGuard::new(sessions.clone()))
                    .wrap(AccessGuard::new(sessions.clone()))
                    .route("/me", web::get().to(get_current_user)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
