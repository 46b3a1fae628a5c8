pub mod auth;
pub mod collections;
pub mod documents;
pub mod search;
pub mod users;

use actix_web::web;

pub fn create_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/auth").configure(auth::create_routes))
        .service(web::scope("/users").configure(users::create_routes))
        .service(web::scope("/roles").configure(users::role_routes))
        .service(web::scope("/collections").configure(collections::create_routes))
        .service(web::scope("/documents").configure(documents::create_routes))
        .service(web::scope("/search").configure(search::create_routes));
}
