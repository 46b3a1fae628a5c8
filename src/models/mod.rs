pub mod auth;
pub mod chunk;
pub mod collection;
pub mod document;
pub mod role;
pub mod search;
pub mod user;

pub use auth::Claims;
pub use user::User;
