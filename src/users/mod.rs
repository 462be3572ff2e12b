use crate::state::AppState;
use axum::Router;

mod dto;
pub(crate) mod extractors;
pub mod handlers;
mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;
mod token;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
