//! Feature services layered on the session

pub mod favorites;

pub use favorites::FavoritesService;
