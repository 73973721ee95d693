pub mod movie_service;
pub mod upload_service;
