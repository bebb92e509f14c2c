pub mod error;
pub mod memory;
pub mod movie_service;
pub mod rest_api;
pub mod state;
