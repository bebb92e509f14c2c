//! Movie operations over a plain in-process list.
//!
//! Not used by the REST API. Unlike [`crate::movie_service::MovieService`],
//! lookups report a missing movie as `None` (or `false` for delete) instead of
//! an error. Mutation needs `&mut self`, so shared use has to be serialized by
//! the owner, e.g. behind a `Mutex`.

use garde::Validate as _;
use movieshub_dal::movie::{is_valid_rating, CreateMovie, Movie};

use crate::error::{MovieError, MovieResult};

#[derive(Debug, Default)]
pub struct InMemoryMovieService {
    movies: Vec<Movie>,
    last_id: i64,
}

impl InMemoryMovieService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a validated copy under a fresh id, ids are never reused.
    pub fn add_movie(&mut self, candidate: CreateMovie) -> MovieResult<Movie> {
        candidate.validate()?;
        self.last_id += 1;
        let movie = Movie::new(self.last_id, candidate);
        self.movies.push(movie.clone());
        Ok(movie)
    }

    /// Insertion order, possibly empty.
    pub fn get_all_movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn get_movie_by_id(&self, id: i64) -> Option<&Movie> {
        self.movies.iter().find(|m| m.id == id)
    }

    pub fn get_movies_by_release_year(&self, release_year: &str) -> Vec<&Movie> {
        self.movies
            .iter()
            .filter(|m| m.year == release_year)
            .collect()
    }

    /// Case insensitive, first match in insertion order.
    pub fn get_movie_by_title(&self, title: &str) -> Option<&Movie> {
        let title = title.to_lowercase();
        self.movies.iter().find(|m| m.title.to_lowercase() == title)
    }

    pub fn update_rating(&mut self, id: i64, rating: f64) -> MovieResult<Option<&Movie>> {
        if !is_valid_rating(rating) {
            return Err(MovieError::Validation(format!(
                "Rating must be between 0 and 10, got {rating}"
            )));
        }
        Ok(self.find_mut(id).map(|movie| {
            movie.rating = rating;
            &*movie
        }))
    }

    pub fn update_genre(&mut self, id: i64, genre: &str) -> MovieResult<Option<&Movie>> {
        if genre.trim().is_empty() {
            return Err(MovieError::Validation(
                "Genre must not be blank".to_string(),
            ));
        }
        Ok(self.find_mut(id).map(|movie| {
            movie.genre = genre.to_string();
            &*movie
        }))
    }

    pub fn delete_movie(&mut self, id: i64) -> bool {
        match self.movies.iter().position(|m| m.id == id) {
            Some(pos) => {
                self.movies.remove(pos);
                true
            }
            None => false,
        }
    }

    fn find_mut(&mut self, id: i64) -> Option<&mut Movie> {
        self.movies.iter_mut().find(|m| m.id == id)
    }
}
