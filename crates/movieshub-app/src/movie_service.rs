//! Business rules for movie records.
//!
//! [`MovieService`] is the only place where rules are checked and storage
//! outcomes are turned into [`MovieError::NotFound`] or
//! [`MovieError::Validation`]. Handlers obtain it as an extractor, built from
//! the pool held in [`AppState`].

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use garde::Validate as _;
use http::request::Parts;
use movieshub_dal::{
    movie::{is_valid_rating, is_valid_year, CreateMovie, Movie, MovieRepository},
    ListingParams, Pool,
};
use tracing::{debug, info};

use crate::{
    error::{MovieError, MovieResult},
    state::AppState,
};

pub struct MovieService {
    repository: MovieRepository,
}

impl FromRequestParts<AppState> for MovieService {
    type Rejection = Infallible;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MovieService::from_pool(state.pool().clone()))
    }
}

fn require_not_blank(value: &str, what: &str) -> MovieResult<()> {
    if value.trim().is_empty() {
        Err(MovieError::Validation(format!("{what} must not be blank")))
    } else {
        Ok(())
    }
}

fn require_valid_rating(rating: f64) -> MovieResult<()> {
    if is_valid_rating(rating) {
        Ok(())
    } else {
        Err(MovieError::Validation(format!(
            "Rating must be between 0 and 10, got {rating}"
        )))
    }
}

impl MovieService {
    pub fn new(repository: MovieRepository) -> Self {
        Self { repository }
    }

    pub fn from_pool(pool: Pool) -> Self {
        Self::new(MovieRepository::new(pool))
    }

    pub async fn add_movie(&self, candidate: CreateMovie) -> MovieResult<Movie> {
        candidate.validate()?;
        let movie = self.repository.create(candidate).await?;
        info!(id = movie.id, title = %movie.title, "Movie added");
        Ok(movie)
    }

    /// All movies ordered by id, no cap on the count. An empty store is
    /// reported as [`MovieError::NotFound`], not as an empty list.
    pub async fn get_all_movies(&self) -> MovieResult<Vec<Movie>> {
        self.list_movies(ListingParams::default()).await
    }

    /// One page of movies, [`MovieError::NotFound`] when there are no movies at all.
    pub async fn list_movies(&self, params: ListingParams) -> MovieResult<Vec<Movie>> {
        let movies = self.repository.list(params).await?;
        if movies.is_empty() && self.repository.count().await? == 0 {
            return Err(MovieError::NotFound("No movies found".to_string()));
        }
        Ok(movies)
    }

    pub async fn count_movies(&self) -> MovieResult<u64> {
        Ok(self.repository.count().await?)
    }

    pub async fn get_movie_by_id(&self, id: i64) -> MovieResult<Movie> {
        debug!("Looking up movie {id}");
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| MovieError::NotFound(format!("Movie with id {id} not found")))
    }

    /// Exact title match. Titles are not unique, the first stored movie wins.
    pub async fn get_movie_by_title(&self, title: &str) -> MovieResult<Movie> {
        self.repository
            .find_by_title(title)
            .await?
            .ok_or_else(|| MovieError::NotFound(format!("Movie with title '{title}' not found")))
    }

    pub async fn update_movie_rating(&self, id: i64, rating: f64) -> MovieResult<Movie> {
        require_valid_rating(rating)?;
        let mut movie = self.get_movie_by_id(id).await?;
        movie.rating = rating;
        let movie = self.repository.save(&movie).await?;
        info!(id, rating, "Movie rating updated");
        Ok(movie)
    }

    pub async fn update_movie_genre(&self, id: i64, genre: &str) -> MovieResult<Movie> {
        require_not_blank(genre, "Genre")?;
        let mut movie = self.get_movie_by_id(id).await?;
        movie.genre = genre.to_string();
        let movie = self.repository.save(&movie).await?;
        info!(id, genre, "Movie genre updated");
        Ok(movie)
    }

    /// Replaces all fields but `id`.
    pub async fn update_movie(&self, id: i64, candidate: CreateMovie) -> MovieResult<Movie> {
        candidate.validate()?;
        let mut movie = self.get_movie_by_id(id).await?;
        movie.replace_with(candidate);
        let movie = self.repository.save(&movie).await?;
        info!(id, "Movie updated");
        Ok(movie)
    }

    pub async fn delete_movie(&self, id: i64) -> MovieResult<()> {
        if !self.repository.exists(id).await? {
            return Err(MovieError::NotFound(format!("Movie with id {id} not found")));
        }
        self.repository.delete(id).await?;
        info!(id, "Movie deleted");
        Ok(())
    }

    pub async fn find_movies_by_genre(&self, genre: &str) -> MovieResult<Vec<Movie>> {
        require_not_blank(genre, "Genre")?;
        Ok(self.repository.find_by_genre(genre.trim()).await?)
    }

    pub async fn search_movies_by_title(&self, fragment: &str) -> MovieResult<Vec<Movie>> {
        require_not_blank(fragment, "Title")?;
        Ok(self.repository.search_title(fragment.trim()).await?)
    }

    pub async fn find_movies_with_min_rating(&self, min_rating: f64) -> MovieResult<Vec<Movie>> {
        require_valid_rating(min_rating)?;
        Ok(self.repository.find_by_min_rating(min_rating).await?)
    }

    pub async fn find_movies_by_year_range(&self, from: &str, to: &str) -> MovieResult<Vec<Movie>> {
        if !is_valid_year(from) || !is_valid_year(to) {
            return Err(MovieError::Validation(
                "Years must be 4-digit numbers".to_string(),
            ));
        }
        if from > to {
            return Err(MovieError::Validation(format!(
                "Year range is reversed: {from} > {to}"
            )));
        }
        Ok(self.repository.find_by_year_range(from, to).await?)
    }
}
