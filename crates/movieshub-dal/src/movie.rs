use std::hash::{Hash, Hasher};

use crate::{error::Result, ChosenDB, Error, ListingParams};
use futures::TryStreamExt as _;
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::Pool;
use tracing::debug;

pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 10.0;

const MOVIE_COLUMNS: &str = "id, title, year, genre, description, rating, image_url";
const VALID_ORDER_FIELDS: &[&str] = &["id", "title", "year", "genre", "rating"];

pub fn not_blank(value: &str, _ctx: &()) -> garde::Result {
    if value.trim().is_empty() {
        Err(garde::Error::new("must not be blank"))
    } else {
        Ok(())
    }
}

/// Rejects NaN as well as values outside of the rating scale.
pub fn is_valid_rating(rating: f64) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}

pub fn is_valid_year(year: &str) -> bool {
    year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CreateMovie {
    #[garde(custom(not_blank), length(chars, min = 3, max = 100))]
    pub title: String,
    #[garde(pattern(r"^[0-9]{4}$"))]
    pub year: String,
    #[garde(custom(not_blank))]
    pub genre: String,
    #[garde(custom(not_blank), length(chars, min = 10, max = 300))]
    pub description: String,
    #[garde(range(min = 0.0, max = 10.0))]
    pub rating: f64,
    #[garde(url)]
    pub image_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub year: String,
    pub genre: String,
    pub description: String,
    pub rating: f64,
    pub image_url: String,
}

impl Movie {
    pub fn new(id: i64, payload: CreateMovie) -> Self {
        let mut movie = Movie {
            id,
            title: String::new(),
            year: String::new(),
            genre: String::new(),
            description: String::new(),
            rating: 0.0,
            image_url: String::new(),
        };
        movie.replace_with(payload);
        movie
    }

    /// Overwrites every field but `id`.
    pub fn replace_with(&mut self, payload: CreateMovie) {
        self.title = payload.title;
        self.year = payload.year;
        self.genre = payload.genre;
        self.description = payload.description;
        self.rating = payload.rating;
        self.image_url = payload.image_url;
    }
}

// Rating is compared by bit pattern so that Eq and Hash stay consistent.
impl PartialEq for Movie {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.rating.to_bits() == other.rating.to_bits()
            && self.title == other.title
            && self.year == other.year
            && self.genre == other.genre
            && self.description == other.description
            && self.image_url == other.image_url
    }
}

impl Eq for Movie {}

impl Hash for Movie {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.title.hash(state);
        self.year.hash(state);
        self.genre.hash(state);
        self.description.hash(state);
        self.rating.to_bits().hash(state);
        self.image_url.hash(state);
    }
}

fn escape_like(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len() + 2);
    escaped.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

pub type MovieRepository = MovieRepositoryImpl<Pool<ChosenDB>>;

pub struct MovieRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> MovieRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, payload: CreateMovie) -> Result<Movie> {
        let result = sqlx::query(
            "INSERT INTO movie (title, year, genre, description, rating, image_url) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&payload.title)
        .bind(&payload.year)
        .bind(&payload.genre)
        .bind(&payload.description)
        .bind(payload.rating)
        .bind(&payload.image_url)
        .execute(&self.executor)
        .await?;

        let id = result.last_insert_rowid();
        debug!("Inserted movie {id}");
        self.get(id).await
    }

    pub async fn save(&self, movie: &Movie) -> Result<Movie> {
        let result = sqlx::query(
            "UPDATE movie SET title = ?, year = ?, genre = ?, description = ?, rating = ?, image_url = ? WHERE id = ?",
        )
        .bind(&movie.title)
        .bind(&movie.year)
        .bind(&movie.genre)
        .bind(&movie.description)
        .bind(movie.rating)
        .bind(&movie.image_url)
        .bind(movie.id)
        .execute(&self.executor)
        .await?;

        if result.rows_affected() == 0 {
            Err(Error::RecordNotFound(format!("Movie {}", movie.id)))
        } else {
            self.get(movie.id).await
        }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Movie>> {
        let record = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movie WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.executor)
        .await?;
        Ok(record)
    }

    pub async fn get(&self, id: i64) -> Result<Movie> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| Error::RecordNotFound(format!("Movie {id}")))
    }

    pub async fn exists(&self, id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM movie WHERE id = ?)")
            .bind(id)
            .fetch_one(&self.executor)
            .await?;
        Ok(exists)
    }

    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM movie")
            .fetch_one(&self.executor)
            .await?;
        Ok(count as u64)
    }

    /// Every stored movie ordered by id, without any cap on the count.
    pub async fn list_all(&self) -> Result<Vec<Movie>> {
        self.list(ListingParams::default()).await
    }

    pub async fn list(&self, params: ListingParams) -> Result<Vec<Movie>> {
        let order = params.ordering(VALID_ORDER_FIELDS)?;
        let order = if order.is_empty() {
            "id".to_string()
        } else {
            order
        };
        let records = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movie ORDER BY {order} LIMIT ? OFFSET ?"
        ))
        .bind(params.limit)
        .bind(params.offset)
        .fetch(&self.executor)
        .try_collect::<Vec<_>>()
        .await?;
        Ok(records)
    }

    /// Exact title match; title is not unique, so the oldest record wins.
    pub async fn find_by_title(&self, title: &str) -> Result<Option<Movie>> {
        let record = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movie WHERE title = ? ORDER BY id LIMIT 1"
        ))
        .bind(title)
        .fetch_optional(&self.executor)
        .await?;
        Ok(record)
    }

    pub async fn find_by_min_rating(&self, min_rating: f64) -> Result<Vec<Movie>> {
        let records = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movie WHERE rating >= ? ORDER BY rating DESC, id"
        ))
        .bind(min_rating)
        .fetch(&self.executor)
        .try_collect::<Vec<_>>()
        .await?;
        Ok(records)
    }

    pub async fn find_by_genre(&self, genre: &str) -> Result<Vec<Movie>> {
        let records = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movie WHERE genre = ? COLLATE NOCASE ORDER BY id"
        ))
        .bind(genre)
        .fetch(&self.executor)
        .try_collect::<Vec<_>>()
        .await?;
        Ok(records)
    }

    pub async fn search_title(&self, fragment: &str) -> Result<Vec<Movie>> {
        let pattern = escape_like(fragment);
        let records = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movie WHERE title LIKE ? ESCAPE '\\' ORDER BY title, id"
        ))
        .bind(pattern)
        .fetch(&self.executor)
        .try_collect::<Vec<_>>()
        .await?;
        Ok(records)
    }

    /// Both bounds inclusive; four digit years sort correctly as text.
    pub async fn find_by_year_range(&self, from: &str, to: &str) -> Result<Vec<Movie>> {
        let records = sqlx::query_as::<_, Movie>(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movie WHERE year BETWEEN ? AND ? ORDER BY year, id"
        ))
        .bind(from)
        .bind(to)
        .fetch(&self.executor)
        .try_collect::<Vec<_>>()
        .await?;
        Ok(records)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM movie WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;

        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound(format!("Movie {id}")))
        } else {
            Ok(())
        }
    }
}
