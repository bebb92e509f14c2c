use garde::Validate;
use movieshub_dal::movie::not_blank;
use serde::Deserialize;

use crate::state::AppState;
use axum::routing::{get, post, put};

#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct TitleQuery {
    #[garde(custom(not_blank), length(max = 255))]
    pub title: String,
}

#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct GenreQuery {
    #[garde(custom(not_blank), length(max = 255))]
    pub genre: String,
}

#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct RatingQuery {
    #[garde(range(min = 0.0))]
    pub rating: f64,
}

#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct MinRatingQuery {
    #[garde(range(min = 0.0, max = 10.0))]
    pub min: f64,
}

#[derive(Debug, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct YearRangeQuery {
    #[garde(pattern(r"^[0-9]{4}$"))]
    pub from: String,
    #[garde(pattern(r"^[0-9]{4}$"))]
    pub to: String,
}

pub const DELETED_MESSAGE: &str = "Movie deleted successfully";

mod movie_api {
    use axum::{
        extract::{Path, Query, State},
        response::IntoResponse,
        Json,
    };
    use axum_valid::Garde;
    use http::StatusCode;
    use movieshub_dal::movie::CreateMovie;
    #[cfg_attr(not(feature = "openapi"), allow(unused_imports))]
    use movieshub_dal::movie::Movie;
    use tracing::debug;

    use super::{
        GenreQuery, MinRatingQuery, RatingQuery, TitleQuery, YearRangeQuery, DELETED_MESSAGE,
    };
    use crate::{
        error::{ApiError, ApiResult},
        movie_service::MovieService,
        rest_api::{validate::ValidJson, Paging},
        state::AppState,
    };

    fn positive_id(id: i64) -> ApiResult<i64> {
        if id > 0 {
            Ok(id)
        } else {
            Err(ApiError::InvalidRequest(format!(
                "Movie id must be positive, got {id}"
            )))
        }
    }

    #[cfg_attr(feature = "openapi", utoipa::path(post, path = "", tag = "Movie", operation_id = "createMovie",
        request_body = CreateMovie,
        responses((status = StatusCode::CREATED, description = "Created Movie", body = Movie),
                  (status = StatusCode::BAD_REQUEST, description = "Invalid movie"))))]
    pub async fn create(
        service: MovieService,
        ValidJson(payload): ValidJson<CreateMovie>,
    ) -> ApiResult<impl IntoResponse> {
        let record = service.add_movie(payload).await?;

        Ok((StatusCode::CREATED, Json(record)))
    }

    #[cfg_attr(feature = "openapi", utoipa::path(get, path = "", tag = "Movie", operation_id = "listMovie",
        params(Paging),
        responses((status = StatusCode::OK, description = "List of movies", body = Vec<Movie>),
                  (status = StatusCode::NOT_FOUND, description = "No movies stored"))))]
    pub async fn list(
        service: MovieService,
        State(state): State<AppState>,
        Garde(Query(paging)): Garde<Query<Paging>>,
    ) -> ApiResult<impl IntoResponse> {
        debug!("Paging: {:?}", paging);
        let listing_params = paging.into_listing_params(state.config().default_page_size)?;
        let movies = service.list_movies(listing_params).await?;
        Ok((StatusCode::OK, Json(movies)))
    }

    #[cfg_attr(feature = "openapi", utoipa::path(get, path = "/count", tag = "Movie", operation_id = "countMovie",
        responses((status = StatusCode::OK, description = "Count", body = u64))))]
    pub async fn count(service: MovieService) -> ApiResult<impl IntoResponse> {
        let count = service.count_movies().await?;
        Ok((StatusCode::OK, Json(count)))
    }

    #[cfg_attr(feature = "openapi", utoipa::path(get, path = "/{id}", tag = "Movie", operation_id = "getMovie",
        params(("id" = i64, Path, description = "Movie id")),
        responses((status = StatusCode::OK, description = "Movie", body = Movie),
                  (status = StatusCode::NOT_FOUND, description = "Movie not found"))))]
    pub async fn get(
        Path(id): Path<i64>,
        service: MovieService,
    ) -> ApiResult<impl IntoResponse> {
        let record = service.get_movie_by_id(positive_id(id)?).await?;

        Ok((StatusCode::OK, Json(record)))
    }

    #[cfg_attr(feature = "openapi", utoipa::path(get, path = "/byTitle", tag = "Movie", operation_id = "getMovieByTitle",
        params(TitleQuery),
        responses((status = StatusCode::OK, description = "Movie with exactly this title", body = Movie),
                  (status = StatusCode::NOT_FOUND, description = "Movie not found"))))]
    pub async fn get_by_title(
        service: MovieService,
        Garde(Query(query)): Garde<Query<TitleQuery>>,
    ) -> ApiResult<impl IntoResponse> {
        let record = service.get_movie_by_title(&query.title).await?;

        Ok((StatusCode::OK, Json(record)))
    }

    #[cfg_attr(feature = "openapi", utoipa::path(put, path = "/{id}", tag = "Movie", operation_id = "updateMovie",
        params(("id" = i64, Path, description = "Movie id")),
        request_body = CreateMovie,
        responses((status = StatusCode::OK, description = "Updated Movie", body = Movie),
                  (status = StatusCode::NOT_FOUND, description = "Movie not found"))))]
    pub async fn update(
        Path(id): Path<i64>,
        service: MovieService,
        ValidJson(payload): ValidJson<CreateMovie>,
    ) -> ApiResult<impl IntoResponse> {
        let record = service.update_movie(positive_id(id)?, payload).await?;

        Ok((StatusCode::OK, Json(record)))
    }

    #[cfg_attr(feature = "openapi", utoipa::path(put, path = "/{id}/rating", tag = "Movie", operation_id = "updateMovieRating",
        params(("id" = i64, Path, description = "Movie id"), RatingQuery),
        responses((status = StatusCode::OK, description = "Updated Movie", body = Movie),
                  (status = StatusCode::BAD_REQUEST, description = "Rating out of range"),
                  (status = StatusCode::NOT_FOUND, description = "Movie not found"))))]
    pub async fn update_rating(
        Path(id): Path<i64>,
        service: MovieService,
        Garde(Query(query)): Garde<Query<RatingQuery>>,
    ) -> ApiResult<impl IntoResponse> {
        let record = service
            .update_movie_rating(positive_id(id)?, query.rating)
            .await?;

        Ok((StatusCode::OK, Json(record)))
    }

    #[cfg_attr(feature = "openapi", utoipa::path(put, path = "/{id}/genre", tag = "Movie", operation_id = "updateMovieGenre",
        params(("id" = i64, Path, description = "Movie id"), GenreQuery),
        responses((status = StatusCode::OK, description = "Updated Movie", body = Movie),
                  (status = StatusCode::BAD_REQUEST, description = "Blank genre"),
                  (status = StatusCode::NOT_FOUND, description = "Movie not found"))))]
    pub async fn update_genre(
        Path(id): Path<i64>,
        service: MovieService,
        Garde(Query(query)): Garde<Query<GenreQuery>>,
    ) -> ApiResult<impl IntoResponse> {
        let record = service
            .update_movie_genre(positive_id(id)?, &query.genre)
            .await?;

        Ok((StatusCode::OK, Json(record)))
    }

    #[cfg_attr(feature = "openapi", utoipa::path(delete, path = "/{id}", tag = "Movie", operation_id = "deleteMovie",
        params(("id" = i64, Path, description = "Movie id")),
        responses((status = StatusCode::OK, description = "Deleted", body = String),
                  (status = StatusCode::NOT_FOUND, description = "Movie not found"))))]
    pub async fn delete(
        Path(id): Path<i64>,
        service: MovieService,
    ) -> ApiResult<impl IntoResponse> {
        service.delete_movie(positive_id(id)?).await?;

        Ok((StatusCode::OK, DELETED_MESSAGE))
    }

    #[cfg_attr(feature = "openapi", utoipa::path(get, path = "/byGenre", tag = "Movie", operation_id = "listMovieByGenre",
        params(GenreQuery),
        responses((status = StatusCode::OK, description = "Movies of genre, case insensitive", body = Vec<Movie>))))]
    pub async fn list_by_genre(
        service: MovieService,
        Garde(Query(query)): Garde<Query<GenreQuery>>,
    ) -> ApiResult<impl IntoResponse> {
        let movies = service.find_movies_by_genre(&query.genre).await?;
        Ok((StatusCode::OK, Json(movies)))
    }

    #[cfg_attr(feature = "openapi", utoipa::path(get, path = "/search", tag = "Movie", operation_id = "searchMovie",
        params(TitleQuery),
        responses((status = StatusCode::OK, description = "Movies with title containing text, case insensitive", body = Vec<Movie>))))]
    pub async fn search(
        service: MovieService,
        Garde(Query(query)): Garde<Query<TitleQuery>>,
    ) -> ApiResult<impl IntoResponse> {
        let movies = service.search_movies_by_title(&query.title).await?;
        Ok((StatusCode::OK, Json(movies)))
    }

    #[cfg_attr(feature = "openapi", utoipa::path(get, path = "/byRating", tag = "Movie", operation_id = "listMovieByRating",
        params(MinRatingQuery),
        responses((status = StatusCode::OK, description = "Movies rated at least min, best first", body = Vec<Movie>))))]
    pub async fn list_by_rating(
        service: MovieService,
        Garde(Query(query)): Garde<Query<MinRatingQuery>>,
    ) -> ApiResult<impl IntoResponse> {
        let movies = service.find_movies_with_min_rating(query.min).await?;
        Ok((StatusCode::OK, Json(movies)))
    }

    #[cfg_attr(feature = "openapi", utoipa::path(get, path = "/byYear", tag = "Movie", operation_id = "listMovieByYear",
        params(YearRangeQuery),
        responses((status = StatusCode::OK, description = "Movies released between years, inclusive", body = Vec<Movie>))))]
    pub async fn list_by_year(
        service: MovieService,
        Garde(Query(query)): Garde<Query<YearRangeQuery>>,
    ) -> ApiResult<impl IntoResponse> {
        let movies = service
            .find_movies_by_year_range(&query.from, &query.to)
            .await?;
        Ok((StatusCode::OK, Json(movies)))
    }

    #[cfg(feature = "openapi")]
    #[derive(utoipa::OpenApi)]
    #[openapi(paths(
        create,
        list,
        count,
        get,
        get_by_title,
        update,
        update_rating,
        update_genre,
        delete,
        list_by_genre,
        search,
        list_by_rating,
        list_by_year
    ))]
    struct ApiDocs;

    #[cfg(feature = "openapi")]
    pub(super) fn api_docs() -> utoipa::openapi::OpenApi {
        use utoipa::OpenApi as _;
        ApiDocs::openapi()
    }
}

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    movie_api::api_docs()
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", post(movie_api::create).get(movie_api::list))
        .route("/count", get(movie_api::count))
        .route("/byTitle", get(movie_api::get_by_title))
        .route("/byGenre", get(movie_api::list_by_genre))
        .route("/byRating", get(movie_api::list_by_rating))
        .route("/byYear", get(movie_api::list_by_year))
        .route("/search", get(movie_api::search))
        .route(
            "/{id}",
            get(movie_api::get)
                .put(movie_api::update)
                .delete(movie_api::delete),
        )
        .route("/{id}/rating", put(movie_api::update_rating))
        .route("/{id}/genre", put(movie_api::update_genre))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppConfig;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        Router,
    };
    use http_body_util::BodyExt as _;
    use movieshub_dal::movie::Movie;
    use serde_json::json;
    use tower::ServiceExt as _;
    use tracing_test::traced_test;

    async fn app() -> Router {
        let pool = movieshub_dal::new_pool("sqlite::memory:", 1).await.unwrap();
        movieshub_dal::migrate(&pool).await.unwrap();
        let state = AppState::new(AppConfig::default(), pool);
        Router::new().nest("/api/movies", router()).with_state(state)
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    fn inception() -> serde_json::Value {
        json!({
            "title": "Inception",
            "year": "2010",
            "genre": "Sci-Fi",
            "description": "A thief who steals secrets through dream-sharing.",
            "rating": 8.8,
            "imageUrl": "https://img.example.com/inception.jpg"
        })
    }

    #[tokio::test]
    #[traced_test]
    async fn test_movie_lifecycle() {
        let app = app().await;

        let (status, _) = call(&app, Method::GET, "/api/movies", None).await;
        assert_eq!(StatusCode::NOT_FOUND, status);

        let (status, body) = call(&app, Method::POST, "/api/movies", Some(inception())).await;
        assert_eq!(StatusCode::CREATED, status);
        let movie: Movie = serde_json::from_slice(&body).unwrap();
        assert!(movie.id > 0);

        let uri = format!("/api/movies/{}", movie.id);
        let (status, body) = call(&app, Method::GET, &uri, None).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(movie, serde_json::from_slice::<Movie>(&body).unwrap());

        let (status, body) = call(&app, Method::GET, "/api/movies", None).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(1, serde_json::from_slice::<Vec<Movie>>(&body).unwrap().len());

        let (status, body) = call(&app, Method::PUT, &format!("{uri}/rating?rating=9.5"), None).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(9.5, serde_json::from_slice::<Movie>(&body).unwrap().rating);

        let (status, _) = call(&app, Method::PUT, &format!("{uri}/rating?rating=11"), None).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        let (status, _) = call(&app, Method::PUT, &format!("{uri}/rating?rating=-1"), None).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);

        let (status, body) = call(&app, Method::PUT, &format!("{uri}/genre?genre=Thriller"), None).await;
        assert_eq!(StatusCode::OK, status);
        let updated: Movie = serde_json::from_slice(&body).unwrap();
        assert_eq!("Thriller", updated.genre);
        assert_eq!(9.5, updated.rating);

        let (status, _) = call(&app, Method::PUT, &format!("{uri}/genre?genre=%20%20"), None).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);

        let (status, body) = call(&app, Method::DELETE, &uri, None).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(DELETED_MESSAGE.as_bytes(), body.as_slice());

        let (status, _) = call(&app, Method::GET, &uri, None).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
        let (status, _) = call(&app, Method::DELETE, &uri, None).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_invalid_input() {
        let app = app().await;

        let mut invalid = inception();
        invalid["year"] = json!("10");
        let (status, _) = call(&app, Method::POST, "/api/movies", Some(invalid)).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);

        let mut invalid = inception();
        invalid["description"] = json!("short");
        let (status, _) = call(&app, Method::POST, "/api/movies", Some(invalid)).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);

        let (status, _) = call(&app, Method::GET, "/api/movies/0", None).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        let (status, _) = call(&app, Method::GET, "/api/movies/byTitle?title=", None).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        let (status, _) = call(&app, Method::PUT, "/api/movies/1/rating?rating=5", None).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
        let (status, _) = call(&app, Method::GET, "/api/movies?sort=budget", None).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        let (status, _) = call(&app, Method::GET, "/api/movies/byYear?from=2010&to=20", None).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_lookups() {
        let app = app().await;
        call(&app, Method::POST, "/api/movies", Some(inception())).await;
        let mut matrix = inception();
        matrix["title"] = json!("The Matrix");
        matrix["year"] = json!("1999");
        matrix["genre"] = json!("sci-fi");
        matrix["rating"] = json!(8.7);
        call(&app, Method::POST, "/api/movies", Some(matrix)).await;

        let (status, body) = call(&app, Method::GET, "/api/movies/byTitle?title=The%20Matrix", None).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!("1999", serde_json::from_slice::<Movie>(&body).unwrap().year);

        let (status, _) = call(&app, Method::GET, "/api/movies/byTitle?title=nonexistent", None).await;
        assert_eq!(StatusCode::NOT_FOUND, status);

        let (_, body) = call(&app, Method::GET, "/api/movies/byGenre?genre=SCI-FI", None).await;
        assert_eq!(2, serde_json::from_slice::<Vec<Movie>>(&body).unwrap().len());

        let (_, body) = call(&app, Method::GET, "/api/movies/search?title=matr", None).await;
        assert_eq!(1, serde_json::from_slice::<Vec<Movie>>(&body).unwrap().len());

        let (_, body) = call(&app, Method::GET, "/api/movies/byRating?min=8.8", None).await;
        assert_eq!(1, serde_json::from_slice::<Vec<Movie>>(&body).unwrap().len());

        let (_, body) = call(&app, Method::GET, "/api/movies/byYear?from=2000&to=2020", None).await;
        let movies: Vec<Movie> = serde_json::from_slice(&body).unwrap();
        assert_eq!(vec!["Inception"], movies.iter().map(|m| m.title.as_str()).collect::<Vec<_>>());

        let (_, body) = call(&app, Method::GET, "/api/movies?sort=-title&page_size=1", None).await;
        let movies: Vec<Movie> = serde_json::from_slice(&body).unwrap();
        assert_eq!("The Matrix", movies[0].title);

        let (_, body) = call(&app, Method::GET, "/api/movies/count", None).await;
        assert_eq!(b"2", body.as_slice());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_malformed_body_is_bad_request() {
        let app = app().await;

        let mut missing_title = inception();
        missing_title.as_object_mut().unwrap().remove("title");
        let (status, body) = call(&app, Method::POST, "/api/movies", Some(missing_title)).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(400, body["status"]);

        let mut mistyped = inception();
        mistyped["rating"] = json!("high");
        let (status, _) = call(&app, Method::POST, "/api/movies", Some(mistyped.clone())).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);

        let (_, body) = call(&app, Method::POST, "/api/movies", Some(inception())).await;
        let movie: Movie = serde_json::from_slice(&body).unwrap();
        let uri = format!("/api/movies/{}", movie.id);
        let (status, _) = call(&app, Method::PUT, &uri, Some(mistyped)).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_list_without_paging_returns_everything() {
        let app = app().await;
        for i in 0..150 {
            let mut movie = inception();
            movie["title"] = json!(format!("Inception {i:03}"));
            let (status, _) = call(&app, Method::POST, "/api/movies", Some(movie)).await;
            assert_eq!(StatusCode::CREATED, status);
        }

        let (status, body) = call(&app, Method::GET, "/api/movies", None).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(150, serde_json::from_slice::<Vec<Movie>>(&body).unwrap().len());

        let (_, body) = call(&app, Method::GET, "/api/movies?page=2", None).await;
        let page: Vec<Movie> = serde_json::from_slice(&body).unwrap();
        assert_eq!(50, page.len());
        assert_eq!("Inception 100", page[0].title);
    }
}
