use anyhow::Result;
use movieshub_dal::movie::Movie;
use reqwest::{StatusCode, Url};
use serde_json::json;

pub fn movie_payload(title: &str, year: &str, genre: &str, rating: f64) -> serde_json::Value {
    json!({
        "title": title,
        "year": year,
        "genre": genre,
        "description": format!("{title} ({year}), a {genre} movie."),
        "rating": rating,
        "imageUrl": format!("https://img.example.com/posters/{year}.jpg"),
    })
}

pub async fn create_movie(
    client: &reqwest::Client,
    base_url: &Url,
    title: &str,
    year: &str,
    genre: &str,
    rating: f64,
) -> Result<Movie> {
    let api_url = base_url.join("api/movies")?;
    let response = client
        .post(api_url)
        .json(&movie_payload(title, year, genre, rating))
        .send()
        .await?;
    assert_eq!(StatusCode::CREATED, response.status());

    let new_movie: Movie = response.json().await?;
    Ok(new_movie)
}
