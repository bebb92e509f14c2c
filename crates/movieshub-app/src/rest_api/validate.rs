use axum::extract::{FromRequest, Request};
use axum::Json;
use garde::Validate;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::state::AppState;

/// JSON body that is deserialized and then checked with garde.
///
/// Any failure, whether broken syntax, a missing or mistyped field or a rule
/// violation, is rejected as [`ApiError::InvalidRequest`], i.e. 400.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<T> ValidJson<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> FromRequest<AppState> for ValidJson<T>
where
    T: DeserializeOwned + Validate<Context = ()>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;
        value
            .validate()
            .map_err(|report| ApiError::InvalidRequest(report.to_string()))?;
        Ok(ValidJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppConfig;
    use axum::body::Body;
    use http::StatusCode;
    use movieshub_dal::movie::CreateMovie;

    async fn state() -> AppState {
        let pool = movieshub_dal::new_pool("sqlite::memory:", 1).await.unwrap();
        AppState::new(AppConfig::default(), pool)
    }

    async fn extract(body: &str) -> Result<ValidJson<CreateMovie>, ApiError> {
        let req = Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        ValidJson::<CreateMovie>::from_request(req, &state().await).await
    }

    fn status(res: Result<ValidJson<CreateMovie>, ApiError>) -> StatusCode {
        use axum::response::IntoResponse as _;
        match res {
            Ok(_) => StatusCode::OK,
            Err(e) => e.into_response().status(),
        }
    }

    #[tokio::test]
    async fn test_valid_body() {
        let res = extract(
            r#"{"title":"Heat","year":"1995","genre":"Crime","description":"Cops and robbers in LA.","rating":8.3,"imageUrl":"https://img.example.com/heat.jpg"}"#,
        )
        .await
        .unwrap();
        assert_eq!("Heat", res.into_inner().title);
    }

    #[tokio::test]
    async fn test_bad_bodies_are_bad_requests() {
        let bodies = [
            // missing title
            r#"{"year":"1995","genre":"Crime","description":"Cops and robbers in LA.","rating":8.3,"imageUrl":"https://img.example.com/heat.jpg"}"#,
            // mistyped rating
            r#"{"title":"Heat","year":"1995","genre":"Crime","description":"Cops and robbers in LA.","rating":"high","imageUrl":"https://img.example.com/heat.jpg"}"#,
            // null title
            r#"{"title":null,"year":"1995","genre":"Crime","description":"Cops and robbers in LA.","rating":8.3,"imageUrl":"https://img.example.com/heat.jpg"}"#,
            // rule violation
            r#"{"title":"Heat","year":"95","genre":"Crime","description":"Cops and robbers in LA.","rating":8.3,"imageUrl":"https://img.example.com/heat.jpg"}"#,
            // broken syntax
            r#"{"title":"Heat","#,
        ];
        for body in bodies {
            assert_eq!(StatusCode::BAD_REQUEST, status(extract(body).await), "{body}");
        }
    }
}
