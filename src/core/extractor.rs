use axum::{
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;

fn rejection_message(rejection: JsonRejection) -> String {
    match rejection {
        JsonRejection::JsonDataError(err) => format!("Invalid JSON data: {}", err.body_text()),
        JsonRejection::JsonSyntaxError(err) => format!("Invalid JSON syntax: {}", err.body_text()),
        JsonRejection::MissingJsonContentType(_) => {
            "Expected request with `Content-Type: application/json`".to_string()
        }
        other => format!("Failed to read JSON body: {}", other.body_text()),
    }
}

/// JSON body whose rejections render as [`AppError::BadRequest`]
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(|rejection| AppError::BadRequest(rejection_message(rejection)))
    }
}

/// JSON body that must also pass its `validator` rules.
///
/// Field rule failures become [`AppError::Validation`] before the handler runs.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let AppJson(value) = AppJson::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::Router;
    use axum_test::TestServer;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize, Validate)]
    struct Title {
        #[validate(length(min = 3))]
        title: String,
    }

    fn server() -> TestServer {
        let router = Router::new()
            .route(
                "/validated",
                post(|ValidatedJson(body): ValidatedJson<Title>| async move { body.title }),
            )
            .route(
                "/whoami",
                post(|user: AuthenticatedUser| async move { user.sub }),
            );
        TestServer::new(router).unwrap()
    }

    #[tokio::test]
    async fn test_valid_body_reaches_handler() {
        let response = server()
            .post("/validated")
            .json(&json!({"title": "Jalan rusak"}))
            .await;

        response.assert_status_ok();
        response.assert_text("Jalan rusak");
    }

    #[tokio::test]
    async fn test_rule_failure_is_a_validation_error() {
        let response = server()
            .post("/validated")
            .json(&json!({"title": "ab"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], false);
        assert!(!body["errors"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_bad_request() {
        let response = server()
            .post("/validated")
            .json(&json!({"judul": "tanpa title"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert!(body["message"].as_str().unwrap().starts_with("Invalid JSON data"));
    }

    #[tokio::test]
    async fn test_missing_user_is_unauthorized() {
        let response = server().post("/whoami").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
