// src/utils/extract.rs

use axum::extract::FromRequest;

use crate::error::AppError;

/// JSON body extractor whose rejections go through `AppError`,
/// so a malformed body gets a 400 with the usual `{"error"}` payload.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::IntoResponse,
    };

    fn json_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_syntax_error_is_bad_request() {
        let err = AppJson::<serde_json::Value>::from_request(json_request("{not json"), &())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_shape_error_is_bad_request() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Payload {
            count: u32,
        }

        let err = AppJson::<Payload>::from_request(json_request(r#"{"count":"three"}"#), &())
            .await
            .unwrap_err();

        // axum alone would answer 422 here
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_valid_body_extracts() {
        let AppJson(value) = AppJson::<serde_json::Value>::from_request(json_request(r#"{"a":1}"#), &())
            .await
            .unwrap();

        assert_eq!(value["a"], 1);
    }
}
