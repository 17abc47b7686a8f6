use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// `Json<T>` whose rejections come back in the API's error envelope
/// instead of axum's plain-text body.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::invalid_json("Envie o corpo como JSON (Content-Type: application/json)")
        }
        JsonRejection::JsonSyntaxError(_) => ApiError::invalid_json("JSON malformado"),
        JsonRejection::JsonDataError(e) => ApiError::validation_error(format!("Dados inválidos: {}", e.body_text()), None),
        other => ApiError::invalid_json(other.body_text()),
    }
}
