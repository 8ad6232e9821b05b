use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use contracts::shared::api::ApiErrorBody;

use crate::shared::data::repository::InvalidField;

/// Ошибки обработчиков `/api/...`, отдаются в едином конверте
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Model '{0}' not found")]
    UnknownModel(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("No valid fields to update")]
    NoFields,
    #[error("Request body must be a JSON object")]
    InvalidBody,
    #[error(transparent)]
    InvalidField(#[from] InvalidField),
    #[error("Internal server error")]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UnknownModel(_)
            | AppError::NoFields
            | AppError::InvalidBody
            | AppError::InvalidField(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Текст ошибки хранилища только в лог, клиенту общий ответ
        if let AppError::Storage(e) = &self {
            tracing::error!("Storage error: {:#}", e);
        }
        let body = ApiErrorBody::new(status.as_u16(), self.to_string(), None);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::UnknownModel("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("order".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::NoFields.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::from(InvalidField("quantity".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(anyhow::anyhow!("disk full")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(AppError::UnknownModel("widget".into()).to_string(), "Model 'widget' not found");
        assert_eq!(
            AppError::from(InvalidField("quantity".into())).to_string(),
            "Invalid value for field 'quantity'"
        );
    }

    #[tokio::test]
    async fn test_storage_error_body_hides_detail() {
        let response =
            AppError::from(anyhow::anyhow!("no such table: orders")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Internal server error");
        assert_eq!(body["code"], 500);
        assert!(body.get("error").map_or(true, |e| e.is_null()));
        assert!(!String::from_utf8_lossy(&bytes).contains("no such table"));
    }
}
