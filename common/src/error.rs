use actix_web::{http::StatusCode, HttpResponse};
use serde_json::json;

#[derive(Debug)]
pub struct ServiceError {
    pub code: u16,
    err: anyhow::Error,
}

impl ServiceError {
    pub fn new(code: u16, err: anyhow::Error) -> Self {
        Self { code, err }
    }

    pub fn into_inner(self) -> anyhow::Error {
        self.err
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "ServiceError: {}", self.err)
    }
}

impl actix_web::error::ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.err.to_string() }))
    }
}

impl<E: Into<anyhow::Error>> From<E> for ServiceError {
    fn from(err: E) -> ServiceError {
        ServiceError {
            code: 500,
            err: err.into(),
        }
    }
}

pub trait AddCode {
    fn code(self, code: u16) -> ServiceError;
}

impl<E: Into<anyhow::Error>> AddCode for E {
    fn code(self, code: u16) -> ServiceError {
        ServiceError::new(code, self.into())
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use actix_web::{body::to_bytes, ResponseError};
    use anyhow::anyhow;

    use super::*;

    #[test]
    fn conversions_default_to_internal_error() {
        let err: ServiceError = anyhow!("boom").into();
        assert_eq!(err.code, 500);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn explicit_code_is_rendered_as_json() {
        let err = anyhow!("Issue repository not found").code(503);
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "Issue repository not found");
    }
}
