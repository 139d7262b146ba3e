//! 폼 필드 추출 (urlencoded / multipart 모두 허용)

use super::error::ApiError;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use axum::{async_trait, Form};
use std::collections::HashMap;

/// POST 폼 필드
#[derive(Debug, Default)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// 필수 u32 필드 (방 ID, 사용자 ID)
    pub fn parse_id(&self, name: &'static str) -> Result<u32, ApiError> {
        self.get(name)
            .ok_or(ApiError::BadRequest(name))?
            .trim()
            .parse()
            .map_err(|_| ApiError::BadRequest(name))
    }
}

#[async_trait]
impl<S> FromRequest<S> for FormFields
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.starts_with("multipart/form-data"))
            .unwrap_or(false);

        if !is_multipart {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|_| ApiError::BadRequest("malformed form body"))?;
            return Ok(Self(fields));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|_| ApiError::BadRequest("malformed multipart body"))?;

        let mut fields = HashMap::new();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|_| ApiError::BadRequest("malformed multipart body"))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            let value = field
                .text()
                .await
                .map_err(|_| ApiError::BadRequest("malformed multipart field"))?;
            fields.insert(name, value);
        }
        Ok(Self(fields))
    }
}

#[cfg(test)]
impl FromIterator<(&'static str, String)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (&'static str, String)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}
