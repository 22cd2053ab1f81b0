//! JSON-over-HTTP client for the photo-to-poetry backend.
//!
//! | Stage   | Request                     | Reply field  |
//! |---------|-----------------------------|--------------|
//! | upload  | `POST /upload {image}`      | `image_name` |
//! | caption | `GET /caption/{image_name}` | `caption`    |
//! | poetry  | `POST /convert {caption}`   | `poem`       |
//! | display | `GET /image/{image_name}`   | raw bytes    |

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use super::protocol::{
    CaptionResponse, ConvertRequest, ErrorResponse, PoemResponse, UploadRequest, UploadResponse,
};
use super::{PoetryBackend, UploadReceipt};
use crate::config::ClientConfig;
use crate::encoded::EncodedImage;
use crate::error::{PoetryError, PoetryResult};
use crate::session::Stage;

/// Backend reached over HTTP at a fixed base URL.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    /// Build a client from validated configuration.
    pub fn new(config: &ClientConfig) -> PoetryResult<Self> {
        config
            .validate()
            .map_err(|reason| PoetryError::config("client", &config.backend_url, reason))?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| PoetryError::network("building HTTP client", e))?;

        Ok(Self {
            client,
            base: config.base_url()?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Base URL with `segments` appended, each percent-encoded as one path
    /// segment so image names cannot escape their route.
    pub fn endpoint(&self, segments: &[&str]) -> PoetryResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                PoetryError::config("backend_url", self.base.as_str(), "cannot carry a path")
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Where the backend serves an uploaded image.
    pub fn image_url(&self, image_name: &str) -> PoetryResult<Url> {
        self.endpoint(&["image", image_name])
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> PoetryResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .ok()
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            });
        Err(PoetryError::backend(operation, status.as_u16(), message))
    }

    async fn read_json<T: DeserializeOwned>(operation: &str, response: Response) -> PoetryResult<T> {
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(operation, e))?;
        serde_json::from_slice(&body).map_err(|e| PoetryError::decode(operation, e.to_string()))
    }
}

fn transport_error(operation: &str, error: reqwest::Error) -> PoetryError {
    if error.is_timeout() {
        PoetryError::timeout(operation)
    } else {
        PoetryError::network(operation, error)
            .with_recovery_suggestion("Check that the backend is running and reachable")
    }
}

#[async_trait]
impl PoetryBackend for HttpBackend {
    async fn upload(&self, image: &EncodedImage) -> PoetryResult<UploadReceipt> {
        const OP: &str = "upload";
        let url = self.endpoint(&["upload"])?;
        tracing::debug!("POST {} ({})", url, image);

        let request = self.client.post(url).json(&UploadRequest {
            image: image.as_str(),
        });
        let response = self.send(OP, request).await?;
        let body: UploadResponse = Self::read_json(OP, response).await?;

        let image_name = body
            .image_name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| PoetryError::missing_field(Stage::Upload, "image_name"))?;
        Ok(UploadReceipt {
            image_name,
            image_url: body.image_url,
            caption_url: body.caption_url,
        })
    }

    async fn caption(&self, image_name: &str) -> PoetryResult<String> {
        const OP: &str = "caption request";
        let url = self.endpoint(&["caption", image_name])?;
        tracing::debug!("GET {}", url);

        let response = self.send(OP, self.client.get(url)).await?;
        let body: CaptionResponse = Self::read_json(OP, response).await?;
        body.caption
            .ok_or_else(|| PoetryError::missing_field(Stage::Caption, "caption"))
    }

    async fn convert(&self, caption: &str) -> PoetryResult<String> {
        const OP: &str = "poem request";
        let url = self.endpoint(&["convert"])?;
        tracing::debug!("POST {}", url);

        let request = self.client.post(url).json(&ConvertRequest { caption });
        let response = self.send(OP, request).await?;
        let body: PoemResponse = Self::read_json(OP, response).await?;
        body.poem
            .ok_or_else(|| PoetryError::missing_field(Stage::Poetry, "poem"))
    }

    async fn fetch_image(&self, image_name: &str) -> PoetryResult<Vec<u8>> {
        const OP: &str = "image download";
        let url = self.image_url(image_name)?;
        tracing::debug!("GET {}", url);

        let response = self.send(OP, self.client.get(url)).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(OP, e))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(url: &str) -> HttpBackend {
        HttpBackend::new(&ClientConfig::new(url.to_string(), None, None)).unwrap()
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let backend = backend("http://localhost:8080");
        assert_eq!(
            backend.endpoint(&["caption", "image_1.jpg"]).unwrap().as_str(),
            "http://localhost:8080/caption/image_1.jpg"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let backend = backend("http://localhost:8080/api/");
        assert_eq!(
            backend.endpoint(&["upload"]).unwrap().as_str(),
            "http://localhost:8080/api/upload"
        );
    }

    #[test]
    fn test_image_names_are_escaped() {
        let backend = backend("http://localhost:8080");
        assert_eq!(
            backend.image_url("../secret name").unwrap().as_str(),
            "http://localhost:8080/image/..%2Fsecret%20name"
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ClientConfig::new("localhost".to_string(), None, None);
        let err = HttpBackend::new(&config).unwrap_err();
        assert_eq!(err.category(), "config");
    }
}
