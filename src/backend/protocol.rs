//! JSON bodies exchanged with the photo-to-poetry backend.
//!
//! Response fields are optional on the wire so that a well-formed reply
//! missing its payload can be told apart from one that is not JSON at all.

use serde::{Deserialize, Serialize};

/// Body of `POST /upload`.
#[derive(Debug, Serialize)]
pub struct UploadRequest<'a> {
    pub image: &'a str,
}

/// Reply to `POST /upload`.
#[derive(Debug, Default, Deserialize)]
pub struct UploadResponse {
    pub image_name: Option<String>,
    pub image_url: Option<String>,
    pub caption_url: Option<String>,
}

/// Reply to `GET /caption/{image_name}`.
#[derive(Debug, Default, Deserialize)]
pub struct CaptionResponse {
    pub caption: Option<String>,
}

/// Body of `POST /convert`.
#[derive(Debug, Serialize)]
pub struct ConvertRequest<'a> {
    pub caption: &'a str,
}

/// Reply to `POST /convert`.
#[derive(Debug, Default, Deserialize)]
pub struct PoemResponse {
    pub poem: Option<String>,
}

/// Body the backend sends with a non-success status.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_request_shape() {
        let body = serde_json::to_value(UploadRequest {
            image: "data:image/png;base64,AAAA",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "image": "data:image/png;base64,AAAA" }));
    }

    #[test]
    fn test_upload_response_accepts_extra_urls() {
        let parsed: UploadResponse = serde_json::from_str(
            r#"{"image_name":"image_1.jpg","image_url":"http://localhost:8080/image/image_1.jpg","caption_url":"http://localhost:8080/caption/image_1.jpg"}"#,
        )
        .unwrap();
        assert_eq!(parsed.image_name.as_deref(), Some("image_1.jpg"));
        assert!(parsed.caption_url.is_some());
    }

    #[test]
    fn test_missing_fields_parse_as_none() {
        let caption: CaptionResponse = serde_json::from_str(r#"{"error":"Caption not found"}"#).unwrap();
        assert!(caption.caption.is_none());
        let poem: PoemResponse = serde_json::from_str("{}").unwrap();
        assert!(poem.poem.is_none());
    }
}
