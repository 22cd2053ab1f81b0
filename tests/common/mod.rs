//! Common test utilities for the photo-to-poetry tests
//!
//! Provides an in-memory backend that records every call it receives and
//! answers from scripted replies, plus small generated test images.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Mutex;

use async_trait::async_trait;
use image::{ImageFormat, Rgba, RgbaImage};
use photo_poetry::{
    EncodedImage, PoetryBackend, PoetryError, PoetryResult, Stage, UploadReceipt,
};

/// PNG bytes of a solid-colour test image.
pub fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(w, h, Rgba([40, 160, 90, 255]));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .expect("encode test png");
    out
}

/// A small captured image, as the capture stage would produce it.
pub fn captured_image() -> EncodedImage {
    EncodedImage::from_bytes(&png_bytes(8, 6)).expect("encode test image")
}

/// A request the backend received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Upload(String),
    Caption(String),
    Convert(String),
    FetchImage(String),
}

/// How the backend answers one kind of request.
#[derive(Debug, Clone)]
pub enum Reply {
    Value(String),
    /// Well-formed response without the expected field
    MissingField,
    /// The server could not be reached
    Unreachable,
}

impl Reply {
    fn render(&self, stage: Stage, field: &'static str) -> PoetryResult<String> {
        match self {
            Reply::Value(value) => Ok(value.clone()),
            Reply::MissingField => Err(PoetryError::missing_field(stage, field)),
            Reply::Unreachable => Err(PoetryError::network(
                stage.label(),
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
            )),
        }
    }
}

/// Scripted backend that records the calls it receives
pub struct RecordingBackend {
    upload: Mutex<Reply>,
    caption: Mutex<Reply>,
    poem: Mutex<Reply>,
    image: Vec<u8>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            upload: Mutex::new(Reply::Value("image_1.jpg".to_string())),
            caption: Mutex::new(Reply::Value("a caption".to_string())),
            poem: Mutex::new(Reply::Value("a poem".to_string())),
            image: png_bytes(2, 2),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_upload(&self, reply: Reply) {
        *self.upload.lock().unwrap() = reply;
    }

    pub fn set_caption(&self, reply: Reply) {
        *self.caption.lock().unwrap() = reply;
    }

    pub fn set_poem(&self, reply: Reply) {
        *self.poem.lock().unwrap() = reply;
    }

    pub fn with_upload(self, name: &str) -> Self {
        self.set_upload(Reply::Value(name.to_string()));
        self
    }

    pub fn with_caption(self, caption: &str) -> Self {
        self.set_caption(Reply::Value(caption.to_string()));
        self
    }

    pub fn with_poem(self, poem: &str) -> Self {
        self.set_poem(Reply::Value(poem.to_string()));
        self
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PoetryBackend for RecordingBackend {
    async fn upload(&self, image: &EncodedImage) -> PoetryResult<UploadReceipt> {
        self.record(Call::Upload(image.as_str().to_string()));
        let reply = self.upload.lock().unwrap().clone();
        reply
            .render(Stage::Upload, "image_name")
            .map(UploadReceipt::named)
    }

    async fn caption(&self, image_name: &str) -> PoetryResult<String> {
        self.record(Call::Caption(image_name.to_string()));
        let reply = self.caption.lock().unwrap().clone();
        reply.render(Stage::Caption, "caption")
    }

    async fn convert(&self, caption: &str) -> PoetryResult<String> {
        self.record(Call::Convert(caption.to_string()));
        let reply = self.poem.lock().unwrap().clone();
        reply.render(Stage::Poetry, "poem")
    }

    async fn fetch_image(&self, image_name: &str) -> PoetryResult<Vec<u8>> {
        self.record(Call::FetchImage(image_name.to_string()));
        Ok(self.image.clone())
    }
}
