//! # Poetry Session
//!
//! The state behind one photo-to-poetry view and the four stages that fill
//! it in:
//!
//! ```text
//! capture ──▶ upload ──▶ caption ──▶ poetry
//!   image      name       caption     poem
//! ```
//!
//! Each stage refuses to start until the stage before it has produced its
//! output, and reports that as a precondition error without touching the
//! network.
//!
//! ## Request tokens
//!
//! Every network stage is split into `begin_*`, which checks the
//! precondition and hands out a [`RequestToken`], and `finish_*`, which
//! applies the result only if that token is still current. A token goes stale
//! when the same stage is started again, when a new image is captured (for
//! uploads), or when a fresh upload lands (for captions and poems). A reset
//! makes every outstanding token stale. Captures that run in the background
//! use [`PoetrySession::begin_capture`] the same way, so the most recently
//! started capture wins. Stale results are dropped, so a slow response can
//! never overwrite the answer to a newer request.
//!
//! Sequential callers can ignore all of this and use [`PoetrySession::upload`],
//! [`PoetrySession::generate_caption`] and [`PoetrySession::convert_to_poem`].

use std::fmt;

use crate::backend::{PoetryBackend, UploadReceipt};
use crate::encoded::EncodedImage;
use crate::error::{PoetryError, PoetryResult};

/// Notice shown when uploading without a captured image.
pub const CAPTURE_FIRST: &str = "Capture an image first!";
/// Notice shown when captioning before an upload succeeded.
pub const UPLOAD_FIRST: &str = "Upload an image first!";
/// Notice shown when converting without a caption.
pub const CAPTION_FIRST: &str = "Generate a caption first!";

/// One of the sequential workflow steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Capture,
    Upload,
    Caption,
    Poetry,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Capture => "capture",
            Stage::Upload => "upload",
            Stage::Caption => "caption",
            Stage::Poetry => "poetry",
        }
    }

    fn slot(self) -> usize {
        match self {
            Stage::Capture => 0,
            Stage::Upload => 1,
            Stage::Caption => 2,
            Stage::Poetry => 3,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifies one invocation of a network stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    stage: Stage,
    generation: u64,
}

impl RequestToken {
    pub fn stage(&self) -> Stage {
        self.stage
    }
}

/// What happened to a completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The result was stored in the session.
    Applied,
    /// A newer request superseded this one; the result was dropped.
    Superseded,
}

/// An upload that passed its precondition and is ready to be sent.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub token: RequestToken,
    pub image: EncodedImage,
}

/// A caption request that passed its precondition.
#[derive(Debug, Clone)]
pub struct PendingCaption {
    pub token: RequestToken,
    pub image_name: String,
}

/// A poem request that passed its precondition.
#[derive(Debug, Clone)]
pub struct PendingPoem {
    pub token: RequestToken,
    pub caption: String,
}

/// Transient, in-memory state of one photo-to-poetry workflow.
#[derive(Debug, Default)]
pub struct PoetrySession {
    captured_image: Option<EncodedImage>,
    upload: Option<UploadReceipt>,
    caption: String,
    poem: String,
    generations: [u64; 4],
}

impl PoetrySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn captured_image(&self) -> Option<&EncodedImage> {
        self.captured_image.as_ref()
    }

    pub fn image_name(&self) -> Option<&str> {
        self.upload.as_ref().map(|r| r.image_name.as_str())
    }

    /// Full receipt of the last successful upload.
    pub fn upload_receipt(&self) -> Option<&UploadReceipt> {
        self.upload.as_ref()
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn poem(&self) -> &str {
        &self.poem
    }

    /// Store a freshly captured image.
    ///
    /// Background captures and uploads still in flight are superseded. The
    /// image name, caption and poem are kept until the next upload succeeds.
    pub fn capture(&mut self, image: EncodedImage) {
        tracing::debug!("Captured {}", image);
        self.captured_image = Some(image);
        self.bump(Stage::Capture);
        self.bump(Stage::Upload);
    }

    /// Issue a token for a capture that completes later.
    pub fn begin_capture(&mut self) -> RequestToken {
        self.bump(Stage::Capture)
    }

    /// Apply the result of a background capture.
    ///
    /// Failures leave the current image in place.
    pub fn finish_capture(
        &mut self,
        token: RequestToken,
        result: PoetryResult<EncodedImage>,
    ) -> PoetryResult<StageOutcome> {
        if !self.is_current(token) {
            tracing::warn!("Dropping superseded {} result", token.stage);
            return Ok(StageOutcome::Superseded);
        }
        self.capture(result?);
        Ok(StageOutcome::Applied)
    }

    /// Clear everything; in-flight requests become stale.
    pub fn reset(&mut self) {
        self.captured_image = None;
        self.upload = None;
        self.caption.clear();
        self.poem.clear();
        self.bump(Stage::Capture);
        self.bump(Stage::Upload);
        self.bump(Stage::Caption);
        self.bump(Stage::Poetry);
    }

    fn bump(&mut self, stage: Stage) -> RequestToken {
        let slot = &mut self.generations[stage.slot()];
        *slot += 1;
        RequestToken {
            stage,
            generation: *slot,
        }
    }

    fn is_current(&self, token: RequestToken) -> bool {
        self.generations[token.stage.slot()] == token.generation
    }

    /// Check the upload precondition and issue a token.
    pub fn begin_upload(&mut self) -> PoetryResult<PendingUpload> {
        let image = self
            .captured_image
            .clone()
            .ok_or_else(|| PoetryError::precondition(Stage::Upload, CAPTURE_FIRST))?;
        Ok(PendingUpload {
            token: self.bump(Stage::Upload),
            image,
        })
    }

    /// Apply the result of an upload.
    ///
    /// On success the new name replaces the old one and caption and poem are
    /// cleared; caption and poem requests still in flight become stale.
    pub fn finish_upload(
        &mut self,
        token: RequestToken,
        result: PoetryResult<UploadReceipt>,
    ) -> PoetryResult<StageOutcome> {
        if !self.accept(token, &result) {
            return Ok(StageOutcome::Superseded);
        }
        let receipt = result?;
        tracing::info!("Uploaded image as {}", receipt.image_name);
        self.upload = Some(receipt);
        self.caption.clear();
        self.poem.clear();
        self.bump(Stage::Caption);
        self.bump(Stage::Poetry);
        Ok(StageOutcome::Applied)
    }

    /// Check the caption precondition and issue a token.
    pub fn begin_caption(&mut self) -> PoetryResult<PendingCaption> {
        let image_name = self
            .image_name()
            .map(str::to_string)
            .ok_or_else(|| PoetryError::precondition(Stage::Caption, UPLOAD_FIRST))?;
        Ok(PendingCaption {
            token: self.bump(Stage::Caption),
            image_name,
        })
    }

    /// Apply the result of a caption request. Failures keep the previous
    /// caption.
    pub fn finish_caption(
        &mut self,
        token: RequestToken,
        result: PoetryResult<String>,
    ) -> PoetryResult<StageOutcome> {
        if !self.accept(token, &result) {
            return Ok(StageOutcome::Superseded);
        }
        self.caption = result?;
        tracing::info!("Caption: {}", self.caption);
        Ok(StageOutcome::Applied)
    }

    /// Check the poetry precondition and issue a token.
    pub fn begin_poem(&mut self) -> PoetryResult<PendingPoem> {
        if self.caption.trim().is_empty() {
            return Err(PoetryError::precondition(Stage::Poetry, CAPTION_FIRST));
        }
        Ok(PendingPoem {
            token: self.bump(Stage::Poetry),
            caption: self.caption.clone(),
        })
    }

    /// Apply the result of a poem request. Failures keep the previous poem.
    pub fn finish_poem(
        &mut self,
        token: RequestToken,
        result: PoetryResult<String>,
    ) -> PoetryResult<StageOutcome> {
        if !self.accept(token, &result) {
            return Ok(StageOutcome::Superseded);
        }
        self.poem = result?;
        tracing::info!("Poem generated ({} lines)", self.poem.lines().count());
        Ok(StageOutcome::Applied)
    }

    /// Whether a completion should be applied; logs stale and failed ones.
    fn accept<T>(&self, token: RequestToken, result: &PoetryResult<T>) -> bool {
        if !self.is_current(token) {
            tracing::warn!("Dropping superseded {} response", token.stage);
            return false;
        }
        if let Err(error) = result {
            tracing::error!("{} failed: {}", token.stage, error);
        }
        true
    }

    /// Upload the captured image.
    pub async fn upload(&mut self, backend: &dyn PoetryBackend) -> PoetryResult<StageOutcome> {
        let pending = self.begin_upload()?;
        let result = backend.upload(&pending.image).await;
        self.finish_upload(pending.token, result)
    }

    /// Fetch the caption for the uploaded image.
    pub async fn generate_caption(
        &mut self,
        backend: &dyn PoetryBackend,
    ) -> PoetryResult<StageOutcome> {
        let pending = self.begin_caption()?;
        let result = backend.caption(&pending.image_name).await;
        self.finish_caption(pending.token, result)
    }

    /// Turn the current caption into a poem.
    pub async fn convert_to_poem(
        &mut self,
        backend: &dyn PoetryBackend,
    ) -> PoetryResult<StageOutcome> {
        let pending = self.begin_poem()?;
        let result = backend.convert(&pending.caption).await;
        self.finish_poem(pending.token, result)
    }
}
