use std::future::Future;
use std::sync::Arc;

use async_channel::{Receiver, Sender, unbounded};
use eframe::egui;
use photo_poetry::capture::{CameraSource, FileSource, capture_image};
use photo_poetry::config::DEFAULT_BACKEND_URL;
use photo_poetry::{
    ClientConfig, EncodedImage, HttpBackend, PoetryBackend, PoetryError, PoetryResult,
    PoetrySession, RequestToken, StageOutcome, UploadReceipt, logging,
};
use photo_poetry::error::{ErrorSeverity, HasSeverity};
use tokio::runtime::Runtime;

/// Results coming back from background tasks.
enum Event {
    Captured(RequestToken, PoetryResult<EncodedImage>),
    Uploaded(RequestToken, PoetryResult<UploadReceipt>),
    Captioned(RequestToken, PoetryResult<String>),
    Converted(RequestToken, PoetryResult<String>),
    ImageFetched(String, PoetryResult<Vec<u8>>),
}

/// Button presses collected while drawing, handled after the panel closes.
enum Action {
    CaptureCamera,
    LoadFile,
    Upload,
    Caption,
    Convert,
    StartOver,
}

struct PoetryApp {
    config: ClientConfig,
    backend: Arc<HttpBackend>,
    runtime: Runtime,
    session: PoetrySession,
    file_path: String,
    notice: Option<(ErrorSeverity, String)>,
    in_flight: usize,
    captured_texture: Option<egui::TextureHandle>,
    uploaded_texture: Option<egui::TextureHandle>,
    events_tx: Sender<Event>,
    events_rx: Receiver<Event>,
}

impl PoetryApp {
    fn new(config: ClientConfig, backend: HttpBackend, runtime: Runtime) -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            config,
            backend: Arc::new(backend),
            runtime,
            session: PoetrySession::new(),
            file_path: String::new(),
            notice: None,
            in_flight: 0,
            captured_texture: None,
            uploaded_texture: None,
            events_tx,
            events_rx,
        }
    }

    fn spawn<F>(&mut self, ctx: &egui::Context, task: F)
    where
        F: Future<Output = Event> + Send + 'static,
    {
        let events_tx = self.events_tx.clone();
        let ctx = ctx.clone();
        self.in_flight += 1;
        self.runtime.spawn(async move {
            let event = task.await;
            let _ = events_tx.send(event).await;
            ctx.request_repaint();
        });
    }

    fn alert(&mut self, error: PoetryError) {
        self.notice = Some((error.severity(), error.alert_text()));
    }

    fn handle_action(&mut self, ctx: &egui::Context, action: Action) {
        match action {
            Action::CaptureCamera => {
                let mut source = CameraSource::new(self.config.camera.clone());
                let max_side = self.config.max_long_side;
                let token = self.session.begin_capture();
                self.spawn(ctx, async move {
                    Event::Captured(token, capture_image(&mut source, max_side).await)
                });
            }
            Action::LoadFile => {
                let mut source = FileSource::new(self.file_path.trim());
                let max_side = self.config.max_long_side;
                let token = self.session.begin_capture();
                self.spawn(ctx, async move {
                    Event::Captured(token, capture_image(&mut source, max_side).await)
                });
            }
            Action::Upload => match self.session.begin_upload() {
                Ok(pending) => {
                    let backend = self.backend.clone();
                    self.spawn(ctx, async move {
                        Event::Uploaded(pending.token, backend.upload(&pending.image).await)
                    });
                }
                Err(e) => self.alert(e),
            },
            Action::Caption => match self.session.begin_caption() {
                Ok(pending) => {
                    let backend = self.backend.clone();
                    self.spawn(ctx, async move {
                        Event::Captioned(pending.token, backend.caption(&pending.image_name).await)
                    });
                }
                Err(e) => self.alert(e),
            },
            Action::Convert => match self.session.begin_poem() {
                Ok(pending) => {
                    let backend = self.backend.clone();
                    self.spawn(ctx, async move {
                        Event::Converted(pending.token, backend.convert(&pending.caption).await)
                    });
                }
                Err(e) => self.alert(e),
            },
            Action::StartOver => {
                self.session.reset();
                self.captured_texture = None;
                self.uploaded_texture = None;
            }
        }
    }

    fn handle_event(&mut self, ctx: &egui::Context, event: Event) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match event {
            Event::Captured(token, result) => {
                let texture = result
                    .as_ref()
                    .ok()
                    .and_then(|image| image.to_bytes().ok())
                    .and_then(|bytes| load_texture(ctx, "captured", &bytes));
                match self.session.finish_capture(token, result) {
                    Ok(StageOutcome::Applied) => self.captured_texture = texture,
                    Ok(StageOutcome::Superseded) => {}
                    // Capture problems are logged, not alerted.
                    Err(e) => tracing::warn!("Capture failed: {}", e.alert_text()),
                }
            }
            Event::Uploaded(token, result) => match self.session.finish_upload(token, result) {
                Ok(StageOutcome::Applied) => {
                    self.uploaded_texture = None;
                    if let Some(name) = self.session.image_name().map(str::to_string) {
                        let backend = self.backend.clone();
                        self.spawn(ctx, async move {
                            let bytes = backend.fetch_image(&name).await;
                            Event::ImageFetched(name, bytes)
                        });
                    }
                }
                Ok(StageOutcome::Superseded) => {}
                Err(e) => self.alert(e),
            },
            Event::Captioned(token, result) => {
                if let Err(e) = self.session.finish_caption(token, result) {
                    self.alert(e);
                }
            }
            Event::Converted(token, result) => {
                if let Err(e) = self.session.finish_poem(token, result) {
                    self.alert(e);
                }
            }
            Event::ImageFetched(name, Ok(bytes)) => {
                if self.session.image_name() == Some(name.as_str()) {
                    self.uploaded_texture = load_texture(ctx, "uploaded", &bytes);
                }
            }
            Event::ImageFetched(name, Err(e)) => {
                tracing::warn!("Could not fetch uploaded image {}: {}", name, e)
            }
        }
    }
}

fn load_texture(ctx: &egui::Context, name: &str, bytes: &[u8]) -> Option<egui::TextureHandle> {
    let rgba = image::load_from_memory(bytes).ok()?.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
    Some(ctx.load_texture(name, color_image, egui::TextureOptions::default()))
}

fn notice_title(severity: ErrorSeverity) -> &'static str {
    match severity {
        ErrorSeverity::Info => "Notice",
        ErrorSeverity::Warning => "Warning",
        ErrorSeverity::Error => "Error",
    }
}

fn show_texture(ui: &mut egui::Ui, texture: &egui::TextureHandle) {
    ui.add(egui::Image::new(egui::load::SizedTexture::from_handle(texture)).max_width(320.0));
}

impl eframe::App for PoetryApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(ctx, event);
        }

        let mut action = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("📷 Photo-to-Poetry");
                ui.label(format!("Backend: {}", self.backend.base_url()));
                ui.separator();

                ui.horizontal(|ui| {
                    if ui.button("Capture Photo").clicked() {
                        action = Some(Action::CaptureCamera);
                    }
                    ui.label("or file:");
                    ui.text_edit_singleline(&mut self.file_path);
                    if ui.button("Load File").clicked() {
                        action = Some(Action::LoadFile);
                    }
                });

                if let Some(texture) = &self.captured_texture {
                    ui.heading("Captured Image:");
                    show_texture(ui, texture);
                }

                ui.horizontal(|ui| {
                    if ui.button("Upload to Server").clicked() {
                        action = Some(Action::Upload);
                    }
                    if ui.button("Generate Caption").clicked() {
                        action = Some(Action::Caption);
                    }
                    if ui.button("Convert to Poetry").clicked() {
                        action = Some(Action::Convert);
                    }
                    if ui.button("Start Over").clicked() {
                        action = Some(Action::StartOver);
                    }
                    if self.in_flight > 0 {
                        ui.spinner();
                    }
                });

                if let Some(name) = self.session.image_name() {
                    ui.separator();
                    ui.label(format!("Uploaded as {}", name));
                    if let Some(texture) = &self.uploaded_texture {
                        show_texture(ui, texture);
                    }
                }

                if !self.session.caption().is_empty() {
                    ui.separator();
                    ui.heading("Caption:");
                    ui.label(self.session.caption());
                }

                if !self.session.poem().is_empty() {
                    ui.separator();
                    ui.heading("Poem:");
                    ui.label(egui::RichText::new(self.session.poem()).monospace());
                }
            });
        });

        if let Some((severity, message)) = self.notice.clone() {
            egui::Window::new(notice_title(severity))
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(message);
                    if ui.button("OK").clicked() {
                        self.notice = None;
                    }
                });
        }

        if let Some(action) = action {
            self.handle_action(ctx, action);
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging(1);

    let mut config = ClientConfig::default();
    config.backend_url =
        std::env::var("POETRY_BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());
    config.max_long_side = Some(1024);
    config.validate()?;

    let backend = HttpBackend::new(&config)?;
    let runtime = Runtime::new()?;
    let app = PoetryApp::new(config, backend, runtime);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([520.0, 720.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Photo-to-Poetry",
        options,
        Box::new(move |_cc| Box::new(app)),
    )?;
    Ok(())
}
