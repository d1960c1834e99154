mod animation;
mod camera;
mod data;
mod error;
mod export;
mod frame;
mod model;
mod placement;
mod render_engine;
mod scene;
mod shader;
mod ui;
pub mod variant;

use data::ViewportState;
use error::{Result, SceneError};
use frame::{FrameDriver, FrameReport};
use model::{LoadPoll, MeshData, PendingModel};
use render_engine::SceneRenderer;
use scene::Scene;
use shader::{ReloadDebounce, ShaderSources};
use variant::{MeshSource, SceneVariant};

use crate::RELOAD_DEBOUNCE_MS;

use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};
use std::time::Duration;

use eframe::egui_glow;
use egui::mutex::Mutex;
use egui_glow::glow;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};

const INITIAL_VIEWPORT: [f32; 2] = [1280.0, 720.0];

pub struct SceneApp {
    gl: Arc<glow::Context>,
    renderer: Arc<Mutex<SceneRenderer>>,
    scene: Scene,
    driver: FrameDriver,
    last_report: FrameReport,
    pending_model: Option<PendingModel>,
    last_error: Option<String>,
    watcher: Option<RecommendedWatcher>,
    shader_update_receiver: mpsc::Receiver<()>,
    reload_debounce: ReloadDebounce,
    shader_dir: PathBuf,
    export_resolution: [u32; 2],
}

impl SceneApp {
    pub fn new<'a>(cc: &'a eframe::CreationContext<'a>, variant: SceneVariant) -> Result<Self> {
        let gl = cc
            .gl
            .as_ref()
            .ok_or_else(|| SceneError::Gl("eframe was not started with the glow renderer".into()))?
            .clone();

        let shader_dir = resolve_asset_path(&variant.shader_dir());
        let config = variant.config();
        let sources = ShaderSources::read_from(&shader_dir)?;
        sources.check_contract(&config.uniforms)?;

        let renderer = SceneRenderer::new(&gl, &sources)?;
        let viewport = ViewportState::new(INITIAL_VIEWPORT[0], INITIAL_VIEWPORT[1], cc.egui_ctx.pixels_per_point());
        let scene = Scene::new(variant, config, viewport);

        let (tx, rx) = mpsc::channel();
        let watcher = Self::create_watcher(&shader_dir, tx);

        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let mut app = Self {
            gl,
            renderer: Arc::new(Mutex::new(renderer)),
            scene,
            driver: FrameDriver::new(),
            last_report: FrameReport::default(),
            pending_model: None,
            last_error: None,
            watcher,
            shader_update_receiver: rx,
            reload_debounce: ReloadDebounce::new(Duration::from_millis(RELOAD_DEBOUNCE_MS)),
            shader_dir,
            export_resolution: [1920, 1080],
        };
        app.build_meshes()?;

        log::info!("Scene `{}` ready", variant);
        Ok(app)
    }

    pub fn create_watcher(path: &Path, tx: mpsc::Sender<()>) -> Option<RecommendedWatcher> {
        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
            if let Ok(event) = res {
                if event.kind.is_modify() || event.kind.is_create() {
                    let _ = tx.send(());
                }
            }
        })
        .ok()?;

        // Errors are handled gracefully by running without hot reload.
        if let Err(e) = watcher.watch(path, RecursiveMode::NonRecursive) {
            log::warn!("Shader hot reload disabled for {:?}: {}", path, e);
            return None;
        }
        Some(watcher)
    }

    fn build_meshes(&mut self) -> Result<()> {
        match self.scene.variant().config().mesh {
            MeshSource::Plane { width, height, segments } => {
                let plane = MeshData::plane(width, height, segments, segments);
                self.renderer.lock().set_meshes(&self.gl, &[plane])?;
            }
            MeshSource::Model { path, clips } => {
                self.renderer.lock().clear_meshes(&self.gl);
                self.pending_model = Some(PendingModel::spawn(resolve_asset_path(path), clips));
            }
        }
        Ok(())
    }

    pub fn switch_variant(&mut self, variant: SceneVariant) {
        if variant == self.scene.variant() {
            return;
        }

        let shader_dir = resolve_asset_path(&variant.shader_dir());
        let config = variant.config();

        let sources = match ShaderSources::read_from(&shader_dir)
            .and_then(|sources| sources.check_contract(&config.uniforms).map(|_| sources))
        {
            Ok(sources) => sources,
            Err(e) => return self.report_error("Cannot switch scene", e),
        };

        let replaced = self.renderer.lock().replace_program(&self.gl, &sources);
        if let Err(e) = replaced {
            return self.report_error("Cannot switch scene", e);
        }

        // Dropping a pending load discards its result.
        self.pending_model = None;

        let (tx, rx) = mpsc::channel();
        self.watcher = Self::create_watcher(&shader_dir, tx);
        self.shader_update_receiver = rx;
        self.reload_debounce = ReloadDebounce::new(Duration::from_millis(RELOAD_DEBOUNCE_MS));
        self.shader_dir = shader_dir;

        let viewport = *self.scene.viewport();
        self.scene = Scene::new(variant, config, viewport);
        self.driver = FrameDriver::new();
        self.last_report = FrameReport::default();
        self.last_error = None;

        if let Err(e) = self.build_meshes() {
            self.report_error("Cannot build scene meshes", e);
        }
        log::info!("Switched to scene `{}`", variant);
    }

    pub fn open_model(&mut self, path: PathBuf) {
        let MeshSource::Model { clips, .. } = self.scene.variant().config().mesh else {
            return;
        };
        self.pending_model = Some(PendingModel::spawn(path, clips));
    }

    pub fn poll_pending_model(&mut self) {
        let Some(pending) = &self.pending_model else {
            return;
        };

        match pending.poll() {
            LoadPoll::Pending => {}
            LoadPoll::Ready(asset) => {
                self.pending_model = None;
                let uploaded = self.renderer.lock().set_meshes(&self.gl, &asset.meshes);
                match uploaded {
                    Ok(()) => {
                        self.scene.attach_model(&asset);
                        self.last_error = None;
                        log::info!("Model loaded: {:?} ({} meshes)", asset.path, asset.meshes.len());
                        for mesh in &asset.meshes {
                            log::debug!("  mesh `{}`: {} vertices", mesh.name, mesh.vertex_count());
                        }
                    }
                    Err(e) => self.report_error("Failed to upload model", e),
                }
            }
            LoadPoll::Failed(e) => {
                self.pending_model = None;
                self.report_error("Failed to load model", e);
            }
        }
    }

    pub fn try_reload_shaders(&mut self) {
        log::info!("Shader files changed, attempting to reload...");

        let result = ShaderSources::read_from(&self.shader_dir).and_then(|sources| {
            sources.check_contract(self.scene.uniforms())?;
            self.renderer.lock().replace_program(&self.gl, &sources)
        });

        match result {
            Ok(()) => {
                self.last_error = None;
                log::info!("Shaders reloaded successfully!");
            }
            Err(e) => self.report_error("Shader reload failed", e),
        }
    }

    fn report_error(&mut self, context: &str, error: SceneError) {
        log::error!("{}: {}", context, error);
        self.last_error = Some(format!("{context}: {error}"));
    }

    pub fn custom_painting(&mut self, ui: &mut egui::Ui) {
        let (rect, _response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());

        let pixels_per_point = ui.ctx().pixels_per_point();
        let viewport = ViewportState::new(rect.width(), rect.height(), pixels_per_point);
        if viewport != *self.scene.viewport() {
            self.scene.resize(rect.width(), rect.height(), pixels_per_point);
        }

        let dt = ui.input(|i| i.stable_dt);
        self.last_report = self.driver.tick(dt, &mut self.scene);
        if self.last_report.render {
            ui.ctx().request_repaint();
        }

        let frame = self.scene.snapshot();
        let renderer = self.renderer.clone();

        let cb = egui_glow::CallbackFn::new(move |_info, painter| {
            renderer.lock().paint(painter.gl(), &frame);
        });

        let callback = egui::PaintCallback {
            rect,
            callback: Arc::new(cb),
        };
        ui.painter().add(callback);
    }
}

/// Resolve a bundled asset relative to the executable, falling back to the
/// working directory.
pub fn resolve_asset_path(relative: &str) -> PathBuf {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let candidate = exe_dir.join(relative);
            if candidate.exists() {
                return candidate;
            }
        }
    }

    PathBuf::from(relative)
}
