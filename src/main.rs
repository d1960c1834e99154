mod app;
use app::SceneApp;
use app::variant::SceneVariant;

pub const DEFAULT_VARIANT: SceneVariant = SceneVariant::ShadertoyPlane;
pub const VARIANT_ENV: &str = "SCENE_VARIANT";
pub const RELOAD_DEBOUNCE_MS: u64 = 100;

fn startup_variant() -> SceneVariant {
    match std::env::var(VARIANT_ENV) {
        Ok(name) => name.parse().unwrap_or_else(|e| {
            log::warn!("{}; using `{}`", e, DEFAULT_VARIANT);
            DEFAULT_VARIANT
        }),
        Err(_) => DEFAULT_VARIANT,
    }
}

fn main() {
    env_logger::init();

    let variant = startup_variant();

    let native_options = eframe::NativeOptions {
        renderer: eframe::Renderer::Glow,
        depth_buffer: 24,
        multisampling: 4,
        ..Default::default()
    };

    eframe::run_native(
        "Scene Demos",
        native_options,
        Box::new(move |cc| Box::new(SceneApp::new(cc, variant).expect("Failed to create SceneApp"))),
    ).expect("Failed to run eframe");
}
