// SPDX-License-Identifier: MIT OR Apache-2.0
//! `texgen` - procedural texture generator.
//!
//! Evaluates a texture node graph off-screen, feeds the published texture to
//! a masked blur of a procedural scene, and exports the results as PNG.
//!
//! ```text
//! texgen [config.ron]
//! ```

mod app;
mod blur;
mod config;
mod error;
mod gpu;
mod layout;
mod scene;

use app::{RenderBackend, TexGenApp};
use config::{AppConfig, CONFIG_FILE_NAME};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["texgen_app=debug", "texgen_graph=info", "wgpu=warn", "naga=warn"] {
        if let Ok(directive) = directive.parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting texgen v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run() {
        tracing::error!("texgen failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> error::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(CONFIG_FILE_NAME), PathBuf::from);
    let config = AppConfig::load_or_default(&config_path)?;

    let backend = RenderBackend::select(config.headless);
    let mut app = TexGenApp::new(config, backend)?;
    let result = app.run();
    app.shutdown();
    result
}
