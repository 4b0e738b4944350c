//! Books service: a CRUD API over book records, enriched with author data
//! fetched from the peer authors service.

pub mod modules;

use anyhow::Context;
use books_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Registry holding every module of the service
pub fn build_registry(settings: &Settings) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, settings)?;
    Ok(registry)
}

/// Run the service until a shutdown signal arrives
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let registry = build_registry(&settings)?;
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    let served = books_http::start_server(&registry, &settings).await;

    registry
        .stop_modules()
        .await
        .context("failed to stop modules")?;
    served
}
