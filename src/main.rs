use anyhow::Context;
use books_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load books settings")?;
    books_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        address = %settings.server.bind_address(),
        authors = %settings.authors.base_url,
        "books-service starting"
    );

    books_service::run(settings).await
}
