use anyhow::Context;
use bookmate_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load BookMate settings")?;
    bookmate_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        store = ?settings.store.backend,
        sessions = ?settings.auth.provider,
        "bookmate-app bootstrap starting"
    );

    bookmate_app::serve(settings).await
}
