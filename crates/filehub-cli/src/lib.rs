use anyhow::Context;
use chrono::NaiveDate;
use filehub_api_client::{ApiClient, IdentityClient, StaticIdentity};
use filehub_core::{ClientConfig, Upload, User};
use filehub_sync::Workspace;
use std::sync::Arc;

/// Initialize tracing for the CLI.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Build the engine: resolve the user (or take `FILEHUB_USER_ID`) and wire
/// the HTTP client into a workspace.
pub async fn connect(config: &ClientConfig) -> anyhow::Result<Workspace> {
    let service = Arc::new(ApiClient::from_config(config).context("Failed to create API client")?);

    let workspace = match &config.user_id_override {
        Some(user_name) => {
            let identity = StaticIdentity(User::from_user_name(user_name.clone()));
            Workspace::connect(service, &identity).await
        }
        None => {
            let identity =
                IdentityClient::from_config(config).context("Failed to create identity client")?;
            Workspace::connect(service, &identity).await
        }
    }
    .context("Could not resolve the current user. Check FILEHUB_USER_API_URL or set FILEHUB_USER_ID")?;

    Ok(workspace.configure(config))
}

/// `YYYY-MM-DD`, for clap value parsing.
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("expected a date as YYYY-MM-DD, got '{}'", value))
}

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Human-readable size, e.g. `1.5 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

pub const TABLE_HEADER: &str = "ID      FILENAME                        SIZE        UPLOADED             DOWNLOADS";

/// One row of the `files --table` output.
pub fn format_upload_row(upload: &Upload) -> String {
    let uploaded = upload
        .uploaded_at()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| upload.upload_time.clone());
    format!(
        "{:<7} {:<31} {:<11} {:<20} {}",
        upload.id,
        truncate_string(&upload.filename, 31),
        format_size(upload.size),
        uploaded,
        upload.download_count
    )
}
