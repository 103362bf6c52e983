//! Screenshot rendering and persistence.

use crate::{BrowserSession, CaptureError};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// A successfully persisted screenshot.
#[derive(Debug, Clone)]
pub struct Captured {
    /// Collision-resistant identifier, fresh per capture.
    pub id: String,
    /// Location of the written PNG.
    pub path: PathBuf,
}

/// Render the current page state to `<output_dir>/<id>.png`.
///
/// The output directory is created on first use. A failed write removes
/// the partial file so no inconsistent output survives.
pub async fn capture(
    session: &BrowserSession,
    full_page: bool,
    output_dir: &Path,
) -> Result<Captured, CaptureError> {
    tokio::fs::create_dir_all(output_dir).await?;

    let params = ScreenshotParams::builder()
        .format(CaptureScreenshotFormat::Png)
        .full_page(full_page)
        .build();

    let data = session
        .bounded(async {
            session
                .page()
                .screenshot(params)
                .await
                .map_err(|e| CaptureError::CaptureFailed(e.to_string()))
        })
        .await?;

    let id = Uuid::new_v4().to_string();
    let path = output_dir.join(format!("{id}.png"));

    if let Err(e) = tokio::fs::write(&path, &data).await {
        let _ = tokio::fs::remove_file(&path).await;
        return Err(CaptureError::CaptureFailed(format!(
            "writing {}: {e}",
            path.display()
        )));
    }

    debug!("wrote {} bytes to {}", data.len(), path.display());
    Ok(Captured { id, path })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers_are_unique_and_name_the_file() {
        let first = Uuid::new_v4().to_string();
        let second = Uuid::new_v4().to_string();
        assert_ne!(first, second);

        let path = Path::new("screenshots").join(format!("{first}.png"));
        let name = path.file_name().and_then(|n| n.to_str()).expect("name");
        assert!(name.starts_with(&first));
        assert!(name.ends_with(".png"));
    }
}
