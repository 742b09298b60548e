use crate::error::{ErrorKind, Result};
use crate::media::base_media_type;
use crate::transport::Transport;
use tracing::instrument;
use urldb_store::{Record, redirect_marker};

/// Fill in a record from the live response for `url`.
///
/// A redirect is recorded as its [`redirect_marker`] and nothing else.
/// Otherwise the base media type is recorded and, when `lock_content` is set,
/// the body is streamed to lock its length and SHA-256 digest. Any other
/// status fails with [`ErrorKind::Status`].
#[instrument(skip(transport, record), fields(path = %record.path))]
pub async fn initialize(transport: &dyn Transport, url: &str, record: &mut Record, lock_content: bool) -> Result<()> {
    let response = transport.get(url).await?;
    if response.is_redirect() {
        record.content_type = redirect_marker(response.status);
        tracing::info!(content_type = %record.content_type, "Recorded redirect");
        return Ok(());
    }
    if !response.is_success() {
        exn::bail!(ErrorKind::Status {
            url: url.to_string(),
            status: response.status,
        });
    }
    record.content_type = base_media_type(response.content_type.as_deref());
    if lock_content {
        let fingerprint = response.fingerprint().await?;
        tracing::info!(content_type = %record.content_type, %fingerprint, "Recorded content fingerprint");
        record.fingerprint = Some(fingerprint);
    } else {
        tracing::info!(content_type = %record.content_type, "Recorded content type");
    }
    Ok(())
}
