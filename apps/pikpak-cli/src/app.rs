//! Wires the clients together and runs one upload.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use pikpak_drive::{ClientInfo, DriveClient, Session};
use pikpak_oss::OssClient;
use pikpak_signer::CaptchaChainSigner;
use pikpak_upload::{UploadEvent, UploadOrchestrator};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::Config;

/// Uploads `path` and returns the drive file id.
///
/// The captcha token held at the end of the run is written back into
/// `config`, whether or not the upload succeeded.
pub async fn run(
    config: &mut Config,
    path: &Path,
    parent_id: Option<&str>,
) -> anyhow::Result<String> {
    if config.access_token.is_empty() {
        anyhow::bail!("access_token is not set in the configuration file");
    }

    let timeout = config.timeout();
    let signer = CaptchaChainSigner::new(config.salt_table().context("loading salt table")?);
    let session = Arc::new(
        Session::new(&config.access_token, &config.user_id, &config.device_id)
            .with_captcha_token(config.captcha_token.clone()),
    );

    let drive = DriveClient::new(ClientInfo::default(), Arc::clone(&session), signer, timeout)?;
    let store = OssClient::new(timeout)?;

    let mut orchestrator =
        UploadOrchestrator::new(config.upload_config(), Arc::new(drive), Arc::new(store));

    let logger = orchestrator
        .take_events()
        .map(|events| tokio::spawn(log_events(events)));

    // Ctrl-C stops the running upload.
    let cancel = orchestrator.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling upload");
            cancel.cancel();
        }
    });

    let result = orchestrator.upload_file(path, parent_id).await;
    interrupt.abort();

    config.captcha_token = session.captcha_token();

    // Dropping the orchestrator closes the event channel.
    drop(orchestrator);
    if let Some(logger) = logger {
        let _ = logger.await;
    }

    result.with_context(|| format!("uploading {}", path.display()))
}

async fn log_events(mut events: mpsc::Receiver<UploadEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            UploadEvent::Checked { name, size, hash } => {
                info!(name = %name, size, hash = %hash, "file checked");
            }
            UploadEvent::Deduplicated { file_id } => {
                info!(file_id = %file_id, "content already on drive, skipping transfer");
            }
            UploadEvent::Initiated {
                file_id,
                upload_id,
                parts,
                chunk_size,
            } => {
                info!(
                    file_id = %file_id,
                    upload_id = %upload_id,
                    parts,
                    chunk_size,
                    "upload started"
                );
            }
            UploadEvent::PartUploaded {
                part_number,
                uploaded_bytes,
                total_bytes,
                bytes_per_second,
                eta,
            } => {
                let percent = if total_bytes > 0 {
                    uploaded_bytes as f64 * 100.0 / total_bytes as f64
                } else {
                    100.0
                };
                info!(
                    part_number,
                    uploaded_bytes,
                    total_bytes,
                    percent = format_args!("{percent:.1}"),
                    speed_kib = format_args!("{:.1}", bytes_per_second / 1024.0),
                    eta_secs = eta.map(|eta| eta.as_secs()),
                    "part uploaded"
                );
            }
            UploadEvent::Completed { .. } | UploadEvent::Failed { .. } => {}
        }
    }
}
