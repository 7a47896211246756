//! Background asset preloading.
//!
//! Decoding runs on a plain worker thread; results travel back to the
//! frame loop over a tokio channel so the loop never blocks on disk.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::core::assets::{self, PetAsset};

#[derive(Debug)]
pub enum AssetUpdate {
    /// Percentage of assets processed so far.
    Progress(u8),
    Loaded { index: usize, asset: PetAsset },
    /// Every asset has been processed (loaded or replaced by a placeholder).
    Ready,
}

pub struct PreloadHandle {
    cancel: Arc<AtomicBool>,
}

impl PreloadHandle {
    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

pub fn spawn_preload(paths: Vec<PathBuf>) -> (PreloadHandle, mpsc::UnboundedReceiver<AssetUpdate>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = Arc::new(AtomicBool::new(false));
    let worker_cancel = Arc::clone(&cancel);

    std::thread::spawn(move || {
        let total = paths.len();
        let _ = tx.send(AssetUpdate::Progress(if total == 0 { 100 } else { 0 }));
        for (index, path) in paths.iter().enumerate() {
            if worker_cancel.load(Ordering::Relaxed) {
                tracing::debug!("preload cancelled");
                return;
            }
            let asset = assets::load_or_placeholder(path);
            if tx.send(AssetUpdate::Loaded { index, asset }).is_err() {
                return; // receiver dropped
            }
            let pct = ((index + 1) * 100 / total) as u8;
            let _ = tx.send(AssetUpdate::Progress(pct));
        }
        tracing::info!(total, "assets ready");
        let _ = tx.send(AssetUpdate::Ready);
    });

    (PreloadHandle { cancel }, rx)
}
