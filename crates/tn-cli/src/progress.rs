//! Terminal progress for the all-pairs phase.

use std::sync::Mutex;

use kdam::{Bar, BarExt};

use tn_analysis::PathObserver;
use tn_core::NodeId;

/// A `kdam` bar advanced once per finished source.
///
/// The bar sits behind a mutex because sources may finish on Rayon
/// workers.
#[derive(Default)]
pub struct BarObserver {
    bar: Mutex<Option<Bar>>,
}

impl PathObserver for BarObserver {
    fn on_start(&self, sources: usize) {
        let built = Bar::builder().total(sources).desc("shortest paths").unit(" sources").build();
        match (built, self.bar.lock()) {
            (Ok(bar), Ok(mut slot)) => *slot = Some(bar),
            (Err(e), _) => log::warn!("progress bar disabled: {e}"),
            (_, Err(_)) => log::warn!("progress bar disabled: lock poisoned"),
        }
    }

    fn on_source_done(&self, _source: NodeId, _reached: usize) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(bar) = slot.as_mut() {
                if let Err(e) = bar.update(1) {
                    log::debug!("progress bar update failed: {e}");
                }
            }
        }
    }

    fn on_finish(&self, pairs: usize) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(mut bar) = slot.take() {
                if let Err(e) = bar.refresh() {
                    log::debug!("progress bar refresh failed: {e}");
                }
                eprintln!();
            }
        }
        log::info!("{pairs} shortest paths computed");
    }
}
