use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

/// 書き込み結果の集計（スナップショット）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistCounts {
    pub succeeded: usize,
    pub failed: usize,
    /// writer が止まった後に投げられて捨てられた書き込み
    pub dropped: usize,
}

/// Persister が更新するカウンタ
#[derive(Debug, Default)]
pub struct PersistStats {
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    dropped: AtomicUsize,
}

impl PersistStats {
    pub fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn counts(&self) -> PersistCounts {
        PersistCounts {
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}
