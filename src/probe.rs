// Debounced availability checks against the booking authority
//
// Each qualifying edit cancels the pending quiet-period timer and starts a new
// one. Once a request is issued it runs to completion; whether its result is
// applied is decided by the store's sequence tracking.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::BookingApi;
use crate::draft::ProbeKey;
use crate::state::{FormEvent, FormStore};

pub struct AvailabilityProbe {
    api: Arc<dyn BookingApi>,
    store: FormStore,
    quiet_period: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl AvailabilityProbe {
    pub fn new(api: Arc<dyn BookingApi>, store: FormStore, quiet_period: Duration) -> Self {
        Self {
            api,
            store,
            quiet_period,
            timer: Mutex::new(None),
        }
    }

    // Restarts the quiet period for `key`. `None` disarms the probe.
    // Must be called from within a Tokio runtime.
    pub fn reschedule(&self, key: Option<ProbeKey>) {
        let mut timer = self.timer.lock();
        if let Some(pending) = timer.take() {
            pending.abort();
        }

        let Some(key) = key else {
            debug!("probe disarmed");
            return;
        };

        debug!(
            room_id = key.room_id,
            quiet_ms = self.quiet_period.as_millis() as u64,
            "probe scheduled"
        );
        let api = Arc::clone(&self.api);
        let store = self.store.clone();
        let quiet_period = self.quiet_period;
        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            issue(api, store, key);
        }));
    }

    pub fn cancel(&self) {
        if let Some(pending) = self.timer.lock().take() {
            pending.abort();
        }
    }
}

impl Drop for AvailabilityProbe {
    fn drop(&mut self) {
        self.cancel();
    }
}

// The request runs on its own task so cancelling the timer never cancels it
fn issue(api: Arc<dyn BookingApi>, store: FormStore, key: ProbeKey) {
    let Some(state) = store.dispatch(FormEvent::ProbeIssued(key.clone())) else {
        debug!("draft changed before the quiet period ended, probe dropped");
        return;
    };
    let Some(seq) = state.probe.pending() else {
        return;
    };

    tokio::spawn(async move {
        let verdict = match api.check_availability(&key).await {
            Ok(response) => Some(response.into()),
            Err(error) => {
                warn!(seq, %error, "availability check failed");
                None
            }
        };

        match store.dispatch(FormEvent::ProbeResolved { seq, verdict }) {
            Some(_) => debug!(seq, "availability result applied"),
            None => debug!(seq, "stale availability result discarded"),
        }
    });
}
