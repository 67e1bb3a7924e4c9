//! Per-service status indicators with timed auto-clear.
//!
//! Three independent indicators (`asr`, `llm`, `tts`). `Active` is not
//! sticky: it reverts to `Idle` after the clear delay unless something
//! newer happened first. Every transition bumps a per-indicator
//! generation; a clear timer only fires if the generation it captured is
//! still current.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, warn};

use crate::events::{EventSink, ViewEvent};

/// How long `Active` stays visible before reverting to `Idle`.
pub const DEFAULT_CLEAR_DELAY: Duration = Duration::from_secs(1);

/// A service with its own indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Service {
    Asr,
    Llm,
    Tts,
}

impl Service {
    pub const ALL: [Service; 3] = [Service::Asr, Service::Llm, Service::Tts];

    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Asr => "asr",
            Service::Llm => "llm",
            Service::Tts => "tts",
        }
    }

    fn index(self) -> usize {
        match self {
            Service::Asr => 0,
            Service::Llm => 1,
            Service::Tts => 2,
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Indicator state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IndicatorState {
    #[default]
    Idle,
    Processing,
    Active,
    Error,
}

impl fmt::Display for IndicatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IndicatorState::Idle => "idle",
            IndicatorState::Processing => "processing",
            IndicatorState::Active => "active",
            IndicatorState::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Slot {
    state: IndicatorState,
    generation: u64,
}

struct Inner {
    slots: Mutex<[Slot; 3]>,
    sink: Arc<dyn EventSink>,
    clear_delay: Duration,
}

impl Inner {
    /// Revert `service` to idle if nothing touched it since `generation`.
    fn clear_if_current(&self, service: Service, generation: u64) {
        {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = &mut slots[service.index()];
            if slot.generation != generation || slot.state != IndicatorState::Active {
                debug!(service = %service, "stale status clear ignored");
                return;
            }
            slot.state = IndicatorState::Idle;
            slot.generation += 1;
        }
        self.sink.emit(ViewEvent::StatusChanged {
            service,
            state: IndicatorState::Idle,
        });
    }
}

/// Shared handle to the three indicators. Cheap to clone.
#[derive(Clone)]
pub struct StatusTracker {
    inner: Arc<Inner>,
}

impl StatusTracker {
    /// Tracker with the standard one-second clear delay.
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self::with_clear_delay(sink, DEFAULT_CLEAR_DELAY)
    }

    pub fn with_clear_delay(sink: Arc<dyn EventSink>, clear_delay: Duration) -> Self {
        StatusTracker {
            inner: Arc::new(Inner {
                slots: Mutex::new([Slot::default(); 3]),
                sink,
                clear_delay,
            }),
        }
    }

    /// Move `service` to `state` and notify the view.
    ///
    /// Setting `Active` schedules a clear on the current tokio runtime.
    pub fn set(&self, service: Service, state: IndicatorState) {
        let generation = {
            let mut slots = self
                .inner
                .slots
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let slot = &mut slots[service.index()];
            slot.state = state;
            slot.generation += 1;
            slot.generation
        };

        debug!(service = %service, state = %state, "status changed");
        self.inner
            .sink
            .emit(ViewEvent::StatusChanged { service, state });

        if state == IndicatorState::Active {
            self.schedule_clear(service, generation);
        }
    }

    /// Current state of one indicator.
    pub fn get(&self, service: Service) -> IndicatorState {
        let slots = self
            .inner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        slots[service.index()].state
    }

    /// All three indicators, in `asr, llm, tts` order.
    pub fn snapshot(&self) -> [(Service, IndicatorState); 3] {
        Service::ALL.map(|s| (s, self.get(s)))
    }

    pub fn clear_delay(&self) -> Duration {
        self.inner.clear_delay
    }

    fn schedule_clear(&self, service: Service, generation: u64) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(service = %service, "no async runtime; indicator stays active");
                return;
            }
        };

        let inner = Arc::clone(&self.inner);
        handle.spawn(async move {
            tokio::time::sleep(inner.clear_delay).await;
            inner.clear_if_current(service, generation);
        });
    }
}

impl fmt::Debug for StatusTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusTracker")
            .field("indicators", &self.snapshot())
            .field("clear_delay", &self.inner.clear_delay)
            .finish()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{drain, ChannelSink, NullSink};

    fn tracker() -> StatusTracker {
        StatusTracker::new(Arc::new(NullSink))
    }

    #[test]
    fn test_starts_idle() {
        let t = tracker();
        for (_, state) in t.snapshot() {
            assert_eq!(state, IndicatorState::Idle);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_active_clears_after_delay() {
        let t = tracker();
        t.set(Service::Llm, IndicatorState::Active);
        assert_eq!(t.get(Service::Llm), IndicatorState::Active);

        tokio::time::sleep(Duration::from_millis(900)).await;
        assert_eq!(t.get(Service::Llm), IndicatorState::Active);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(t.get(Service::Llm), IndicatorState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_state_survives_stale_timer() {
        let t = tracker();
        t.set(Service::Tts, IndicatorState::Active);
        tokio::time::sleep(Duration::from_millis(300)).await;
        t.set(Service::Tts, IndicatorState::Processing);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(t.get(Service::Tts), IndicatorState::Processing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reactivation_restarts_timer() {
        let t = tracker();
        t.set(Service::Asr, IndicatorState::Active);
        tokio::time::sleep(Duration::from_millis(600)).await;
        t.set(Service::Asr, IndicatorState::Active);

        // First timer fires at 1.0s, but it is stale.
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(t.get(Service::Asr), IndicatorState::Active);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(t.get(Service::Asr), IndicatorState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_indicators_are_independent() {
        let t = tracker();
        t.set(Service::Llm, IndicatorState::Active);
        t.set(Service::Tts, IndicatorState::Error);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(t.get(Service::Llm), IndicatorState::Idle);
        assert_eq!(t.get(Service::Tts), IndicatorState::Error);
        assert_eq!(t.get(Service::Asr), IndicatorState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_emits_every_transition() {
        let (sink, mut rx) = ChannelSink::new();
        let t = StatusTracker::new(Arc::new(sink));
        t.set(Service::Llm, IndicatorState::Processing);
        t.set(Service::Llm, IndicatorState::Active);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let states: Vec<IndicatorState> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                ViewEvent::StatusChanged { service, state } if service == Service::Llm => {
                    Some(state)
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            states,
            vec![
                IndicatorState::Processing,
                IndicatorState::Active,
                IndicatorState::Idle
            ]
        );
    }

    #[test]
    fn test_active_without_runtime_stays_active() {
        let t = tracker();
        t.set(Service::Llm, IndicatorState::Active);
        assert_eq!(t.get(Service::Llm), IndicatorState::Active);
    }
}
