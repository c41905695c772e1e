//! Refresh scheduler
//!
//! Two timers share one loop: a slow refresh timer that fetches and parses the
//! feed in a background task, and a fast animation timer that re-renders the
//! strip from whatever observations are cached. A failed refresh keeps the
//! previous observations and marks them stale; rendering never waits on the
//! network.

use chrono::{DateTime, Local, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, instrument, warn};

use crate::Result;
use crate::display::layout::station_codes;
use crate::display::{AnimationPhase, BrightnessSchedule, DisplayEngine};
use crate::error::MetarMapError;
use crate::models::ObservationSet;
use crate::render::{Frame, RenderSink};
use crate::weather::{Fetcher, ObservationParser};

/// Slow refresh cycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Fetching,
    Applied,
    FetchFailed,
}

/// Cached observations plus refresh bookkeeping
#[derive(Debug, Clone)]
pub struct CacheState {
    pub observations: Arc<ObservationSet>,
    /// Last refresh failed; `observations` are from an earlier cycle
    pub stale: bool,
    pub consecutive_failures: u32,
    pub last_success: Option<DateTime<Utc>>,
    pub fetch_state: FetchState,
    /// `Applied` or `FetchFailed` of the most recent finished cycle
    pub last_outcome: Option<FetchState>,
}

impl Default for CacheState {
    fn default() -> Self {
        Self {
            observations: Arc::new(ObservationSet::empty()),
            stale: false,
            consecutive_failures: 0,
            last_success: None,
            fetch_state: FetchState::Idle,
            last_outcome: None,
        }
    }
}

/// Shared observation cache. The set is swapped whole, never edited in place.
#[derive(Debug, Clone, Default)]
pub struct ObservationCache {
    inner: Arc<RwLock<CacheState>>,
}

impl ObservationCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshot(&self) -> CacheState {
        self.inner.read().await.clone()
    }

    /// Install the observations of a successful refresh
    pub async fn replace(&self, observations: ObservationSet) {
        let mut state = self.inner.write().await;
        state.last_success = observations.fetched_at();
        state.observations = Arc::new(observations);
        state.stale = false;
        state.consecutive_failures = 0;
    }

    /// Keep the current observations and flag them stale
    pub async fn mark_failed(&self) -> CacheState {
        let mut state = self.inner.write().await;
        state.stale = true;
        state.consecutive_failures += 1;
        state.clone()
    }

    /// Move the refresh state machine, returning the previous state
    pub async fn set_fetch_state(&self, next: FetchState) -> FetchState {
        let mut state = self.inner.write().await;
        if matches!(next, FetchState::Applied | FetchState::FetchFailed) {
            state.last_outcome = Some(next);
        }
        std::mem::replace(&mut state.fetch_state, next)
    }
}

/// Timer settings
#[derive(Debug, Clone, Copy)]
pub struct SchedulerSettings {
    pub refresh_interval: Duration,
    pub tick_interval: Duration,
    /// Upper bound for one fetch-and-parse
    pub fetch_timeout: Duration,
}

struct RefreshOutcome {
    observations: ObservationSet,
    skipped: usize,
}

/// Fetch and parse one cycle, bounded by `timeout`
async fn refresh_cycle<F: Fetcher, P: ObservationParser>(
    fetcher: Arc<F>,
    parser: Arc<P>,
    stations: Arc<Vec<String>>,
    timeout: Duration,
) -> Result<RefreshOutcome> {
    let fetched_at = Utc::now();
    let raw = tokio::time::timeout(timeout, fetcher.fetch(&stations))
        .await
        .map_err(|_| MetarMapError::fetch(format!("Fetch timed out after {timeout:?}")))??;
    let outcome = parser.parse(&raw, fetched_at)?;
    Ok(RefreshOutcome {
        skipped: outcome.skipped.len(),
        observations: ObservationSet::new(outcome.observations, fetched_at),
    })
}

/// Resolves when the in-flight refresh finishes; never resolves when there is none
async fn join_in_flight<T>(handle: &mut Option<JoinHandle<T>>) -> std::result::Result<T, JoinError> {
    match handle {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

pub struct RefreshScheduler<F, P, S> {
    fetcher: Arc<F>,
    parser: Arc<P>,
    sink: S,
    engine: DisplayEngine,
    brightness: BrightnessSchedule,
    settings: SchedulerSettings,
    stations: Arc<Vec<String>>,
    cache: ObservationCache,
    phase: AnimationPhase,
    tick: u64,
}

impl<F, P, S> RefreshScheduler<F, P, S>
where
    F: Fetcher,
    P: ObservationParser,
    S: RenderSink,
{
    pub fn new(
        fetcher: F,
        parser: P,
        sink: S,
        engine: DisplayEngine,
        brightness: BrightnessSchedule,
        settings: SchedulerSettings,
    ) -> Self {
        let stations = Arc::new(station_codes(engine.airports()));
        Self {
            fetcher: Arc::new(fetcher),
            parser: Arc::new(parser),
            sink,
            engine,
            brightness,
            settings,
            stations,
            cache: ObservationCache::new(),
            phase: AnimationPhase::On,
            tick: 0,
        }
    }

    /// Handle to the shared observation cache, including the refresh state
    #[must_use]
    pub fn cache(&self) -> ObservationCache {
        self.cache.clone()
    }

    async fn transition(&self, next: FetchState) {
        let previous = self.cache.set_fetch_state(next).await;
        debug!(from = ?previous, to = ?next, "Refresh state change");
    }

    /// Run until `shutdown` turns true or its sender is dropped.
    /// A render in progress always completes; an in-flight refresh is abandoned.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut refresh = interval(self.settings.refresh_interval);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut animation = interval(self.settings.tick_interval);
        animation.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut in_flight: Option<JoinHandle<Result<RefreshOutcome>>> = None;

        info!(
            stations = self.stations.len(),
            refresh = ?self.settings.refresh_interval,
            tick = ?self.settings.tick_interval,
            "Scheduler started"
        );

        while !*shutdown.borrow() {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                joined = join_in_flight(&mut in_flight) => {
                    in_flight = None;
                    self.apply(joined).await;
                }
                _ = refresh.tick() => {
                    if in_flight.is_some() {
                        debug!("Refresh still in flight, skipping this one");
                        continue;
                    }
                    self.transition(FetchState::Fetching).await;
                    in_flight = Some(tokio::spawn(refresh_cycle(
                        Arc::clone(&self.fetcher),
                        Arc::clone(&self.parser),
                        Arc::clone(&self.stations),
                        self.settings.fetch_timeout,
                    )));
                }
                _ = animation.tick() => {
                    self.render_tick().await;
                }
            }
        }

        if let Some(handle) = in_flight.take() {
            handle.abort();
            self.transition(FetchState::Idle).await;
            info!("Abandoned in-flight refresh");
        }
        info!(frames = self.tick, "Scheduler stopped");
    }

    async fn apply(&mut self, joined: std::result::Result<Result<RefreshOutcome>, JoinError>) {
        let result = joined
            .map_err(|e| MetarMapError::fetch(format!("Refresh task failed: {e}")))
            .and_then(|outcome| outcome);

        match result {
            Ok(outcome) => {
                info!(
                    stations = outcome.observations.len(),
                    skipped = outcome.skipped,
                    "Observations refreshed"
                );
                self.cache.replace(outcome.observations).await;
                self.transition(FetchState::Applied).await;
            }
            Err(e) => {
                let state = self.cache.mark_failed().await;
                let age = state
                    .last_success
                    .map(|t| format!("{}s", (Utc::now() - t).num_seconds()))
                    .unwrap_or_else(|| "never fetched".to_string());
                warn!(
                    consecutive_failures = state.consecutive_failures,
                    data_age = %age,
                    "Refresh failed, showing last known observations: {e}"
                );
                self.transition(FetchState::FetchFailed).await;
            }
        }
        self.transition(FetchState::Idle).await;
    }

    #[instrument(level = "debug", skip(self), fields(tick = self.tick, phase = ?self.phase))]
    async fn render_tick(&mut self) {
        let state = self.cache.snapshot().await;
        let brightness = self.brightness.brightness_at(&Local::now());

        match self.engine.frame(&state.observations, self.phase) {
            Ok(pixels) => {
                let frame = Frame {
                    tick: self.tick,
                    brightness,
                    stale: state.stale,
                    pixels,
                };
                if let Err(e) = self.sink.render(&frame).await {
                    error!("Render failed: {e}");
                }
            }
            Err(e) => error!("Skipping render: {e}"),
        }

        self.tick += 1;
        self.phase = self.phase.toggled();
    }
}
