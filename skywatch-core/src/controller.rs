use log::debug;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

use crate::{
    client::ProvideWeather,
    error::{ErrorKind, ValidationError},
    model::{QueryState, WeatherQuery},
};

/// Drives weather lookups and publishes the lifecycle of the latest
/// query through a watch channel.
///
/// State is always replaced whole, so subscribers never observe a torn
/// value. At most one lookup is represented at a time: each accepted
/// `submit` gets a monotonically increasing tag, and a completion is
/// applied only while its tag is still the latest. A response from a
/// superseded request is dropped without publishing.
///
/// Requires a tokio runtime; the fetch runs on a spawned task.
#[derive(Debug)]
pub struct QueryController {
    client: Arc<dyn ProvideWeather>,
    state: watch::Sender<QueryState>,
    /// Tag of the most recently accepted submission. The lock is held
    /// across tag checks and publishes so a stale completion can never
    /// interleave with a newer submit.
    latest: Arc<Mutex<u64>>,
}

impl QueryController {
    pub fn new(client: Arc<dyn ProvideWeather>) -> Self {
        let (state, _) = watch::channel(QueryState::Idle);
        Self { client, state, latest: Arc::new(Mutex::new(0)) }
    }

    /// Subscribe to state changes. The receiver immediately sees the
    /// current value.
    pub fn subscribe(&self) -> watch::Receiver<QueryState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> QueryState {
        self.state.borrow().clone()
    }

    /// Submit a lookup for `raw_city`.
    ///
    /// Blank input is rejected here without touching the state or the
    /// network. Otherwise `Loading` is published synchronously, before
    /// any I/O, and the fetch proceeds on a background task with air
    /// quality disabled (no surface exposes the toggle).
    pub fn submit(&self, raw_city: &str) -> Result<(), ValidationError> {
        let city = raw_city.trim();
        if city.is_empty() {
            return Err(ValidationError::BlankCity);
        }

        let query = WeatherQuery::new(city);
        let tag = {
            // The tag counter itself cannot be left inconsistent, so a
            // poisoned lock is safe to recover.
            let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
            *latest += 1;
            self.state.send_replace(QueryState::Loading { city: city.to_string() });
            *latest
        };

        let client = Arc::clone(&self.client);
        let state = self.state.clone();
        let latest = Arc::clone(&self.latest);

        tokio::spawn(async move {
            let outcome = client.fetch(&query).await;

            let latest = latest.lock().unwrap_or_else(PoisonError::into_inner);
            if *latest != tag {
                debug!("dropping stale response for '{}' (tag {tag}, latest {})", query.city, *latest);
                return;
            }

            let next = match outcome {
                Ok(result) => QueryState::Success { result },
                Err(err) => {
                    let kind = ErrorKind::from(&err);
                    debug!("lookup for '{}' failed: {err}", query.city);
                    QueryState::Failed { kind, message: err.to_string() }
                }
            };

            state.send_replace(next);
        });

        Ok(())
    }
}
