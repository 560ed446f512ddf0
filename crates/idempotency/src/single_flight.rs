//! Single-flight coordination keyed by fingerprint.
//!
//! The first caller for a fingerprint becomes the leader and runs the work;
//! callers arriving while it is in flight wait for and share its output.
//! If a leader is dropped before finishing, one of its waiters takes over.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::Fingerprint;

type Flights<T> = HashMap<Fingerprint, watch::Receiver<Option<T>>>;

enum Role<T> {
    Leader(watch::Sender<Option<T>>),
    Follower(watch::Receiver<Option<T>>),
}

/// Removes the flight entry when the leader finishes or is dropped.
struct FlightGuard<'a, T> {
    flights: &'a Mutex<Flights<T>>,
    key: Fingerprint,
}

impl<T> Drop for FlightGuard<'_, T> {
    fn drop(&mut self) {
        lock(self.flights).remove(&self.key);
    }
}

fn lock<T>(flights: &Mutex<Flights<T>>) -> MutexGuard<'_, Flights<T>> {
    flights.lock().unwrap_or_else(PoisonError::into_inner)
}

/// At most one in-flight execution per fingerprint.
///
/// The map lock is only held to register or look up a flight, never across
/// the work itself.
pub struct SingleFlight<T> {
    flights: Mutex<Flights<T>>,
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            flights: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> std::fmt::Debug for SingleFlight<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleFlight")
            .field("in_flight", &lock(&self.flights).len())
            .finish()
    }
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of fingerprints currently being executed.
    pub fn in_flight(&self) -> usize {
        lock(&self.flights).len()
    }

    /// Runs `work` for `key`, or waits for the execution already in flight
    /// and returns a clone of its output.
    pub async fn run<F, Fut>(&self, key: &Fingerprint, work: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let sender = loop {
            match self.join_or_lead(key) {
                Role::Leader(sender) => break sender,
                Role::Follower(mut receiver) => {
                    metrics::counter!("single_flight_joined_total").increment(1);
                    tracing::debug!(fingerprint = %key, "joining in-flight execution");

                    let shared = match receiver.wait_for(Option::is_some).await {
                        Ok(output) => (*output).clone(),
                        Err(_) => None,
                    };
                    if let Some(value) = shared {
                        return value;
                    }
                    tracing::debug!(fingerprint = %key, "leader abandoned execution, retrying");
                }
            }
        };

        let _guard = FlightGuard {
            flights: &self.flights,
            key: key.clone(),
        };

        let value = work().await;
        sender.send_replace(Some(value.clone()));
        value
    }

    fn join_or_lead(&self, key: &Fingerprint) -> Role<T> {
        let mut flights = lock(&self.flights);
        if let Some(receiver) = flights.get(key) {
            return Role::Follower(receiver.clone());
        }

        let (sender, receiver) = watch::channel(None);
        flights.insert(key.clone(), receiver);
        Role::Leader(sender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn sequential_calls_each_execute() {
        let flight = SingleFlight::new();
        let runs = AtomicUsize::new(0);
        let runs = &runs;
        let key = Fingerprint::from_raw("k");

        for expected in 1..=3 {
            let value = flight
                .run(&key, move || async move { runs.fetch_add(1, Ordering::SeqCst) + 1 })
                .await;
            assert_eq!(value, expected);
        }
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_execution() {
        let flight = SingleFlight::new();
        let runs = AtomicUsize::new(0);
        let runs = &runs;
        let key = Fingerprint::from_raw("k");

        let work = move || async move {
            runs.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            "result".to_string()
        };

        let (a, b, c) = tokio::join!(
            flight.run(&key, work),
            flight.run(&key, work),
            flight.run(&key, work)
        );

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!((a.as_str(), b.as_str(), c.as_str()), ("result", "result", "result"));
        assert_eq!(flight.in_flight(), 0);
    }

    #[tokio::test]
    async fn distinct_keys_do_not_wait_on_each_other() {
        let flight = SingleFlight::new();
        let runs = AtomicUsize::new(0);
        let runs = &runs;

        let work = move |n: usize| {
            move || async move {
                runs.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                n
            }
        };

        let key_a = Fingerprint::from_raw("a");
        let key_b = Fingerprint::from_raw("b");
        let (a, b) = tokio::join!(flight.run(&key_a, work(1)), flight.run(&key_b, work(2)));

        assert_eq!((a, b), (1, 2));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn follower_takes_over_when_leader_is_dropped() {
        let flight = Arc::new(SingleFlight::new());
        let key = Fingerprint::from_raw("k");
        let started = Arc::new(tokio::sync::Notify::new());

        let leader = {
            let flight = flight.clone();
            let key = key.clone();
            let started = started.clone();
            tokio::spawn(async move {
                flight
                    .run(&key, move || async move {
                        started.notify_one();
                        std::future::pending::<u32>().await
                    })
                    .await
            })
        };
        started.notified().await;
        assert_eq!(flight.in_flight(), 1);

        let follower = {
            let flight = flight.clone();
            let key = key.clone();
            tokio::spawn(async move { flight.run(&key, || async { 7 }).await })
        };
        tokio::task::yield_now().await;

        leader.abort();
        assert_eq!(follower.await.unwrap(), 7);
        assert_eq!(flight.in_flight(), 0);
    }
}
