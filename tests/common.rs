#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use parapipe::sink::Sink;

/// Generous upper bound for "did not hang".
pub const DEADLINE: Duration = Duration::from_secs(5);

/// Await `fut`, panicking if it does not finish before [`DEADLINE`].
pub async fn within<F: Future>(what: &str, fut: F) -> F::Output {
    tokio::time::timeout(DEADLINE, fut)
        .await
        .unwrap_or_else(|_| panic!("{what} did not finish in time"))
}

/// Tracks how many invocations are active at once, and the highest value seen.
#[derive(Clone, Default)]
pub struct Gauge {
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    total: Arc<AtomicUsize>,
}

impl Gauge {
    pub fn enter(&self) -> GaugeGuard {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
        GaugeGuard {
            active: self.active.clone(),
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

pub struct GaugeGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for GaugeGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A sink that also stores every result it receives.
pub fn collecting_sink<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, Sink<T>) {
    let out = Arc::new(Mutex::new(Vec::new()));
    let handle = out.clone();
    let sink = Sink::new().on_result(move |v| handle.lock().expect("mutex poisoned").push(v));
    (out, sink)
}

pub fn sorted<T: Ord + Clone>(items: &Mutex<Vec<T>>) -> Vec<T> {
    let mut v = items.lock().expect("mutex poisoned").clone();
    v.sort();
    v
}
