use std::str::FromStr;
use std::sync::{Arc, Mutex};

use tracing::Level;

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() {
    // if LOG_LEVEL env var is set, use it
    let level = std::env::var("LOG_LEVEL").ok().and_then(|level| Level::from_str(&level).ok()).unwrap_or(Level::INFO);
    let _ = tracing_subscriber::fmt().with_max_level(level).with_test_writer().try_init();
}

/// Returns a subscriber that records every value it receives, and a function draining what was recorded
#[allow(unused)]
pub fn watcher<T: Clone + Send + 'static>() -> (impl Fn(&T) + Send + Sync + 'static, impl Fn() -> Vec<T>) {
    let values = Arc::new(Mutex::new(Vec::new()));
    let accumulate = {
        let values = values.clone();
        move |value: &T| values.lock().unwrap().push(value.clone())
    };
    let check = move || values.lock().unwrap().drain(..).collect::<Vec<T>>();
    (accumulate, check)
}
