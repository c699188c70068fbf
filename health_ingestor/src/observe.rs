//! Observation sink for retries and chunk failures.

use log::Level;

/// Receives human-readable observations from the fetch engine.
pub trait Observer: Send + Sync {
    fn emit(&self, level: Level, message: &str);
}

/// Forwards observations to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn emit(&self, level: Level, message: &str) {
        log::log!(target: "health_ingestor", level, "{message}");
    }
}

/// Keeps every observation in memory.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: std::sync::Mutex<Vec<(Level, String)>>,
}

#[cfg(any(test, feature = "test-util"))]
impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(Level, String)> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, level: Level) -> usize {
        self.events().iter().filter(|(l, _)| *l == level).count()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Observer for RecordingObserver {
    fn emit(&self, level: Level, message: &str) {
        if let Ok(mut events) = self.events.lock() {
            events.push((level, message.to_string()));
        }
    }
}
