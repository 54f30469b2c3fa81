use std::sync::Mutex;

use super::changes::Change;

/// Notified synchronously, in registration order, after every
/// committed mutation. The library-level hook a metrics sink would
/// attach to; this core ships only the `println!`-based default.
pub trait ChangeObserver: Send + Sync {
    fn on_change(&self, change: &Change);
}

/// Default observer: writes one line per change to stdout. Mirrors the
/// buffer-or-println behaviour of a bare-bones publisher — useful as a
/// development default and as a seam tests can swap out.
pub struct LogObserver {
    buffer: Option<Mutex<Vec<String>>>,
}

impl LogObserver {
    /// Prints directly to stdout.
    pub fn new() -> Self {
        LogObserver { buffer: None }
    }

    /// Captures formatted lines instead of printing, for tests that
    /// want to assert on observer output without scraping stdout.
    pub fn buffered() -> Self {
        LogObserver { buffer: Some(Mutex::new(Vec::new())) }
    }

    pub fn lines(&self) -> Vec<String> {
        match &self.buffer {
            Some(buffer) => buffer.lock().unwrap().clone(),
            None => Vec::new(),
        }
    }
}

impl Default for LogObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeObserver for LogObserver {
    fn on_change(&self, change: &Change) {
        let line = format!(
            "change entity={} id={} deleted={} at={}",
            change.entity, change.id, change.deleted, change.timestamp
        );
        match &self.buffer {
            Some(buffer) => buffer.lock().unwrap().push(line),
            None => println!("{line}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn buffered_observer_captures_lines() {
        let observer = LogObserver::buffered();
        observer.on_change(&Change::new(Utc::now(), "document", "d1", false));
        assert_eq!(observer.lines().len(), 1);
        assert!(observer.lines()[0].contains("entity=document"));
    }
}
