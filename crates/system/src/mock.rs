//! In-memory counter source for tests.

use crate::counter::{Category, Counter, CounterError, CounterHandle, CounterSource};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// What the next read of one instance returns.
#[derive(Clone, Copy)]
enum Reading {
    Value(f32),
    NotReady,
    Malformed,
}

#[derive(Default)]
struct MockState {
    instances: HashMap<Category, Vec<String>>,
    /// Current reading per instance; absent means the instance vanished.
    readings: HashMap<(Category, String), Reading>,
    opened: usize,
}

/// A scriptable [`CounterSource`].  Clones share state, so a test can keep
/// one copy to steer the source after handing another to a registry.
#[derive(Clone)]
pub struct MockSource {
    state:    Arc<Mutex<MockState>>,
    total_mb: f64,
}

impl MockSource {
    pub fn new(total_mb: f64) -> Self {
        Self {
            state: Arc::default(),
            total_mb,
        }
    }

    pub fn set_instances(&self, category: Category, names: &[&str]) {
        let names = names.iter().map(|n| n.to_string()).collect();
        self.state.lock().unwrap().instances.insert(category, names);
    }

    pub fn set_value(&self, category: Category, instance: &str, value: f32) {
        self.set_reading(category, instance, Reading::Value(value));
    }

    /// Reads report a missing baseline.
    pub fn set_not_ready(&self, category: Category, instance: &str) {
        self.set_reading(category, instance, Reading::NotReady);
    }

    /// Reads return unparsable text.
    pub fn set_malformed(&self, category: Category, instance: &str) {
        self.set_reading(category, instance, Reading::Malformed);
    }

    pub fn remove_value(&self, category: Category, instance: &str) {
        let key = (category, instance.to_string());
        self.state.lock().unwrap().readings.remove(&key);
    }

    fn set_reading(&self, category: Category, instance: &str, reading: Reading) {
        let key = (category, instance.to_string());
        self.state.lock().unwrap().readings.insert(key, reading);
    }

    /// Number of counters opened so far.
    pub fn opened(&self) -> usize {
        self.state.lock().unwrap().opened
    }
}

struct MockCounter {
    category: Category,
    instance: String,
    state:    Arc<Mutex<MockState>>,
}

impl Counter for MockCounter {
    fn next_value(&self) -> Result<f32, CounterError> {
        let instance = self.instance.clone();
        let reading = self
            .state
            .lock()
            .unwrap()
            .readings
            .get(&(self.category, self.instance.clone()))
            .copied();

        match reading {
            Some(Reading::Value(v)) => Ok(v),
            Some(Reading::NotReady) => Err(CounterError::NotReady { instance }),
            Some(Reading::Malformed) => Err(CounterError::Parse {
                instance,
                raw: "n/a".into(),
            }),
            None => Err(CounterError::Unavailable { instance }),
        }
    }
}

impl CounterSource for MockSource {
    fn instances(&self, category: Category) -> Result<Vec<String>, CounterError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .instances
            .get(&category)
            .cloned()
            .unwrap_or_default())
    }

    fn open(&self, category: Category, instance: &str) -> Result<CounterHandle, CounterError> {
        self.state.lock().unwrap().opened += 1;
        Ok(Arc::new(MockCounter {
            category,
            instance: instance.to_string(),
            state:    Arc::clone(&self.state),
        }))
    }

    fn total_memory_mb(&self) -> f64 {
        self.total_mb
    }
}
