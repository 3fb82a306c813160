use crate::core::models::results::Results;
use crate::core::models::structure::AtomCollection;

/// A progress callback invoked at every intermediate step of an algorithm with
/// the step index, the current structure, the current results and a label.
pub type Observer<'a> = Box<dyn Fn(usize, &AtomCollection, &Results, &str) + 'a>;

/// An ordered set of observers.
///
/// Observers are pure instrumentation (trajectory recording, progress output):
/// they are notified synchronously, in registration order, and nothing they do
/// feeds back into the computation.
#[derive(Default)]
pub struct ObserverSet<'a> {
    observers: Vec<Observer<'a>>,
}

impl<'a> ObserverSet<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, observer: Observer<'a>) {
        self.observers.push(observer);
    }

    pub fn with(mut self, observer: Observer<'a>) -> Self {
        self.add(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    #[inline]
    pub fn notify(&self, step: usize, structure: &AtomCollection, results: &Results, label: &str) {
        for observer in &self.observers {
            observer(step, structure, results, label);
        }
    }
}
