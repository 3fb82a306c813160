use super::error::TaskError;
use crate::core::calculator::Calculator;
use std::collections::BTreeMap;
use std::collections::btree_map;

/// The named-system registry shared by all tasks of one pipeline run.
///
/// Every entry owns its calculator exclusively. Tasks never alias an entry:
/// they either read it through [`lookup`](Self::lookup), take a private deep
/// copy through [`clone_for_task`](Self::clone_for_task), or replace it through
/// [`commit`](Self::commit).
#[derive(Debug, Clone, Default)]
pub struct SystemsMap {
    systems: BTreeMap<String, Box<dyn Calculator>>,
}

impl SystemsMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the calculator registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::MissingSystem`] naming both the system and the
    /// requesting task if `name` is not registered.
    pub fn lookup(&self, name: &str, task: &str) -> Result<&dyn Calculator, TaskError> {
        self.systems
            .get(name)
            .map(|calculator| calculator.as_ref())
            .ok_or_else(|| missing(name, task))
    }

    pub fn lookup_mut(&mut self, name: &str, task: &str) -> Result<&mut dyn Calculator, TaskError> {
        match self.systems.get_mut(name) {
            Some(calculator) => Ok(calculator.as_mut()),
            None => Err(missing(name, task)),
        }
    }

    /// Checks that every name in `names` resolves, reporting the first miss.
    pub fn validate_inputs(&self, names: &[String], task: &str) -> Result<(), TaskError> {
        for name in names {
            self.lookup(name, task)?;
        }
        Ok(())
    }

    /// Returns an independently owned deep copy of the calculator registered
    /// under `name`. The registry entry is not touched.
    pub fn clone_for_task(&self, name: &str, task: &str) -> Result<Box<dyn Calculator>, TaskError> {
        Ok(self.lookup(name, task)?.clone_box())
    }

    /// Inserts `calculator` under `name`, returning the previous owner if the
    /// name was already registered.
    pub fn commit(
        &mut self,
        name: impl Into<String>,
        calculator: Box<dyn Calculator>,
    ) -> Option<Box<dyn Calculator>> {
        self.systems.insert(name.into(), calculator)
    }

    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Calculator>> {
        self.systems.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.systems.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.systems.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Calculator)> {
        self.systems
            .iter()
            .map(|(name, calculator)| (name.as_str(), calculator.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

impl IntoIterator for SystemsMap {
    type Item = (String, Box<dyn Calculator>);
    type IntoIter = btree_map::IntoIter<String, Box<dyn Calculator>>;

    fn into_iter(self) -> Self::IntoIter {
        self.systems.into_iter()
    }
}

fn missing(name: &str, task: &str) -> TaskError {
    TaskError::MissingSystem {
        name: name.to_string(),
        task: task.to_string(),
    }
}
