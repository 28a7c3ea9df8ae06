use super::task::Task;
use std::fmt;
use std::sync::Arc;

/// Predicate evaluated against the running task
pub type Predicate = Arc<dyn Fn(&Task) -> bool + Send + Sync>;

/// `if`/`unless` gate shared by callbacks and validations
#[derive(Clone, Default)]
pub struct Guard {
    when: Option<Predicate>,
    unless: Option<Predicate>,
}

impl Guard {
    pub fn always() -> Self {
        Self::default()
    }

    pub fn when(predicate: impl Fn(&Task) -> bool + Send + Sync + 'static) -> Self {
        Self::default().and_when(predicate)
    }

    pub fn unless(predicate: impl Fn(&Task) -> bool + Send + Sync + 'static) -> Self {
        Self::default().and_unless(predicate)
    }

    pub fn and_when(mut self, predicate: impl Fn(&Task) -> bool + Send + Sync + 'static) -> Self {
        self.when = Some(Arc::new(predicate));
        self
    }

    pub fn and_unless(mut self, predicate: impl Fn(&Task) -> bool + Send + Sync + 'static) -> Self {
        self.unless = Some(Arc::new(predicate));
        self
    }

    pub fn allows(&self, task: &Task) -> bool {
        self.when.as_ref().map_or(true, |when| when(task))
            && self.unless.as_ref().map_or(true, |unless| !unless(task))
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("when", &self.when.is_some())
            .field("unless", &self.unless.is_some())
            .finish()
    }
}
