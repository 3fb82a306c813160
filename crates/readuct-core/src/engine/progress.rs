/// Pipeline-level progress events.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    ValidationStart { total_tasks: usize },
    ValidationFinish,

    TaskStart {
        name: String,
        index: usize,
        total: usize,
    },
    TaskFinish { name: String, success: bool },

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
