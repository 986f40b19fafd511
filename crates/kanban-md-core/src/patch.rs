use crate::model::{normalize_description, normalize_title, Priority, Step, Task, Workload};

/// Change to an optional field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPatch<T> {
    /// Overwrite with a new value.
    Set(T),
    /// Remove the value.
    Clear,
}

impl<T> FieldPatch<T> {
    fn apply_to(self, slot: &mut Option<T>) {
        *slot = match self {
            Self::Set(value) => Some(value),
            Self::Clear => None,
        };
    }
}

/// Complete set of editable task fields, used when creating or replacing a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    /// Task title, folded onto one line; a blank one keeps the existing title.
    pub title: String,
    /// Description body; trimmed and dropped when blank.
    pub description: Option<String>,
    /// Tags in order.
    pub tags: Vec<String>,
    /// Priority.
    pub priority: Option<Priority>,
    /// Workload estimate.
    pub workload: Option<Workload>,
    /// Free-form due date.
    pub due_date: Option<String>,
    /// Explicit expansion preference.
    pub default_expanded: Option<bool>,
    /// Checklist.
    pub steps: Option<Vec<Step>>,
}

impl TaskDraft {
    /// Draft with only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Overwrite every field of `task` except its id.
    ///
    /// A blank title keeps the current one.
    pub(crate) fn write_into(self, task: &mut Task) {
        let Self {
            title,
            description,
            tags,
            priority,
            workload,
            due_date,
            default_expanded,
            steps,
        } = self;

        if let Some(title) = normalize_title(&title) {
            task.title = title;
        }
        task.description = description.as_deref().and_then(normalize_description);
        task.tags = tags;
        task.priority = priority;
        task.workload = workload;
        task.due_date = due_date;
        task.default_expanded = default_expanded;
        task.steps = steps;
    }
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// New title; a blank one is ignored.
    pub title: Option<String>,
    /// Description change.
    pub description: Option<FieldPatch<String>>,
    /// Replacement tag list.
    pub tags: Option<Vec<String>>,
    /// Priority change.
    pub priority: Option<FieldPatch<Priority>>,
    /// Workload change.
    pub workload: Option<FieldPatch<Workload>>,
    /// Due date change.
    pub due_date: Option<FieldPatch<String>>,
    /// Expansion preference change.
    pub default_expanded: Option<FieldPatch<bool>>,
    /// Checklist change.
    pub steps: Option<FieldPatch<Vec<Step>>>,
}

impl TaskPatch {
    /// Returns true when applying the patch would not touch any field.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.priority.is_none()
            && self.workload.is_none()
            && self.due_date.is_none()
            && self.default_expanded.is_none()
            && self.steps.is_none()
    }

    pub(crate) fn apply_to(self, task: &mut Task) {
        if let Some(title) = self.title.as_deref().and_then(normalize_title) {
            task.title = title;
        }
        match self.description {
            Some(FieldPatch::Set(text)) => task.set_description(&text),
            Some(FieldPatch::Clear) => task.description = None,
            None => {}
        }
        if let Some(tags) = self.tags {
            task.tags = tags;
        }
        if let Some(patch) = self.priority {
            patch.apply_to(&mut task.priority);
        }
        if let Some(patch) = self.workload {
            patch.apply_to(&mut task.workload);
        }
        if let Some(patch) = self.due_date {
            patch.apply_to(&mut task.due_date);
        }
        if let Some(patch) = self.default_expanded {
            patch.apply_to(&mut task.default_expanded);
        }
        if let Some(patch) = self.steps {
            patch.apply_to(&mut task.steps);
        }
    }
}
