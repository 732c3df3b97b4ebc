use crate::error::AppError;
use crate::model::Task;
use time::OffsetDateTime;

/// Ordered collection of tasks. Stored order is insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskList {
    tasks: Vec<Task>,
}

/// A task in timeline order, tagged with its position in the stored list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineEntry<'a> {
    pub position: usize,
    pub task: &'a Task,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Returns a list with a new pending task at the end. Blank text yields
    /// an unchanged copy.
    pub fn with_task(&self, text: &str, now: OffsetDateTime) -> TaskList {
        let mut tasks = self.tasks.clone();
        if let Some(task) = Task::new(text, now) {
            tasks.push(task);
        }
        TaskList { tasks }
    }

    pub fn with_toggled(&self, index: usize, now: OffsetDateTime) -> Result<TaskList, AppError> {
        let current = self
            .tasks
            .get(index)
            .ok_or_else(|| AppError::invalid_index(index, self.tasks.len()))?;

        let mut tasks = self.tasks.clone();
        tasks[index] = current.toggled(now);
        Ok(TaskList { tasks })
    }

    /// Appends a task created at `now`. Returns `None` when `text` is blank,
    /// in which case the list is left as it was.
    pub fn append(&mut self, text: &str, now: OffsetDateTime) -> Option<&Task> {
        let before = self.tasks.len();
        let next = self.with_task(text, now);
        if next.len() == before {
            return None;
        }

        *self = next;
        tracing::debug!(position = before, "task appended");
        self.tasks.last()
    }

    pub fn toggle(&mut self, index: usize, now: OffsetDateTime) -> Result<&Task, AppError> {
        *self = self.with_toggled(index, now)?;
        let task = &self.tasks[index];
        tracing::debug!(position = index, done = task.is_done(), "task toggled");
        Ok(task)
    }

    /// Tasks sorted ascending by creation time. Ties keep insertion order.
    pub fn ordered_by_creation(&self) -> Vec<Task> {
        self.timeline()
            .into_iter()
            .map(|entry| entry.task.clone())
            .collect()
    }

    pub fn timeline(&self) -> Vec<TimelineEntry<'_>> {
        let mut entries: Vec<TimelineEntry<'_>> = self
            .tasks
            .iter()
            .enumerate()
            .map(|(position, task)| TimelineEntry { position, task })
            .collect();
        entries.sort_by_key(|entry| entry.task.created_at());
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::TaskList;
    use time::macros::datetime;
    use time::{Duration, OffsetDateTime};

    fn t0() -> OffsetDateTime {
        datetime!(2025-12-20 09:00 UTC)
    }

    fn texts(list: &TaskList) -> Vec<&str> {
        list.tasks().iter().map(|task| task.text()).collect()
    }

    fn assert_completion_invariant(list: &TaskList) {
        for task in list.tasks() {
            assert_eq!(task.is_done(), task.completed_at().is_some());
        }
    }

    #[test]
    fn append_grows_by_one_and_keeps_insertion_order() {
        let mut list = TaskList::new();
        let titles = ["alpha", "bravo", "charlie", "delta", "echo"];

        for (offset, title) in titles.iter().enumerate() {
            let before = list.len();
            let added = list.append(title, t0() + Duration::minutes(offset as i64));
            assert!(added.is_some());
            assert_eq!(list.len(), before + 1);
        }

        assert_eq!(texts(&list), titles.to_vec());
    }

    #[test]
    fn append_ignores_blank_text() {
        let mut list = TaskList::new();
        list.append("keep", t0());
        let snapshot = list.clone();

        assert!(list.append("", t0()).is_none());
        assert!(list.append("   ", t0()).is_none());
        assert_eq!(list, snapshot);
    }

    #[test]
    fn append_creates_pending_task_stamped_now() {
        let mut list = TaskList::new();
        let task = list.append("demo", t0()).unwrap().clone();

        assert!(!task.is_done());
        assert_eq!(task.created_at(), t0());
        assert_eq!(task.completed_at(), None);
    }

    #[test]
    fn toggle_rejects_out_of_range_index() {
        let mut list = TaskList::new();
        list.append("only", t0());
        let snapshot = list.clone();

        let err = list.toggle(1, t0()).unwrap_err();
        assert_eq!(err.code(), "invalid_index");
        assert_eq!(list, snapshot);

        let err = TaskList::new().toggle(0, t0()).unwrap_err();
        assert_eq!(err.code(), "invalid_index");
    }

    #[test]
    fn toggle_twice_restores_pending_state() {
        let mut list = TaskList::new();
        list.append("demo", t0());
        let original = list.clone();

        list.toggle(0, t0() + Duration::hours(1)).unwrap();
        assert_completion_invariant(&list);
        list.toggle(0, t0() + Duration::hours(2)).unwrap();
        assert_completion_invariant(&list);

        assert_eq!(list, original);
        assert_eq!(list.get(0).unwrap().completed_at(), None);
    }

    #[test]
    fn completion_invariant_holds_across_toggle_sequence() {
        let mut list = TaskList::new();
        for (offset, title) in ["a", "b", "c"].iter().enumerate() {
            list.append(title, t0() + Duration::seconds(offset as i64));
        }

        let sequence = [0, 2, 0, 1, 2, 2, 1, 0];
        for (step, index) in sequence.iter().enumerate() {
            list.toggle(*index, t0() + Duration::minutes(step as i64))
                .unwrap();
            assert_completion_invariant(&list);
        }
    }

    #[test]
    fn with_toggled_leaves_source_untouched() {
        let list = TaskList::new().with_task("demo", t0());
        let toggled = list.with_toggled(0, t0() + Duration::hours(1)).unwrap();

        assert!(!list.get(0).unwrap().is_done());
        assert!(toggled.get(0).unwrap().is_done());
    }

    #[test]
    fn ordered_by_creation_sorts_without_mutating() {
        let mut list = TaskList::new();
        list.append("late", t0() + Duration::hours(3));
        list.append("early", t0());
        list.append("middle", t0() + Duration::hours(1));
        list.append("early twin", t0());

        let ordered = list.ordered_by_creation();
        let ordered_texts: Vec<&str> = ordered.iter().map(|task| task.text()).collect();

        assert_eq!(ordered_texts, ["early", "early twin", "middle", "late"]);
        assert!(
            ordered
                .windows(2)
                .all(|pair| pair[0].created_at() <= pair[1].created_at())
        );
        assert_eq!(texts(&list), ["late", "early", "middle", "early twin"]);

        let mut source_sorted: Vec<&str> = texts(&list);
        let mut ordered_sorted = ordered_texts.clone();
        source_sorted.sort_unstable();
        ordered_sorted.sort_unstable();
        assert_eq!(source_sorted, ordered_sorted);
    }

    #[test]
    fn timeline_entries_point_back_to_stored_positions() {
        let mut list = TaskList::new();
        list.append("second", t0() + Duration::minutes(5));
        list.append("first", t0());

        let timeline = list.timeline();
        assert_eq!(timeline[0].position, 1);
        assert_eq!(timeline[0].task.text(), "first");
        assert_eq!(timeline[1].position, 0);

        let position = timeline[0].position;
        list.toggle(position, t0() + Duration::minutes(10)).unwrap();
        assert!(list.get(1).unwrap().is_done());
        assert!(!list.get(0).unwrap().is_done());
    }

    #[test]
    fn buy_milk_call_mom_scenario() {
        let t1 = t0() + Duration::minutes(1);
        let t2 = t0() + Duration::minutes(2);
        let mut list = TaskList::new();
        list.append("Buy milk", t0());
        list.append("Call mom", t1);

        assert_eq!(texts(&list), ["Buy milk", "Call mom"]);
        let timeline: Vec<String> = list
            .ordered_by_creation()
            .iter()
            .map(|task| task.text().to_string())
            .collect();
        assert_eq!(timeline, ["Buy milk", "Call mom"]);

        let untouched = list.get(1).unwrap().clone();
        list.toggle(0, t2).unwrap();

        let first = list.get(0).unwrap();
        assert!(first.is_done());
        assert_eq!(first.completed_at(), Some(t2));
        assert_eq!(list.get(1).unwrap(), &untouched);
    }
}
