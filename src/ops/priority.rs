use crate::model::task::{DayTask, Priority, PriorityFilter};

/// Anything that carries a priority and can be ordered or filtered by it.
pub trait Prioritized {
    fn priority(&self) -> Priority;
}

impl Prioritized for DayTask {
    fn priority(&self) -> Priority {
        self.priority
    }
}

impl<T: Prioritized + ?Sized> Prioritized for &T {
    fn priority(&self) -> Priority {
        (**self).priority()
    }
}

/// Order tasks by ascending priority. Equal priorities keep their input order.
pub fn sort_tasks<T: Prioritized>(tasks: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut sorted: Vec<T> = tasks.into_iter().collect();
    sorted.sort_by_key(|t| t.priority());
    sorted
}

/// Keep only the tasks the filter admits, in input order.
pub fn filter_tasks<T: Prioritized>(
    tasks: impl IntoIterator<Item = T>,
    filter: PriorityFilter,
) -> Vec<T> {
    match filter {
        PriorityFilter::OneToFour => tasks.into_iter().collect(),
        PriorityFilter::OneToTwo => tasks
            .into_iter()
            .filter(|t| t.priority() <= Priority::Two)
            .collect(),
    }
}
