//! Filtering, searching and sorting for the client task list.
//!
//! Pure view logic over borrowed tasks; nothing here mutates the
//! stored collection or its insertion order.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::task::Task;

// ── Status filter ────────────────────────────────────────────────────

/// Which completion states the view shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    fn keeps(self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => !task.completed,
            StatusFilter::Completed => task.completed,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "completed" => Ok(StatusFilter::Completed),
            other => Err(format!("unknown status filter: {other}")),
        }
    }
}

// ── Sort key ─────────────────────────────────────────────────────────

/// How the view is ordered. Ties keep their relative insertion order;
/// the sort underneath is stable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Newest first. The default view.
    #[default]
    DateDesc,
    /// Oldest first.
    DateAsc,
    /// High before medium before low.
    Priority,
    /// Assignee name, case-insensitive ascending.
    Assignee,
    /// Earliest deadline first; tasks without a deadline sink to the
    /// end regardless of direction.
    Deadline,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date-desc" => Ok(SortKey::DateDesc),
            "date-asc" => Ok(SortKey::DateAsc),
            "priority" => Ok(SortKey::Priority),
            "assignee" => Ok(SortKey::Assignee),
            "deadline" => Ok(SortKey::Deadline),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

fn compare(key: SortKey, a: &Task, b: &Task) -> Ordering {
    match key {
        SortKey::DateDesc => b.created_at.cmp(&a.created_at),
        SortKey::DateAsc => a.created_at.cmp(&b.created_at),
        SortKey::Priority => b.priority.cmp(&a.priority),
        SortKey::Assignee => a.assignee.to_lowercase().cmp(&b.assignee.to_lowercase()),
        SortKey::Deadline => match (a.deadline, b.deadline) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => x.cmp(&y),
        },
    }
}

// ── Search ───────────────────────────────────────────────────────────

/// Case-insensitive substring match over title, description, assignee
/// and category. `needle` must already be lowercased.
fn matches(task: &Task, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    [&task.title, &task.description, &task.assignee, &task.category]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

// ── Selection ────────────────────────────────────────────────────────

/// Produce the filtered, searched, sorted view as borrowed tasks. An
/// empty or all-whitespace search matches everything.
pub fn select<'a>(
    tasks: &'a [Task],
    filter: StatusFilter,
    search: &str,
    sort: SortKey,
) -> Vec<&'a Task> {
    let needle = search.trim().to_lowercase();
    let mut view: Vec<&Task> = tasks
        .iter()
        .filter(|t| filter.keeps(t))
        .filter(|t| matches(t, &needle))
        .collect();
    view.sort_by(|a, b| compare(sort, a, b));
    view
}
