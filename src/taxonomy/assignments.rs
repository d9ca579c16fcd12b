//! Task-category assignments.
//!
//! A task may carry several assignments and at most one of them is primary.
//! Each operation runs in a single transaction so the primary count of a
//! task is 0 or 1 after every step. Category names are stored as given and
//! are not checked against any project.

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::TaskCategoryAssignment;
use crate::storage::events::EventType;
use crate::storage::sqlite::{
    clear_primary, delete_assignment_row, insert_assignment, mark_primary, select_assignment,
    select_assignments,
};
use crate::storage::SqliteStorage;
use crate::validate::normalize_name;

/// Add a category assignment to a task.
///
/// The first assignment of a task is always primary, whatever was asked.
/// A later assignment asked to be primary takes over from the current one.
///
/// # Errors
///
/// Returns `DuplicateAssignment` if the task already has the same
/// tier1/tier2 pair, or `InvalidArgument` for blank input.
pub fn add_assignment(
    storage: &mut SqliteStorage,
    task_id: &str,
    tier1: &str,
    tier2: Option<&str>,
    is_primary: Option<bool>,
    actor: &str,
) -> Result<TaskCategoryAssignment> {
    let task_id = task_id.trim();
    if task_id.is_empty() {
        return Err(Error::InvalidArgument("task id must not be empty".to_string()));
    }
    let tier1 = normalize_name(tier1)?;
    let tier2 = tier2
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(normalize_name)
        .transpose()?;

    storage.mutate("add_assignment", actor, |tx, ctx| {
        let existing = select_assignments(tx, task_id)?;

        if existing
            .iter()
            .any(|a| a.tier1_category == tier1 && a.tier2_category == tier2)
        {
            let label = match &tier2 {
                Some(t2) => format!("{tier1} / {t2}"),
                None => tier1.clone(),
            };
            return Err(Error::DuplicateAssignment {
                task_id: task_id.to_string(),
                label,
            });
        }

        let primary = existing.is_empty() || is_primary.unwrap_or(false);
        if primary && !existing.is_empty() {
            clear_primary(tx, task_id)?;
        }

        let assignment = TaskCategoryAssignment::new(task_id.to_string(), tier1, tier2, primary);
        insert_assignment(tx, &assignment)?;
        ctx.record_change(
            "task",
            task_id,
            EventType::AssignmentAdded,
            None,
            Some(assignment.label()),
        );
        debug!(task = task_id, id = %assignment.id, primary, "Added assignment");
        Ok(assignment)
    })
}

/// Make an assignment its task's primary, clearing every sibling.
///
/// # Errors
///
/// Returns `AssignmentNotFound` for an unknown id.
pub fn set_primary(
    storage: &mut SqliteStorage,
    assignment_id: &str,
    actor: &str,
) -> Result<TaskCategoryAssignment> {
    storage.mutate("set_primary", actor, |tx, ctx| {
        let mut target = select_assignment(tx, assignment_id)?.ok_or_else(|| {
            Error::AssignmentNotFound {
                id: assignment_id.to_string(),
            }
        })?;

        let previous = select_assignments(tx, &target.task_id)?
            .into_iter()
            .find(|a| a.is_primary)
            .map(|a| a.label());

        clear_primary(tx, &target.task_id)?;
        mark_primary(tx, assignment_id)?;
        target.is_primary = true;

        ctx.record_change(
            "task",
            &target.task_id,
            EventType::AssignmentPrimarySet,
            previous,
            Some(target.label()),
        );
        Ok(target)
    })
}

/// Delete an assignment.
///
/// Removing the primary leaves the task without one; no sibling is
/// promoted.
///
/// # Errors
///
/// Returns `AssignmentNotFound` for an unknown id.
pub fn remove_assignment(
    storage: &mut SqliteStorage,
    assignment_id: &str,
    actor: &str,
) -> Result<TaskCategoryAssignment> {
    storage.mutate("remove_assignment", actor, |tx, ctx| {
        let removed = select_assignment(tx, assignment_id)?.ok_or_else(|| {
            Error::AssignmentNotFound {
                id: assignment_id.to_string(),
            }
        })?;
        delete_assignment_row(tx, assignment_id)?;
        ctx.record_change(
            "task",
            &removed.task_id,
            EventType::AssignmentRemoved,
            Some(removed.label()),
            None,
        );
        if removed.is_primary {
            debug!(task = %removed.task_id, "Primary assignment removed, task has none now");
        }
        Ok(removed)
    })
}

/// A task's assignments in creation order.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_assignments(storage: &SqliteStorage, task_id: &str) -> Result<Vec<TaskCategoryAssignment>> {
    storage.list_assignments(task_id.trim())
}

/// The task's primary assignment, if it has one.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn primary_assignment(
    storage: &SqliteStorage,
    task_id: &str,
) -> Result<Option<TaskCategoryAssignment>> {
    Ok(list_assignments(storage, task_id)?
        .into_iter()
        .find(|a| a.is_primary))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primary_count(storage: &SqliteStorage, task: &str) -> usize {
        list_assignments(storage, task)
            .unwrap()
            .iter()
            .filter(|a| a.is_primary)
            .count()
    }

    #[test]
    fn test_first_assignment_is_forced_primary() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let first = add_assignment(&mut storage, "task_1", "Structural", None, Some(false), "test").unwrap();
        assert!(first.is_primary);

        let second = add_assignment(&mut storage, "task_1", "Systems", None, None, "test").unwrap();
        assert!(!second.is_primary);
        assert_eq!(primary_count(&storage, "task_1"), 1);
    }

    #[test]
    fn test_new_primary_demotes_old() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let first = add_assignment(&mut storage, "task_1", "Structural", None, None, "test").unwrap();
        let second = add_assignment(&mut storage, "task_1", "Systems", Some("Plumbing"), Some(true), "test").unwrap();

        assert!(second.is_primary);
        assert_eq!(primary_count(&storage, "task_1"), 1);
        let primary = primary_assignment(&storage, "task_1").unwrap().unwrap();
        assert_eq!(primary.id, second.id);
        assert!(!storage.get_assignment(&first.id).unwrap().unwrap().is_primary);
    }

    #[test]
    fn test_set_primary_clears_siblings() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        add_assignment(&mut storage, "task_1", "Structural", None, None, "test").unwrap();
        let b = add_assignment(&mut storage, "task_1", "Systems", None, None, "test").unwrap();
        let c = add_assignment(&mut storage, "task_1", "Finishes", None, None, "test").unwrap();

        set_primary(&mut storage, &b.id, "test").unwrap();
        set_primary(&mut storage, &c.id, "test").unwrap();
        // Setting the current primary again is a no-op
        set_primary(&mut storage, &c.id, "test").unwrap();

        assert_eq!(primary_count(&storage, "task_1"), 1);
        assert_eq!(primary_assignment(&storage, "task_1").unwrap().unwrap().id, c.id);
        assert!(matches!(
            set_primary(&mut storage, "asg_missing", "test"),
            Err(Error::AssignmentNotFound { .. })
        ));
    }

    #[test]
    fn test_removing_primary_promotes_nothing() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let a = add_assignment(&mut storage, "task_1", "Structural", None, None, "test").unwrap();
        add_assignment(&mut storage, "task_1", "Systems", None, None, "test").unwrap();

        let removed = remove_assignment(&mut storage, &a.id, "test").unwrap();
        assert!(removed.is_primary);
        assert_eq!(primary_count(&storage, "task_1"), 0);
        assert_eq!(list_assignments(&storage, "task_1").unwrap().len(), 1);
        assert!(primary_assignment(&storage, "task_1").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_pair_rejected() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        add_assignment(&mut storage, "task_1", "Systems", Some("Plumbing"), None, "test").unwrap();
        let dup = add_assignment(&mut storage, "task_1", " Systems ", Some("Plumbing"), None, "test");
        assert!(matches!(dup, Err(Error::DuplicateAssignment { .. })));

        // Same tier1 without tier2 is a different pair
        assert!(add_assignment(&mut storage, "task_1", "Systems", None, None, "test").is_ok());
        // Blank tier2 means none, so this one is a duplicate
        assert!(add_assignment(&mut storage, "task_1", "Systems", Some("  "), None, "test").is_err());
    }

    #[test]
    fn test_tasks_are_independent() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let a = add_assignment(&mut storage, "task_1", "Systems", None, None, "test").unwrap();
        let b = add_assignment(&mut storage, "task_2", "Systems", None, None, "test").unwrap();
        assert!(a.is_primary && b.is_primary);

        remove_assignment(&mut storage, &a.id, "test").unwrap();
        assert_eq!(primary_count(&storage, "task_2"), 1);
    }

    #[test]
    fn test_primary_invariant_over_mixed_sequence() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let names = ["Planning", "Site Work", "Structural", "Systems", "Finishes"];
        let mut ids = Vec::new();

        for (i, name) in names.iter().enumerate() {
            let a = add_assignment(&mut storage, "task_9", name, None, Some(i % 2 == 0), "test").unwrap();
            ids.push(a.id);
            assert!(primary_count(&storage, "task_9") <= 1);
        }
        for (i, id) in ids.iter().enumerate() {
            if i % 2 == 0 {
                remove_assignment(&mut storage, id, "test").unwrap();
            } else {
                set_primary(&mut storage, id, "test").unwrap();
            }
            assert!(primary_count(&storage, "task_9") <= 1);
        }
    }
}
