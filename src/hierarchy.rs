//! The in-memory task hierarchy.
//!
//! `TaskList` owns the top-level tasks; each task owns its subtasks. Views
//! address entities by their position in the flattened pre-order sequence, so
//! `flatten` and `resolve_by_flat_index` are both built on `TaskList::walk` and
//! cannot disagree about ordering.

use std::fmt;
use std::ops::ControlFlow;

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::debug;

use crate::fields::Kind;
use crate::task::{RowStyle, Task, TaskId};

/// Root of the hierarchy: the ordered top-level tasks plus the id allocator.
#[derive(Debug, Default)]
pub struct TaskList {
    tasks: Vec<Task>,
    last_id: u64,
}

/// One row of the flattened view.
#[derive(Debug, Clone, Copy)]
pub struct FlatEntry<'a> {
    pub index: usize,
    pub depth: usize,
    pub task: &'a Task,
}

impl FlatEntry<'_> {
    pub fn render(&self, style: &RowStyle) -> String {
        self.task.render(self.depth, style)
    }

    /// Owned, serialisable copy of this row.
    pub fn to_row(&self, style: &RowStyle) -> FlatRow {
        FlatRow {
            index: self.index,
            depth: self.depth,
            kind: self.task.kind,
            description: self.task.description.clone(),
            created_at: self.task.created_at,
            label: self.render(style),
        }
    }
}

impl fmt::Display for FlatEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&RowStyle::default()))
    }
}

/// Serialisable snapshot of a flattened row, used for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct FlatRow {
    pub index: usize,
    pub depth: usize,
    pub kind: Kind,
    pub description: String,
    pub created_at: DateTime<Local>,
    pub label: String,
}

impl TaskList {
    pub fn new() -> Self {
        TaskList::default()
    }

    fn next_id(&mut self) -> TaskId {
        self.last_id += 1;
        TaskId(self.last_id)
    }

    /// Append a new top-level task stamped with the current time.
    pub fn create_task(&mut self, description: &str) -> &Task {
        self.create_task_at(description, Local::now())
    }

    /// Append a new top-level task with an explicit creation time.
    pub fn create_task_at(&mut self, description: &str, created_at: DateTime<Local>) -> &Task {
        let id = self.next_id();
        debug!(%id, description, "create task");
        self.tasks.push(Task::new(id, description, created_at));
        &self.tasks[self.tasks.len() - 1]
    }

    /// Attach a new subtask to `parent`, stamped with the current time.
    ///
    /// Returns `None` and leaves the model untouched when `parent` no longer
    /// exists. Any entity may be a parent, including a subtask.
    pub fn add_subtask(&mut self, parent: TaskId, description: &str) -> Option<&Task> {
        self.add_subtask_at(parent, description, Local::now())
    }

    pub fn add_subtask_at(
        &mut self,
        parent: TaskId,
        description: &str,
        created_at: DateTime<Local>,
    ) -> Option<&Task> {
        if self.get(parent).is_none() {
            debug!(%parent, "add subtask ignored, parent not found");
            return None;
        }
        let id = self.next_id();
        let owner = find_mut(&mut self.tasks, parent)?;
        debug!(%id, %parent, description, "add subtask");
        Some(owner.push_child(Task::new_subtask(id, parent, description, created_at)))
    }

    /// Excise an entity (and its subtree) from whichever sequence owns it.
    ///
    /// Removing something that is already gone is a no-op returning `None`.
    pub fn remove(&mut self, id: TaskId) -> Option<Task> {
        let Some(parent) = self.get(id).map(|t| t.parent) else {
            debug!(%id, "remove ignored, task not found");
            return None;
        };
        let removed = match parent {
            Some(parent) => find_mut(&mut self.tasks, parent)?.remove_subtask(id),
            None => {
                let pos = self.tasks.iter().position(|t| t.id == id)?;
                Some(self.tasks.remove(pos))
            }
        };
        if let Some(task) = &removed {
            debug!(%id, subtasks = task.children.len(), "removed task");
        }
        removed
    }

    /// Drop every task and, with them, every subtask.
    pub fn clear_all(&mut self) {
        debug!(count = self.tasks.len(), "clear all tasks");
        self.tasks.clear();
    }

    /// Pre-order traversal shared by every position-based query.
    ///
    /// The visitor sees each task with its depth and can stop the walk early by
    /// returning `ControlFlow::Break`.
    pub fn walk<'a, B>(
        &'a self,
        mut visit: impl FnMut(&'a Task, usize) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        fn go<'a, B>(
            tasks: &'a [Task],
            depth: usize,
            visit: &mut impl FnMut(&'a Task, usize) -> ControlFlow<B>,
        ) -> ControlFlow<B> {
            for task in tasks {
                visit(task, depth)?;
                go(&task.children, depth + 1, visit)?;
            }
            ControlFlow::Continue(())
        }
        go(&self.tasks, 0, &mut visit)
    }

    /// Fresh pre-order sequence of every entity with its depth.
    pub fn flatten(&self) -> Vec<FlatEntry<'_>> {
        let mut entries = Vec::new();
        let _ = self.walk(|task, depth| {
            let index = entries.len();
            entries.push(FlatEntry { index, depth, task });
            ControlFlow::<()>::Continue(())
        });
        entries
    }

    /// Render the flattened view into display strings.
    pub fn render(&self, style: &RowStyle) -> Vec<String> {
        self.flatten().iter().map(|e| e.render(style)).collect()
    }

    /// The entity at a zero-based flattened position, if any.
    pub fn resolve_by_flat_index(&self, index: usize) -> Option<&Task> {
        let mut position = 0usize;
        let found = self.walk(|task, _| {
            if position == index {
                return ControlFlow::Break(task);
            }
            position += 1;
            ControlFlow::Continue(())
        });
        match found {
            ControlFlow::Break(task) => Some(task),
            ControlFlow::Continue(()) => None,
        }
    }

    /// Like `resolve_by_flat_index`, but negative positions resolve to nothing.
    pub fn resolve_signed(&self, index: i64) -> Option<&Task> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.resolve_by_flat_index(i))
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        find(&self.tasks, id)
    }

    /// Number of parent links between `id` and the top level.
    pub fn depth(&self, id: TaskId) -> Option<usize> {
        let mut depth = 0;
        let mut current = self.get(id)?.parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.get(parent)?.parent;
        }
        Some(depth)
    }

    /// Top-level tasks in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn top_level_len(&self) -> usize {
        self.tasks.len()
    }

    /// Number of rows in the flattened view.
    pub fn len(&self) -> usize {
        let mut count = 0;
        let _ = self.walk(|_, _| {
            count += 1;
            ControlFlow::<()>::Continue(())
        });
        count
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

fn find(tasks: &[Task], id: TaskId) -> Option<&Task> {
    for task in tasks {
        if task.id == id {
            return Some(task);
        }
        if let Some(found) = find(&task.children, id) {
            return Some(found);
        }
    }
    None
}

fn find_mut(tasks: &mut [Task], id: TaskId) -> Option<&mut Task> {
    for task in tasks.iter_mut() {
        if task.id == id {
            return Some(task);
        }
        if let Some(found) = find_mut(&mut task.children, id) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn shape(list: &TaskList) -> Vec<(String, usize)> {
        list.flatten()
            .iter()
            .map(|e| (format!("{}{}", e.task.kind.marker(), e.task.description), e.depth))
            .collect()
    }

    /// Build a list from (top-level description, subtask descriptions) pairs.
    fn build(layout: &[(&str, &[&str])]) -> TaskList {
        let mut list = TaskList::new();
        for (task, subs) in layout {
            let id = list.create_task_at(task, noon()).id;
            for sub in *subs {
                list.add_subtask_at(id, sub, noon()).unwrap();
            }
        }
        list
    }

    #[test]
    fn single_task_flattens_to_one_row() {
        let mut list = TaskList::new();
        list.create_task("Buy milk");
        assert_eq!(shape(&list), vec![("Buy milk".to_string(), 0)]);
    }

    #[test]
    fn subtask_follows_its_parent() {
        let mut list = TaskList::new();
        let id = list.create_task("Buy milk").id;
        let sub = list.add_subtask(id, "2% milk").unwrap();
        assert_eq!(sub.parent, Some(id));
        assert!(sub.is_subtask());

        assert_eq!(
            shape(&list),
            vec![
                ("Buy milk".to_string(), 0),
                ("[Subtask] 2% milk".to_string(), 1),
            ]
        );
    }

    #[test]
    fn resolve_walks_past_subtasks() {
        let list = build(&[("A", &["A.1"]), ("B", &[])]);
        assert_eq!(
            shape(&list),
            vec![
                ("A".to_string(), 0),
                ("[Subtask] A.1".to_string(), 1),
                ("B".to_string(), 0),
            ]
        );
        assert_eq!(list.resolve_by_flat_index(2).unwrap().description, "B");
        assert_eq!(list.resolve_by_flat_index(1).unwrap().description, "A.1");
    }

    #[test]
    fn removing_a_task_drops_its_subtasks() {
        let mut list = build(&[("A", &["A.1"]), ("B", &[])]);
        let a = list.resolve_by_flat_index(0).unwrap().id;
        let sub = list.resolve_by_flat_index(1).unwrap().id;

        let removed = list.remove(a).unwrap();
        assert_eq!(removed.children.len(), 1);
        assert_eq!(shape(&list), vec![("B".to_string(), 0)]);
        assert!(list.get(sub).is_none());
    }

    #[test]
    fn clear_all_empties_the_view() {
        let mut list = build(&[("A", &["A.1", "A.2"]), ("B", &["B.1"])]);
        list.clear_all();
        assert!(list.flatten().is_empty());
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn removing_a_subtask_keeps_siblings_in_order() {
        let mut list = build(&[("A", &["A.1", "A.2", "A.3"])]);
        let middle = list.resolve_by_flat_index(2).unwrap().id;
        list.remove(middle).unwrap();
        assert_eq!(
            shape(&list),
            vec![
                ("A".to_string(), 0),
                ("[Subtask] A.1".to_string(), 1),
                ("[Subtask] A.3".to_string(), 1),
            ]
        );
    }

    #[test]
    fn second_remove_is_a_silent_no_op() {
        let mut list = build(&[("A", &["A.1"]), ("B", &[])]);
        let sub = list.resolve_by_flat_index(1).unwrap().id;

        assert!(list.remove(sub).is_some());
        let before = shape(&list);
        assert!(list.remove(sub).is_none());
        assert_eq!(shape(&list), before);
    }

    #[test]
    fn stale_parent_handle_adds_nothing() {
        let mut list = build(&[("A", &[])]);
        let a = list.resolve_by_flat_index(0).unwrap().id;
        list.remove(a);
        assert!(list.add_subtask(a, "orphan").is_none());
        assert!(list.flatten().is_empty());
    }

    #[test]
    fn out_of_range_indices_resolve_to_none() {
        let list = build(&[("A", &["A.1"]), ("B", &[])]);
        assert!(list.resolve_by_flat_index(3).is_none());
        assert!(list.resolve_by_flat_index(usize::MAX).is_none());
        assert!(list.resolve_signed(-1).is_none());
        assert_eq!(list.resolve_signed(0).unwrap().description, "A");
        assert!(TaskList::new().resolve_by_flat_index(0).is_none());
    }

    #[test]
    fn resolve_agrees_with_flatten_for_every_index() {
        let shapes: [&[(&str, &[&str])]; 4] = [
            &[],
            &[("A", &[])],
            &[("A", &["A.1", "A.2"]), ("B", &[]), ("C", &["C.1"])],
            &[("A", &[]), ("B", &["B.1", "B.2", "B.3"]), ("C", &[]), ("D", &["D.1"])],
        ];
        for layout in shapes {
            let list = build(layout);
            let flat = list.flatten();
            assert_eq!(flat.len(), list.len());
            for entry in &flat {
                let resolved = list.resolve_by_flat_index(entry.index).unwrap();
                assert_eq!(resolved.id, entry.task.id);
            }
            assert!(list.resolve_by_flat_index(flat.len()).is_none());
        }
    }

    #[test]
    fn flatten_is_pre_order() {
        let list = build(&[("A", &["A.1", "A.2"]), ("B", &[]), ("C", &["C.1"])]);
        let flat = list.flatten();

        // every subtask sits after its parent and before the next top-level task
        let mut current_top = None;
        for entry in &flat {
            match entry.task.parent {
                None => current_top = Some(entry.task.id),
                Some(parent) => assert_eq!(Some(parent), current_top),
            }
        }
        let order: Vec<&str> = flat.iter().map(|e| e.task.description.as_str()).collect();
        assert_eq!(order, vec!["A", "A.1", "A.2", "B", "C", "C.1"]);
    }

    #[test]
    fn depth_by_parent_links_matches_traversal_depth() {
        let mut list = build(&[("A", &["A.1"]), ("B", &["B.1"])]);
        let nested_parent = list.resolve_by_flat_index(1).unwrap().id;
        list.add_subtask_at(nested_parent, "A.1.a", noon()).unwrap();

        for entry in list.flatten() {
            assert_eq!(list.depth(entry.task.id), Some(entry.depth));
        }
        assert_eq!(list.resolve_by_flat_index(2).unwrap().description, "A.1.a");
        assert_eq!(list.depth(list.resolve_by_flat_index(2).unwrap().id), Some(2));
    }

    #[test]
    fn rendered_rows_use_indent_and_marker() {
        let list = build(&[("Buy milk", &["2% milk"])]);
        assert_eq!(
            list.render(&RowStyle::default()),
            vec![
                "Buy milk (Added on 2024-05-01 12:00)".to_string(),
                "    [Subtask] 2% milk (Added on 2024-05-01 12:00)".to_string(),
            ]
        );
        assert_eq!(
            list.flatten()[1].to_string(),
            "    [Subtask] 2% milk (Added on 2024-05-01 12:00)"
        );
    }

    #[test]
    fn ids_are_not_reused_after_clear() {
        let mut list = build(&[("A", &[])]);
        let old = list.resolve_by_flat_index(0).unwrap().id;
        list.clear_all();
        let new = list.create_task("B").id;
        assert_ne!(old, new);
        assert!(list.remove(old).is_none());
        assert_eq!(list.top_level_len(), 1);
    }

    #[test]
    fn json_row_carries_kind_and_label() {
        let list = build(&[("A", &["A.1"])]);
        let row = list.flatten()[1].to_row(&RowStyle::default());
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["kind"], "subtask");
        assert_eq!(value["depth"], 1);
        assert_eq!(value["index"], 1);
        assert_eq!(value["description"], "A.1");
        assert_eq!(value["label"], "    [Subtask] A.1 (Added on 2024-05-01 12:00)");
    }
}
