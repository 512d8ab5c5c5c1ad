//! Undo/redo journal: a linear, bounded history of edit actions, grouped so
//! that a batch of edits undoes and redoes atomically, with coalescing of
//! adjacent same-kind edits so that ordinary typing doesn't produce one
//! history entry per keystroke.

pub const DEFAULT_GROUP_LIMIT: usize = 200;
pub const MERGE_WINDOW_NANOS: u64 = 1_000_000_000;

pub type GroupId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Insert,
    Delete,
}

/// One captured edit. `captured_text` holds what must be replayed to undo
/// it: the inserted text for an `Insert`, the deleted text for a `Delete`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    pub start: usize,
    pub end: usize,
    pub captured_text: String,
    pub group_id: GroupId,
    pub timestamp: u64,
}

/// A single undo/redo step to replay against the engine. Produced by
/// `Journal::undo`/`Journal::redo`; the journal has no access to the
/// buffers or the index, so it hands the steps back for the engine to
/// apply through its own (uncaptured) mutation primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Insert { start: usize, text: String },
    Delete { start: usize, end: usize },
}

#[derive(Debug, Clone)]
struct Group {
    id: GroupId,
    actions: Vec<Action>,
}

/// The plan returned by `undo`/`redo`: the steps to apply, in replay order,
/// and the caret position the caller should report to a `JournalListener`.
#[derive(Debug, Clone)]
pub struct Plan {
    pub steps: Vec<Step>,
    pub caret: usize,
}

/// Linear, group-bounded undo/redo history.
pub struct Journal {
    groups: Vec<Group>,
    /// Number of groups currently applied; divides applied history (left)
    /// from rolled-back, redoable history (right).
    cursor: usize,
    next_group_id: GroupId,
    /// Set while a batch-edit bracket is open; freezes the group id so
    /// every capture inside the bracket shares one group.
    frozen_group: Option<GroupId>,
    group_limit: Option<usize>,
}

impl Journal {
    pub fn new() -> Self {
        Self {
            groups: Vec::new(),
            cursor: 0,
            next_group_id: 0,
            frozen_group: None,
            group_limit: Some(DEFAULT_GROUP_LIMIT),
        }
    }

    pub fn with_unlimited_history() -> Self {
        Self {
            group_limit: None,
            ..Self::new()
        }
    }

    pub fn set_unlimited(&mut self, unlimited: bool) {
        self.group_limit = if unlimited {
            None
        } else {
            Some(DEFAULT_GROUP_LIMIT)
        };
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.groups.len()
    }

    fn fresh_group_id(&mut self) -> GroupId {
        let id = self.next_group_id;
        self.next_group_id += 1;
        id
    }

    /// Open a batch-edit bracket: every capture until `end_batch` shares one
    /// group id, so the whole batch undoes/redoes as a single step.
    pub fn begin_batch(&mut self) -> GroupId {
        let id = self.fresh_group_id();
        self.frozen_group = Some(id);
        id
    }

    pub fn end_batch(&mut self) {
        self.frozen_group = None;
    }

    /// Record a new action, coalescing it into the previous one when the
    /// abuts-boundary predicate holds.
    pub fn capture(
        &mut self,
        kind: ActionKind,
        start: usize,
        end: usize,
        captured_text: String,
        timestamp: u64,
    ) {
        if self.cursor < self.groups.len() {
            self.groups.truncate(self.cursor);
        }

        if self.try_coalesce(kind, start, end, &captured_text, timestamp) {
            return;
        }

        let group_id = self.frozen_group.unwrap_or_else(|| self.fresh_group_id());
        let action = Action {
            kind,
            start,
            end,
            captured_text,
            group_id,
            timestamp,
        };

        match self.groups.last_mut() {
            Some(last) if last.id == group_id => last.actions.push(action),
            _ => {
                self.groups.push(Group {
                    id: group_id,
                    actions: vec![action],
                });
                self.cursor += 1;
            }
        }

        self.enforce_bound();
    }

    fn try_coalesce(
        &mut self,
        kind: ActionKind,
        start: usize,
        end: usize,
        text: &str,
        timestamp: u64,
    ) -> bool {
        let Some(last_group) = self.groups.last_mut() else {
            return false;
        };
        let in_same_bracket = match self.frozen_group {
            Some(g) => g == last_group.id,
            None => true,
        };
        if !in_same_bracket {
            return false;
        }
        let Some(last) = last_group.actions.last_mut() else {
            return false;
        };
        if last.kind != kind {
            return false;
        }
        if timestamp.saturating_sub(last.timestamp) > MERGE_WINDOW_NANOS {
            return false;
        }

        match kind {
            ActionKind::Insert if start == last.end => {
                last.end = end;
                last.captured_text.push_str(text);
                last.timestamp = timestamp;
                true
            }
            ActionKind::Delete if end == last.start => {
                last.start = start;
                last.captured_text = format!("{}{}", text, last.captured_text);
                last.timestamp = timestamp;
                true
            }
            ActionKind::Delete if start == last.start => {
                last.end = end;
                last.captured_text.push_str(text);
                last.timestamp = timestamp;
                true
            }
            _ => false,
        }
    }

    fn enforce_bound(&mut self) {
        let Some(limit) = self.group_limit else {
            return;
        };
        while self.groups.len() > limit {
            self.groups.remove(0);
            self.cursor = self.cursor.saturating_sub(1);
        }
    }

    /// Undo the most recently applied group, returning the steps to replay
    /// (in reverse-capture order) and the caret to report.
    pub fn undo(&mut self) -> Option<Plan> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        let group = &self.groups[self.cursor];
        let steps = group
            .actions
            .iter()
            .rev()
            .map(|action| match action.kind {
                ActionKind::Insert => Step::Delete {
                    start: action.start,
                    end: action.end,
                },
                ActionKind::Delete => Step::Insert {
                    start: action.start,
                    text: action.captured_text.clone(),
                },
            })
            .collect();
        let first = group.actions.first().expect("groups are never empty");
        let caret = match first.kind {
            ActionKind::Insert => first.start,
            ActionKind::Delete => first.end,
        };
        Some(Plan { steps, caret })
    }

    /// Redo the next rolled-back group, returning the steps to replay (in
    /// original capture order) and the caret to report.
    pub fn redo(&mut self) -> Option<Plan> {
        if self.cursor >= self.groups.len() {
            return None;
        }
        let group = &self.groups[self.cursor];
        let steps = group
            .actions
            .iter()
            .map(|action| match action.kind {
                ActionKind::Insert => Step::Insert {
                    start: action.start,
                    text: action.captured_text.clone(),
                },
                ActionKind::Delete => Step::Delete {
                    start: action.start,
                    end: action.end,
                },
            })
            .collect();
        let last = group.actions.last().expect("groups are never empty");
        let caret = match last.kind {
            ActionKind::Insert => last.end,
            ActionKind::Delete => last.start,
        };
        self.cursor += 1;
        Some(Plan { steps, caret })
    }

    pub fn clear(&mut self) {
        self.groups.clear();
        self.cursor = 0;
        self.frozen_group = None;
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}
