//! Flat storage for review comment threads.
//!
//! The backend ships comments pre-nested (each top-level comment carries its
//! `replies`). Rendering and counting want the opposite shape: a flat map
//! keyed by id plus a derived parent-to-children index, so thread membership
//! is data rather than object nesting. [`CommentStore`] does that conversion
//! on ingest and keeps server order throughout — the backend decides sort
//! order, the client never re-sorts.
//!
//! A store is rebuilt wholesale from each fetch. There is no local splicing
//! after a create: the caller re-fetches and replaces the store, so what is
//! shown is always what the server returned.

use std::collections::HashMap;

use crate::types::Comment;

/// Where a comment is anchored, derived from which location fields are set.
///
/// A line number without a file path does not name a line of anything, so it
/// falls back to `General` rather than inventing a `Line` scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommentScope {
    /// Whole-submission comment: no file, no line.
    General,
    /// Anchored to a file as a whole.
    File(String),
    /// Anchored to one 1-indexed line of one file.
    Line(String, u32),
}

impl CommentScope {
    /// Derives the scope of a single comment.
    pub fn of(comment: &Comment) -> CommentScope {
        match (&comment.file_path, comment.line_number) {
            (Some(path), Some(line)) => CommentScope::Line(path.clone(), line),
            (Some(path), None) => CommentScope::File(path.clone()),
            _ => CommentScope::General,
        }
    }

    /// The file this scope is anchored to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            CommentScope::General => None,
            CommentScope::File(path) | CommentScope::Line(path, _) => Some(path),
        }
    }
}

/// Flat comment storage: every comment findable by id, thread structure held
/// as an id index, top-level order exactly as the server sent it.
#[derive(Debug, Default)]
pub struct CommentStore {
    by_id: HashMap<String, Comment>,
    top_level: Vec<String>,
    children: HashMap<String, Vec<String>>,
}

impl CommentStore {
    /// Builds a store from one fetched comment list.
    ///
    /// Accepts both shapes the backend can produce: replies pre-nested under
    /// their parents, or replies delivered in the outer list with only
    /// `parent_comment_id` set, in any order. Everything is indexed by id
    /// first and threaded second, so a reply arriving before its parent still
    /// files under it. Replies deeper than one level are hoisted to hang off
    /// the thread root, keeping the one-level invariant.
    pub fn new(list: Vec<Comment>) -> Self {
        let mut store = Self::default();

        let mut flat: Vec<Comment> = Vec::new();
        let mut queue: std::collections::VecDeque<Comment> = list.into();
        while let Some(mut comment) = queue.pop_front() {
            // Pull nested replies out; they re-enter the queue flat, tagged
            // with their parent id in case the backend omitted it.
            for mut reply in std::mem::take(&mut comment.replies) {
                if reply.parent_comment_id.is_none() {
                    reply.parent_comment_id = Some(comment.id.clone());
                }
                queue.push_back(reply);
            }
            flat.push(comment);
        }

        for comment in &flat {
            store.by_id.insert(comment.id.clone(), comment.clone());
        }
        for comment in &flat {
            match &comment.parent_comment_id {
                Some(parent) if store.by_id.contains_key(parent) => {
                    let root = store.thread_root(parent);
                    store.children.entry(root).or_default().push(comment.id.clone());
                }
                _ => store.top_level.push(comment.id.clone()),
            }
        }
        store
    }

    /// Resolves the top-level ancestor of `id` (one hop at most in valid
    /// data, but tolerant of deeper chains). The hop count is bounded by the
    /// store size, so a malformed parent cycle terminates at an arbitrary
    /// member instead of looping.
    fn thread_root(&self, id: &str) -> String {
        let mut current = id.to_owned();
        for _ in 0..self.by_id.len() {
            match self.by_id.get(&current).and_then(|c| c.parent_comment_id.clone()) {
                Some(parent) if parent != current && self.by_id.contains_key(&parent) => {
                    current = parent;
                }
                _ => break,
            }
        }
        current
    }

    /// Total number of comments held, replies included.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Comment> {
        self.by_id.get(id)
    }

    /// Top-level comments in server order.
    pub fn top_level(&self) -> impl Iterator<Item = &Comment> {
        self.top_level.iter().filter_map(|id| self.by_id.get(id))
    }

    /// Replies under one top-level comment, in server order.
    pub fn replies(&self, id: &str) -> impl Iterator<Item = &Comment> {
        self.children
            .get(id)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(|id| self.by_id.get(id))
    }

    /// Number of replies under one top-level comment.
    pub fn reply_count(&self, id: &str) -> usize {
        self.children.get(id).map(Vec::len).unwrap_or(0)
    }

    /// Top-level comments whose scope matches `scope`, in server order.
    /// Replies never match directly — they belong to their thread.
    pub fn scoped(&self, scope: &CommentScope) -> Vec<&Comment> {
        self.top_level().filter(|c| CommentScope::of(c) == *scope).collect()
    }

    /// Number of top-level comments in `scope`.
    pub fn scoped_count(&self, scope: &CommentScope) -> usize {
        self.top_level().filter(|c| CommentScope::of(c) == *scope).count()
    }

    /// Per-line count of top-level comments anchored to lines of `path`.
    /// This is what the renderer's gutter indicators show.
    pub fn line_counts(&self, path: &str) -> HashMap<u32, usize> {
        let mut counts = HashMap::new();
        for comment in self.top_level() {
            if let CommentScope::Line(p, line) = CommentScope::of(comment) {
                if p == path {
                    *counts.entry(line).or_insert(0) += 1;
                }
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crate::types::UserRef;

    fn comment(id: &str, path: Option<&str>, line: Option<u32>, parent: Option<&str>) -> Comment {
        Comment {
            id: id.to_owned(),
            submission_id: 42,
            content: format!("body of {id}"),
            file_path: path.map(str::to_owned),
            line_number: line,
            author: UserRef { id: 30, name: "Ravi".to_owned(), email: None },
            parent_comment_id: parent.map(str::to_owned),
            replies: Vec::new(),
            is_edited: false,
            created_at: Utc.with_ymd_and_hms(2025, 4, 1, 10, 30, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 4, 1, 10, 30, 0).unwrap(),
        }
    }

    #[test]
    fn ingest_loses_nothing_and_duplicates_nothing() {
        let mut top = comment("c1", Some("src/main.py"), Some(2), None);
        top.replies.push(comment("r1", Some("src/main.py"), Some(2), Some("c1")));
        top.replies.push(comment("r2", Some("src/main.py"), Some(2), None)); // parent id omitted
        let other = comment("c2", None, None, None);

        let store = CommentStore::new(vec![top, other]);

        assert_eq!(store.len(), 4);
        let tops: Vec<&str> = store.top_level().map(|c| c.id.as_str()).collect();
        assert_eq!(tops, ["c1", "c2"], "top-level order follows the server");
        let replies: Vec<&str> = store.replies("c1").map(|c| c.id.as_str()).collect();
        assert_eq!(replies, ["r1", "r2"], "reply order follows the server");
        assert_eq!(store.reply_count("c2"), 0);
    }

    #[test]
    fn flat_input_threads_by_parent_id() {
        let list = vec![
            comment("c1", None, None, None),
            comment("r1", None, None, Some("c1")),
        ];
        let store = CommentStore::new(list);
        assert_eq!(store.top_level().count(), 1);
        assert_eq!(store.reply_count("c1"), 1);
    }

    #[test]
    fn flat_input_threads_replies_listed_before_their_parent() {
        let list = vec![
            comment("r1", None, None, Some("c1")),
            comment("c1", None, None, None),
            comment("c2", None, None, None),
        ];
        let store = CommentStore::new(list);
        let tops: Vec<&str> = store.top_level().map(|c| c.id.as_str()).collect();
        assert_eq!(tops, ["c1", "c2"], "an early reply must not surface as top-level");
        let replies: Vec<&str> = store.replies("c1").map(|c| c.id.as_str()).collect();
        assert_eq!(replies, ["r1"]);
    }

    #[test]
    fn deep_nesting_is_hoisted_to_the_thread_root() {
        let mut reply = comment("r1", None, None, Some("c1"));
        reply.replies.push(comment("rr1", None, None, None));
        let mut top = comment("c1", None, None, None);
        top.replies.push(reply);

        let store = CommentStore::new(vec![top]);
        let replies: Vec<&str> = store.replies("c1").map(|c| c.id.as_str()).collect();
        assert_eq!(replies, ["r1", "rr1"], "reply-to-reply lands under the root");
    }

    #[test]
    fn scope_derivation_matches_field_presence() {
        let line = comment("a", Some("src/main.py"), Some(2), None);
        let file = comment("b", Some("src/main.py"), None, None);
        let general = comment("c", None, None, None);
        let dangling = comment("d", None, Some(9), None); // line without a file

        assert_eq!(CommentScope::of(&line), CommentScope::Line("src/main.py".into(), 2));
        assert_eq!(CommentScope::of(&file), CommentScope::File("src/main.py".into()));
        assert_eq!(CommentScope::of(&general), CommentScope::General);
        assert_eq!(CommentScope::of(&dangling), CommentScope::General);
    }

    #[test]
    fn line_counts_skip_replies_and_other_files() {
        let mut c1 = comment("c1", Some("src/main.py"), Some(2), None);
        c1.replies.push(comment("r1", Some("src/main.py"), Some(2), Some("c1")));
        let list = vec![
            c1,
            comment("c2", Some("src/main.py"), Some(2), None),
            comment("c3", Some("src/main.py"), Some(5), None),
            comment("c4", Some("src/other.py"), Some(2), None),
        ];
        let store = CommentStore::new(list);

        let counts = store.line_counts("src/main.py");
        assert_eq!(counts.get(&2), Some(&2), "replies do not count toward the gutter");
        assert_eq!(counts.get(&5), Some(&1));
        assert_eq!(counts.get(&9), None);
    }

    #[test]
    fn scoped_filters_top_level_by_scope() {
        let list = vec![
            comment("c1", Some("src/main.py"), Some(2), None),
            comment("c2", Some("src/main.py"), None, None),
            comment("c3", None, None, None),
        ];
        let store = CommentStore::new(list);

        let line = CommentScope::Line("src/main.py".into(), 2);
        assert_eq!(store.scoped(&line).len(), 1);
        assert_eq!(store.scoped_count(&CommentScope::File("src/main.py".into())), 1);
        assert_eq!(store.scoped_count(&CommentScope::General), 1);
        assert_eq!(store.scoped_count(&CommentScope::Line("src/main.py".into(), 3)), 0);
    }
}
