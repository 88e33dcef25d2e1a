//! Arena-backed model of the submitted project's file tree.
//!
//! The backend ships the tree as nested `FileNode` values. For navigation the
//! client wants flat, indexable state: nodes live in a `Vec` arena, children
//! are index lists, and a path-keyed map gives O(1) lookup. Expansion is a
//! set of directory paths, not per-node flags, so collapsing a parent keeps
//! its descendants' expansion and re-expanding restores the subtree exactly.
//!
//! All traversal is an explicit worklist over indices. Nothing here recurses
//! over node values, so arbitrarily deep trees cannot blow the stack.

use std::collections::{HashMap, HashSet};

use crate::types::{FileNode, FileNodeKind, ProjectFileSystem};

/// One materialized node. `depth` is 0 for the synthetic root's children,
/// which are the rows shown at the left edge of the tree panel.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub path: String,
    pub kind: FileNodeKind,
    pub size: Option<u64>,
    pub depth: usize,
    children: Vec<usize>,
}

impl TreeNode {
    pub fn is_dir(&self) -> bool {
        self.kind == FileNodeKind::Directory
    }

    /// Directories with no children get no expand affordance in the UI.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// The whole tree: arena, path index, root list, and expansion state.
#[derive(Debug, Default)]
pub struct FileTree {
    nodes: Vec<TreeNode>,
    by_path: HashMap<String, usize>,
    roots: Vec<usize>,
    expanded: HashSet<String>,
}

impl FileTree {
    /// Flattens a fetched tree into the arena, preserving server order.
    ///
    /// The root directory itself is synthetic — it is indexed (its path seeds
    /// the expansion set) but never materialised as a row.
    pub fn from_file_system(fs: &ProjectFileSystem) -> Self {
        Self::from_root(&fs.root_directory)
    }

    pub fn from_root(root: &FileNode) -> Self {
        let mut tree = Self::default();
        tree.expanded.insert(root.path.clone());

        // (node, depth, parent arena index); pushed reversed so pops come
        // out in server order.
        let mut stack: Vec<(&FileNode, usize, Option<usize>)> = Vec::new();
        if let Some(children) = &root.children {
            for child in children.iter().rev() {
                stack.push((child, 0, None));
            }
        }
        while let Some((node, depth, parent)) = stack.pop() {
            let index = tree.nodes.len();
            tree.nodes.push(TreeNode {
                name: node.name.clone(),
                path: node.path.clone(),
                kind: node.kind,
                size: node.size,
                depth,
                children: Vec::new(),
            });
            tree.by_path.insert(node.path.clone(), index);
            match parent {
                Some(parent) => tree.nodes[parent].children.push(index),
                None => tree.roots.push(index),
            }
            if let Some(children) = &node.children {
                for child in children.iter().rev() {
                    stack.push((child, depth + 1, Some(index)));
                }
            }
        }
        tree
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> &TreeNode {
        &self.nodes[index]
    }

    pub fn index_of(&self, path: &str) -> Option<usize> {
        self.by_path.get(path).copied()
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        self.expanded.contains(path)
    }

    /// Toggles a directory open/closed; files are ignored. Returns the new
    /// expanded state of the node.
    pub fn toggle(&mut self, index: usize) -> bool {
        let node = &self.nodes[index];
        if !node.is_dir() {
            return false;
        }
        if self.expanded.contains(&node.path) {
            // Keep descendants' entries so re-expanding restores them.
            self.expanded.remove(&node.path);
            false
        } else {
            self.expanded.insert(node.path.clone());
            true
        }
    }

    /// Collapses a directory (no-op for files and already-closed dirs).
    pub fn collapse(&mut self, index: usize) {
        let node = &self.nodes[index];
        if node.is_dir() {
            self.expanded.remove(&node.path);
        }
    }

    /// Expands every ancestor directory of `path` so the node has a visible
    /// row. Returns the node's arena index, or `None` (tree untouched) for
    /// unknown paths.
    pub fn reveal(&mut self, path: &str) -> Option<usize> {
        let index = self.index_of(path)?;
        let mut prefix = path;
        while let Some((parent, _)) = prefix.rsplit_once('/') {
            if let Some(i) = self.index_of(parent) {
                if self.nodes[i].is_dir() {
                    self.expanded.insert(self.nodes[i].path.clone());
                }
            }
            prefix = parent;
        }
        Some(index)
    }

    /// Arena indices of the rows currently visible, depth-first in server
    /// order, honouring expansion state.
    pub fn visible_rows(&self) -> Vec<usize> {
        let mut rows = Vec::new();
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(index) = stack.pop() {
            rows.push(index);
            let node = &self.nodes[index];
            if node.is_dir() && self.expanded.contains(&node.path) {
                stack.extend(node.children.iter().rev());
            }
        }
        rows
    }
}

/// Human-readable size for tree rows and the code panel header.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else if b < KB * KB * KB {
        format!("{:.1} MB", b / (KB * KB))
    } else {
        format!("{:.1} GB", b / (KB * KB * KB))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, path: &str) -> FileNode {
        FileNode {
            name: name.to_owned(),
            path: path.to_owned(),
            kind: FileNodeKind::File,
            size: Some(100),
            last_modified: None,
            children: None,
        }
    }

    fn dir(name: &str, path: &str, children: Vec<FileNode>) -> FileNode {
        FileNode {
            name: name.to_owned(),
            path: path.to_owned(),
            kind: FileNodeKind::Directory,
            size: None,
            last_modified: None,
            children: Some(children),
        }
    }

    /// root/{src/{main.py, util.py}, docs/ (empty), README.md}
    fn sample() -> FileNode {
        dir(
            "widgets",
            "widgets",
            vec![
                dir(
                    "src",
                    "widgets/src",
                    vec![file("main.py", "widgets/src/main.py"), file("util.py", "widgets/src/util.py")],
                ),
                dir("docs", "widgets/docs", vec![]),
                file("README.md", "widgets/README.md"),
            ],
        )
    }

    fn names(tree: &FileTree, rows: &[usize]) -> Vec<String> {
        rows.iter().map(|&i| tree.node(i).name.clone()).collect()
    }

    #[test]
    fn builds_arena_in_server_order() {
        let tree = FileTree::from_root(&sample());
        assert_eq!(tree.len(), 5, "root itself is not a row");
        let rows = tree.visible_rows();
        assert_eq!(names(&tree, &rows), ["src", "docs", "README.md"], "collapsed by default");
        assert_eq!(tree.node(rows[0]).depth, 0);
    }

    #[test]
    fn expansion_reveals_children_in_place() {
        let mut tree = FileTree::from_root(&sample());
        let src = tree.index_of("widgets/src").unwrap();
        assert!(tree.toggle(src));
        let rows = tree.visible_rows();
        assert_eq!(names(&tree, &rows), ["src", "main.py", "util.py", "docs", "README.md"]);
        assert_eq!(tree.node(rows[1]).depth, 1);
    }

    #[test]
    fn collapse_preserves_descendant_expansion() {
        let root = dir(
            "r",
            "r",
            vec![dir("a", "r/a", vec![dir("b", "r/a/b", vec![file("x", "r/a/b/x")])])],
        );
        let mut tree = FileTree::from_root(&root);
        let a = tree.index_of("r/a").unwrap();
        let b = tree.index_of("r/a/b").unwrap();
        tree.toggle(a);
        tree.toggle(b);
        assert_eq!(tree.visible_rows().len(), 3);

        tree.collapse(a);
        assert_eq!(tree.visible_rows().len(), 1, "collapsed parent hides the subtree");
        assert!(tree.is_expanded("r/a/b"), "descendant expansion survives");

        tree.toggle(a);
        assert_eq!(tree.visible_rows().len(), 3, "re-expanding restores the subtree");
    }

    #[test]
    fn toggling_files_is_a_no_op() {
        let mut tree = FileTree::from_root(&sample());
        let readme = tree.index_of("widgets/README.md").unwrap();
        assert!(!tree.toggle(readme));
        assert!(!tree.is_expanded("widgets/README.md"));
    }

    #[test]
    fn empty_directory_reports_no_children() {
        let mut tree = FileTree::from_root(&sample());
        let docs = tree.index_of("widgets/docs").unwrap();
        assert!(!tree.node(docs).has_children());
        // Expanding it is legal, it just reveals nothing.
        tree.toggle(docs);
        assert_eq!(tree.visible_rows().len(), 3);
    }

    #[test]
    fn empty_tree_renders_no_rows() {
        let tree = FileTree::from_root(&dir("r", "r", vec![]));
        assert!(tree.is_empty());
        assert!(tree.visible_rows().is_empty());
    }

    #[test]
    fn reveal_opens_ancestors_of_a_buried_path() {
        let mut tree = FileTree::from_root(&sample());
        let index = tree.reveal("widgets/src/main.py").unwrap();
        let rows = tree.visible_rows();
        assert!(rows.contains(&index), "revealed path has a visible row");
        assert!(tree.is_expanded("widgets/src"));

        assert!(tree.reveal("widgets/src/gone.py").is_none());
    }

    #[test]
    fn sizes_format_like_the_platform() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }
}
