//! Rollup tree: hierarchical size attribution.
//!
//! A [`RollupNode`] carries a VM-size and a file-size total plus named
//! children. Trees are built fresh per analysis run by attributing
//! resolved coverage maps level by level; nothing mutates them after
//! construction.

pub mod format;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::engine::ranges::{segment_at, Segment};

/// Bucket name for scope bytes no range claimed at a level.
pub const UNMAPPED: &str = "[unmapped]";
/// Bucket name for rows folded away by a finite row limit.
pub const OTHER: &str = "[other]";

/// Address space a size contribution was measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    Vm,
    File,
}

/// One node of the rollup tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RollupNode {
    pub name: String,
    pub vm_size: u64,
    pub file_size: u64,
    pub children: BTreeMap<String, RollupNode>,
}

impl RollupNode {
    pub fn new(name: impl Into<String>) -> Self {
        RollupNode {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add `size` bytes in `space` along `path`, growing every node on
    /// the way down. Keeping parents and children in the same call is
    /// what makes the conservation invariant hold by construction:
    /// children (plus buckets) always sum to their parent's total.
    pub fn add(&mut self, path: &[&str], space: Space, size: u64) {
        match space {
            Space::Vm => self.vm_size += size,
            Space::File => self.file_size += size,
        }
        if let Some((head, rest)) = path.split_first() {
            let child = self
                .children
                .entry((*head).to_string())
                .or_insert_with(|| RollupNode::new(*head));
            child.add(rest, space, size);
        }
    }

    /// Size used for ordering: the larger of the two spaces.
    pub fn weight(&self) -> u64 {
        self.vm_size.max(self.file_size)
    }

    /// Children in report order: weight descending, ties by name
    /// ascending.
    pub fn sorted_children(&self) -> Vec<&RollupNode> {
        let mut children: Vec<&RollupNode> = self.children.values().collect();
        children.sort_by(|a, b| b.weight().cmp(&a.weight()).then_with(|| a.name.cmp(&b.name)));
        children
    }
}

/// Attribute one address space's resolved coverage into the tree.
///
/// `levels` holds one disjoint coverage map per hierarchy level,
/// outermost first, all over the same `scope`. Every elementary
/// interval of the scope lands at a full-depth path; a level that does
/// not cover the interval contributes an [`UNMAPPED`] component.
pub fn attribute(root: &mut RollupNode, levels: &[Vec<Segment>], scope: &[(u64, u64)], space: Space) {
    if levels.is_empty() {
        return;
    }
    let mut bounds: Vec<u64> = Vec::new();
    for &(start, end) in scope {
        bounds.push(start);
        bounds.push(end);
    }
    for level in levels {
        for segment in level {
            bounds.push(segment.start);
            bounds.push(segment.end);
        }
    }
    bounds.sort_unstable();
    bounds.dedup();

    for window in bounds.windows(2) {
        let (lo, hi) = (window[0], window[1]);
        if !scope.iter().any(|&(s, e)| s <= lo && hi <= e) {
            continue;
        }
        let path: Vec<&str> = levels
            .iter()
            .map(|level| {
                segment_at(level, lo)
                    .and_then(|seg| seg.label.as_deref())
                    .unwrap_or(UNMAPPED)
            })
            .collect();
        root.add(&path, space, hi - lo);
    }
}
