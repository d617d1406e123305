//! Parent/child relation over every structural unit.
//!
//! The scanner reports each unit family separately; the editing phases need
//! to know which unit owns a line and which units enclose which. Nodes are
//! stored in document order (parents before their children).

use crate::model::{StructureIndex, Unit, UnitId};

#[derive(Debug, Clone)]
pub struct Node {
    pub unit: Unit,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub depth: usize,
}

#[derive(Debug, Clone, Default)]
pub struct UnitTree {
    nodes: Vec<Node>,
    /// Innermost node covering each line.
    innermost: Vec<Option<usize>>,
}

impl UnitTree {
    pub fn build(index: &StructureIndex, line_count: usize) -> Self {
        let mut units = index.units();
        units.sort_by(|a, b| {
            a.span
                .start
                .cmp(&b.span.start)
                .then(b.span.end.cmp(&a.span.end))
                .then(a.id.kind.rank().cmp(&b.id.kind.rank()))
        });

        let mut nodes: Vec<Node> = Vec::with_capacity(units.len());
        let mut stack: Vec<usize> = Vec::new();
        for unit in units {
            while let Some(&top) = stack.last() {
                if nodes[top].unit.span.encloses(&unit.span) {
                    break;
                }
                stack.pop();
            }
            let parent = stack.last().copied();
            let depth = parent.map_or(0, |p| nodes[p].depth + 1);
            let idx = nodes.len();
            if let Some(p) = parent {
                nodes[p].children.push(idx);
            }
            nodes.push(Node {
                unit,
                parent,
                children: Vec::new(),
                depth,
            });
            stack.push(idx);
        }

        let mut innermost = vec![None; line_count];
        for (idx, node) in nodes.iter().enumerate() {
            let span = node.unit.span;
            for slot in innermost.iter_mut().take(span.end + 1).skip(span.start) {
                *slot = Some(idx);
            }
        }

        Self { nodes, innermost }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find(&self, id: UnitId) -> Option<usize> {
        self.nodes.iter().position(|n| n.unit.id == id)
    }

    /// Innermost unit whose range covers `line`.
    pub fn innermost(&self, line: usize) -> Option<usize> {
        self.innermost.get(line).copied().flatten()
    }

    /// `idx` followed by its ancestors up to the root.
    pub fn ancestors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(Some(idx), move |&i| self.nodes[i].parent)
    }

    /// Every node below `idx`, depth first.
    pub fn descendants(&self, idx: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut pending: Vec<usize> = self.nodes[idx].children.iter().rev().copied().collect();
        while let Some(i) = pending.pop() {
            out.push(i);
            pending.extend(self.nodes[i].children.iter().rev().copied());
        }
        out
    }

    /// Node indices with every child ahead of its parent.
    pub fn children_first(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.nodes.len()).collect();
        order.sort_by(|&a, &b| self.nodes[b].depth.cmp(&self.nodes[a].depth).then(a.cmp(&b)));
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::model::UnitKind;
    use crate::scanner::scan;

    const SCRIPT: &str = r#"setup() {
  mkdir -p out
}
if JobStep "Section 1: Run"; then
  SubStep "Section 1.1: Loop"
  for f in a b; do
    echo "$f"
  done
fi
"#;

    fn tree() -> UnitTree {
        let doc = Document::parse(SCRIPT);
        UnitTree::build(&scan(&doc), doc.len())
    }

    #[test]
    fn parents_follow_nesting() {
        let tree = tree();
        let loop_idx = tree.find(UnitId::new(UnitKind::Loop, 5)).unwrap();
        let kinds: Vec<UnitKind> = tree
            .ancestors(loop_idx)
            .map(|i| tree.node(i).unit.id.kind)
            .collect();
        assert_eq!(kinds, vec![UnitKind::Loop, UnitKind::Subsection, UnitKind::Section]);
        let func = tree.find(UnitId::new(UnitKind::Function, 0)).unwrap();
        assert_eq!(tree.node(func).parent, None);
    }

    #[test]
    fn innermost_owner_per_line() {
        let tree = tree();
        let owner = |line| tree.innermost(line).map(|i| tree.node(i).unit.id.kind);
        assert_eq!(owner(1), Some(UnitKind::Function));
        assert_eq!(owner(3), Some(UnitKind::Section));
        assert_eq!(owner(6), Some(UnitKind::Loop));
        assert_eq!(owner(8), Some(UnitKind::Section));
        assert_eq!(owner(42), None);
    }

    #[test]
    fn children_come_first() {
        let tree = tree();
        let order = tree.children_first();
        let pos = |i: usize| order.iter().position(|&x| x == i).unwrap();
        for (idx, node) in tree.nodes().iter().enumerate() {
            if let Some(parent) = node.parent {
                assert!(pos(idx) < pos(parent));
            }
        }
    }

    #[test]
    fn descendants_of_section() {
        let tree = tree();
        let section = tree.find(UnitId::new(UnitKind::Section, 3)).unwrap();
        assert_eq!(tree.descendants(section).len(), 2);
    }
}
