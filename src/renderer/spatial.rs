//! Spatial index traversal
//!
//! The shadow core only consumes a spatial index; [`BoundsTree`] is the
//! reference implementation the scene uses by default.

use super::culling::Intersection;
use super::geometry::Aabb;
use super::object::ObjectId;

/// How a traversal treats node bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraversalMode {
    /// Prune subtrees whose bounds test `Outside`.
    #[default]
    BoundsChecked,
    /// Always descend. Used for trees whose node bounds are not maintained,
    /// such as the tree of moving objects.
    Unbounded,
}

/// Volume test applied to node bounds during traversal.
pub type VolumeTest<'a> = &'a dyn Fn(&Aabb) -> Intersection;

/// A hierarchical bounds structure over scene objects.
pub trait SpatialIndex {
    /// Iterate the ids of all objects in subtrees not rejected by `test`.
    ///
    /// Objects are yielded in a deterministic order for an unchanged index.
    /// Callers still test each object's own bounds.
    fn traverse<'a>(
        &'a self,
        mode: TraversalMode,
        test: VolumeTest<'a>,
    ) -> Box<dyn Iterator<Item = ObjectId> + 'a>;
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        bounds: Aabb,
        objects: Vec<ObjectId>,
    },
    Branch {
        bounds: Aabb,
        children: [usize; 2],
    },
}

impl Node {
    fn bounds(&self) -> &Aabb {
        match self {
            Node::Leaf { bounds, .. } | Node::Branch { bounds, .. } => bounds,
        }
    }
}

/// Binary bounding-volume tree split at the median of the longest axis.
#[derive(Debug, Clone, Default)]
pub struct BoundsTree {
    nodes: Vec<Node>,
    len: usize,
}

impl BoundsTree {
    /// Maximum objects per leaf.
    pub const LEAF_SIZE: usize = 4;

    /// Build a tree over `(id, bounds)` pairs.
    pub fn build(items: impl IntoIterator<Item = (ObjectId, Aabb)>) -> Self {
        let mut items: Vec<(ObjectId, Aabb)> = items
            .into_iter()
            .filter(|(_, aabb)| !aabb.is_empty())
            .collect();
        let mut tree = Self {
            nodes: Vec::new(),
            len: items.len(),
        };
        if !items.is_empty() {
            tree.build_node(&mut items);
        }
        tree
    }

    fn build_node(&mut self, items: &mut [(ObjectId, Aabb)]) -> usize {
        let bounds = items
            .iter()
            .fold(Aabb::EMPTY, |acc, (_, aabb)| acc.union(aabb));
        let index = self.nodes.len();

        if items.len() <= Self::LEAF_SIZE {
            self.nodes.push(Node::Leaf {
                bounds,
                objects: items.iter().map(|(id, _)| *id).collect(),
            });
            return index;
        }

        let size = bounds.size();
        let axis = if size.x >= size.y && size.x >= size.z {
            0
        } else if size.y >= size.z {
            1
        } else {
            2
        };
        items.sort_by(|(a_id, a), (b_id, b)| {
            a.center()[axis]
                .total_cmp(&b.center()[axis])
                .then(a_id.cmp(b_id))
        });

        // Reserve the slot so the root stays at index 0.
        self.nodes.push(Node::Branch {
            bounds,
            children: [0, 0],
        });
        let (left, right) = items.split_at_mut(items.len() / 2);
        let left = self.build_node(left);
        let right = self.build_node(right);
        self.nodes[index] = Node::Branch {
            bounds,
            children: [left, right],
        };
        index
    }

    /// Number of indexed objects.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bounds of the whole tree.
    pub fn bounds(&self) -> Aabb {
        self.nodes.first().map_or(Aabb::EMPTY, |n| *n.bounds())
    }
}

impl SpatialIndex for BoundsTree {
    fn traverse<'a>(
        &'a self,
        mode: TraversalMode,
        test: VolumeTest<'a>,
    ) -> Box<dyn Iterator<Item = ObjectId> + 'a> {
        Box::new(Traverse {
            tree: self,
            mode,
            test,
            stack: if self.nodes.is_empty() { Vec::new() } else { vec![0] },
            pending: Vec::new(),
        })
    }
}

/// Depth-first traversal iterator over a [`BoundsTree`].
struct Traverse<'a> {
    tree: &'a BoundsTree,
    mode: TraversalMode,
    test: VolumeTest<'a>,
    stack: Vec<usize>,
    pending: Vec<ObjectId>,
}

impl Iterator for Traverse<'_> {
    type Item = ObjectId;

    fn next(&mut self) -> Option<ObjectId> {
        loop {
            if let Some(id) = self.pending.pop() {
                return Some(id);
            }
            let index = self.stack.pop()?;
            let node = &self.tree.nodes[index];
            if self.mode == TraversalMode::BoundsChecked
                && (self.test)(node.bounds()) == Intersection::Outside
            {
                continue;
            }
            match node {
                Node::Leaf { objects, .. } => {
                    self.pending.extend(objects.iter().rev().copied());
                }
                Node::Branch { children, .. } => {
                    self.stack.push(children[1]);
                    self.stack.push(children[0]);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn unit_box_at(x: f32) -> Aabb {
        Aabb::new(Vec3::new(x, 0.0, 0.0), Vec3::new(x + 1.0, 1.0, 1.0))
    }

    fn tree(n: u32) -> BoundsTree {
        BoundsTree::build((0..n).map(|i| (ObjectId(i), unit_box_at(i as f32 * 2.0))))
    }

    #[test]
    fn test_traverse_everything() {
        let tree = tree(13);
        let test = |_: &Aabb| Intersection::Inside;
        let mut ids: Vec<_> = tree.traverse(TraversalMode::BoundsChecked, &test).collect();
        ids.sort();
        assert_eq!(ids, (0..13).map(ObjectId).collect::<Vec<_>>());
    }

    #[test]
    fn test_traverse_prunes_outside_subtrees() {
        let tree = tree(16);
        let region = Aabb::new(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(4.5, 1.0, 1.0));
        let test = |b: &Aabb| {
            if b.intersects(&region) {
                Intersection::Intersecting
            } else {
                Intersection::Outside
            }
        };
        let ids: Vec<_> = tree.traverse(TraversalMode::BoundsChecked, &test).collect();
        // Only the first leaf survives pruning.
        assert!(ids.len() <= BoundsTree::LEAF_SIZE);
        assert!(ids.contains(&ObjectId(0)));
        assert!(ids.contains(&ObjectId(2)));
    }

    #[test]
    fn test_unbounded_mode_ignores_bounds() {
        let tree = tree(9);
        let test = |_: &Aabb| Intersection::Outside;
        assert_eq!(tree.traverse(TraversalMode::BoundsChecked, &test).count(), 0);
        assert_eq!(tree.traverse(TraversalMode::Unbounded, &test).count(), 9);
    }

    #[test]
    fn test_traversal_order_is_stable() {
        let tree = tree(11);
        let test = |_: &Aabb| Intersection::Inside;
        let a: Vec<_> = tree.traverse(TraversalMode::BoundsChecked, &test).collect();
        let b: Vec<_> = tree.traverse(TraversalMode::BoundsChecked, &test).collect();
        assert_eq!(a, b);
    }
}
