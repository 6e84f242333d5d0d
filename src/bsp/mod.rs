// src/bsp/mod.rs

pub mod sight;

pub use sight::{check_sight, SightLine, PASS_OVER, PASS_UNDER};

use crate::dmu::handle::{ElementType, LeafId, LineId, NodeId, SectorId};
use crate::errors::DmuError;
use crate::fixed::{Fixed, FRACBITS};
use crate::utils::geometry::perp_distance;

/// The partition line of an internal node: a point and a direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partition {
    pub origin: [f64; 2],
    pub direction: [f64; 2],
}

impl Partition {
    pub fn new(origin: [f64; 2], direction: [f64; 2]) -> Self {
        Partition { origin, direction }
    }

    /// Which child a point descends into: 0 is the front (right) side,
    /// 1 the back. A point exactly on the partition always resolves to
    /// the back child, matching the classic engine's tie-break.
    #[inline]
    pub fn point_on_side(&self, p: [f64; 2]) -> usize {
        let cross = perp_distance(self.origin, self.direction, p);
        if cross < 0.0 {
            0
        } else {
            1
        }
    }
}

/// Classic fixed-point side test, kept bit-identical to the original
/// routine (axis fast paths, sign-bit shortcut, pre-shifted multiplies)
/// for save-compatible logic operating within ±65536 map units.
pub fn point_on_side_fixed(x: Fixed, y: Fixed, origin: [Fixed; 2], direction: [Fixed; 2]) -> usize {
    let (lx, ly) = (origin[0].0, origin[1].0);
    let (ldx, ldy) = (direction[0].0, direction[1].0);
    let (x, y) = (x.0, y.0);

    if ldx == 0 {
        if x <= lx {
            return (ldy > 0) as usize;
        }
        return (ldy < 0) as usize;
    }
    if ldy == 0 {
        if y <= ly {
            return (ldx < 0) as usize;
        }
        return (ldx > 0) as usize;
    }

    let dx = x.wrapping_sub(lx);
    let dy = y.wrapping_sub(ly);

    // Decide by sign bits alone when the products would disagree in sign.
    if ((ldy ^ ldx ^ dx ^ dy) as u32) & 0x8000_0000 != 0 {
        if ((ldy ^ dx) as u32) & 0x8000_0000 != 0 {
            return 1;
        }
        return 0;
    }

    let left = Fixed(ldy >> FRACBITS).mul(Fixed(dx));
    let right = Fixed(dy).mul(Fixed(ldx >> FRACBITS));
    if right < left {
        0
    } else {
        1
    }
}

/// A child slot of an internal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BspChild {
    Node(NodeId),
    Leaf(LeafId),
}

/// An internal node: a partition line and two children, front first.
#[derive(Debug, Clone, PartialEq)]
pub struct BspNode {
    pub partition: Partition,
    pub children: [BspChild; 2],
}

/// One edge of a leaf's convex boundary. Half-edges produced from a map
/// line carry its id; the ones produced by partition splits do not.
#[derive(Debug, Clone, PartialEq)]
pub struct HEdge {
    pub v1: [f64; 2],
    pub v2: [f64; 2],
    pub line: Option<LineId>,
    /// Which side of the line this half-edge runs along (0 front, 1 back).
    pub side: u8,
}

/// A convex subspace and the sector it lies in. The half-edge list runs
/// around the boundary in order.
#[derive(Debug, Clone, PartialEq)]
pub struct BspLeaf {
    pub sector: SectorId,
    pub hedges: Vec<HEdge>,
}

/// A static, already-built BSP tree over map space. Construction is a
/// conversion-time step; this crate only consumes the finished tree.
#[derive(Debug, Clone, PartialEq)]
pub struct BspTree {
    nodes: Vec<BspNode>,
    leafs: Vec<BspLeaf>,
    root: BspChild,
}

impl BspTree {
    pub fn new(nodes: Vec<BspNode>, leafs: Vec<BspLeaf>, root: BspChild) -> Result<Self, DmuError> {
        if leafs.is_empty() {
            return Err(DmuError::IndexOutOfRange {
                ty: ElementType::BspLeaf,
                index: 0,
                count: 0,
            });
        }
        let check = |child: BspChild| match child {
            BspChild::Node(id) if id.index() >= nodes.len() => Err(DmuError::IndexOutOfRange {
                ty: ElementType::BspNode,
                index: id.index(),
                count: nodes.len(),
            }),
            BspChild::Leaf(id) if id.index() >= leafs.len() => Err(DmuError::IndexOutOfRange {
                ty: ElementType::BspLeaf,
                index: id.index(),
                count: leafs.len(),
            }),
            _ => Ok(()),
        };
        check(root)?;
        for node in &nodes {
            check(node.children[0])?;
            check(node.children[1])?;
        }
        Ok(BspTree { nodes, leafs, root })
    }

    /// A degenerate tree for maps that fit in a single convex subspace.
    pub fn single_leaf(leaf: BspLeaf) -> Self {
        BspTree {
            nodes: Vec::new(),
            leafs: vec![leaf],
            root: BspChild::Leaf(LeafId(0)),
        }
    }

    pub fn root(&self) -> BspChild {
        self.root
    }

    pub fn nodes(&self) -> &[BspNode] {
        &self.nodes
    }

    pub fn leafs(&self) -> &[BspLeaf] {
        &self.leafs
    }

    pub fn node(&self, id: NodeId) -> Result<&BspNode, DmuError> {
        self.nodes.get(id.index()).ok_or(DmuError::IndexOutOfRange {
            ty: ElementType::BspNode,
            index: id.index(),
            count: self.nodes.len(),
        })
    }

    pub fn leaf(&self, id: LeafId) -> Result<&BspLeaf, DmuError> {
        self.leafs.get(id.index()).ok_or(DmuError::IndexOutOfRange {
            ty: ElementType::BspLeaf,
            index: id.index(),
            count: self.leafs.len(),
        })
    }

    /// Descends from the root to the leaf containing the point. Always
    /// terminates: the constructor guarantees child indices are valid and
    /// every path ends in a leaf.
    pub fn leaf_at(&self, p: [f64; 2]) -> LeafId {
        let mut child = self.root;
        loop {
            match child {
                BspChild::Leaf(id) => return id,
                BspChild::Node(id) => {
                    let node = &self.nodes[id.index()];
                    child = node.children[node.partition.point_on_side(p)];
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A 256x128 room split down the middle at x=128 into two leafs.
    /// The partition points north, so the east half is its front side.
    /// Leaf 0 is the west half, leaf 1 the east half.
    pub fn split_room_tree(sector: SectorId) -> BspTree {
        let west = BspLeaf {
            sector,
            hedges: vec![
                HEdge { v1: [0.0, 0.0], v2: [128.0, 0.0], line: Some(LineId(0)), side: 0 },
                HEdge { v1: [128.0, 0.0], v2: [128.0, 128.0], line: None, side: 0 },
                HEdge { v1: [128.0, 128.0], v2: [0.0, 128.0], line: Some(LineId(2)), side: 0 },
                HEdge { v1: [0.0, 128.0], v2: [0.0, 0.0], line: Some(LineId(3)), side: 0 },
            ],
        };
        let east = BspLeaf {
            sector,
            hedges: vec![
                HEdge { v1: [128.0, 0.0], v2: [256.0, 0.0], line: Some(LineId(0)), side: 0 },
                HEdge { v1: [256.0, 0.0], v2: [256.0, 128.0], line: Some(LineId(1)), side: 0 },
                HEdge { v1: [256.0, 128.0], v2: [128.0, 128.0], line: Some(LineId(2)), side: 0 },
                HEdge { v1: [128.0, 128.0], v2: [128.0, 0.0], line: None, side: 1 },
            ],
        };
        let node = BspNode {
            partition: Partition::new([128.0, 0.0], [0.0, 1.0]),
            children: [BspChild::Leaf(LeafId(1)), BspChild::Leaf(LeafId(0))],
        };
        BspTree::new(vec![node], vec![west, east], BspChild::Node(NodeId(0))).unwrap()
    }
}
