//! Edge-loop extraction and validation.
//!
//! A selection of edges is decomposed into chains of vertices ("loops"), each
//! either open or circular. Extraction only looks at the selected edges
//! themselves, never at the rest of the mesh.
//!
//! # Traversal Order
//!
//! Seeds and growth directions follow ascending vertex ids: the seed of each
//! loop is the smallest vertex that still has unconsumed edges, and a chain
//! grows into the first unvisited neighbor in edge-supply order. On selections
//! without branching vertices every decomposition is equivalent; on branching
//! selections this order picks one of several valid decompositions.
//!
//! # Example
//!
//! ```
//! use looprelax::algo::loops::extract_loops;
//! use looprelax::mesh::{EdgeKey, VertexId};
//!
//! let v = |i: usize| VertexId::<u32>::new(i);
//! let edges = vec![EdgeKey::new(v(0), v(1)), EdgeKey::new(v(1), v(2)), EdgeKey::new(v(2), v(0))];
//!
//! let loops = extract_loops(&edges);
//! assert_eq!(loops.len(), 1);
//! assert!(loops[0].circular);
//! assert_eq!(loops[0].len(), 3);
//! ```

use std::collections::BTreeMap;

use crate::mesh::{vertex_neighbors, EdgeKey, Mapping, MeshIndex, PolyMesh, VertexId};

/// Distance under which two consecutive loop vertices count as coincident.
pub const COINCIDENT_TOLERANCE: f64 = 1e-6;

/// An ordered chain of vertices.
///
/// For a circular loop the last vertex connects back to the first; the
/// closing vertex is not repeated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loop<I: MeshIndex = u32> {
    /// Vertices in chain order.
    pub vertices: Vec<VertexId<I>>,

    /// Whether the last vertex connects back to the first.
    pub circular: bool,
}

impl<I: MeshIndex> Loop<I> {
    /// Create a loop from its vertices.
    pub fn new(vertices: Vec<VertexId<I>>, circular: bool) -> Self {
        Self { vertices, circular }
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Check whether the loop has no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Keys of the edges joining consecutive vertices, including the closing
    /// edge of a circular loop.
    pub fn edge_keys(&self) -> Vec<EdgeKey<I>> {
        let mut keys: Vec<EdgeKey<I>> = self
            .vertices
            .windows(2)
            .map(|pair| EdgeKey::new(pair[0], pair[1]))
            .collect();
        if self.circular && self.vertices.len() > 1 {
            if let (Some(&first), Some(&last)) = (self.vertices.first(), self.vertices.last()) {
                keys.push(EdgeKey::new(last, first));
            }
        }
        keys
    }
}

type Adjacency<I> = BTreeMap<VertexId<I>, Vec<VertexId<I>>>;

/// Remove `b` from the neighbor list of `a`, dropping `a` once it has none left.
fn unlink<I: MeshIndex>(adjacency: &mut Adjacency<I>, a: VertexId<I>, b: VertexId<I>) {
    if let Some(neighbors) = adjacency.get_mut(&a) {
        if let Some(pos) = neighbors.iter().position(|&n| n == b) {
            neighbors.remove(pos);
        }
        if neighbors.is_empty() {
            adjacency.remove(&a);
        }
    }
}

/// Decompose a set of edges into loops.
///
/// Every edge ends up in exactly one loop, unless the selection branches: a
/// vertex with more than two selected edges leaves some of its edges to later,
/// shorter loops. Self-edges are ignored.
pub fn extract_loops<I: MeshIndex>(edge_keys: &[EdgeKey<I>]) -> Vec<Loop<I>> {
    let mut adjacency = vertex_neighbors(edge_keys);
    let mut loops = Vec::new();

    while let Some(&seed) = adjacency.keys().next() {
        let mut chain = vec![seed];
        let mut flipped = false;

        loop {
            let tail = chain[chain.len() - 1];
            let next = adjacency
                .get(&tail)
                .and_then(|neighbors| neighbors.iter().copied().find(|n| !chain.contains(n)));

            match next {
                Some(next) => {
                    unlink(&mut adjacency, tail, next);
                    unlink(&mut adjacency, next, tail);
                    chain.push(next);
                }
                // One end reached; grow from the other one, then stop
                None if !flipped => {
                    chain.reverse();
                    flipped = true;
                }
                None => break,
            }
        }

        let head = chain[0];
        let tail = chain[chain.len() - 1];
        let circular = adjacency
            .get(&head)
            .is_some_and(|neighbors| neighbors.contains(&tail));
        if circular {
            unlink(&mut adjacency, head, tail);
            unlink(&mut adjacency, tail, head);
        }

        loops.push(Loop::new(chain, circular));
    }

    log::debug!(
        "extracted {} loop(s) from {} edge(s)",
        loops.len(),
        edge_keys.len()
    );
    loops
}

/// Drop loops that cannot be relaxed.
///
/// A loop is kept when it has at least three vertices, at least one vertex
/// maps to an editable vertex (when a mapping is given), and at least one pair
/// of consecutive vertices lies further apart than [`COINCIDENT_TOLERANCE`].
pub fn validate_loops<I: MeshIndex>(
    loops: Vec<Loop<I>>,
    mesh: &PolyMesh<I>,
    mapping: Option<&Mapping<I>>,
) -> Vec<Loop<I>> {
    let total = loops.len();
    let valid: Vec<Loop<I>> = loops
        .into_iter()
        .filter(|lp| {
            if lp.len() < 3 {
                return false;
            }
            if let Some(mapping) = mapping {
                if !lp.vertices.iter().any(|&v| mapping.is_mapped(v)) {
                    return false;
                }
            }
            lp.vertices.windows(2).any(|pair| {
                (mesh.position(pair[1]) - mesh.position(pair[0])).norm() > COINCIDENT_TOLERANCE
            })
        })
        .collect();

    if valid.len() < total {
        log::debug!("dropped {} unusable loop(s)", total - valid.len());
    }
    valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_with_edges;
    use nalgebra::Point3;
    use std::collections::BTreeSet;

    fn v(i: usize) -> VertexId {
        VertexId::new(i)
    }

    fn keys(pairs: &[(usize, usize)]) -> Vec<EdgeKey> {
        pairs.iter().map(|&(a, b)| EdgeKey::new(v(a), v(b))).collect()
    }

    fn edge_set(loops: &[Loop]) -> BTreeSet<EdgeKey> {
        loops.iter().flat_map(|lp| lp.edge_keys()).collect()
    }

    #[test]
    fn test_open_chain() {
        let edges = keys(&[(3, 4), (1, 2), (2, 3)]);
        let loops = extract_loops(&edges);

        assert_eq!(loops.len(), 1);
        assert!(!loops[0].circular);
        // Seed 1 is an end, so the chain runs from the far end back to it after flipping
        assert_eq!(loops[0].vertices, vec![v(4), v(3), v(2), v(1)]);
    }

    #[test]
    fn test_seed_in_middle() {
        let edges = keys(&[(5, 0), (0, 7)]);
        let loops = extract_loops(&edges);

        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].vertices, vec![v(5), v(0), v(7)]);
    }

    #[test]
    fn test_circular_loop() {
        let edges = keys(&[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let loops = extract_loops(&edges);

        assert_eq!(loops.len(), 1);
        assert!(loops[0].circular);
        assert_eq!(loops[0].len(), 4);
        assert_eq!(edge_set(&loops), edges.into_iter().collect());
    }

    #[test]
    fn test_two_disjoint_loops() {
        let edges = keys(&[(0, 1), (1, 2), (10, 11), (11, 12), (12, 10)]);
        let loops = extract_loops(&edges);

        assert_eq!(loops.len(), 2);
        assert!(!loops[0].circular);
        assert!(loops[1].circular);
        assert_eq!(edge_set(&loops), edges.into_iter().collect());
    }

    #[test]
    fn test_branching_consumes_every_edge() {
        // A "T": vertex 1 has three selected edges
        let edges = keys(&[(0, 1), (1, 2), (1, 3)]);
        let loops = extract_loops(&edges);

        assert_eq!(loops.len(), 2);
        assert_eq!(edge_set(&loops), edges.into_iter().collect());
    }

    #[test]
    fn test_self_edge_ignored() {
        let edges = vec![EdgeKey::new(v(2), v(2))];
        assert!(extract_loops(&edges).is_empty());
    }

    #[test]
    fn test_edge_keys_of_circular_loop() {
        let lp = Loop::new(vec![v(4), v(2), v(9)], true);
        assert_eq!(lp.edge_keys(), keys(&[(4, 2), (2, 9), (9, 4)]));
    }

    fn line_mesh(xs: &[f64]) -> PolyMesh {
        let vertices: Vec<Point3<f64>> = xs.iter().map(|&x| Point3::new(x, 0.0, 0.0)).collect();
        let edges: Vec<[usize; 2]> = (1..xs.len()).map(|i| [i - 1, i]).collect();
        let faces: Vec<Vec<usize>> = Vec::new();
        build_with_edges(&vertices, &faces, &edges).unwrap()
    }

    #[test]
    fn test_validate_drops_short_loops() {
        let mesh = line_mesh(&[0.0, 1.0, 2.0]);
        let loops = vec![
            Loop::new(vec![v(0), v(1)], false),
            Loop::new(vec![v(0), v(1), v(2)], false),
        ];
        let valid = validate_loops(loops, &mesh, None);
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].len(), 3);
    }

    #[test]
    fn test_validate_drops_stacked_loops() {
        let mesh = line_mesh(&[1.0, 1.0 + 1e-8, 1.0 - 1e-8, 1.0]);
        let loops = vec![Loop::new(vec![v(0), v(1), v(2), v(3)], true)];
        assert!(validate_loops(loops, &mesh, None).is_empty());
    }

    #[test]
    fn test_validate_drops_unmapped_loops() {
        let mesh = line_mesh(&[0.0, 1.0, 2.0, 3.0]);
        let mapping = Mapping::from_pairs([
            (v(0), VertexId::invalid()),
            (v(1), VertexId::invalid()),
            (v(2), VertexId::invalid()),
            (v(3), v(3)),
        ]);
        let loops = vec![
            Loop::new(vec![v(0), v(1), v(2)], false),
            Loop::new(vec![v(1), v(2), v(3)], false),
        ];
        let valid = validate_loops(loops, &mesh, Some(&mapping));
        assert_eq!(valid, vec![Loop::new(vec![v(1), v(2), v(3)], false)]);
    }
}
