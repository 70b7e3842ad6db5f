//! Expansion of loops to every topologically parallel loop.
//!
//! Starting from a seed loop, the faces on either side of it are collected
//! and, for each face, the edge that does not touch any vertex seen so far
//! becomes part of the next ring on that side. Rings keep growing outward
//! until a mesh boundary is hit or a ring closes onto used vertices.
//!
//! Parallel rings are only well-defined on regular quad topology. When an
//! edge of a ring is hidden, missing from the mesh, or shared by more than two
//! faces, expansion is abandoned and the seed loops are returned unchanged.

use std::collections::HashSet;

use super::loops::Loop;
use crate::mesh::{EdgeKey, FaceAdjacency, FaceId, MeshIndex, PolyMesh, VertexId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    A,
    B,
}

/// Split the faces around a ring into its two sides.
///
/// Returns `None` when the topology around the ring is irregular.
fn classify_sides<I: MeshIndex>(
    adjacency: &FaceAdjacency<I>,
    ring: &[EdgeKey<I>],
) -> Option<(Vec<FaceId<I>>, Vec<FaceId<I>>)> {
    let mut side_a: Vec<FaceId<I>> = Vec::new();
    let mut side_b: Vec<FaceId<I>> = Vec::new();

    for &key in ring {
        let faces = adjacency.faces_of_edge(key)?;
        if faces.len() > 2 {
            return None;
        }

        let mut taken: Option<Side> = None;
        for &face in faces {
            // A face continues a side if that side is empty or its last face touches this one
            let fits = |side: &[FaceId<I>], which: Side| {
                taken != Some(which)
                    && side
                        .last()
                        .map_or(true, |&last| adjacency.are_adjacent(face, last))
            };

            if fits(&side_a, Side::A) {
                side_a.push(face);
                if taken.is_some() {
                    break;
                }
                taken = Some(Side::A);
            } else if fits(&side_b, Side::B) {
                side_b.push(face);
                if taken.is_some() {
                    break;
                }
                taken = Some(Side::B);
            }
        }
    }

    Some((side_a, side_b))
}

/// Rebuild an ordered vertex loop from a ring of consecutive edges.
fn ring_to_loop<I: MeshIndex>(ring: &[EdgeKey<I>]) -> Loop<I> {
    match ring {
        [] => return Loop::new(Vec::new(), false),
        [single] => return Loop::new(single.vertices().to_vec(), false),
        _ => {}
    }

    let mut vertices: Vec<VertexId<I>> = ring
        .windows(2)
        .filter_map(|pair| pair[0].vertices().into_iter().find(|&v| pair[1].contains(v)))
        .collect();
    let (Some(&inner_first), Some(&inner_last)) = (vertices.first(), vertices.last()) else {
        return Loop::new(Vec::new(), false);
    };

    if let Some(start) = ring[0].other(inner_first) {
        vertices.insert(0, start);
    }
    if let Some(end) = ring[ring.len() - 1].other(inner_last) {
        vertices.push(end);
    }

    let circular = vertices.len() > 1 && vertices.first() == vertices.last();
    if circular {
        vertices.pop();
    }
    Loop::new(vertices, circular)
}

/// Expand seed loops to all loops parallel to them.
///
/// The result lists, for each seed, the seed itself followed by the rings
/// discovered from it. Hidden faces and edges are not crossed. On irregular
/// topology the seeds are returned as they are.
///
/// # Example
///
/// ```
/// use looprelax::algo::loops::Loop;
/// use looprelax::algo::parallel::parallel_loops;
/// use looprelax::mesh::{build_from_quads, PolyMesh, VertexId};
/// use nalgebra::Point3;
///
/// // A strip of two quads stacked vertically
/// let vertices: Vec<Point3<f64>> = (0..6)
///     .map(|i| Point3::new((i % 2) as f64, (i / 2) as f64, 0.0))
///     .collect();
/// let mesh: PolyMesh = build_from_quads(&vertices, &[[0, 1, 3, 2], [2, 3, 5, 4]]).unwrap();
///
/// let seed = Loop::new(vec![VertexId::new(2), VertexId::new(3)], false);
/// let loops = parallel_loops(&mesh, &[seed]);
/// assert_eq!(loops.len(), 3);
/// ```
pub fn parallel_loops<I: MeshIndex>(mesh: &PolyMesh<I>, seeds: &[Loop<I>]) -> Vec<Loop<I>> {
    let adjacency = FaceAdjacency::new(mesh);
    let mut rings: Vec<Vec<EdgeKey<I>>> = Vec::new();

    for seed in seeds {
        let seed_ring = seed.edge_keys();
        let mut used: HashSet<VertexId<I>> =
            seed_ring.iter().flat_map(|key| key.vertices()).collect();
        rings.push(seed_ring.clone());
        let mut frontier = vec![seed_ring];

        while let Some(ring) = frontier.pop() {
            let Some((side_a, side_b)) = classify_sides(&adjacency, &ring) else {
                log::warn!("irregular topology around selected loop; skipping parallel loops");
                return seeds.to_vec();
            };

            for side in [side_a, side_b] {
                let next: Vec<EdgeKey<I>> = side
                    .iter()
                    .filter_map(|&face| {
                        mesh.face(face)
                            .edge_keys()
                            .find(|key| !used.contains(&key.lo()) && !used.contains(&key.hi()))
                    })
                    .collect();
                if next.is_empty() {
                    continue;
                }
                used.extend(next.iter().flat_map(|key| key.vertices()));
                rings.push(next.clone());
                frontier.push(next);
            }
        }
    }

    log::debug!(
        "expanded {} seed loop(s) to {} parallel loop(s)",
        seeds.len(),
        rings.len()
    );
    rings.iter().map(|ring| ring_to_loop(ring)).collect()
}
