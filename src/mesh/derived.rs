//! Modifier-evaluated meshes and their link back to the editable mesh.
//!
//! When an object carries enabled mirror modifiers, loops are searched on the
//! mirrored geometry rather than on the editable mesh alone, so that a loop
//! crossing the mirror plane is seen as one loop. The [`DerivedMesh`] records
//! for every derived vertex which editable vertex it came from and under which
//! reflection, which lets its positions be refreshed after the editable mesh
//! moves. A [`Mapping`] then routes edits on derived vertices back to the
//! editable ones.

use std::collections::BTreeMap;

use nalgebra::{Point3, Vector3};

use super::index::{MeshIndex, VertexId};
use super::object::{MirrorModifier, Modifier};
use super::polymesh::PolyMesh;
use crate::error::Result;

/// Distance under which a derived vertex is identified with an editable one.
pub const MAPPING_TOLERANCE: f64 = 1e-6;

/// Where a derived vertex comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Origin<I: MeshIndex> {
    source: VertexId<I>,
    scale: Vector3<f64>,
}

/// A mesh produced by evaluating the mirror modifiers of an object.
#[derive(Debug, Clone)]
pub struct DerivedMesh<I: MeshIndex = u32> {
    mesh: PolyMesh<I>,
    origins: Vec<Origin<I>>,
}

impl<I: MeshIndex> DerivedMesh<I> {
    /// Evaluate the enabled mirror modifiers of a stack on top of `mesh`.
    ///
    /// Returns `None` when no mirror modifier is enabled in the viewport; the
    /// editable mesh is then used directly. Modifiers apply in stack order and
    /// each one mirrors across its axes in X, Y, Z order, so the result of one
    /// axis is mirrored again by the next.
    pub fn evaluate(mesh: &PolyMesh<I>, modifiers: &[Modifier]) -> Result<Option<Self>> {
        let mirrors: Vec<&MirrorModifier> =
            modifiers.iter().filter_map(Modifier::active_mirror).collect();
        if mirrors.is_empty() {
            return Ok(None);
        }

        let mut derived = Self {
            mesh: mesh.clone(),
            origins: mesh
                .vertex_ids()
                .map(|v| Origin {
                    source: v,
                    scale: Vector3::new(1.0, 1.0, 1.0),
                })
                .collect(),
        };

        for settings in mirrors {
            for axis in settings.axes.enabled() {
                derived.mirror_axis(axis, settings)?;
            }
        }

        log::debug!(
            "evaluated mirror modifiers: {} -> {} vertices",
            mesh.num_vertices(),
            derived.mesh.num_vertices()
        );
        Ok(Some(derived))
    }

    fn mirror_axis(&mut self, axis: usize, settings: &MirrorModifier) -> Result<()> {
        let source = self.mesh.clone();
        let mut flip = Vector3::new(1.0, 1.0, 1.0);
        flip[axis] = -1.0;

        // Copy of each vertex; on-plane vertices may be shared with their copy
        let mut copy_of: Vec<VertexId<I>> = Vec::with_capacity(source.num_vertices());
        let mut merged: Vec<bool> = Vec::with_capacity(source.num_vertices());
        for (v, vertex) in source.vertices() {
            let on_plane =
                settings.use_merge && 2.0 * vertex.position[axis].abs() <= settings.merge_threshold;
            if on_plane {
                copy_of.push(v);
                merged.push(true);
                continue;
            }
            let mirrored = Point3::from(vertex.position.coords.component_mul(&flip));
            let copy = self.mesh.add_vertex(mirrored);
            let copied = self.mesh.vertex_mut(copy);
            copied.selected = vertex.selected;
            copied.hidden = vertex.hidden;

            let origin = self.origins[v.index()];
            self.origins.push(Origin {
                source: origin.source,
                scale: origin.scale.component_mul(&flip),
            });
            copy_of.push(copy);
            merged.push(false);
        }

        for (_, edge) in source.edges() {
            let [a, b] = edge.key.vertices();
            if merged[a.index()] && merged[b.index()] {
                continue;
            }
            let id = self.mesh.add_edge(copy_of[a.index()], copy_of[b.index()])?;
            let copied = self.mesh.edge_mut(id);
            copied.selected = edge.selected;
            copied.hidden = edge.hidden;
        }

        for (_, face) in source.faces() {
            if face.vertices.iter().all(|v| merged[v.index()]) {
                continue;
            }
            // Reflection flips orientation
            let ring: Vec<VertexId<I>> = face
                .vertices
                .iter()
                .rev()
                .map(|v| copy_of[v.index()])
                .collect();
            let id = self.mesh.add_face(&ring)?;
            self.mesh.face_mut(id).hidden = face.hidden;
        }

        Ok(())
    }

    /// The evaluated mesh.
    pub fn mesh(&self) -> &PolyMesh<I> {
        &self.mesh
    }

    /// The editable vertex a derived vertex was produced from.
    pub fn source_of(&self, v: VertexId<I>) -> VertexId<I> {
        self.origins[v.index()].source
    }

    /// Recompute every derived position from the current editable positions.
    pub fn refresh_positions(&mut self, original: &PolyMesh<I>) {
        for (i, origin) in self.origins.iter().enumerate() {
            let p = original.position(origin.source).coords.component_mul(&origin.scale);
            self.mesh.set_position(VertexId::new(i), Point3::from(p));
        }
    }
}

/// Derived-to-editable vertex mapping.
///
/// Every loop vertex of the derived mesh has an entry; vertices without an
/// editable counterpart map to the invalid sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping<I: MeshIndex = u32> {
    map: BTreeMap<VertexId<I>, VertexId<I>>,
}

impl<I: MeshIndex> Mapping<I> {
    /// Build the mapping of the given derived loop vertices.
    ///
    /// Each selected, visible editable vertex claims the first still-unclaimed
    /// loop vertex (in first-appearance order) whose derived position lies
    /// within [`MAPPING_TOLERANCE`] of it.
    pub fn build<T>(original: &PolyMesh<I>, derived: &PolyMesh<I>, loop_vertices: T) -> Self
    where
        T: IntoIterator<Item = VertexId<I>>,
    {
        let mut map = BTreeMap::new();
        let mut candidates = Vec::new();
        for v in loop_vertices {
            if map.insert(v, VertexId::invalid()).is_none() {
                candidates.push(v);
            }
        }

        for v in original.selected_vertex_ids() {
            let p = original.position(v);
            let hit = candidates
                .iter()
                .position(|&d| (derived.position(d) - p).norm() < MAPPING_TOLERANCE);
            if let Some(idx) = hit {
                map.insert(candidates.remove(idx), v);
            }
        }

        Self { map }
    }

    /// Create a mapping from explicit pairs. Vertices absent from `pairs` are unknown.
    pub fn from_pairs<T>(pairs: T) -> Self
    where
        T: IntoIterator<Item = (VertexId<I>, VertexId<I>)>,
    {
        Self {
            map: pairs.into_iter().collect(),
        }
    }

    /// The editable vertex for a derived vertex, if it has one.
    pub fn resolve(&self, v: VertexId<I>) -> Option<VertexId<I>> {
        self.map.get(&v).copied().filter(|m| m.is_valid())
    }

    /// Check whether a derived vertex maps to any editable vertex.
    pub fn is_mapped(&self, v: VertexId<I>) -> bool {
        self.resolve(v).is_some()
    }

    /// Number of entries, mapped or not.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check whether the mapping has no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over all entries; unmapped entries carry the invalid sentinel.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId<I>, VertexId<I>)> + '_ {
        self.map.iter().map(|(&k, &v)| (k, v))
    }
}
