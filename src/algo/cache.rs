//! Topology cache shared between repeated invocations of a tool.
//!
//! Extracting and expanding loops only depends on the mesh topology and the
//! selection, not on vertex positions. When a tool is re-run on the same
//! object with the same selection and settings (for example to try another
//! iteration count), the loops and mapping of the previous run are reused.

use std::collections::HashMap;

use super::loops::Loop;
use super::relax::InputMode;
use crate::mesh::{Mapping, MeshIndex, MeshObject, VertexId};

/// Everything a cached result depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint<I: MeshIndex = u32> {
    object: String,
    input: InputMode,
    boundaries: bool,
    mirror_modifiers: Vec<String>,
    selection: Vec<VertexId<I>>,
}

impl<I: MeshIndex> Fingerprint<I> {
    /// Capture the current state of an object for a tool invocation.
    pub fn new(object: &MeshObject<I>, input: InputMode, boundaries: bool) -> Self {
        Self {
            object: object.name.clone(),
            input,
            boundaries,
            mirror_modifiers: object.active_mirror_names(),
            selection: object.mesh.selected_vertex_ids(),
        }
    }
}

/// Cached topology of a previous invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<I: MeshIndex = u32> {
    /// Validated loops, in working-mesh ids.
    pub loops: Vec<Loop<I>>,

    /// Whether the loops refer to a mirror-derived mesh.
    pub derived: bool,

    /// Derived-to-editable mapping, present when `derived` is set.
    pub mapping: Option<Mapping<I>>,
}

/// Per-tool cache of loop topology.
#[derive(Debug, Clone)]
pub struct TopologyCache<I: MeshIndex = u32> {
    entries: HashMap<String, (Fingerprint<I>, CacheEntry<I>)>,
}

impl<I: MeshIndex> Default for TopologyCache<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> TopologyCache<I> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// The entry stored for `tool`, if its fingerprint matches.
    pub fn read(&self, tool: &str, fingerprint: &Fingerprint<I>) -> Option<&CacheEntry<I>> {
        self.entries
            .get(tool)
            .filter(|(stored, _)| stored == fingerprint)
            .map(|(_, entry)| entry)
    }

    /// Store the entry for `tool`, replacing any previous one.
    pub fn write(&mut self, tool: &str, fingerprint: Fingerprint<I>, entry: CacheEntry<I>) {
        self.entries.insert(tool.to_string(), (fingerprint, entry));
    }

    /// Forget the entry for `tool`.
    pub fn delete(&mut self, tool: &str) {
        self.entries.remove(tool);
    }

    /// Number of cached tools.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
