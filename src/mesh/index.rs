//! Typed element ids.
//!
//! Vertices, edges and faces of a [`PolyMesh`](super::PolyMesh) are addressed
//! by [`VertexId`], [`EdgeId`] and [`FaceId`], thin wrappers over an arena
//! slot. Loops, phases, mappings and cache entries all store these ids, so a
//! vertex id can never be passed where an edge is expected.
//!
//! The reserved all-ones value marks an id that refers to nothing. A derived
//! vertex that no editable vertex claimed resolves to [`VertexId::invalid`].

use std::fmt::{self, Debug};
use std::hash::Hash;

/// Storage type behind the element ids.
///
/// Meshes, loops and caches are generic over it; `u32` is the only width
/// provided and the default everywhere.
pub trait MeshIndex:
    Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static
{
    /// Value reserved for "no element".
    const INVALID: Self;

    /// Wrap an arena slot.
    ///
    /// Debug builds assert that the slot is below the reserved value.
    fn from_usize(v: usize) -> Self;

    /// Arena slot of this index.
    fn to_usize(self) -> usize;

    /// Whether this is a real slot rather than the reserved value.
    fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl MeshIndex for u32 {
    const INVALID: Self = u32::MAX;

    #[inline]
    fn from_usize(v: usize) -> Self {
        debug_assert!(v < Self::INVALID as usize, "slot {} does not fit a u32 id", v);
        v as u32
    }

    #[inline]
    fn to_usize(self) -> usize {
        self as usize
    }
}

/// Id of a mesh vertex.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId<I: MeshIndex = u32>(I);

/// Id of a mesh edge.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct EdgeId<I: MeshIndex = u32>(I);

/// Id of a mesh face.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct FaceId<I: MeshIndex = u32>(I);

macro_rules! element_id {
    ($name:ident, $tag:literal) => {
        impl<I: MeshIndex> $name<I> {
            /// Id of the given arena slot.
            #[inline]
            pub fn new(slot: usize) -> Self {
                Self(I::from_usize(slot))
            }

            /// Id that refers to nothing.
            #[inline]
            pub fn invalid() -> Self {
                Self(I::INVALID)
            }

            /// Arena slot of this id.
            #[inline]
            pub fn index(self) -> usize {
                self.0.to_usize()
            }

            /// Whether this id refers to a slot.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0.is_valid()
            }
        }

        impl<I: MeshIndex> Debug for $name<I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", $tag, self.index())
                } else {
                    write!(f, "{}(-)", $tag)
                }
            }
        }
    };
}

element_id!(VertexId, "V");
element_id!(EdgeId, "E");
element_id!(FaceId, "F");
