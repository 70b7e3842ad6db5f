//! Mesh objects and their modifier stack.
//!
//! A [`MeshObject`] bundles the editable mesh with the state an editor keeps
//! next to it: a name that identifies the object between invocations, the
//! modifier stack (of which only mirror modifiers matter here), and the
//! mesh's own symmetry axes used to keep mirrored vertices in sync on write.

use nalgebra::Vector3;

use super::index::MeshIndex;
use super::polymesh::PolyMesh;

/// Independent X/Y/Z mirror flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MirrorAxes {
    /// Mirror across the YZ plane.
    pub x: bool,
    /// Mirror across the XZ plane.
    pub y: bool,
    /// Mirror across the XY plane.
    pub z: bool,
}

impl MirrorAxes {
    /// No mirroring.
    pub const NONE: MirrorAxes = MirrorAxes {
        x: false,
        y: false,
        z: false,
    };

    /// Create axes from individual flags.
    pub fn new(x: bool, y: bool, z: bool) -> Self {
        Self { x, y, z }
    }

    /// Check whether any axis is enabled.
    pub fn any(self) -> bool {
        self.x || self.y || self.z
    }

    /// Enabled axis indices in X, Y, Z order.
    pub fn enabled(self) -> impl Iterator<Item = usize> {
        [self.x, self.y, self.z]
            .into_iter()
            .enumerate()
            .filter(|&(_, on)| on)
            .map(|(axis, _)| axis)
    }

    /// Component-wise scale vectors for every combination of enabled axes.
    ///
    /// X and Y come first (and their combination when both are on); with Z
    /// enabled, every previous vector is repeated with Z negated, followed by
    /// the pure Z reflection.
    pub fn reflections(self) -> Vec<Vector3<f64>> {
        let mut planar = Vec::new();
        if self.x {
            planar.push(Vector3::new(-1.0, 1.0, 1.0));
        }
        if self.y {
            planar.push(Vector3::new(1.0, -1.0, 1.0));
        }
        if self.x && self.y {
            planar.push(Vector3::new(-1.0, -1.0, 1.0));
        }
        if self.z {
            let flip_z = Vector3::new(1.0, 1.0, -1.0);
            let mirrored: Vec<Vector3<f64>> =
                planar.iter().map(|v| v.component_mul(&flip_z)).collect();
            planar.extend(mirrored);
            planar.push(flip_z);
        }
        planar
    }
}

/// Settings of a mirror modifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirrorModifier {
    /// Axes the geometry is mirrored across.
    pub axes: MirrorAxes,

    /// Whether vertices lying on the mirror plane are shared with their copy.
    pub use_merge: bool,

    /// Maximum distance between a vertex and its reflection for merging.
    pub merge_threshold: f64,
}

impl Default for MirrorModifier {
    fn default() -> Self {
        Self {
            axes: MirrorAxes::new(true, false, false),
            use_merge: true,
            merge_threshold: 0.001,
        }
    }
}

/// The kind of a modifier.
#[derive(Debug, Clone, PartialEq)]
pub enum ModifierKind {
    /// A mirror modifier.
    Mirror(MirrorModifier),
    /// Any other modifier, identified by its type name. Ignored by loop tools.
    Other(String),
}

/// An entry of an object's modifier stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Modifier {
    /// Unique name within the stack.
    pub name: String,

    /// Modifier type and settings.
    pub kind: ModifierKind,

    /// Whether the modifier is enabled in the viewport.
    pub show_viewport: bool,
}

impl Modifier {
    /// Create an enabled mirror modifier.
    pub fn mirror(name: impl Into<String>, settings: MirrorModifier) -> Self {
        Self {
            name: name.into(),
            kind: ModifierKind::Mirror(settings),
            show_viewport: true,
        }
    }

    /// Mirror settings if this is a mirror modifier enabled in the viewport.
    pub fn active_mirror(&self) -> Option<&MirrorModifier> {
        match &self.kind {
            ModifierKind::Mirror(settings) if self.show_viewport => Some(settings),
            _ => None,
        }
    }
}

/// An editable mesh together with its object-level state.
#[derive(Debug, Clone)]
pub struct MeshObject<I: MeshIndex = u32> {
    /// Object name, used to recognize the same object between invocations.
    pub name: String,

    /// The editable mesh.
    pub mesh: PolyMesh<I>,

    /// Modifier stack, in evaluation order.
    pub modifiers: Vec<Modifier>,

    /// Symmetry axes declared on the mesh itself.
    pub symmetry: MirrorAxes,
}

impl<I: MeshIndex> MeshObject<I> {
    /// Create an object without modifiers or symmetry.
    pub fn new(name: impl Into<String>, mesh: PolyMesh<I>) -> Self {
        Self {
            name: name.into(),
            mesh,
            modifiers: Vec::new(),
            symmetry: MirrorAxes::NONE,
        }
    }

    /// Append a modifier to the stack.
    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    /// Set the mesh symmetry axes.
    pub fn with_symmetry(mut self, symmetry: MirrorAxes) -> Self {
        self.symmetry = symmetry;
        self
    }

    /// Names of the mirror modifiers enabled in the viewport, in stack order.
    pub fn active_mirror_names(&self) -> Vec<String> {
        self.modifiers
            .iter()
            .filter(|m| m.active_mirror().is_some())
            .map(|m| m.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflections_x_only() {
        let r = MirrorAxes::new(true, false, false).reflections();
        assert_eq!(r, vec![Vector3::new(-1.0, 1.0, 1.0)]);
    }

    #[test]
    fn test_reflections_all_axes() {
        let r = MirrorAxes::new(true, true, true).reflections();
        assert_eq!(r.len(), 7);
        assert_eq!(r[2], Vector3::new(-1.0, -1.0, 1.0));
        assert_eq!(r[3], Vector3::new(-1.0, 1.0, -1.0));
        assert_eq!(r[5], Vector3::new(-1.0, -1.0, -1.0));
        assert_eq!(r[6], Vector3::new(1.0, 1.0, -1.0));
    }

    #[test]
    fn test_reflections_none() {
        assert!(MirrorAxes::NONE.reflections().is_empty());
        assert!(!MirrorAxes::NONE.any());
    }

    #[test]
    fn test_enabled_axes() {
        let axes: Vec<usize> = MirrorAxes::new(true, false, true).enabled().collect();
        assert_eq!(axes, vec![0, 2]);
    }

    #[test]
    fn test_active_mirror_names() {
        let mut hidden = Modifier::mirror("Mirror.001", MirrorModifier::default());
        hidden.show_viewport = false;
        let object = MeshObject::<u32>::new("Cube", PolyMesh::new())
            .with_modifier(Modifier::mirror("Mirror", MirrorModifier::default()))
            .with_modifier(Modifier {
                name: "Subsurf".to_string(),
                kind: ModifierKind::Other("SUBSURF".to_string()),
                show_viewport: true,
            })
            .with_modifier(hidden);

        assert_eq!(object.active_mirror_names(), vec!["Mirror".to_string()]);
    }
}
