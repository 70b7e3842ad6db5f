//! Writing relaxed positions back to the editable mesh.
//!
//! Positions computed on the working (possibly mirror-derived) mesh are routed
//! through the derived-to-editable [`Mapping`], optionally constrained by an
//! axis lock, blended with the current position, and mirrored onto symmetric
//! counterparts before being stored.

use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

use crate::mesh::{Mapping, MeshIndex, MirrorAxes, PolyMesh, VertexId};

/// How much of a computed move is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Influence {
    /// Replace the current position with the computed one.
    #[default]
    Replace,
    /// Blend: 100 replaces, 0 keeps the current position.
    Percent(f64),
}

impl Influence {
    /// Create a blend influence, clamped to `[0, 100]`.
    pub fn percent(value: f64) -> Self {
        Influence::Percent(value.clamp(0.0, 100.0))
    }

    fn blend(self, target: Point3<f64>, current: Point3<f64>) -> Point3<f64> {
        match self {
            Influence::Replace => target,
            Influence::Percent(p) => Point3::from(
                target.coords * (p / 100.0) + current.coords * ((100.0 - p) / 100.0),
            ),
        }
    }
}

/// Coordinate frame in which locked axes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReferenceFrame {
    /// The object's own axes.
    Local,
    /// World axes, given the object's world matrix.
    Global {
        /// Object-to-world transform.
        world: Matrix4<f64>,
    },
    /// View axes.
    View {
        /// World-to-view transform.
        view: Matrix4<f64>,
        /// Object-to-world transform.
        world: Matrix4<f64>,
    },
    /// A user-defined orientation.
    Custom {
        /// Orientation-to-world transform of the custom frame.
        orientation: Matrix4<f64>,
        /// Object-to-world transform.
        world: Matrix4<f64>,
    },
}

impl ReferenceFrame {
    /// Transform from object-local coordinates into this frame.
    pub fn matrix(&self) -> Matrix4<f64> {
        match *self {
            ReferenceFrame::Local => Matrix4::identity(),
            ReferenceFrame::Global { world } => world,
            ReferenceFrame::View { view, world } => view * world,
            ReferenceFrame::Custom { orientation, world } => {
                orientation.try_inverse().unwrap_or_else(Matrix4::identity) * world
            }
        }
    }
}

/// Axes along which vertices may not move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisLock {
    /// Lock the frame's X axis.
    pub x: bool,
    /// Lock the frame's Y axis.
    pub y: bool,
    /// Lock the frame's Z axis.
    pub z: bool,
    /// Frame the axes refer to.
    pub frame: ReferenceFrame,
}

impl AxisLock {
    /// Zero the locked components of an object-space delta.
    fn constrain(&self, delta: Vector3<f64>) -> Vector3<f64> {
        let to_frame: Matrix3<f64> = self.frame.matrix().fixed_view::<3, 3>(0, 0).into_owned();
        let Some(from_frame) = to_frame.try_inverse() else {
            log::warn!("singular reference frame; axis lock ignored");
            return delta;
        };

        let mut local = to_frame * delta;
        for (axis, locked) in [self.x, self.y, self.z].into_iter().enumerate() {
            if locked {
                local[axis] = 0.0;
            }
        }
        from_frame * local
    }
}

/// Options for [`write_positions`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WriteOptions {
    /// Optional axis lock.
    pub lock: Option<AxisLock>,

    /// Blend of computed and current positions.
    pub influence: Influence,
}

impl WriteOptions {
    /// Set the axis lock.
    pub fn with_lock(mut self, lock: AxisLock) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Set the influence.
    pub fn with_influence(mut self, influence: Influence) -> Self {
        self.influence = influence;
        self
    }
}

/// Apply computed positions to the editable mesh.
///
/// Moves are applied in order. Each vertex id is translated through
/// `mapping` when one is given; vertices without an editable counterpart are
/// skipped. For each reflection enabled in `symmetry`, any vertex sitting
/// exactly at the reflection of the moved vertex's old position is moved to
/// the reflection of its new one.
///
/// Returns the editable ids that were written, in move order.
pub fn write_positions<I: MeshIndex>(
    mesh: &mut PolyMesh<I>,
    moves: &[(VertexId<I>, Point3<f64>)],
    mapping: Option<&Mapping<I>>,
    symmetry: MirrorAxes,
    options: &WriteOptions,
) -> Vec<VertexId<I>> {
    let reflections = symmetry.reflections();
    let mut written = Vec::with_capacity(moves.len());

    for &(id, target) in moves {
        let index = match mapping {
            Some(mapping) => match mapping.resolve(id) {
                Some(original) => original,
                None => continue,
            },
            None => id,
        };
        if !mesh.contains_vertex(index) {
            continue;
        }

        let current = *mesh.position(index);
        let target = match &options.lock {
            Some(lock) => current + lock.constrain(target - current),
            None => target,
        };
        let new_position = options.influence.blend(target, current);

        for scale in &reflections {
            let mirrored_old = Point3::from(current.coords.component_mul(scale));
            let mirrored_new = Point3::from(new_position.coords.component_mul(scale));
            let twins: Vec<VertexId<I>> = mesh
                .vertices()
                .filter(|(_, v)| v.position == mirrored_old)
                .map(|(vid, _)| vid)
                .collect();
            for twin in twins {
                mesh.set_position(twin, mirrored_new);
            }
        }

        mesh.set_position(index, new_position);
        written.push(index);
    }

    written
}
