//! Wavefront OBJ format support.
//!
//! Only geometry is read: `v` positions, `f` polygons and `l` polylines.
//! Texture coordinates, normals, groups and materials are ignored. Face
//! corners of the form `v/vt/vn` use their first index; negative indices
//! count back from the most recently declared vertex.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::{build_with_edges, to_face_vertex, MeshIndex, PolyMesh};

/// Load a mesh from an OBJ file.
///
/// Polylines (`l` records) become wire edges between consecutive vertices.
///
/// # Example
///
/// ```no_run
/// use looprelax::io::obj;
/// use looprelax::mesh::PolyMesh;
///
/// let mesh: PolyMesh = obj::load("model.obj").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<PolyMesh<I>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);

    let load_error = |line: usize, message: String| MeshError::LoadError {
        path: path.to_path_buf(),
        message: format!("line {}: {}", line, message),
    };

    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut faces: Vec<Vec<usize>> = Vec::new();
    let mut edges: Vec<[usize; 2]> = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let number = number + 1;
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("v") => {
                let coords: Vec<f64> = tokens
                    .take(3)
                    .map(|t| t.parse::<f64>())
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| load_error(number, e.to_string()))?;
                if coords.len() != 3 {
                    return Err(load_error(number, "vertex needs three coordinates".into()));
                }
                vertices.push(Point3::new(coords[0], coords[1], coords[2]));
            }
            Some("f") => {
                let ring = tokens
                    .map(|t| resolve_index(t, vertices.len()))
                    .collect::<Option<Vec<usize>>>()
                    .ok_or_else(|| load_error(number, "invalid face index".into()))?;
                faces.push(ring);
            }
            Some("l") => {
                let chain = tokens
                    .map(|t| resolve_index(t, vertices.len()))
                    .collect::<Option<Vec<usize>>>()
                    .ok_or_else(|| load_error(number, "invalid line index".into()))?;
                edges.extend(chain.windows(2).map(|w| [w[0], w[1]]));
            }
            _ => {}
        }
    }

    if faces.is_empty() && edges.is_empty() {
        return Err(MeshError::LoadError {
            path: path.to_path_buf(),
            message: "OBJ file contains no faces or lines".to_string(),
        });
    }

    build_with_edges(&vertices, &faces, &edges)
}

/// Resolve a 1-based (or negative, relative) OBJ index to a 0-based one.
fn resolve_index(token: &str, num_vertices: usize) -> Option<usize> {
    let first = token.split('/').next()?;
    let index: i64 = first.parse().ok()?;
    if index > 0 {
        Some(index as usize - 1)
    } else if index < 0 {
        let back = index.unsigned_abs() as usize;
        num_vertices.checked_sub(back)
    } else {
        None
    }
}

/// Save a mesh to an OBJ file.
///
/// Faces are written as `f` records, edges bounding no face as `l` records.
///
/// # Example
///
/// ```no_run
/// use looprelax::io::obj;
/// use looprelax::mesh::PolyMesh;
///
/// let mesh: PolyMesh = PolyMesh::new();
/// obj::save(&mesh, "output.obj").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &PolyMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);

    let (vertices, faces, wires) = to_face_vertex(mesh);

    writeln!(writer, "# looprelax")?;
    for v in &vertices {
        writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
    }
    for face in &faces {
        let ring: Vec<String> = face.iter().map(|i| (i + 1).to_string()).collect();
        writeln!(writer, "f {}", ring.join(" "))?;
    }
    for [a, b] in &wires {
        writeln!(writer, "l {} {}", a + 1, b + 1)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{EdgeKey, VertexId};

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_resolve_index() {
        assert_eq!(resolve_index("1", 4), Some(0));
        assert_eq!(resolve_index("3/7/2", 4), Some(2));
        assert_eq!(resolve_index("2//5", 4), Some(1));
        assert_eq!(resolve_index("-1", 4), Some(3));
        assert_eq!(resolve_index("-4", 4), Some(0));
        assert_eq!(resolve_index("-5", 4), None);
        assert_eq!(resolve_index("0", 4), None);
        assert_eq!(resolve_index("x", 4), None);
    }

    #[test]
    fn test_load_faces_and_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "quad.obj",
            "# quad with a tail\n\
             v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nv 2 1 0\nv 3 1 0\n\
             vt 0 0\n\
             f 1/1 2/1 3/1 -3/1\n\
             l 3 5 6\n",
        );

        let mesh: PolyMesh = load(&path).unwrap();
        assert_eq!(mesh.num_vertices(), 6);
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.num_edges(), 6);
        assert_eq!(
            mesh.face_vertices(crate::mesh::FaceId::new(0)),
            &[VertexId::new(0), VertexId::new(1), VertexId::new(2), VertexId::new(3)]
        );
        assert!(mesh
            .find_edge(EdgeKey::new(VertexId::new(4), VertexId::new(5)))
            .is_some());
    }

    #[test]
    fn test_load_rejects_bad_records() {
        let dir = tempfile::tempdir().unwrap();

        let path = write_file(&dir, "bad_vertex.obj", "v 0 0\nf 1 1 1\n");
        assert!(matches!(
            load::<_, u32>(&path),
            Err(MeshError::LoadError { .. })
        ));

        let path = write_file(&dir, "bad_index.obj", "v 0 0 0\nv 1 0 0\nl 1 0\n");
        assert!(matches!(
            load::<_, u32>(&path),
            Err(MeshError::LoadError { .. })
        ));

        let path = write_file(&dir, "points.obj", "v 0 0 0\n");
        assert!(matches!(
            load::<_, u32>(&path),
            Err(MeshError::LoadError { .. })
        ));
    }

    #[test]
    fn test_save_then_load_keeps_wires() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.5, 0.25, -1.0),
        ];
        let mesh: PolyMesh =
            build_with_edges(&vertices, &[vec![0, 1, 2, 3]], &[[2, 4]]).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.obj");
        save(&mesh, &path).unwrap();
        let loaded: PolyMesh = load(&path).unwrap();

        assert_eq!(loaded.num_vertices(), 5);
        assert_eq!(loaded.num_faces(), 1);
        assert_eq!(loaded.num_edges(), 5);
        assert_eq!(loaded.position(VertexId::new(4)), &Point3::new(2.5, 0.25, -1.0));
    }
}
