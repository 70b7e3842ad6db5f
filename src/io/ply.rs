//! PLY (Stanford polygon) format support.
//!
//! Polygon faces are kept as-is. An optional `edge` element with `vertex1`
//! and `vertex2` properties is read as wire edges and written for edges
//! that bound no face.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::error::{MeshError, Result};
use crate::mesh::{build_with_edges, to_face_vertex, MeshIndex, PolyMesh};

/// Load a mesh from a PLY file.
///
/// # Example
///
/// ```no_run
/// use looprelax::io::ply;
/// use looprelax::mesh::PolyMesh;
///
/// let mesh: PolyMesh = ply::load("model.ply").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<PolyMesh<I>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let load_error = |message: &str| MeshError::LoadError {
        path: path.to_path_buf(),
        message: message.to_string(),
    };

    let parser = Parser::<DefaultElement>::new();
    let ply = parser
        .read_ply(&mut reader)
        .map_err(|e| load_error(&e.to_string()))?;

    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or_else(|| load_error("PLY file has no vertex element"))?;

    let mut vertices: Vec<Point3<f64>> = Vec::with_capacity(vertex_element.len());
    for vertex in vertex_element {
        let x = get_float_property(vertex, "x")
            .ok_or_else(|| load_error("vertex missing x coordinate"))?;
        let y = get_float_property(vertex, "y")
            .ok_or_else(|| load_error("vertex missing y coordinate"))?;
        let z = get_float_property(vertex, "z")
            .ok_or_else(|| load_error("vertex missing z coordinate"))?;
        vertices.push(Point3::new(x, y, z));
    }

    let mut faces: Vec<Vec<usize>> = Vec::new();
    if let Some(face_element) = ply.payload.get("face") {
        faces.reserve(face_element.len());
        for face in face_element {
            let indices = get_list_property(face, "vertex_indices")
                .or_else(|| get_list_property(face, "vertex_index"))
                .ok_or_else(|| load_error("face missing vertex_indices property"))?;
            faces.push(indices);
        }
    }

    let mut edges: Vec<[usize; 2]> = Vec::new();
    if let Some(edge_element) = ply.payload.get("edge") {
        for edge in edge_element {
            let a = get_index_property(edge, "vertex1")
                .ok_or_else(|| load_error("edge missing vertex1 property"))?;
            let b = get_index_property(edge, "vertex2")
                .ok_or_else(|| load_error("edge missing vertex2 property"))?;
            edges.push([a, b]);
        }
    }

    if faces.is_empty() && edges.is_empty() {
        return Err(load_error("PLY file contains no faces or edges"));
    }

    build_with_edges(&vertices, &faces, &edges)
}

fn get_float_property(element: &DefaultElement, name: &str) -> Option<f64> {
    match element.get(name)? {
        Property::Float(v) => Some(*v as f64),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(*v as f64),
        Property::UInt(v) => Some(*v as f64),
        Property::Short(v) => Some(*v as f64),
        Property::UShort(v) => Some(*v as f64),
        Property::Char(v) => Some(*v as f64),
        Property::UChar(v) => Some(*v as f64),
        _ => None,
    }
}

fn get_index_property(element: &DefaultElement, name: &str) -> Option<usize> {
    match element.get(name)? {
        Property::Int(v) => usize::try_from(*v).ok(),
        Property::UInt(v) => Some(*v as usize),
        Property::Short(v) => usize::try_from(*v).ok(),
        Property::UShort(v) => Some(*v as usize),
        Property::Char(v) => usize::try_from(*v).ok(),
        Property::UChar(v) => Some(*v as usize),
        _ => None,
    }
}

fn get_list_property(element: &DefaultElement, name: &str) -> Option<Vec<usize>> {
    match element.get(name)? {
        Property::ListInt(v) => v.iter().map(|&x| usize::try_from(x).ok()).collect(),
        Property::ListUInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListShort(v) => v.iter().map(|&x| usize::try_from(x).ok()).collect(),
        Property::ListUShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListChar(v) => v.iter().map(|&x| usize::try_from(x).ok()).collect(),
        Property::ListUChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        _ => None,
    }
}

/// Save a mesh to a PLY file (ASCII format).
///
/// # Example
///
/// ```no_run
/// use looprelax::io::ply;
/// use looprelax::mesh::PolyMesh;
///
/// let mesh: PolyMesh = PolyMesh::new();
/// ply::save(&mesh, "output.ply").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &PolyMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let (vertices, faces, wires) = to_face_vertex(mesh);

    if faces.iter().any(|f| f.len() > u8::MAX as usize) {
        return Err(MeshError::SaveError {
            path: path.to_path_buf(),
            message: "face has more than 255 vertices".to_string(),
        });
    }

    // Write header
    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment Generated by looprelax")?;
    writeln!(writer, "element vertex {}", vertices.len())?;
    writeln!(writer, "property double x")?;
    writeln!(writer, "property double y")?;
    writeln!(writer, "property double z")?;
    writeln!(writer, "element face {}", faces.len())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    if !wires.is_empty() {
        writeln!(writer, "element edge {}", wires.len())?;
        writeln!(writer, "property int vertex1")?;
        writeln!(writer, "property int vertex2")?;
    }
    writeln!(writer, "end_header")?;

    for v in &vertices {
        writeln!(writer, "{} {} {}", v.x, v.y, v.z)?;
    }

    for f in &faces {
        let ring: Vec<String> = f.iter().map(|i| i.to_string()).collect();
        writeln!(writer, "{} {}", f.len(), ring.join(" "))?;
    }

    for [a, b] in &wires {
        writeln!(writer, "{} {}", a, b)?;
    }

    writer.flush()?;
    Ok(())
}
