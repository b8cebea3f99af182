//! Binary STL serialization.
//!
//! ```text
//! UINT8[80]    – Header (all zero)
//! UINT32       – Number of triangles
//! foreach triangle
//!     REAL32[3] – Normal vector (normal of the first vertex)
//!     REAL32[3] – Vertex 1
//!     REAL32[3] – Vertex 2
//!     REAL32[3] – Vertex 3
//!     UINT16    – Attribute byte count (always 0)
//! end
//! ```
//!
//! All fields are little-endian, so a buffer for `T` triangles is exactly
//! `84 + 50 * T` bytes long.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::error::{MeshError, MeshResult};
use crate::Mesh;

/// STL binary header size in bytes.
pub const HEADER_SIZE: usize = 80;

/// Size of one triangle record (normal + 3 vertices + attribute count).
pub const TRIANGLE_RECORD_SIZE: usize = 50;

/// Exact byte length of a binary STL holding `triangle_count` triangles.
#[inline]
pub const fn binary_stl_size(triangle_count: usize) -> usize {
    HEADER_SIZE + 4 + TRIANGLE_RECORD_SIZE * triangle_count
}

/// Encode a mesh into an owned binary STL buffer.
///
/// Fails with [`MeshError::IndexOutOfRange`] if any face references a missing
/// vertex; nothing is encoded in that case.
pub fn serialize(mesh: &Mesh) -> MeshResult<Vec<u8>> {
    let mut buffer = Vec::with_capacity(binary_stl_size(mesh.face_count()));
    write_binary_stl(mesh, &mut buffer)?;
    debug_assert_eq!(buffer.len(), binary_stl_size(mesh.face_count()));
    Ok(buffer)
}

/// Stream a mesh as binary STL into any writer.
pub fn write_binary_stl<W: Write>(mesh: &Mesh, writer: &mut W) -> MeshResult<()> {
    mesh.check_indices()?;
    if mesh.face_count() > u32::MAX as usize {
        return Err(MeshError::TooManyTriangles {
            count: mesh.face_count(),
        });
    }

    let triangles = mesh.faces.iter().map(|&[i0, i1, i2]| {
        let a = &mesh.vertices[i0 as usize];
        let p0 = &a.position;
        let p1 = &mesh.vertices[i1 as usize].position;
        let p2 = &mesh.vertices[i2 as usize].position;

        stl_io::Triangle {
            normal: stl_io::Normal::new([a.normal.x as f32, a.normal.y as f32, a.normal.z as f32]),
            vertices: [
                stl_io::Vertex::new([p0.x as f32, p0.y as f32, p0.z as f32]),
                stl_io::Vertex::new([p1.x as f32, p1.y as f32, p1.z as f32]),
                stl_io::Vertex::new([p2.x as f32, p2.y as f32, p2.z as f32]),
            ],
        }
    });

    stl_io::write_stl(writer, triangles).map_err(|source| MeshError::Encode { source })?;

    debug!("Encoded {} triangles as binary STL", mesh.face_count());
    Ok(())
}

/// Save mesh to a binary STL file.
pub fn save_stl(mesh: &Mesh, path: &Path) -> MeshResult<()> {
    info!("Saving mesh to {:?}", path);

    let file = File::create(path).map_err(|e| MeshError::IoWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);

    write_binary_stl(mesh, &mut writer)?;

    writer.flush().map_err(|e| MeshError::IoWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    info!("Saved {} triangles to {:?}", mesh.face_count(), path);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vertex;
    use nalgebra::{Point3, Vector3};
    use tempfile::NamedTempFile;

    fn read_f32(buf: &[u8], offset: usize) -> f32 {
        f32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
    }

    fn tetrahedron() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.vertices.push(Vertex::new(
            Point3::new(0.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, -1.0),
        ));
        mesh.vertices.push(Vertex::from_coords(10.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 10.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 10.0));
        mesh.faces.push([0, 2, 1]);
        mesh.faces.push([0, 1, 3]);
        mesh.faces.push([0, 3, 2]);
        mesh.faces.push([1, 2, 3]);
        mesh
    }

    #[test]
    fn test_size_matches_triangle_count() {
        let mesh = tetrahedron();
        let bytes = serialize(&mesh).expect("should serialize");
        assert_eq!(bytes.len(), 84 + 50 * 4);
        assert_eq!(bytes.len(), binary_stl_size(mesh.face_count()));
        assert_eq!(u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]), 4);
    }

    #[test]
    fn test_empty_mesh_is_header_only() {
        let bytes = serialize(&Mesh::new()).expect("should serialize");
        assert_eq!(bytes.len(), 84);
        assert_eq!(&bytes[80..84], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_record_layout() {
        let mesh = tetrahedron();
        let bytes = serialize(&mesh).expect("should serialize");

        // First record: normal of vertex 0, then vertices 0, 2, 1.
        assert_eq!(read_f32(&bytes, 84), 0.0);
        assert_eq!(read_f32(&bytes, 88), 0.0);
        assert_eq!(read_f32(&bytes, 92), -1.0);
        assert_eq!(read_f32(&bytes, 96 + 12), 0.0); // v2.x
        assert_eq!(read_f32(&bytes, 96 + 16), 10.0); // v2.y
        assert_eq!(read_f32(&bytes, 96 + 24), 10.0); // v1.x
        assert_eq!(&bytes[84 + 48..84 + 50], &[0, 0]);
    }

    #[test]
    fn test_serialize_is_idempotent() {
        let mesh = tetrahedron();
        let first = serialize(&mesh).expect("should serialize");
        let second = serialize(&mesh).expect("should serialize");
        assert_eq!(first, second);
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let mut mesh = tetrahedron();
        mesh.faces.push([0, 1, 9]);
        let err = serialize(&mesh).unwrap_err();
        assert!(matches!(err, MeshError::IndexOutOfRange { index: 9, .. }));
    }

    #[test]
    fn test_save_and_reload_stl() {
        let mesh = tetrahedron();
        let file = NamedTempFile::with_suffix(".stl").unwrap();
        save_stl(&mesh, file.path()).expect("should save");

        let on_disk = std::fs::read(file.path()).unwrap();
        assert_eq!(on_disk, serialize(&mesh).unwrap());

        let mut reader = File::open(file.path()).unwrap();
        let reloaded = stl_io::read_stl(&mut reader).expect("should parse");
        assert_eq!(reloaded.faces.len(), 4);
    }
}
