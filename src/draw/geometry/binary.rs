//! Binary mesh frames for zero-copy transfer to the GPU layer
//!
//! Format (little endian):
//! `[magic "TMSH"][vertex_count: u32][f32 x,y,depth ...][u8 r,g,b,a ...]`
//!
//! Both payloads are 4-byte aligned so the receiver can view them directly as
//! Float32Array/Uint8Array.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::mesh::{VertexMesh, BYTES_PER_COLOR, FLOATS_PER_VERTEX};
use super::types::{Point, Triangle};

pub const MESH_MAGIC: &[u8; 4] = b"TMSH";

/// Header size in bytes (magic + vertex count)
pub const HEADER_LEN: usize = 8;

/// Write a mesh frame into any writer
pub fn write_mesh<W: Write>(writer: &mut W, mesh: &VertexMesh) -> io::Result<()> {
    writer.write_all(MESH_MAGIC)?;
    writer.write_u32::<LittleEndian>(frame_vertex_count(mesh.vertex_count())?)?;
    for &f in mesh.positions() {
        writer.write_f32::<LittleEndian>(f)?;
    }
    writer.write_all(mesh.colors())?;
    Ok(())
}

/// Encode a mesh frame into a fresh buffer
pub fn mesh_to_bytes(mesh: &VertexMesh) -> io::Result<Vec<u8>> {
    let len = HEADER_LEN
        + mesh.vertex_count() * (FLOATS_PER_VERTEX * 4 + BYTES_PER_COLOR);
    let mut buffer = Vec::with_capacity(len);
    write_mesh(&mut buffer, mesh)?;
    Ok(buffer)
}

/// The header stores the vertex count as a u32
fn frame_vertex_count(count: usize) -> io::Result<u32> {
    u32::try_from(count).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} vertices do not fit in a mesh frame", count),
        )
    })
}

/// Decode a mesh frame. Colors are re-attached per triangle, so a frame whose
/// vertex count is not a multiple of 3 is rejected.
pub fn read_mesh<R: Read>(reader: &mut R) -> io::Result<VertexMesh> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != MESH_MAGIC {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "bad mesh magic"));
    }

    let vertex_count = reader.read_u32::<LittleEndian>()? as usize;
    if vertex_count % 3 != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("vertex count {} is not a multiple of 3", vertex_count),
        ));
    }

    let mut positions = vec![0.0f32; vertex_count * FLOATS_PER_VERTEX];
    reader.read_f32_into::<LittleEndian>(&mut positions)?;
    let mut colors = vec![0u8; vertex_count * BYTES_PER_COLOR];
    reader.read_exact(&mut colors)?;

    let mut mesh = VertexMesh::new();
    for (tri, rgba) in positions.chunks_exact(9).zip(colors.chunks_exact(12)) {
        let triangle = Triangle::new(
            Point::new(tri[0] as f64, tri[1] as f64),
            Point::new(tri[3] as f64, tri[4] as f64),
            Point::new(tri[6] as f64, tri[7] as f64),
        );
        let color = [rgba[0], rgba[1], rgba[2], rgba[3]];
        if !mesh.push_triangle(&triangle, color, tri[2]) {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "non-finite vertex"));
        }
    }
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_layout() {
        let mut mesh = VertexMesh::new();
        let tri = Triangle::new(Point::new(0.0, 0.0), Point::new(2.0, 0.0), Point::new(0.0, 2.0));
        mesh.push_triangle(&tri, [10, 20, 30, 255], -1.0);

        let bytes = mesh_to_bytes(&mesh).unwrap();
        assert_eq!(&bytes[0..4], b"TMSH");
        assert_eq!(u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), 3);
        assert_eq!(bytes.len(), HEADER_LEN + 3 * 12 + 3 * 4);
        assert_eq!(&bytes[bytes.len() - 4..], &[10, 20, 30, 255]);

        let decoded = read_mesh(&mut bytes.as_slice()).unwrap();
        assert_eq!(decoded, mesh);
    }

    #[test]
    fn test_vertex_count_must_fit_header() {
        assert_eq!(frame_vertex_count(3).unwrap(), 3);
        assert_eq!(frame_vertex_count(u32::MAX as usize).unwrap(), u32::MAX);
        #[cfg(target_pointer_width = "64")]
        {
            let err = frame_vertex_count(u32::MAX as usize + 1).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn test_rejects_bad_magic() {
        let bytes = b"NOPE\0\0\0\0".to_vec();
        assert!(read_mesh(&mut bytes.as_slice()).is_err());
    }
}
