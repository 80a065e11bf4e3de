//! CPU-side indexed meshes assembled from parsed OBJ data, one per
//! material group.

use std::collections::HashMap;

use objcore::FaceCorner;
use thiserror::Error;

use crate::obj::ObjData;

/// Vertex with position/normal/uv. Values are in object space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Indexed triangle mesh with tightly-packed vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Triangles of one `usemtl` group.
#[derive(Clone, Debug, PartialEq)]
pub struct SubMesh {
    pub material: String,
    pub mesh: MeshData,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("{kind} index {index} out of range (len={len}) in group '{material}'")]
    IndexOutOfRange {
        kind: &'static str,
        index: i32,
        len: usize,
        material: String,
    },

    #[error("Too many vertices in group '{0}' (>{max})", max = u32::MAX)]
    TooManyVertices(String),
}

const DEFAULT_NORMAL: [f32; 3] = [0.0, 0.0, 1.0];
const DEFAULT_UV: [f32; 2] = [0.0, 0.0];

/// Build one indexed mesh per material group. Corners are de-duplicated on
/// their (position, uv, normal) triple and faces are fan-triangulated; faces
/// with fewer than three corners are dropped.
pub fn build_submeshes(data: &ObjData) -> Result<Vec<SubMesh>, MeshError> {
    let mut out = Vec::with_capacity(data.material_usages().len());
    for (group, material) in data.material_usages().iter().enumerate() {
        let mesh = build_group(data, group, material)?;
        log::debug!(
            "Group '{}': {} vertices, {} triangles",
            material,
            mesh.vertices.len(),
            mesh.triangle_count()
        );
        out.push(SubMesh {
            material: material.clone(),
            mesh,
        });
    }
    Ok(out)
}

fn build_group(data: &ObjData, group: usize, material: &str) -> Result<MeshData, MeshError> {
    let mut unique: HashMap<FaceCorner, u32> = HashMap::new();
    let mut vertices: Vec<MeshVertex> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut face_indices: Vec<u32> = Vec::new();

    for face in data.faces_in_group(group) {
        face_indices.clear();
        for &corner in face {
            let index = match unique.get(&corner) {
                Some(&idx) => idx,
                None => {
                    let position = lookup(data.positions(), corner.position, "position", material)?
                        .ok_or_else(|| out_of_range("position", 0, data.positions().len(), material))?;
                    let uv = lookup(data.uvs(), corner.uv, "uv", material)?.unwrap_or(DEFAULT_UV);
                    let normal = lookup(data.normals(), corner.normal, "normal", material)?
                        .unwrap_or(DEFAULT_NORMAL);

                    let idx = u32::try_from(vertices.len())
                        .map_err(|_| MeshError::TooManyVertices(material.to_owned()))?;
                    vertices.push(MeshVertex::new(position, normal, uv));
                    unique.insert(corner, idx);
                    idx
                }
            };
            face_indices.push(index);
        }

        if face_indices.len() < 3 {
            continue;
        }
        // Triangulate fan
        for tri in 1..(face_indices.len() - 1) {
            indices.push(face_indices[0]);
            indices.push(face_indices[tri]);
            indices.push(face_indices[tri + 1]);
        }
    }

    Ok(MeshData::new(vertices, indices))
}

/// 1-based lookup; `0` is an absent component.
fn lookup<T: Copy>(
    items: &[T],
    index: i32,
    kind: &'static str,
    material: &str,
) -> Result<Option<T>, MeshError> {
    if index == 0 {
        return Ok(None);
    }
    usize::try_from(index)
        .ok()
        .and_then(|i| i.checked_sub(1))
        .and_then(|i| items.get(i).copied())
        .map(Some)
        .ok_or_else(|| out_of_range(kind, index, items.len(), material))
}

fn out_of_range(kind: &'static str, index: i32, len: usize, material: &str) -> MeshError {
    MeshError::IndexOutOfRange {
        kind,
        index,
        len,
        material: material.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::NullSink;
    use crate::obj::parse_obj_lines;
    use crate::options::ParseOptions;

    fn obj(lines: &[&str]) -> ObjData {
        parse_obj_lines(lines, &ParseOptions::strict(), &mut NullSink).expect("parse")
    }

    #[test]
    fn mesh_data_validity() {
        let data = MeshData::new(vec![MeshVertex::default()], vec![0]);
        assert!(data.is_valid());
        assert!(!MeshData::default().is_valid());
    }

    #[test]
    fn quad_is_fan_triangulated() {
        let data = obj(&[
            "v 0 0 0", "v 1 0 0", "v 1 1 0", "v 0 1 0", "vt 0 0", "vn 0 0 1",
            "usemtl M", "f 1/1/1 2/1/1 3/1/1 4/1/1",
        ]);
        let subs = build_submeshes(&data).unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].material, "M");
        assert_eq!(subs[0].mesh.vertices.len(), 4);
        assert_eq!(subs[0].mesh.indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn shared_corners_are_deduplicated() {
        let data = obj(&[
            "v 0 0 0", "v 1 0 0", "v 1 1 0", "v 0 1 0",
            "usemtl M", "f 1 2 3", "f 1 3 4",
        ]);
        let subs = build_submeshes(&data).unwrap();
        let mesh = &subs[0].mesh;
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        // Missing uv/normal fall back to defaults.
        assert_eq!(mesh.vertices[0].normal, DEFAULT_NORMAL);
        assert_eq!(mesh.vertices[0].uv, DEFAULT_UV);
    }

    #[test]
    fn one_submesh_per_group() {
        let data = obj(&[
            "v 0 0 0", "v 1 0 0", "v 0 1 0",
            "usemtl A", "f 1 2 3", "usemtl B", "usemtl C", "f 3 2 1",
        ]);
        let subs = build_submeshes(&data).unwrap();
        let names: Vec<&str> = subs.iter().map(|s| s.material.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert!(subs[0].mesh.is_valid());
        assert!(!subs[1].mesh.is_valid());
        assert_eq!(subs[2].mesh.vertices[0].position, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn degenerate_faces_are_dropped() {
        let data = obj(&["v 0 0 0", "v 1 0 0", "usemtl A", "f 1 2"]);
        let subs = build_submeshes(&data).unwrap();
        assert!(subs[0].mesh.indices.is_empty());
    }

    #[test]
    fn out_of_range_index_is_error() {
        let data = obj(&["v 0 0 0", "usemtl A", "f 1 2 3"]);
        assert_eq!(
            build_submeshes(&data),
            Err(MeshError::IndexOutOfRange {
                kind: "position",
                index: 2,
                len: 1,
                material: "A".to_owned(),
            })
        );

        let data = obj(&["v 0 0 0", "usemtl A", "f 1/4 1/4 1/4"]);
        assert!(matches!(
            build_submeshes(&data),
            Err(MeshError::IndexOutOfRange { kind: "uv", .. })
        ));
    }

    #[test]
    fn relative_index_below_first_vertex_is_error() {
        // -1 with a single vertex resolves to 0, which has no position.
        let data = obj(&["v 0 0 0", "usemtl A", "f -1 1 1"]);
        assert!(matches!(
            build_submeshes(&data),
            Err(MeshError::IndexOutOfRange { kind: "position", .. })
        ));
    }
}
