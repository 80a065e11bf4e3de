//! OBJ/MTL asset pipelines built on the `objcore` decoders.
//! Geometry and material files are parsed independently; the caller decides
//! when to follow an OBJ's `mtllib` reference.

pub mod diag;
pub mod mesh;
pub mod mtl;
pub mod obj;
pub mod options;
pub mod texture;

pub use diag::{Diagnostic, DiagnosticKind, DiagnosticSink, Diagnostics, LogSink, NullSink};
pub use mesh::{MeshData, MeshError, MeshVertex, SubMesh, build_submeshes};
pub use mtl::{Material, MaterialLibrary, MtlError};
pub use obj::{ObjData, ObjError};
pub use objcore::FaceCorner;
pub use options::{ErrorPolicy, ParseOptions};
