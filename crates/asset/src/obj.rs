//! Streaming OBJ parser: positions, normals, texture coordinates and faces
//! grouped by `usemtl`.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use objcore::{Cursor, DecodeError, FaceCorner, classify_line, decode_face_corner, decode_floats};
use thiserror::Error;

use crate::diag::{Diagnostic, DiagnosticSink, LogSink};
use crate::options::{ErrorPolicy, ParseOptions};

pub const DEFAULT_OBJECT_NAME: &str = "Default";

/// Parsed geometry file.
///
/// `face_groups` is aligned 1:1 with `material_usages`: every `usemtl` opens
/// a new group and faces go to the most recent one.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjData {
    object_name: String,
    material_library: String,
    material_usages: Vec<String>,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    face_groups: Vec<Vec<FaceCorner>>,
    // Corner count of each face, per group.
    face_sizes: Vec<Vec<usize>>,
}

impl ObjData {
    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    /// `mtllib` reference; empty if the file has none.
    pub fn material_library(&self) -> &str {
        &self.material_library
    }

    pub fn material_usages(&self) -> &[String] {
        &self.material_usages
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn uvs(&self) -> &[[f32; 2]] {
        &self.uvs
    }

    pub fn face_groups(&self) -> &[Vec<FaceCorner>] {
        &self.face_groups
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    /// Total number of `f` lines recorded across all groups.
    pub fn face_count(&self) -> usize {
        self.face_sizes.iter().map(Vec::len).sum()
    }

    /// `(material, corners)` for each group, in file order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[FaceCorner])> {
        self.material_usages
            .iter()
            .map(String::as_str)
            .zip(self.face_groups.iter().map(Vec::as_slice))
    }

    /// Corners of each face in group `group`. Empty if the group doesn't exist.
    pub fn faces_in_group(&self, group: usize) -> impl Iterator<Item = &[FaceCorner]> {
        let corners = self.face_groups.get(group).map(Vec::as_slice).unwrap_or(&[]);
        let sizes = self.face_sizes.get(group).map(Vec::as_slice).unwrap_or(&[]);
        sizes.iter().scan(0usize, move |start, &n| {
            let face = &corners[*start..*start + n];
            *start += n;
            Some(face)
        })
    }
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("face declared before any usemtl")]
pub struct NoMaterialGroup;

/// Accumulates geometry records while a file is being read.
#[derive(Debug)]
pub struct ObjBuilder {
    data: ObjData,
}

impl Default for ObjBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjBuilder {
    pub fn new() -> Self {
        Self {
            data: ObjData {
                object_name: DEFAULT_OBJECT_NAME.to_owned(),
                material_library: String::new(),
                material_usages: Vec::new(),
                positions: Vec::new(),
                normals: Vec::new(),
                uvs: Vec::new(),
                face_groups: Vec::new(),
                face_sizes: Vec::new(),
            },
        }
    }

    pub fn set_object_name(&mut self, name: &str) {
        self.data.object_name = name.to_owned();
    }

    pub fn set_material_library(&mut self, name: &str) {
        self.data.material_library = name.to_owned();
    }

    /// Opens a new face group.
    pub fn add_material_usage(&mut self, name: &str) {
        self.data.material_usages.push(name.to_owned());
        self.data.face_groups.push(Vec::new());
        self.data.face_sizes.push(Vec::new());
    }

    pub fn add_position(&mut self, position: [f32; 3]) {
        self.data.positions.push(position);
    }

    pub fn add_normal(&mut self, normal: [f32; 3]) {
        self.data.normals.push(normal);
    }

    pub fn add_uv(&mut self, uv: [f32; 2]) {
        self.data.uvs.push(uv);
    }

    /// Appends one face to the most recently opened group.
    pub fn add_face(&mut self, corners: &[FaceCorner]) -> Result<(), NoMaterialGroup> {
        let (Some(group), Some(sizes)) = (
            self.data.face_groups.last_mut(),
            self.data.face_sizes.last_mut(),
        ) else {
            return Err(NoMaterialGroup);
        };
        group.extend_from_slice(corners);
        sizes.push(corners.len());
        Ok(())
    }

    /// Positions read so far; negative face indices resolve against this.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.data.positions.len()
    }

    pub fn build(self) -> ObjData {
        self.data
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ObjError {
    #[error("Line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: DecodeError,
    },

    #[error("Line {line}: '{directive}' is missing its argument")]
    MissingArgument { line: usize, directive: &'static str },

    #[error("Line {line}: face declared before any usemtl")]
    FaceWithoutMaterial { line: usize },
}

impl ObjError {
    pub fn line(&self) -> usize {
        match *self {
            Self::Decode { line, .. }
            | Self::MissingArgument { line, .. }
            | Self::FaceWithoutMaterial { line } => line,
        }
    }

    /// Whether `ErrorPolicy::Skip` may drop the line and continue.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::FaceWithoutMaterial { .. })
    }
}

/// Line-at-a-time OBJ driver. Feed lines in file order, then call
/// [`ObjParser::finish`].
#[derive(Debug)]
pub struct ObjParser {
    builder: ObjBuilder,
    options: ParseOptions,
    // Reused between face lines so a bad corner leaves the group untouched.
    corners: Vec<FaceCorner>,
}

impl ObjParser {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            builder: ObjBuilder::new(),
            options,
            corners: Vec::with_capacity(4),
        }
    }

    pub fn feed_line(
        &mut self,
        line_no: usize,
        line: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), ObjError> {
        let Some((symbol, rest)) = classify_line(line) else {
            return Ok(());
        };

        match self.apply(symbol, rest, line_no) {
            Ok(true) => Ok(()),
            Ok(false) => {
                sink.report(Diagnostic::unknown_directive(line_no, symbol));
                Ok(())
            }
            Err(err) if err.is_recoverable() && self.options.error_policy == ErrorPolicy::Skip => {
                let (token, cause): (&str, &dyn std::error::Error) = match &err {
                    ObjError::Decode { source, .. } => (source.token().unwrap_or(symbol), source),
                    _ => (symbol, &err),
                };
                sink.report(Diagnostic::skipped_line(line_no, token, cause));
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Returns `false` for directives this driver does not handle.
    fn apply(&mut self, symbol: &str, mut rest: Cursor<'_>, line: usize) -> Result<bool, ObjError> {
        let decode = |source| ObjError::Decode { line, source };

        match symbol {
            "mtllib" => {
                let name = rest.next().ok_or(ObjError::MissingArgument {
                    line,
                    directive: "mtllib",
                })?;
                self.builder.set_material_library(name);
            }
            "usemtl" => {
                let name = rest.next().ok_or(ObjError::MissingArgument {
                    line,
                    directive: "usemtl",
                })?;
                self.builder.add_material_usage(name);
            }
            "o" => {
                let name = rest.next().ok_or(ObjError::MissingArgument {
                    line,
                    directive: "o",
                })?;
                self.builder.set_object_name(name);
            }
            "v" => {
                let position = decode_floats::<3>(&mut rest).map_err(decode)?;
                self.builder.add_position(position);
            }
            "vn" => {
                let normal = decode_floats::<3>(&mut rest).map_err(decode)?;
                self.builder.add_normal(normal);
            }
            "vt" => {
                let uv = decode_floats::<2>(&mut rest).map_err(decode)?;
                self.builder.add_uv(uv);
            }
            "f" => {
                if self.builder.data.face_groups.is_empty() {
                    return Err(ObjError::FaceWithoutMaterial { line });
                }
                let vertex_count = self.builder.vertex_count();
                self.corners.clear();
                for token in rest {
                    let corner = decode_face_corner(token, vertex_count).map_err(decode)?;
                    self.corners.push(corner);
                }
                if self.corners.is_empty() {
                    return Err(ObjError::MissingArgument {
                        line,
                        directive: "f",
                    });
                }
                self.builder
                    .add_face(&self.corners)
                    .map_err(|NoMaterialGroup| ObjError::FaceWithoutMaterial { line })?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub fn finish(self) -> ObjData {
        self.builder.build()
    }
}

/// Parse already-split lines. Line numbers are 1-based positions in `lines`.
pub fn parse_obj_lines<I, S>(
    lines: I,
    options: &ParseOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<ObjData, ObjError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = ObjParser::new(*options);
    for (idx, line) in lines.into_iter().enumerate() {
        parser.feed_line(idx + 1, line.as_ref(), sink)?;
    }
    Ok(parser.finish())
}

/// Load an OBJ file, reporting diagnostics through `log`.
pub fn load_obj_from_path(path: impl AsRef<Path>) -> Result<ObjData> {
    load_obj_from_path_with(path, &ParseOptions::default(), &mut LogSink)
}

/// Load an OBJ file with explicit options and diagnostic sink.
/// Refuses paths without an `.obj` extension before opening them.
pub fn load_obj_from_path_with(
    path: impl AsRef<Path>,
    options: &ParseOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<ObjData> {
    let path = path.as_ref();
    if !objcore::file_extension_matches(path, "obj") {
        bail!("Not an OBJ file: {}", path.display());
    }
    let file = File::open(path)
        .with_context(|| format!("Failed to open OBJ file: {}", path.display()))?;
    log::debug!("Parsing OBJ {}", path.display());
    load_obj_from_reader(BufReader::new(file), options, sink)
        .with_context(|| format!("Failed to parse OBJ file: {}", path.display()))
}

/// Load an OBJ mesh from a [`BufRead`] implementation.
pub fn load_obj_from_reader<R: BufRead>(
    reader: R,
    options: &ParseOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<ObjData> {
    let mut parser = ObjParser::new(*options);
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", idx + 1))?;
        parser.feed_line(idx + 1, &line, sink)?;
    }
    Ok(parser.finish())
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str) -> Result<ObjData> {
    load_obj_from_reader(io::Cursor::new(contents), &ParseOptions::default(), &mut LogSink)
}

/// Where the `mtllib` of `data` lives, relative to the OBJ file itself.
pub fn material_library_path(obj_path: impl AsRef<Path>, data: &ObjData) -> Option<PathBuf> {
    if data.material_library.is_empty() {
        return None;
    }
    let dir = obj_path.as_ref().parent().unwrap_or_else(|| Path::new(""));
    Some(dir.join(&data.material_library))
}
