//! MTL material library parser.
//!
//! Each `newmtl` opens a record and the attribute lines that follow fill it
//! in, so a missing attribute simply stays `None` instead of shifting every
//! later material.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use objcore::{Cursor, DecodeError, classify_line, decode_float, decode_floats};
use thiserror::Error;

use crate::diag::{Diagnostic, DiagnosticSink, LogSink};
use crate::options::{ErrorPolicy, ParseOptions};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Material {
    pub name: String,
    /// `Ka`
    pub ambient: Option<[f32; 3]>,
    /// `Kd`
    pub diffuse: Option<[f32; 3]>,
    /// `Ks`
    pub specular: Option<[f32; 3]>,
    /// `Ns`
    pub specular_exponent: Option<f32>,
    /// `Ni`
    pub optical_density: Option<f32>,
    /// `d`, 1.0 is fully opaque.
    pub dissolve: Option<f32>,
    /// `map_Kd`, as written in the file.
    pub diffuse_map: Option<String>,
}

impl Material {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }
}

/// Parsed material file, materials in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialLibrary {
    materials: Vec<Material>,
}

impl MaterialLibrary {
    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Looks up a material by name. If a name is declared twice the later
    /// declaration wins, matching how renderers bind `usemtl`.
    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.iter().rev().find(|m| m.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.materials.iter().map(|m| m.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Path of `name`'s diffuse map, resolved against `base_dir` (usually the
    /// directory the library was loaded from).
    pub fn resolve_diffuse_map(&self, name: &str, base_dir: impl AsRef<Path>) -> Option<PathBuf> {
        let map = self.get(name)?.diffuse_map.as_deref()?;
        Some(base_dir.as_ref().join(map))
    }
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("material attribute before any newmtl")]
pub struct NoCurrentMaterial;

#[derive(Debug, Default)]
pub struct MtlBuilder {
    materials: Vec<Material>,
}

impl MtlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_material(&mut self, name: &str) {
        self.materials.push(Material::new(name));
    }

    /// Material currently being filled in.
    pub fn current(&mut self) -> Result<&mut Material, NoCurrentMaterial> {
        self.materials.last_mut().ok_or(NoCurrentMaterial)
    }

    pub fn set_ambient(&mut self, rgb: [f32; 3]) -> Result<(), NoCurrentMaterial> {
        self.current()?.ambient = Some(rgb);
        Ok(())
    }

    pub fn set_diffuse(&mut self, rgb: [f32; 3]) -> Result<(), NoCurrentMaterial> {
        self.current()?.diffuse = Some(rgb);
        Ok(())
    }

    pub fn set_specular(&mut self, rgb: [f32; 3]) -> Result<(), NoCurrentMaterial> {
        self.current()?.specular = Some(rgb);
        Ok(())
    }

    pub fn set_specular_exponent(&mut self, value: f32) -> Result<(), NoCurrentMaterial> {
        self.current()?.specular_exponent = Some(value);
        Ok(())
    }

    pub fn set_optical_density(&mut self, value: f32) -> Result<(), NoCurrentMaterial> {
        self.current()?.optical_density = Some(value);
        Ok(())
    }

    pub fn set_dissolve(&mut self, value: f32) -> Result<(), NoCurrentMaterial> {
        self.current()?.dissolve = Some(value);
        Ok(())
    }

    pub fn set_diffuse_map(&mut self, path: &str) -> Result<(), NoCurrentMaterial> {
        self.current()?.diffuse_map = Some(path.to_owned());
        Ok(())
    }

    pub fn build(self) -> MaterialLibrary {
        MaterialLibrary {
            materials: self.materials,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum MtlError {
    #[error("Line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: DecodeError,
    },

    #[error("Line {line}: '{directive}' is missing its argument")]
    MissingArgument { line: usize, directive: &'static str },

    #[error("Line {line}: '{directive}' before any newmtl")]
    AttributeWithoutMaterial { line: usize, directive: &'static str },
}

impl MtlError {
    pub fn line(&self) -> usize {
        match *self {
            Self::Decode { line, .. }
            | Self::MissingArgument { line, .. }
            | Self::AttributeWithoutMaterial { line, .. } => line,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::AttributeWithoutMaterial { .. })
    }
}

#[derive(Debug)]
pub struct MtlParser {
    builder: MtlBuilder,
    options: ParseOptions,
}

impl MtlParser {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            builder: MtlBuilder::new(),
            options,
        }
    }

    pub fn feed_line(
        &mut self,
        line_no: usize,
        line: &str,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), MtlError> {
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
                    MtlError::Decode { source, .. } => (source.token().unwrap_or(symbol), source),
                    _ => (symbol, &err),
                };
                sink.report(Diagnostic::skipped_line(line_no, token, cause));
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn apply(&mut self, symbol: &str, mut rest: Cursor<'_>, line: usize) -> Result<bool, MtlError> {
        let directive: &'static str = match symbol {
            "newmtl" => "newmtl",
            "Ka" => "Ka",
            "Kd" => "Kd",
            "Ks" => "Ks",
            "Ns" => "Ns",
            "Ni" => "Ni",
            "d" => "d",
            "map_Kd" => "map_Kd",
            _ => return Ok(false),
        };
        let decode = |source| MtlError::Decode { line, source };
        let missing = MtlError::MissingArgument { line, directive };

        if directive == "newmtl" {
            let name = rest.next().ok_or(missing)?;
            self.builder.new_material(name);
            return Ok(true);
        }

        // Attribute lines need an open material before anything is decoded.
        let builder = &mut self.builder;
        builder
            .current()
            .map_err(|NoCurrentMaterial| MtlError::AttributeWithoutMaterial { line, directive })?;

        let res = match directive {
            "Ka" => builder.set_ambient(decode_floats::<3>(&mut rest).map_err(decode)?),
            "Kd" => builder.set_diffuse(decode_floats::<3>(&mut rest).map_err(decode)?),
            "Ks" => builder.set_specular(decode_floats::<3>(&mut rest).map_err(decode)?),
            "Ns" => builder.set_specular_exponent(scalar(&mut rest).map_err(decode)?),
            "Ni" => builder.set_optical_density(scalar(&mut rest).map_err(decode)?),
            "d" => builder.set_dissolve(scalar(&mut rest).map_err(decode)?),
            _ => builder.set_diffuse_map(texture_file(rest).ok_or(missing)?),
        };
        res.map_err(|NoCurrentMaterial| MtlError::AttributeWithoutMaterial { line, directive })?;
        Ok(true)
    }

    pub fn finish(self) -> MaterialLibrary {
        self.builder.build()
    }
}

fn scalar(rest: &mut Cursor<'_>) -> Result<f32, DecodeError> {
    let [value] = decode_floats::<1>(rest)?;
    Ok(value)
}

/// File name of a `map_*` line, after any texture options
/// (`-s 1 1 1`, `-bm 0.5`, `-clamp on`, ...). The name runs to the end of the
/// line so paths with spaces survive.
fn texture_file(mut rest: Cursor<'_>) -> Option<&str> {
    loop {
        let word = rest.rest().trim();
        let option = rest.next_word()?;
        if !option.starts_with('-') {
            return Some(word);
        }
        match option {
            "-blendu" | "-blendv" | "-bm" | "-boost" | "-cc" | "-clamp" | "-imfchan"
            | "-texres" | "-type" => {
                rest.next_word()?;
            }
            "-mm" => {
                rest.next_word()?;
                rest.next_word()?;
            }
            // u [v [w]]
            "-o" | "-s" | "-t" => {
                rest.next_word()?;
                for _ in 0..2 {
                    let mut peek = rest;
                    match peek.next_word() {
                        Some(value) if decode_float(value).is_ok() => rest = peek,
                        _ => break,
                    }
                }
            }
            _ => {}
        }
    }
}

pub fn parse_mtl_lines<I, S>(
    lines: I,
    options: &ParseOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<MaterialLibrary, MtlError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = MtlParser::new(*options);
    for (idx, line) in lines.into_iter().enumerate() {
        parser.feed_line(idx + 1, line.as_ref(), sink)?;
    }
    Ok(parser.finish())
}

pub fn load_mtl_from_path(path: impl AsRef<Path>) -> Result<MaterialLibrary> {
    load_mtl_from_path_with(path, &ParseOptions::default(), &mut LogSink)
}

pub fn load_mtl_from_path_with(
    path: impl AsRef<Path>,
    options: &ParseOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<MaterialLibrary> {
    let path = path.as_ref();
    if !objcore::file_extension_matches(path, "mtl") {
        bail!("Not an MTL file: {}", path.display());
    }
    let file = File::open(path)
        .with_context(|| format!("Failed to open MTL file: {}", path.display()))?;
    log::debug!("Parsing MTL {}", path.display());
    load_mtl_from_reader(BufReader::new(file), options, sink)
        .with_context(|| format!("Failed to parse MTL file: {}", path.display()))
}

pub fn load_mtl_from_reader<R: BufRead>(
    reader: R,
    options: &ParseOptions,
    sink: &mut dyn DiagnosticSink,
) -> Result<MaterialLibrary> {
    let mut parser = MtlParser::new(*options);
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", idx + 1))?;
        parser.feed_line(idx + 1, &line, sink)?;
    }
    Ok(parser.finish())
}

pub fn load_mtl_from_str(contents: &str) -> Result<MaterialLibrary> {
    load_mtl_from_reader(io::Cursor::new(contents), &ParseOptions::default(), &mut LogSink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::{Diagnostics, NullSink};

    fn parse(lines: &[&str]) -> (Result<MaterialLibrary, MtlError>, Diagnostics) {
        let mut diags = Diagnostics::new();
        let res = parse_mtl_lines(lines, &ParseOptions::default(), &mut diags);
        (res, diags)
    }

    #[test]
    fn single_red_material() {
        let (res, diags) = parse(&["newmtl Red", "Kd 1.0 0.0 0.0", "d 0.5"]);
        let lib = res.unwrap();
        assert!(diags.is_empty());
        assert_eq!(lib.names().collect::<Vec<_>>(), vec!["Red"]);
        let red = &lib.materials()[0];
        assert_eq!(red.diffuse, Some([1.0, 0.0, 0.0]));
        assert_eq!(red.dissolve, Some(0.5));
        assert_eq!(red.ambient, None);
    }

    #[test]
    fn full_library() {
        let src = r#"
            # Blender MTL File
            newmtl Wood
            Ns 96.0784
            Ka 0.1 0.1 0.1
            Kd 0.64 0.4 0.2
            Ks 0.5 0.5 0.5
            Ni 1.45
            d 1.0
            illum 2
            map_Kd wood.png

            newmtl Glass
            Kd 0.9 0.9 1.0
            d 0.25
        "#;
        let lib = load_mtl_from_str(src).expect("parse mtl");
        assert_eq!(lib.len(), 2);

        let wood = lib.get("Wood").unwrap();
        assert_eq!(wood.specular_exponent, Some(96.0784));
        assert_eq!(wood.ambient, Some([0.1, 0.1, 0.1]));
        assert_eq!(wood.specular, Some([0.5, 0.5, 0.5]));
        assert_eq!(wood.optical_density, Some(1.45));
        assert_eq!(wood.diffuse_map.as_deref(), Some("wood.png"));

        // Glass has no Ka line; nothing shifts into it from Wood.
        let glass = lib.get("Glass").unwrap();
        assert_eq!(glass.ambient, None);
        assert_eq!(glass.dissolve, Some(0.25));
        assert_eq!(glass.diffuse_map, None);
    }

    #[test]
    fn attribute_before_newmtl_is_fatal() {
        let (res, _) = parse(&["Kd 1 1 1"]);
        assert_eq!(
            res,
            Err(MtlError::AttributeWithoutMaterial {
                line: 1,
                directive: "Kd"
            })
        );
        // Even a malformed attribute reports the structural problem first.
        let (res, _) = parse(&["d nope"]);
        assert!(matches!(res, Err(MtlError::AttributeWithoutMaterial { .. })));
    }

    #[test]
    fn malformed_value_skips_line() {
        let (res, diags) = parse(&["newmtl A", "Ns x", "Kd 1 0", "Ni 1.5"]);
        let lib = res.unwrap();
        let a = lib.get("A").unwrap();
        assert_eq!(a.specular_exponent, None);
        assert_eq!(a.diffuse, None);
        assert_eq!(a.optical_density, Some(1.5));
        assert_eq!(diags.skipped_lines(), 2);
    }

    #[test]
    fn malformed_value_aborts_when_strict() {
        let mut sink = NullSink;
        let res = parse_mtl_lines(["newmtl A", "Ns x"], &ParseOptions::strict(), &mut sink);
        assert!(matches!(
            res,
            Err(MtlError::Decode {
                line: 2,
                source: DecodeError::InvalidFloat { .. }
            })
        ));
    }

    #[test]
    fn unknown_directives_are_warnings() {
        let (res, diags) = parse(&["newmtl A", "illum 2", "map_Bump n.png"]);
        assert_eq!(res.unwrap().len(), 1);
        assert_eq!(diags.unknown_directives(), 2);
    }

    #[test]
    fn diffuse_map_takes_file_after_options() {
        let (res, _) = parse(&["newmtl A", "map_Kd -s 1 1 1 textures/a.png"]);
        let lib = res.unwrap();
        assert_eq!(lib.get("A").unwrap().diffuse_map.as_deref(), Some("textures/a.png"));
        assert_eq!(
            lib.resolve_diffuse_map("A", "assets"),
            Some(PathBuf::from("assets/textures/a.png"))
        );
        assert_eq!(lib.resolve_diffuse_map("B", "assets"), None);
    }

    #[test]
    fn texture_options_are_skipped() {
        let (res, _) = parse(&[
            "newmtl A",
            "map_Kd -clamp on -mm 0 1 -o 0.5 a.png",
            "newmtl B",
            "map_Kd -s 2 b.png",
            "newmtl C",
            "map_Kd my texture.png",
        ]);
        let lib = res.unwrap();
        assert_eq!(lib.get("A").unwrap().diffuse_map.as_deref(), Some("a.png"));
        assert_eq!(lib.get("B").unwrap().diffuse_map.as_deref(), Some("b.png"));
        assert_eq!(lib.get("C").unwrap().diffuse_map.as_deref(), Some("my texture.png"));
    }

    #[test]
    fn texture_options_without_file_are_missing_argument() {
        let mut sink = NullSink;
        let res = parse_mtl_lines(
            ["newmtl A", "map_Kd -s 1 1 1"],
            &ParseOptions::strict(),
            &mut sink,
        );
        assert_eq!(
            res,
            Err(MtlError::MissingArgument {
                line: 2,
                directive: "map_Kd"
            })
        );

        let (res, diags) = parse(&["newmtl A", "map_Kd -bm 0.5", "map_Kd"]);
        assert_eq!(res.unwrap().get("A").unwrap().diffuse_map, None);
        assert_eq!(diags.skipped_lines(), 2);
    }

    #[test]
    fn later_declaration_wins() {
        let (res, _) = parse(&["newmtl A", "d 0.1", "newmtl A", "d 0.9"]);
        let lib = res.unwrap();
        assert_eq!(lib.len(), 2);
        assert_eq!(lib.get("A").unwrap().dissolve, Some(0.9));
    }

    #[test]
    fn missing_name_is_skipped() {
        let (res, diags) = parse(&["newmtl", "newmtl B"]);
        assert_eq!(res.unwrap().names().collect::<Vec<_>>(), vec!["B"]);
        assert_eq!(diags.skipped_lines(), 1);
    }

    #[test]
    fn reparse_is_identical() {
        let lines = ["newmtl A", "Ka 0.2 0.3 0.4", "Ns 10", "map_Kd a.png"];
        let (a, _) = parse(&lines);
        let (b, _) = parse(&lines);
        assert_eq!(a.unwrap(), b.unwrap());
    }
}
