//! objinspect: parse an OBJ file (and its material library) and log a summary.
//!
//! Usage: objinspect <file.obj> [--strict] [--mtl=<file.mtl>] [--no-mtl] [--textures]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use asset::{
    Diagnostics, ErrorPolicy, MaterialLibrary, ObjData, ParseOptions, build_submeshes,
    mtl::load_mtl_from_path_with,
    obj::{load_obj_from_path_with, material_library_path},
    texture::TextureData,
};

#[derive(Debug, Default)]
struct Args {
    obj_path: Option<PathBuf>,
    mtl_path: Option<PathBuf>,
    strict: bool,
    no_mtl: bool,
    textures: bool,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    for arg in std::env::args().skip(1) {
        if arg == "--strict" {
            args.strict = true;
        } else if arg == "--no-mtl" {
            args.no_mtl = true;
        } else if arg == "--textures" {
            args.textures = true;
        } else if let Some(val) = arg.strip_prefix("--mtl=") {
            args.mtl_path = Some(PathBuf::from(val));
        } else if arg.starts_with("--") {
            log::warn!("Unknown flag '{}', ignoring.", arg);
        } else {
            args.obj_path = Some(PathBuf::from(arg));
        }
    }
    args
}

fn report_diagnostics(what: &str, diags: &Diagnostics) {
    for d in diags.iter() {
        log::debug!("{}: {}", what, d);
    }
    if !diags.is_empty() {
        log::warn!(
            "{}: {} line(s) skipped, {} unhandled directive(s)",
            what,
            diags.skipped_lines(),
            diags.unknown_directives()
        );
    }
}

fn summarize_obj(data: &ObjData) -> Result<()> {
    log::info!(
        "Object '{}': {} positions, {} normals, {} uvs, {} faces in {} group(s)",
        data.object_name(),
        data.positions().len(),
        data.normals().len(),
        data.uvs().len(),
        data.face_count(),
        data.material_usages().len()
    );
    for sub in build_submeshes(data)? {
        log::info!(
            "  usemtl {}: {} vertices, {} triangles",
            sub.material,
            sub.mesh.vertices.len(),
            sub.mesh.triangle_count()
        );
    }
    Ok(())
}

fn summarize_mtl(lib: &MaterialLibrary, data: &ObjData, base_dir: &Path, textures: bool) {
    log::info!("Material library: {} material(s)", lib.len());
    for name in data.material_usages() {
        if lib.get(name).is_none() {
            log::warn!("usemtl '{}' has no matching newmtl", name);
        }
    }
    if !textures {
        return;
    }
    for material in lib.materials() {
        let Some(path) = lib.resolve_diffuse_map(&material.name, base_dir) else {
            continue;
        };
        match TextureData::load(&path) {
            Ok(tex) => log::info!(
                "  {}: map_Kd {} ({}x{})",
                material.name,
                path.display(),
                tex.width,
                tex.height
            ),
            Err(e) => log::warn!("  {}: {:#}", material.name, e),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args();
    let Some(obj_path) = args.obj_path.as_deref() else {
        bail!("Usage: objinspect <file.obj> [--strict] [--mtl=<file.mtl>] [--no-mtl] [--textures]");
    };
    let options = ParseOptions {
        error_policy: if args.strict {
            ErrorPolicy::Abort
        } else {
            ErrorPolicy::Skip
        },
    };
    log::info!("Inspecting {} ({:?})", obj_path.display(), options.error_policy);

    let mut diags = Diagnostics::new();
    let data = load_obj_from_path_with(obj_path, &options, &mut diags)?;
    report_diagnostics("OBJ", &diags);
    summarize_obj(&data).context("Failed to assemble meshes")?;

    if args.no_mtl {
        return Ok(());
    }
    let mtl_path = match args.mtl_path.clone() {
        Some(path) => path,
        None => match material_library_path(obj_path, &data) {
            Some(path) => path,
            None => {
                log::info!("No mtllib referenced.");
                return Ok(());
            }
        },
    };

    let mut diags = Diagnostics::new();
    let lib = load_mtl_from_path_with(&mtl_path, &options, &mut diags)?;
    report_diagnostics("MTL", &diags);
    let base_dir = mtl_path.parent().unwrap_or_else(|| Path::new(""));
    summarize_mtl(&lib, &data, base_dir, args.textures);

    Ok(())
}
