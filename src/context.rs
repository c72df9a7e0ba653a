//! `Context`: the library's top-level handle (spec §4.8, §6). Unlike the
//! rest of this crate, which propagates `Result<_, CodecError>`, every
//! `Context` method latches failures into `last_error` and returns a
//! plain value (`bool`/`Option<_>`), mirroring the reference API's opaque
//! handle plus `ctmGetError` pattern rather than Rust's usual `?`-chaining
//! - callers that want `Result` should use `codec::{encode_mesh,
//! decode_mesh}` directly.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::codec::{decode_mesh, encode_mesh, Mg2Precision};
use crate::container::CompressionMethod;
use crate::error::{CodecError, ErrorKind};
use crate::mesh::{AttribMap, Mesh, TexMap};

/// Whether a `Context` reads (`Import`) or writes (`Export`) meshes. Fixed
/// for the lifetime of the context, like the reference API's
/// `CTM_IMPORT`/`CTM_EXPORT` constructor argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Import,
    Export,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Fresh,
    Loaded,
    Defined,
    Failed,
}

/// The codec's top-level handle: one `Context` per load or save.
pub struct Context {
    mode: Mode,
    state: State,
    mesh: Option<Mesh>,
    method: CompressionMethod,
    mg2_precision: Mg2Precision,
    last_error: ErrorKind,
}

impl Context {
    pub fn new(mode: Mode) -> Self {
        Context {
            mode,
            state: State::Fresh,
            mesh: None,
            method: CompressionMethod::default(),
            mg2_precision: Mg2Precision::default(),
            last_error: ErrorKind::None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Returns the latched error and clears it back to `NONE` (spec §6
    /// `ctmGetError`); the second call in a row always sees `NONE`.
    pub fn get_error(&mut self) -> ErrorKind {
        std::mem::replace(&mut self.last_error, ErrorKind::None)
    }

    fn fail(&mut self, err: CodecError) {
        log::error!("context operation failed: {err}");
        self.last_error = err.to_error_kind();
        self.state = State::Failed;
    }

    /// Latches an error for a misuse of the API surface (wrong mode,
    /// wrong state, bad argument) without moving the context to `Failed` -
    /// these are recoverable, unlike a corrupt stream.
    fn reject(&mut self, msg: &'static str, kind: ErrorKind) {
        log::warn!("context rejected operation: {msg}");
        self.last_error = kind;
    }

    /// Like [`Context::reject`], but for call sites that already have a
    /// `CodecError` in hand (e.g. a failed name lookup) rather than a bare
    /// message/kind pair.
    fn reject_codec(&mut self, err: CodecError) {
        log::warn!("context rejected operation: {err}");
        self.last_error = err.to_error_kind();
    }

    pub fn set_compression_method(&mut self, method: CompressionMethod) -> bool {
        if self.mode != Mode::Export {
            self.reject("set_compression_method is only valid in Export mode", ErrorKind::InvalidOperation);
            return false;
        }
        self.method = method;
        true
    }

    pub fn set_vertex_precision(&mut self, precision: f32) -> bool {
        if !(precision.is_finite() && precision > 0.0) {
            self.reject("vertex precision must be positive and finite", ErrorKind::InvalidArgument);
            return false;
        }
        self.mg2_precision.vertex = precision;
        true
    }

    /// Sets the absolute vertex precision to `k` times the mean edge
    /// length of the currently defined mesh (spec §4.3
    /// `set_vertex_precision_rel`).
    pub fn set_vertex_precision_rel(&mut self, k: f32) -> bool {
        if !(k.is_finite() && k > 0.0) {
            self.reject("relative precision factor must be positive and finite", ErrorKind::InvalidArgument);
            return false;
        }
        let Some(mesh) = &self.mesh else {
            self.reject("set_vertex_precision_rel requires a defined mesh", ErrorKind::InvalidOperation);
            return false;
        };
        self.mg2_precision.vertex = k * mesh.mean_edge_length();
        true
    }

    pub fn set_normal_precision(&mut self, precision: f32) -> bool {
        if !(precision.is_finite() && precision > 0.0) {
            self.reject("normal precision must be positive and finite", ErrorKind::InvalidArgument);
            return false;
        }
        self.mg2_precision.normal = precision;
        true
    }

    pub fn set_tex_coord_precision(&mut self, name: &str, precision: f32) -> bool {
        if !(precision.is_finite() && precision > 0.0) {
            self.reject("precision must be positive and finite", ErrorKind::InvalidArgument);
            return false;
        }
        let Some(mesh) = &mut self.mesh else {
            self.reject("no mesh defined", ErrorKind::InvalidOperation);
            return false;
        };
        match mesh.tex_maps.iter_mut().find(|m| m.name == name) {
            Some(m) => {
                m.precision = precision;
                true
            }
            None => {
                self.reject("no tex map with that name", ErrorKind::InvalidArgument);
                false
            }
        }
    }

    pub fn set_attrib_precision(&mut self, name: &str, precision: f32) -> bool {
        if !(precision.is_finite() && precision > 0.0) {
            self.reject("precision must be positive and finite", ErrorKind::InvalidArgument);
            return false;
        }
        let Some(mesh) = &mut self.mesh else {
            self.reject("no mesh defined", ErrorKind::InvalidOperation);
            return false;
        };
        match mesh.attrib_maps.iter_mut().find(|m| m.name == name) {
            Some(m) => {
                m.precision = precision;
                true
            }
            None => {
                self.reject("no attribute map with that name", ErrorKind::InvalidArgument);
                false
            }
        }
    }

    pub fn set_file_comment(&mut self, comment: impl Into<String>) -> bool {
        match &mut self.mesh {
            Some(mesh) => {
                mesh.comment = Some(comment.into());
                true
            }
            None => {
                self.reject("no mesh defined", ErrorKind::InvalidOperation);
                false
            }
        }
    }

    /// Supplies the mesh to export (spec §4.8). Valid only in `Export`
    /// mode.
    pub fn define_mesh(&mut self, mesh: Mesh) -> bool {
        if self.mode != Mode::Export {
            self.reject("define_mesh is only valid in Export mode", ErrorKind::InvalidOperation);
            return false;
        }
        match mesh.validate() {
            Ok(()) => {
                self.mesh = Some(mesh);
                self.state = State::Defined;
                true
            }
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    pub fn add_tex_map(&mut self, map: TexMap) -> bool {
        self.mutate_defined_mesh(|mesh| mesh.tex_maps.push(map))
    }

    pub fn add_attrib_map(&mut self, map: AttribMap) -> bool {
        self.mutate_defined_mesh(|mesh| mesh.attrib_maps.push(map))
    }

    fn mutate_defined_mesh(&mut self, f: impl FnOnce(&mut Mesh)) -> bool {
        if self.mode != Mode::Export || self.state != State::Defined {
            self.reject("a mesh must be defined before adding maps", ErrorKind::InvalidOperation);
            return false;
        }
        let mesh = self.mesh.as_mut().expect("Defined state implies a mesh is present");
        f(mesh);
        match mesh.validate() {
            Ok(()) => true,
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    /// Reads a mesh through `r` (spec §6 `ctmLoadCustom`). Valid only in
    /// `Import` mode.
    pub fn load<R: Read>(&mut self, r: &mut R) -> bool {
        if self.mode != Mode::Import {
            self.reject("load is only valid in Import mode", ErrorKind::InvalidOperation);
            return false;
        }
        match decode_mesh(r) {
            Ok(mesh) => {
                self.mesh = Some(mesh);
                self.state = State::Loaded;
                true
            }
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    /// Alias for [`Context::load`]; kept distinct because the reference
    /// API exposes both a file-path entry point and a callback-pair entry
    /// point under these two names, and both collapse to the same
    /// `Read`-generic call here.
    pub fn load_custom<R: Read>(&mut self, r: &mut R) -> bool {
        self.load(r)
    }

    /// Opens `path` and loads through it (spec §6 `ctmLoad`, the
    /// file-path entry point distinct from `load_custom`'s callback pair).
    /// A failure to open the file latches `FILE_ERROR` without touching
    /// `state`, since no decode has been attempted yet.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> bool {
        if self.mode != Mode::Import {
            self.reject("load is only valid in Import mode", ErrorKind::InvalidOperation);
            return false;
        }
        let file = match File::open(path.as_ref()) {
            Ok(f) => f,
            Err(e) => {
                self.reject_io(e);
                return false;
            }
        };
        self.load(&mut BufReader::new(file))
    }

    /// Writes the defined mesh through `w` (spec §6 `ctmSaveCustom`).
    /// Valid only in `Export` mode with a mesh already defined.
    pub fn save<W: Write>(&mut self, w: &mut W) -> bool {
        if self.mode != Mode::Export || self.state != State::Defined {
            self.reject("save requires a defined mesh in Export mode", ErrorKind::InvalidOperation);
            return false;
        }
        let mesh = self.mesh.as_ref().expect("Defined state implies a mesh is present").clone();
        match encode_mesh(w, &mesh, self.method, self.mg2_precision) {
            Ok(()) => true,
            Err(e) => {
                self.fail(e);
                false
            }
        }
    }

    pub fn save_custom<W: Write>(&mut self, w: &mut W) -> bool {
        self.save(w)
    }

    /// Creates `path` and saves through it (spec §6 `ctmSave`, the
    /// file-path entry point distinct from `save_custom`'s callback pair).
    pub fn save_file(&mut self, path: impl AsRef<Path>) -> bool {
        if self.mode != Mode::Export || self.state != State::Defined {
            self.reject("save requires a defined mesh in Export mode", ErrorKind::InvalidOperation);
            return false;
        }
        let file = match File::create(path.as_ref()) {
            Ok(f) => f,
            Err(e) => {
                self.reject_io(e);
                return false;
            }
        };
        self.save(&mut BufWriter::new(file))
    }

    /// Latches a bare file-open/create failure as `FILE_ERROR` without
    /// moving to `Failed` - the context has not attempted a decode, so a
    /// retry with a different path is still meaningful.
    fn reject_io(&mut self, e: std::io::Error) {
        log::warn!("context file operation failed: {e}");
        self.last_error = ErrorKind::FileError;
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.mesh.as_ref()
    }

    pub fn vertex_count(&self) -> u32 {
        self.mesh.as_ref().map(|m| m.vertex_count() as u32).unwrap_or(0)
    }

    pub fn triangle_count(&self) -> u32 {
        self.mesh.as_ref().map(|m| m.triangle_count() as u32).unwrap_or(0)
    }

    pub fn has_normals(&self) -> bool {
        self.mesh.as_ref().map(|m| m.has_normals()).unwrap_or(false)
    }

    /// Spec §6's `get_named_tex_map`: `None` is itself the "not found"
    /// sentinel (`TexMapId | NONE`), so this does not latch an error.
    pub fn get_named_tex_map(&self, name: &str) -> Option<&TexMap> {
        self.mesh.as_ref().and_then(|m| m.tex_map_by_name(name))
    }

    /// Spec §6's `get_named_attrib_map`: see [`Context::get_named_tex_map`].
    pub fn get_named_attrib_map(&self, name: &str) -> Option<&AttribMap> {
        self.mesh.as_ref().and_then(|m| m.attrib_map_by_name(name))
    }

    /// A stricter name-based lookup for callers that treat an unknown map
    /// name as a genuine usage error rather than a sentinel to check for
    /// (SPEC_FULL.md §9): latches `CodecError::NoSuchMap` (`INVALID_ARGUMENT`
    /// at the boundary) when `name` isn't registered, instead of silently
    /// returning `None`.
    pub fn tex_map_by_name(&mut self, name: &str) -> Option<&TexMap> {
        let found = self.mesh.as_ref().is_some_and(|m| m.tex_map_by_name(name).is_some());
        if !found {
            self.reject_codec(CodecError::NoSuchMap(name.to_string()));
            return None;
        }
        self.mesh.as_ref().and_then(|m| m.tex_map_by_name(name))
    }

    /// See [`Context::tex_map_by_name`].
    pub fn attrib_map_by_name(&mut self, name: &str) -> Option<&AttribMap> {
        let found = self.mesh.as_ref().is_some_and(|m| m.attrib_map_by_name(name).is_some());
        if !found {
            self.reject_codec(CodecError::NoSuchMap(name.to_string()));
            return None;
        }
        self.mesh.as_ref().and_then(|m| m.attrib_map_by_name(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tetrahedron() -> Mesh {
        Mesh {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            indices: vec![[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]],
            normals: None,
            tex_maps: vec![],
            attrib_maps: vec![],
            comment: Some("t".to_string()),
        }
    }

    #[test]
    fn export_then_import_roundtrip() {
        let mut export = Context::new(Mode::Export);
        assert!(export.set_compression_method(CompressionMethod::Mg1));
        assert!(export.define_mesh(tetrahedron()));

        let mut buf = Vec::new();
        assert!(export.save(&mut buf));

        let mut import = Context::new(Mode::Import);
        let mut cur = Cursor::new(buf);
        assert!(import.load(&mut cur));
        assert_eq!(import.vertex_count(), 4);
        assert_eq!(import.triangle_count(), 4);
    }

    #[test]
    fn save_in_import_mode_latches_invalid_operation_then_clears() {
        let mut ctx = Context::new(Mode::Import);
        let mut buf = Vec::new();
        assert!(!ctx.save(&mut buf));
        assert_eq!(ctx.get_error(), ErrorKind::InvalidOperation);
        assert_eq!(ctx.get_error(), ErrorKind::None);
    }

    #[test]
    fn short_read_latches_file_error_and_fails_context() {
        let mut ctx = Context::new(Mode::Import);
        let mut cur = Cursor::new(b"NOPE".to_vec());
        assert!(!ctx.load(&mut cur));
        assert_eq!(ctx.get_error(), ErrorKind::FormatError);
        assert_eq!(ctx.state, State::Failed);
    }

    #[test]
    fn set_vertex_precision_rel_uses_mean_edge_length() {
        let mut ctx = Context::new(Mode::Export);
        assert!(ctx.define_mesh(tetrahedron()));
        assert!(ctx.set_vertex_precision_rel(0.5));
        assert!(ctx.mg2_precision.vertex > 0.0);
    }

    #[test]
    fn named_tex_map_lookup_after_roundtrip() {
        let mut mesh = Mesh {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            indices: vec![[0, 1, 2], [0, 2, 3]],
            normals: None,
            tex_maps: vec![],
            attrib_maps: vec![],
            comment: None,
        };
        mesh.tex_maps.push(TexMap::new("P", vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]));

        let mut export = Context::new(Mode::Export);
        export.set_compression_method(CompressionMethod::Mg1);
        assert!(export.define_mesh(mesh));
        let mut buf = Vec::new();
        assert!(export.save(&mut buf));

        let mut import = Context::new(Mode::Import);
        let mut cur = Cursor::new(buf);
        assert!(import.load(&mut cur));
        let map = import.get_named_tex_map("P").expect("named tex map P");
        assert_eq!(map.coords, vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
    }

    #[test]
    fn file_path_roundtrip() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("openctm-context-test-{}.ctm", std::process::id()));

        let mut export = Context::new(Mode::Export);
        assert!(export.define_mesh(tetrahedron()));
        assert!(export.save_file(&path));

        let mut import = Context::new(Mode::Import);
        assert!(import.load_file(&path));
        assert_eq!(import.vertex_count(), 4);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn tex_map_by_name_latches_no_such_map() {
        let mut ctx = Context::new(Mode::Export);
        assert!(ctx.define_mesh(tetrahedron()));
        assert!(ctx.tex_map_by_name("nope").is_none());
        assert_eq!(ctx.get_error(), ErrorKind::InvalidArgument);
        assert_eq!(ctx.get_error(), ErrorKind::None);
    }

    #[test]
    fn load_file_missing_path_latches_file_error() {
        let mut ctx = Context::new(Mode::Import);
        assert!(!ctx.load_file("/nonexistent/path/does-not-exist.ctm"));
        assert_eq!(ctx.get_error(), ErrorKind::FileError);
        assert_eq!(ctx.get_error(), ErrorKind::None);
    }
}
