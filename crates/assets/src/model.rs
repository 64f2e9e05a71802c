use glam::Vec3;
use std::path::Path;

use crate::{AssetError, AssetId};

/// Model formats the loader accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Obj,
}

impl ModelFormat {
    pub fn from_path(path: &Path) -> Result<Self, AssetError> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("obj") => Ok(Self::Obj),
            _ => Err(AssetError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Triangle mesh with per-vertex normals, all source objects merged.
#[derive(Debug, Clone)]
pub struct ModelData {
    pub id: AssetId,
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl ModelData {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        match ModelFormat::from_path(path)? {
            ModelFormat::Obj => Self::load_obj(path),
        }
    }

    fn load_obj(path: &Path) -> Result<Self, AssetError> {
        tracing::info!(path = %path.display(), "loading car model");
        let bytes = std::fs::read(path)?;

        let options = tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        };
        let (models, _materials) =
            tobj::load_obj(path, &options).map_err(|e| AssetError::ObjLoad {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if models.len() > 1 {
            tracing::debug!(objects = models.len(), "merging OBJ objects into one mesh");
        }

        let name = models
            .first()
            .map(|m| m.name.clone())
            .filter(|n| !n.is_empty())
            .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "model".to_string());

        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut indices = Vec::new();
        let mut missing_normals = Vec::new();

        for model in &models {
            let mesh = &model.mesh;
            if mesh.positions.is_empty() {
                continue;
            }
            let offset = positions.len() as u32;
            let count = mesh.positions.len() / 3;
            positions.extend(mesh.positions.chunks_exact(3).map(|p| [p[0], p[1], p[2]]));
            if mesh.normals.len() == mesh.positions.len() {
                normals.extend(mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]));
            } else {
                missing_normals.push(offset as usize..offset as usize + count);
                normals.extend(std::iter::repeat_n([0.0; 3], count));
            }
            indices.extend(mesh.indices.iter().map(|i| i + offset));
        }

        if positions.is_empty() || indices.is_empty() {
            return Err(AssetError::EmptyModel(path.to_path_buf()));
        }
        if !missing_normals.is_empty() {
            // Objects never share vertices, so each range only sees its own faces.
            let generated = face_normals(&positions, &indices);
            for range in missing_normals {
                normals[range.clone()].copy_from_slice(&generated[range]);
            }
        }

        let model = Self {
            id: AssetId::of_bytes(&bytes),
            name,
            positions,
            normals,
            indices,
        };
        tracing::info!(
            vertices = model.vertex_count(),
            triangles = model.triangle_count(),
            id = %model.id,
            "car model loaded"
        );
        Ok(model)
    }

    pub fn vertex_count(&self) -> u32 {
        self.positions.len() as u32
    }

    pub fn triangle_count(&self) -> u32 {
        (self.indices.len() / 3) as u32
    }

    /// Axis-aligned bounds as (min, max).
    pub fn bounds(&self) -> (Vec3, Vec3) {
        self.positions.iter().fold(
            (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |(lo, hi), p| {
                let p = Vec3::from_array(*p);
                (lo.min(p), hi.max(p))
            },
        )
    }
}

/// Area-weighted vertex normals accumulated from triangle faces.
fn face_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let pa = Vec3::from_array(positions[a]);
        let pb = Vec3::from_array(positions[b]);
        let pc = Vec3::from_array(positions[c]);
        let n = (pb - pa).cross(pc - pa);
        acc[a] += n;
        acc[b] += n;
        acc[c] += n;
    }
    acc.into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const QUAD_OBJ: &str = "\
o body
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 0.0 -1.0
v 0.0 0.0 -1.0
f 1 2 3 4
";

    fn write_obj(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("car.obj");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            ModelFormat::from_path(Path::new("models/car.OBJ")).unwrap(),
            ModelFormat::Obj
        );
        assert!(matches!(
            ModelFormat::from_path(Path::new("models/testarossa.dae")),
            Err(AssetError::UnsupportedFormat(_))
        ));
        assert!(ModelFormat::from_path(Path::new("models/car")).is_err());
    }

    #[test]
    fn quad_is_triangulated_with_generated_normals() {
        let (_dir, path) = write_obj(QUAD_OBJ);
        let model = ModelData::load(&path).unwrap();
        assert_eq!(model.name, "body");
        assert_eq!(model.vertex_count(), 4);
        assert_eq!(model.triangle_count(), 2);
        // Counter-clockwise seen from above: normals point up.
        for n in &model.normals {
            assert!((n[1] - 1.0).abs() < 1e-5, "normal {n:?}");
        }
    }

    #[test]
    fn authored_normals_survive_next_to_generated_ones() {
        let (_dir, path) = write_obj(
            "\
o body
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vn 0.0 0.0 -1.0
f 1//1 2//1 3//1
o wheel
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 1.0 0.0 -1.0
f 4 5 6
",
        );
        let model = ModelData::load(&path).unwrap();
        assert_eq!(model.vertex_count(), 6);
        for n in &model.normals[..3] {
            assert_eq!(*n, [0.0, 0.0, -1.0]);
        }
        for n in &model.normals[3..] {
            assert!((n[1] - 1.0).abs() < 1e-5, "normal {n:?}");
        }
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let (_dir, path) = write_obj(QUAD_OBJ);
        let model = ModelData::load(&path).unwrap();
        let (lo, hi) = model.bounds();
        assert_eq!(lo, Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(hi, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn same_file_same_id() {
        let (_d1, p1) = write_obj(QUAD_OBJ);
        let (_d2, p2) = write_obj(QUAD_OBJ);
        let a = ModelData::load(&p1).unwrap();
        let b = ModelData::load(&p2).unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn obj_without_faces_is_empty() {
        let (_dir, path) = write_obj("v 0 0 0\nv 1 0 0\n");
        let err = ModelData::load(&path).unwrap_err();
        assert!(matches!(err, AssetError::EmptyModel(_)));
    }

    #[test]
    fn missing_obj_is_io_error() {
        let err = ModelData::load("/no/such/car.obj").unwrap_err();
        assert!(matches!(err, AssetError::Io(_)));
    }
}
