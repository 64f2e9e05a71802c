//! CPU-side mesh generation. Everything here is plain data, uploaded by `gpu`.

use bytemuck::{Pod, Zeroable};
use synthwave_assets::{HeightField, ModelData};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Indexed line list for one displaced terrain tile.
///
/// The tile is a `size`×`size` grid of `segments`² quads in the XZ plane,
/// centered on the origin, each quad split along one diagonal. Heights come
/// from `field` scaled by `displacement_scale`; texture row 0 lands on the
/// +Z edge of the tile, nearest the viewer.
pub fn terrain_wireframe(
    size: f32,
    segments: u32,
    field: &HeightField,
    displacement_scale: f32,
) -> (Vec<Vertex>, Vec<u32>) {
    let n = segments.max(1);
    let row = n + 1;
    let half = size / 2.0;
    let step = size / n as f32;

    let mut vertices = Vec::with_capacity((row * row) as usize);
    for iy in 0..=n {
        for ix in 0..=n {
            let u = ix as f32 / n as f32;
            let v = 1.0 - iy as f32 / n as f32;
            let height = field.sample(u, v) * displacement_scale;
            vertices.push(Vertex {
                position: [half - ix as f32 * step, height, half - iy as f32 * step],
                normal: [0.0, 1.0, 0.0],
                uv: [u, v],
            });
        }
    }

    let mut indices = Vec::with_capacity(line_count(n) as usize * 2);
    for iy in 0..=n {
        for ix in 0..=n {
            let a = iy * row + ix;
            if ix < n {
                indices.extend([a, a + 1]);
            }
            if iy < n {
                indices.extend([a, a + row]);
            }
            if ix < n && iy < n {
                // Shared edge of the quad's two triangles.
                indices.extend([a + row, a + 1]);
            }
        }
    }

    (vertices, indices)
}

/// Number of line segments `terrain_wireframe` emits for `segments` quads per side.
pub fn line_count(segments: u32) -> u32 {
    let n = segments.max(1);
    2 * n * (n + 1) + n * n
}

/// Triangle fan disc sector in the XY plane, facing +Z.
///
/// `theta_start`/`theta_length` select the arc; the drive scene uses the
/// upper half (0..π). UVs map the full circle onto the unit square.
pub fn sun_disc(
    radius: f32,
    segments: u32,
    theta_start: f32,
    theta_length: f32,
) -> (Vec<Vertex>, Vec<u32>) {
    let segments = segments.max(3);
    let normal = [0.0, 0.0, 1.0];

    let mut vertices = Vec::with_capacity(segments as usize + 2);
    vertices.push(Vertex {
        position: [0.0, 0.0, 0.0],
        normal,
        uv: [0.5, 0.5],
    });
    for s in 0..=segments {
        let theta = theta_start + s as f32 / segments as f32 * theta_length;
        let (sin, cos) = theta.sin_cos();
        vertices.push(Vertex {
            position: [radius * cos, radius * sin, 0.0],
            normal,
            uv: [(cos + 1.0) / 2.0, (sin + 1.0) / 2.0],
        });
    }

    let indices = (1..=segments).flat_map(|i| [i, i + 1, 0]).collect();
    (vertices, indices)
}

/// Interleave a loaded model's positions and normals.
pub fn model_mesh(model: &ModelData) -> (Vec<Vertex>, Vec<u32>) {
    let vertices = model
        .positions
        .iter()
        .zip(&model.normals)
        .map(|(p, n)| Vertex {
            position: *p,
            normal: *n,
            uv: [0.0, 0.0],
        })
        .collect();
    (vertices, model.indices.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;
    use synthwave_assets::{AssetId, ImageData};

    #[test]
    fn flat_terrain_counts() {
        let (verts, indices) = terrain_wireframe(50.0, 25, &HeightField::flat(), 5.0);
        assert_eq!(verts.len(), 26 * 26);
        assert_eq!(indices.len() as u32, line_count(25) * 2);
        assert_eq!(line_count(25), 1925);
        assert!(verts.iter().all(|v| v.position[1] == 0.0));
        let max_index = *indices.iter().max().unwrap();
        assert!((max_index as usize) < verts.len());
    }

    #[test]
    fn terrain_spans_one_tile() {
        let (verts, _) = terrain_wireframe(50.0, 25, &HeightField::flat(), 5.0);
        let min_z = verts.iter().map(|v| v.position[2]).fold(f32::MAX, f32::min);
        let max_z = verts.iter().map(|v| v.position[2]).fold(f32::MIN, f32::max);
        assert_relative_eq!(min_z, -25.0);
        assert_relative_eq!(max_z, 25.0);
    }

    #[test]
    fn displacement_scales_heights() {
        let white = HeightField::from_image(&ImageData::solid_color(4, 4, [255, 0, 0, 255]));
        let (verts, _) = terrain_wireframe(10.0, 2, &white, 5.0);
        for v in &verts {
            assert_relative_eq!(v.position[1], 5.0);
        }
    }

    #[test]
    fn half_sun_disc() {
        let (verts, indices) = sun_disc(8.0, 50, 0.0, PI);
        assert_eq!(verts.len(), 52);
        assert_eq!(indices.len(), 150);
        // Upper half only.
        assert!(verts.iter().all(|v| v.position[1] >= -1e-5));
        assert_relative_eq!(verts[1].position[0], 8.0);
        assert_relative_eq!(verts[51].position[0], -8.0, epsilon = 1e-5);
    }

    #[test]
    fn model_mesh_interleaves() {
        let model = ModelData {
            id: AssetId(1),
            name: "tri".into(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            indices: vec![0, 1, 2],
        };
        let (verts, indices) = model_mesh(&model);
        assert_eq!(verts.len(), 3);
        assert_eq!(verts[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(verts[2].normal, [0.0, 0.0, 1.0]);
        assert_eq!(indices, vec![0, 1, 2]);
    }
}
