//! Box-per-point cloud meshes.
//!
//! Every point becomes an axis-aligned cube of the bucket's edge length,
//! 4 vertices per face so each face keeps a flat normal:
//!
//! ```text
//!        3 ────── 2        corners = center + h·(n ± u ± v)
//!        │ ╲      │        u × v = n, so 0-1-2 / 0-2-3 wind CCW
//!        │   ╲    │        seen from outside
//!        0 ────── 1
//! ```

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use octomap_cloud::ColoredPoint;

/// Vertices emitted per point.
pub const VERTICES_PER_POINT: usize = 24;

/// Indices emitted per point.
pub const INDICES_PER_POINT: usize = 36;

/// (normal, u, v) per face with u × v = normal.
const FACES: [(Vec3, Vec3, Vec3); 6] = [
  (Vec3::X, Vec3::Y, Vec3::Z),
  (Vec3::NEG_X, Vec3::Z, Vec3::Y),
  (Vec3::Y, Vec3::Z, Vec3::X),
  (Vec3::NEG_Y, Vec3::X, Vec3::Z),
  (Vec3::Z, Vec3::X, Vec3::Y),
  (Vec3::NEG_Z, Vec3::Y, Vec3::X),
];

const CORNERS: [(f32, f32); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

/// Build a vertex-colored cube mesh for `points`, each cube `edge_length`
/// wide.
pub fn build_cloud_mesh(points: &[ColoredPoint], edge_length: f32) -> Mesh {
  let mut mesh = Mesh::new(
    PrimitiveTopology::TriangleList,
    RenderAssetUsages::default(),
  );

  let half = edge_length * 0.5;
  let vertex_count = points.len() * VERTICES_PER_POINT;
  let mut positions: Vec<[f32; 3]> = Vec::with_capacity(vertex_count);
  let mut normals: Vec<[f32; 3]> = Vec::with_capacity(vertex_count);
  let mut colors: Vec<[f32; 4]> = Vec::with_capacity(vertex_count);
  let mut indices: Vec<u32> = Vec::with_capacity(points.len() * INDICES_PER_POINT);

  for point in points {
    let color = point.color.to_array();
    for (normal, u, v) in FACES {
      let base = positions.len() as u32;
      for (su, sv) in CORNERS {
        let corner = point.position + (normal + u * su + v * sv) * half;
        positions.push(corner.to_array());
        normals.push(normal.to_array());
        colors.push(color);
      }
      indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
  }

  mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
  mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
  mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, colors);
  mesh.insert_indices(Indices::U32(indices));

  mesh
}

#[cfg(test)]
mod tests {
  use bevy::mesh::VertexAttributeValues;
  use octomap_cloud::Rgba;

  use super::*;

  fn point(x: f32, y: f32, z: f32) -> ColoredPoint {
    ColoredPoint {
      position: Vec3::new(x, y, z),
      color: Rgba::rgb(1.0, 0.5, 0.0),
    }
  }

  fn positions(mesh: &Mesh) -> Vec<[f32; 3]> {
    match mesh.attribute(Mesh::ATTRIBUTE_POSITION) {
      Some(VertexAttributeValues::Float32x3(values)) => values.clone(),
      other => panic!("unexpected position attribute: {other:?}"),
    }
  }

  #[test]
  fn test_counts_per_point() {
    let mesh = build_cloud_mesh(&[point(0.0, 0.0, 0.0), point(2.0, 0.0, 0.0)], 1.0);
    assert_eq!(mesh.count_vertices(), 2 * VERTICES_PER_POINT);
    assert_eq!(mesh.indices().map(Indices::len), Some(2 * INDICES_PER_POINT));
  }

  #[test]
  fn test_empty_cloud() {
    let mesh = build_cloud_mesh(&[], 0.4);
    assert_eq!(mesh.count_vertices(), 0);
    assert_eq!(mesh.indices().map(Indices::len), Some(0));
  }

  /// Cube spans center ± edge/2 on every axis.
  #[test]
  fn test_cube_extent() {
    let mesh = build_cloud_mesh(&[point(1.0, 2.0, 3.0)], 0.5);
    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(f32::MIN);
    for p in positions(&mesh) {
      min = min.min(Vec3::from(p));
      max = max.max(Vec3::from(p));
    }
    assert!(min.abs_diff_eq(Vec3::new(0.75, 1.75, 2.75), 1e-6));
    assert!(max.abs_diff_eq(Vec3::new(1.25, 2.25, 3.25), 1e-6));
  }

  /// Every triangle faces away from the cube center.
  #[test]
  fn test_outward_winding() {
    let center = Vec3::new(-1.0, 4.0, 0.5);
    let mesh = build_cloud_mesh(&[point(center.x, center.y, center.z)], 2.0);
    let positions = positions(&mesh);
    let Some(Indices::U32(indices)) = mesh.indices() else {
      panic!("expected u32 indices");
    };
    for tri in indices.chunks(3) {
      let [a, b, c] = [0, 1, 2].map(|i| Vec3::from(positions[tri[i] as usize]));
      let face_normal = (b - a).cross(c - a);
      let outward = (a + b + c) / 3.0 - center;
      assert!(face_normal.dot(outward) > 0.0);
    }
  }

  #[test]
  fn test_vertex_colors_match_point() {
    let mesh = build_cloud_mesh(&[point(0.0, 0.0, 0.0)], 1.0);
    match mesh.attribute(Mesh::ATTRIBUTE_COLOR) {
      Some(VertexAttributeValues::Float32x4(colors)) => {
        assert_eq!(colors.len(), VERTICES_PER_POINT);
        assert!(colors.iter().all(|c| *c == [1.0, 0.5, 0.0, 1.0]));
      }
      other => panic!("unexpected color attribute: {other:?}"),
    }
  }
}
