//! Benchmarks for topology, search, geometry and field operations.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::{Point2, Point3, Vector2};
use tessel::algo::curvature::{
    compute_curvature, cotangent_laplacian_matrix, CurvatureOptions, DualAreaScheme,
};
use tessel::algo::geometry::{face_areas, halfedge_length};
use tessel::algo::labels::{vertex_depths, vertex_distances, DistanceOptions};
use tessel::field::{self, Grid2, GridField2};
use tessel::mesh::FnProperty;
use tessel::prelude::*;

fn grid_positions(n: usize) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n * 2);

    for j in 0..=n {
        for i in 0..=n {
            // A gentle bump keeps curvature non-trivial.
            let (x, y) = (i as f64 / n as f64, j as f64 / n as f64);
            let z = 0.2 * (x * std::f64::consts::PI).sin() * (y * std::f64::consts::PI).sin();
            vertices.push(Point3::new(x, y, z));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    (vertices, faces)
}

fn create_grid_mesh(n: usize) -> HeMesh {
    let (vertices, faces) = grid_positions(n);
    build_from_triangles(&vertices, &faces).unwrap()
}

fn bench_mesh_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_grid");
    for n in [10, 50] {
        let (vertices, faces) = grid_positions(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let mesh: HeMesh = build_from_triangles(&vertices, &faces).unwrap();
                mesh
            });
        });
    }
    group.finish();
}

fn bench_mesh_traversal(c: &mut Criterion) {
    let mesh = create_grid_mesh(50);

    c.bench_function("connected_vertices_all", |b| {
        b.iter(|| {
            let mut count = 0;
            for v in mesh.vertex_ids() {
                count += mesh.connected_vertices(v).count();
            }
            count
        });
    });

    c.bench_function("face_areas_parallel", |b| b.iter(|| face_areas(&mesh, true)));
    c.bench_function("face_areas_sequential", |b| b.iter(|| face_areas(&mesh, false)));
}

fn bench_labels(c: &mut Criterion) {
    let mesh = create_grid_mesh(50);
    let source = [VertexId::new(0)];
    let lengths = FnProperty(|e: EdgeId| halfedge_length(&mesh, e.halfedge()));

    c.bench_function("vertex_depths_50x50", |b| {
        let mut depths = vec![0usize; mesh.num_vertices()];
        b.iter(|| vertex_depths(&mesh, &source, &[], &mut depths).unwrap());
    });

    for best_first in [true, false] {
        let options = DistanceOptions::default().with_best_first(best_first);
        let name = if best_first { "best_first" } else { "label_correcting" };
        c.bench_function(&format!("vertex_distances_{name}"), |b| {
            let mut distances = vec![0.0; mesh.num_vertices()];
            b.iter(|| vertex_distances(&mesh, &source, &[], &lengths, &mut distances, &options).unwrap());
        });
    }
}

fn bench_curvature(c: &mut Criterion) {
    let mesh = create_grid_mesh(50);
    let small = create_grid_mesh(12);

    c.bench_function("curvature_parallel", |b| {
        b.iter(|| compute_curvature(&mesh, &CurvatureOptions::new(DualAreaScheme::Mixed)))
    });
    c.bench_function("curvature_sequential", |b| {
        b.iter(|| compute_curvature(&mesh, &CurvatureOptions::new(DualAreaScheme::Mixed).sequential()))
    });
    c.bench_function("cotangent_laplacian_matrix_12x12", |b| {
        b.iter(|| cotangent_laplacian_matrix(&small, None))
    });
}

fn bench_fields(c: &mut Criterion) {
    let grid = Grid2::new(256, 256, Vector2::repeat(1.0 / 256.0)).unwrap();
    let f = GridField2::from_fn(grid, |p: Point2<f64>| (p.x * 7.0).sin() * p.y, true);

    for parallel in [true, false] {
        let mode = if parallel { "parallel" } else { "sequential" };
        c.bench_function(&format!("field_laplacian_{mode}"), |b| {
            b.iter(|| field::laplacian2(&f, parallel))
        });
        c.bench_function(&format!("field_add_scaled_{mode}"), |b| {
            let mut dst = f.values().to_vec();
            b.iter(|| field::ops::add_scaled(&mut dst, f.values(), 0.5, parallel).unwrap());
        });
    }
}

criterion_group!(
    benches,
    bench_mesh_construction,
    bench_mesh_traversal,
    bench_labels,
    bench_curvature,
    bench_fields
);
criterion_main!(benches);
