use mesh_core::{
    mesh::{IndexFormat, NORMAL_PROPERTY, TEXCOORD_PROPERTY},
    render::{FrontFace, RecordingContext},
    types::{Vec2f, Vec3f},
};
use sphere_model::{offscreen, DrawContext, GeometryError, Model, RenderContextError};

const EPS: f32 = 1e-5;

fn normals(model: &Model) -> Vec<Vec3f> {
    model
        .mesh()
        .property_vertices::<Vec3f>(NORMAL_PROPERTY)
        .unwrap()
}

#[test]
fn default_sphere_counts_and_radius() {
    let model = Model::new_sphere(1f32, 16, 8, false, false).unwrap();
    assert_eq!(model.vertex_count(), 153);
    assert_eq!(model.triangle_count(), 256);
    assert_eq!(model.mesh().index_format(), IndexFormat::U16);
    for p in model.mesh().positions() {
        assert!((p.norm() - 1f32).abs() < EPS, "{:?} off the sphere", p);
    }

    let aabb = model.aabb();
    assert!((aabb.min().unwrap() - Vec3f::new(-1f32, -1f32, -1f32)).norm() < 1e-3);
    assert!((aabb.max().unwrap() - Vec3f::new(1f32, 1f32, 1f32)).norm() < 1e-3);
}

#[test]
fn hemisphere_stays_above_the_rim() {
    let model = Model::new_sphere(2f32, 16, 8, false, true).unwrap();
    assert_eq!(model.vertex_count(), 85);
    assert_eq!(model.triangle_count(), 128);
    for p in model.mesh().positions() {
        assert!(p.y >= 0f32);
        assert!((p.norm() - 2f32).abs() < 1e-4);
    }
    let rim = model
        .mesh()
        .positions()
        .iter()
        .filter(|p| p.y == 0f32)
        .count();
    assert_eq!(rim, 17);
}

#[test]
fn inward_normals_are_negated() {
    let outward = Model::new_sphere(1.5, 12, 6, false, false).unwrap();
    let inward = Model::new_sphere(1.5, 12, 6, true, false).unwrap();
    let positions = outward.mesh().positions();

    for ((p, n_out), n_in) in positions.iter().zip(normals(&outward)).zip(normals(&inward)) {
        assert!((n_out.norm() - 1f32).abs() < EPS);
        assert!((n_out - p / 1.5).norm() < 1e-4);
        assert_eq!(n_in, -n_out);
    }
}

#[test]
fn indices_stay_in_bounds() {
    for (u, v, hemisphere) in [(3, 2, false), (7, 5, true), (64, 32, false)] {
        let model = Model::new_sphere(1f32, u, v, false, hemisphere).unwrap();
        let count = model.vertex_count() as u32;
        assert!(model.mesh().indices_u32().iter().all(|i| *i < count));
        assert_eq!(model.mesh().index_count() as usize, model.triangle_count() * 3);
    }
}

#[test]
fn winding_faces_the_normals() {
    for inward in [false, true] {
        let model = Model::new_sphere(1f32, 16, 8, inward, false).unwrap();
        assert_eq!(model.front_face(), FrontFace::Ccw);
        let positions = model.mesh().positions();
        let normals = normals(&model);

        let mut checked = 0;
        for [a, b, c] in model.mesh().triangles() {
            let (a, b, c) = (a as usize, b as usize, c as usize);
            let face = (positions[b] - positions[a]).cross(&(positions[c] - positions[a]));
            if face.norm() < 1e-6 {
                continue;
            }
            let normal = normals[a] + normals[b] + normals[c];
            assert!(face.dot(&normal) > 0f32, "inward={} triangle {} {} {}", inward, a, b, c);
            checked += 1;
        }
        assert!(checked >= 16 * 6 * 2);
    }
}

#[test]
fn texcoords_span_the_unit_square() {
    let model = Model::new_sphere(1f32, 16, 8, false, false).unwrap();
    let uv = model
        .mesh()
        .property_vertices::<Vec2f>(TEXCOORD_PROPERTY)
        .unwrap();
    assert_eq!(uv.first(), Some(&Vec2f::new(0f32, 0f32)));
    assert_eq!(uv.last(), Some(&Vec2f::new(1f32, 1f32)));
    assert!(uv
        .iter()
        .all(|t| (0f32..=1f32).contains(&t.x) && (0f32..=1f32).contains(&t.y)));
}

#[test]
fn invalid_parameters_are_rejected() {
    let cases = [
        (0f32, 16, 8),
        (-1f32, 16, 8),
        (f32::NAN, 16, 8),
        (f32::INFINITY, 16, 8),
        (1f32, 2, 8),
        (1f32, 16, 1),
    ];
    for (radius, u, v) in cases {
        let err = Model::new_sphere(radius, u, v, false, false).unwrap_err();
        assert!(
            matches!(err, GeometryError::InvalidArgument { .. }),
            "{} {} {}: {}",
            radius,
            u,
            v,
            err
        );
    }
}

#[test]
fn render_reaches_the_context() {
    let model = Model::new_sphere(1f32, 16, 8, false, true).unwrap();
    let mut ctx = RecordingContext::with_pipeline(offscreen::shader_layout());
    model.render(&mut ctx).unwrap();

    let record = &ctx.records()[0];
    assert_eq!(record.id, model.id());
    assert_eq!(record.vertex_count, 85);
    assert_eq!(record.index_count, 128 * 3);
    assert!(record.cull_back);
}

struct FailingContext;

impl DrawContext for FailingContext {
    fn draw_mesh(
        &mut self,
        _draw: &mesh_core::render::DrawMesh<'_>,
    ) -> Result<(), RenderContextError> {
        Err(RenderContextError::Backend("device lost".to_owned()))
    }
}

#[test]
fn context_failures_surface_unchanged() {
    let model = Model::new_sphere(1f32, 16, 8, false, false).unwrap();
    match model.render(&mut FailingContext) {
        Err(RenderContextError::Backend(msg)) => assert_eq!(msg, "device lost"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn offscreen_render_covers_the_centre() {
    let mut target = match offscreen::Offscreen::new(64, 64) {
        Ok(target) => target,
        Err(e) => {
            eprintln!("skipping GPU test: {}", e);
            return;
        }
    };
    let model = Model::new_sphere(1f32, 16, 8, false, false).unwrap();
    target.render(&model).unwrap();
    target.render(&model).unwrap();
    assert_eq!(target.cached_meshes(), 1);
    assert_eq!(target.frame().len(), 64 * 64 * 4);

    let centre = target.pixel(32, 32).unwrap();
    let corner = target.pixel(0, 0).unwrap();
    assert_ne!(centre, corner);
    assert!(target.pixel(64, 0).is_none());
}

#[test]
fn oversized_target_is_an_error() {
    let err = match offscreen::Offscreen::new(100_000, 4) {
        Ok(_) => panic!("100000x4 target accepted"),
        Err(e) => e,
    };
    assert!(matches!(err, RenderContextError::Backend(_)));
}

#[test]
fn saved_png_matches_the_frame() {
    let mut target = match offscreen::Offscreen::new(48, 32) {
        Ok(target) => target,
        Err(e) => {
            eprintln!("skipping GPU test: {}", e);
            return;
        }
    };
    let path = std::env::temp_dir().join(format!("sphere-model-{}.png", std::process::id()));

    let err = target.save_png(&path).unwrap_err();
    assert!(err.to_string().contains("nothing rendered"));
    assert!(!path.exists());

    let model = Model::new_sphere(1f32, 16, 8, false, true).unwrap();
    target.render(&model).unwrap();
    target.save_png(&path).unwrap();

    let saved = image::open(&path).unwrap().to_rgba8();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(saved.dimensions(), (48, 32));
    for (x, y) in [(0, 0), (24, 16), (47, 31)] {
        assert_eq!(Some(saved.get_pixel(x, y).0), target.pixel(x, y));
    }
}
