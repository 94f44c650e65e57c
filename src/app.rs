use mesh_core::render::{DrawRecord, RecordingContext, RenderContextError};

use crate::{cli::Args, offscreen, Model};

/// Submits `model` to a recording context bound to the shader layout, without touching the GPU.
pub fn dry_run(model: &Model) -> Result<Vec<DrawRecord>, RenderContextError> {
    let mut ctx = RecordingContext::with_pipeline(offscreen::shader_layout());
    model.render(&mut ctx)?;
    Ok(ctx.records().to_vec())
}

pub fn run(args: &Args) -> anyhow::Result<()> {
    let config = args.load_config()?;
    let model = Model::from_params(config.sphere_params())?;
    log::info!(
        "{} {}: radius {}, {}x{} segments, {} vertices, {} triangles",
        if config.hemisphere { "hemisphere" } else { "sphere" },
        model.id(),
        config.radius,
        config.radial_segments,
        config.vertical_segments,
        model.vertex_count(),
        model.triangle_count()
    );

    if args.dry_run {
        for record in dry_run(&model)? {
            log::info!("draw {:?}", record);
        }
        return Ok(());
    }

    let mut target = offscreen::Offscreen::new(config.output.width, config.output.height)?;
    target.render(&model)?;
    target.save_png(&config.output.path)?;
    log::info!(
        "wrote {}x{} frame to {}",
        config.output.width,
        config.output.height,
        config.output.path.display()
    );
    Ok(())
}
