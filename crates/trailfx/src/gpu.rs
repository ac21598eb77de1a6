use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use image::RgbaImage;
use motiontrail::gpu::{read_texture_rgba, GpuParameterSink, HeadlessGpu, TextureSource};
use motiontrail::EffectController;

use crate::export::{slot_file_name, ParameterDump};
use crate::run::{drive, RunSummary, TickPlan};
use crate::source::FrameSequence;
use crate::tee::Tee;

/// Same loop as the CPU path, but every frame is first uploaded to a render
/// target and captured back through a readback, and parameters also land in
/// a [`GpuParameterSink`].
pub(crate) fn run(
    controller: &mut EffectController,
    frames: &FrameSequence,
    plan: &TickPlan,
    dump: Option<&mut ParameterDump>,
    export: Option<&Path>,
) -> Result<RunSummary> {
    let gpu = HeadlessGpu::new()?;
    let resolution = controller.ring().resolution();
    tracing::info!(adapter = gpu.adapter_name(), %resolution, "using headless GPU");

    let render_target = gpu.create_render_target(resolution);
    let mut gpu_sink = GpuParameterSink::new(&gpu.device, &gpu.queue, resolution);

    let summary = drive(controller, frames, plan, dump, |controller, image, recorder| {
        let mut sink = Tee(recorder, &mut gpu_sink);
        let outcome = if image.dimensions() == (resolution.width, resolution.height) {
            gpu.upload_image(&render_target, image);
            let source = TextureSource::new(&gpu.device, &gpu.queue, &render_target);
            controller.tick(&source, &mut sink)
        } else {
            // Mismatched input never reaches the GPU; the controller reports
            // it and leaves history alone.
            controller.tick(image, &mut sink)
        };
        gpu_sink.flush();
        Ok(outcome)
    })?;

    if let Some(directory) = export {
        export_gpu_slots(&gpu, &gpu_sink, controller.delay_count(), directory)?;
    }
    Ok(summary)
}

fn export_gpu_slots(
    gpu: &HeadlessGpu,
    sink: &GpuParameterSink,
    delay_count: usize,
    directory: &Path,
) -> Result<()> {
    fs::create_dir_all(directory).with_context(|| {
        format!(
            "failed to prepare export directory at {}",
            directory.display()
        )
    })?;

    for index in 0..delay_count {
        let Some(texture) = sink.frame_texture(index) else {
            continue;
        };
        let pixels = read_texture_rgba(&gpu.device, &gpu.queue, texture)
            .with_context(|| format!("failed to read back frame texture {index}"))?;
        let image = RgbaImage::from_raw(texture.width(), texture.height(), pixels)
            .context("frame texture readback has an unexpected size")?;
        let path = directory.join(format!("gpu-{}", slot_file_name(index)));
        image
            .save(&path)
            .with_context(|| format!("failed to write GPU slot image to {}", path.display()))?;
    }
    Ok(())
}
