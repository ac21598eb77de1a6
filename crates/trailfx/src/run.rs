use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use image::RgbaImage;
use motiontrail::{EffectConfig, EffectController, RecordingSink, Rgba, TickOutcome};
use trailconfig::TrailConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::{CheckArgs, RunArgs};
use crate::export::{export_history, ParameterDump};
use crate::source::FrameSequence;

const DEFAULT_TICKS: u64 = 60;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub(crate) struct TickPlan {
    pub ticks: u64,
    pub interval: Option<Duration>,
}

#[derive(Debug, Default)]
pub(crate) struct RunSummary {
    pub captured: u64,
    pub skipped: u64,
    pub disabled: u64,
}

fn load_config(path: &Path) -> Result<TrailConfig> {
    TrailConfig::load(path)
        .with_context(|| format!("failed to load trail configuration from {}", path.display()))
}

fn effect_config(path: &Path, file: &TrailConfig) -> Result<EffectConfig> {
    EffectConfig::from_file(file)
        .with_context(|| format!("invalid effect configuration in {}", path.display()))
}

pub fn check(args: CheckArgs) -> Result<()> {
    let file = load_config(&args.config)?;
    let config = effect_config(&args.config, &file)?;

    println!("Configuration OK: {}", args.config.display());
    println!("  resolution:    {}", config.resolution);
    println!("  delay frames:  {}", config.delay_count);
    println!("  max color:     {}", format_color(config.max_color));
    println!("  sections:      {}", config.sections.len());
    for (index, section) in config.sections.iter().enumerate() {
        println!(
            "    #{index:<2} threshold={:<8.3} color={}",
            section.threshold,
            format_color(section.color)
        );
    }
    if let Some(interval) = file.driver.interval {
        println!("  tick interval: {interval:?}");
    }
    Ok(())
}

fn format_color(color: Rgba) -> String {
    format!(
        "[{:.3}, {:.3}, {:.3}, {:.3}]",
        color.r, color.g, color.b, color.a
    )
}

pub fn run(args: RunArgs) -> Result<()> {
    let file = load_config(&args.config)?;
    let mut config = effect_config(&args.config, &file)?;
    if let Some(delay) = args.delay {
        tracing::debug!(
            configured = config.delay_count,
            requested = delay,
            "overriding delay frame count"
        );
        config.delay_count = delay;
    }

    let plan = TickPlan {
        ticks: args.ticks.or(file.driver.ticks).unwrap_or(DEFAULT_TICKS),
        interval: if args.unpaced {
            None
        } else {
            file.driver.interval
        },
    };
    let frames = FrameSequence::open(args.frames.as_deref(), config.resolution)?;
    let mut controller =
        EffectController::new(config).context("failed to initialise motion trail")?;
    let mut dump = args
        .dump_parameters
        .as_deref()
        .map(ParameterDump::create)
        .transpose()?;

    tracing::info!(
        ticks = plan.ticks,
        interval = ?plan.interval,
        gpu = args.gpu,
        "starting trail run"
    );

    let summary = if args.gpu {
        run_gpu(&mut controller, &frames, &plan, dump.as_mut(), args.export.as_deref())?
    } else {
        drive(
            &mut controller,
            &frames,
            &plan,
            dump.as_mut(),
            |controller, image, recorder| Ok(controller.tick(image, recorder)),
        )?
    };

    if let Some(directory) = args.export.as_deref() {
        export_history(&controller, directory)?;
    }
    if let Some(dump) = dump {
        dump.finish()?;
    }

    println!(
        "Ran {} ticks: {} captured, {} skipped, {} disabled; next slot {}",
        controller.ticks(),
        summary.captured,
        summary.skipped,
        summary.disabled,
        controller.current_index()
    );
    Ok(())
}

#[cfg(feature = "gpu")]
fn run_gpu(
    controller: &mut EffectController,
    frames: &FrameSequence,
    plan: &TickPlan,
    dump: Option<&mut ParameterDump>,
    export: Option<&Path>,
) -> Result<RunSummary> {
    crate::gpu::run(controller, frames, plan, dump, export)
}

#[cfg(not(feature = "gpu"))]
fn run_gpu(
    _controller: &mut EffectController,
    _frames: &FrameSequence,
    _plan: &TickPlan,
    _dump: Option<&mut ParameterDump>,
    _export: Option<&Path>,
) -> Result<RunSummary> {
    anyhow::bail!("--gpu requires trailfx to be built with the `gpu` feature")
}

/// Runs `plan.ticks` host frames. `step` performs one controller tick
/// against the recorder (and whatever other sink it wraps); the recorded
/// writes are drained into `dump` after every tick.
pub(crate) fn drive<F>(
    controller: &mut EffectController,
    frames: &FrameSequence,
    plan: &TickPlan,
    mut dump: Option<&mut ParameterDump>,
    mut step: F,
) -> Result<RunSummary>
where
    F: FnMut(&mut EffectController, &RgbaImage, &mut RecordingSink) -> Result<TickOutcome>,
{
    let mut summary = RunSummary::default();
    let mut recorder = RecordingSink::new();

    for tick in 0..plan.ticks {
        let started = Instant::now();
        let image = frames.frame(tick)?;
        let outcome = step(controller, &image, &mut recorder)?;

        let label = match &outcome {
            TickOutcome::Captured { .. } => {
                summary.captured += 1;
                "captured"
            }
            TickOutcome::Skipped(_) => {
                summary.skipped += 1;
                "skipped"
            }
            TickOutcome::Disabled => {
                summary.disabled += 1;
                "disabled"
            }
        };

        let writes = recorder.take();
        if let Some(dump) = dump.as_deref_mut() {
            dump.record(tick, label, &writes)?;
        }

        if let Some(remaining) = plan
            .interval
            .and_then(|interval| interval.checked_sub(started.elapsed()))
        {
            thread::sleep(remaining);
        }
    }

    tracing::info!(
        captured = summary.captured,
        skipped = summary.skipped,
        disabled = summary.disabled,
        "trail run complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use motiontrail::Resolution;

    use super::*;

    #[test]
    fn drive_counts_outcomes() {
        let resolution = Resolution::new(8, 4);
        let mut controller = EffectController::new(EffectConfig {
            resolution,
            delay_count: 2,
            ..EffectConfig::default()
        })
        .unwrap();
        let frames = FrameSequence::Synthetic { resolution };
        let plan = TickPlan {
            ticks: 5,
            interval: None,
        };

        let summary = drive(&mut controller, &frames, &plan, None, |c, image, rec| {
            Ok(c.tick(image, rec))
        })
        .unwrap();
        assert_eq!(summary.captured, 5);
        assert_eq!(summary.skipped, 0);
        assert_eq!(controller.current_index(), 1);
    }
}
