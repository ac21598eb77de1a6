//! Host side of a motion trail (motion extraction) effect.
//!
//! The compositing shader blends the current image with up to
//! [`FRAME_DELAY_LIMIT`] earlier frames, colouring recent motion with the max
//! color and older motion through a gradient of [`Section`]s. This crate owns
//! the frame history and keeps the shader's parameters in step with it:
//!
//! ```text
//!   host frame loop
//!        │ tick(source, sink)
//!        ▼
//!   EffectController ──▶ sync_parameters() ──▶ sink: delay, max color, gradient
//!        │
//!        └─(delay > 0)─▶ FrameRingBuffer::capture(current) ──▶ sink: _Frame<current>
//!                          current = (current + 1) % delay
//! ```
//!
//! Sinks implement [`ShaderParameterSink`]. [`RecordingSink`] keeps the call
//! stream in memory; with the `gpu` feature, `gpu::GpuParameterSink` writes
//! into wgpu textures and a uniform buffer.

mod config;
mod controller;
mod error;
mod frame;
mod ring;
mod sink;
mod types;

#[cfg(feature = "gpu")]
pub mod gpu;

pub use config::EffectConfig;
pub use controller::{EffectController, TickOutcome};
pub use error::{CaptureError, ConfigError};
pub use frame::{FrameSlot, FrameSource};
pub use ring::FrameRingBuffer;
pub use sink::{ParameterWrite, RecordingSink, ShaderParameterSink};
pub use types::{
    frame_parameter_name, parse_frame_parameter, Resolution, Rgba, Section, COLORS_PARAM,
    DELAY_FRAMES_PARAM, FRAME_DELAY_LIMIT, FRAME_PARAM_PREFIX, MAX_COLOR_PARAM, SECTION_CAPACITY,
    SECTION_COUNT_PARAM, THRESHOLDS_PARAM,
};
