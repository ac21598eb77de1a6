//! wgpu backing for the trail parameters.
//!
//! - `context` opens a surface-less device and uploads CPU images.
//! - `uniforms` mirrors the shader's std140 parameter block.
//! - `sink` implements [`ShaderParameterSink`](crate::ShaderParameterSink)
//!   on top of one texture per history slot plus the uniform buffer, and
//!   exposes the bind group a compositing pipeline uses.
//! - `readback` turns a GPU render target into a
//!   [`FrameSource`](crate::FrameSource) through a blocking copy.

mod context;
mod readback;
mod sink;
mod uniforms;

pub use context::{HeadlessGpu, FRAME_TEXTURE_FORMAT};
pub use readback::{read_texture_rgba, TextureSource};
pub use sink::{GpuParameterSink, FIRST_FRAME_BINDING, SAMPLER_BINDING, UNIFORM_BINDING};
