/*!
# Skytrace Engine

Core types for the Skytrace compute ray tracer.

This crate holds everything that does not talk to the GPU directly: the error
taxonomy, the engine logging system, renderer configuration, the GPU-layout
data model (per-frame settings, scene primitives) and skybox face loading.
The Vulkan backend (`skytrace_engine_renderer_vulkan`) builds on these types.

## Architecture

- **Engine**: process-wide logger slot
- **RendererConfig**: shader/skybox paths, device extensions, debug layers
- **Settings**: per-frame uniform consumed by the compute shader
- **Scene**: immutable sphere and plane sequences uploaded once
- **CubemapPixels**: six decoded skybox faces, ready for a single staged copy
- **FrameState**: the per-frame submission protocol
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod config;
pub mod frame;
pub mod scene;
pub mod settings;
pub mod skybox;

// Main skytrace namespace module
pub mod skytrace {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine (logger owner)
    pub use crate::engine::Engine;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Configuration sub-module
    pub mod config {
        pub use crate::config::*;
    }

    // Render data sub-module
    pub mod render {
        pub use crate::frame::*;
        pub use crate::scene::*;
        pub use crate::settings::*;
        pub use crate::skybox::*;
    }
}

// Re-export math library at crate root
pub use glam;
