//! Renderer configuration
//!
//! Device extensions and debug layers are enumerated options rather than raw
//! strings; the backend converts them to their Vulkan names.

use std::path::{Path, PathBuf};

/// Device extensions the renderer knows how to require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceExtension {
    /// Presentable image chains (VK_KHR_swapchain)
    Swapchain,
}

/// Optional instance layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugLayer {
    /// Khronos validation layer
    Validation,
}

/// Which validation messages are forwarded to the engine logger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationSeverity {
    /// Only errors
    ErrorsOnly,
    /// Errors and warnings
    ErrorsAndWarnings,
    /// Everything, including info and verbose
    All,
}

/// Paths of the three precompiled shader programs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderPaths {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
    pub compute: PathBuf,
}

impl Default for ShaderPaths {
    fn default() -> Self {
        Self {
            vertex: PathBuf::from("data/shaders/rendering.vert.spv"),
            fragment: PathBuf::from("data/shaders/rendering.frag.spv"),
            compute: PathBuf::from("data/shaders/ray_tracing.comp.spv"),
        }
    }
}

/// Cube map face, in upload order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkyboxFace {
    Back,
    Front,
    Top,
    Bottom,
    Right,
    Left,
}

impl SkyboxFace {
    /// All faces in layer order
    pub const ALL: [SkyboxFace; 6] = [
        SkyboxFace::Back,
        SkyboxFace::Front,
        SkyboxFace::Top,
        SkyboxFace::Bottom,
        SkyboxFace::Right,
        SkyboxFace::Left,
    ];

    /// Array layer of this face in the cube image
    pub fn layer(self) -> usize {
        match self {
            SkyboxFace::Back => 0,
            SkyboxFace::Front => 1,
            SkyboxFace::Top => 2,
            SkyboxFace::Bottom => 3,
            SkyboxFace::Right => 4,
            SkyboxFace::Left => 5,
        }
    }
}

/// Ordered paths of the six skybox faces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkyboxPaths {
    faces: [PathBuf; 6],
}

impl SkyboxPaths {
    /// Build from paths given in face order (back, front, top, bottom, right, left)
    pub fn new(faces: [PathBuf; 6]) -> Self {
        Self { faces }
    }

    /// Six faces named `<face>.<extension>` inside `directory`
    pub fn from_directory(directory: impl AsRef<Path>, extension: &str) -> Self {
        let dir = directory.as_ref();
        let faces = SkyboxFace::ALL.map(|face| {
            let name = match face {
                SkyboxFace::Back => "back",
                SkyboxFace::Front => "front",
                SkyboxFace::Top => "top",
                SkyboxFace::Bottom => "bottom",
                SkyboxFace::Right => "right",
                SkyboxFace::Left => "left",
            };
            dir.join(format!("{}.{}", name, extension))
        });
        Self { faces }
    }

    /// Path of one face
    pub fn face(&self, face: SkyboxFace) -> &Path {
        &self.faces[face.layer()]
    }

    /// Paths in layer order
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.faces.iter().map(PathBuf::as_path)
    }
}

impl Default for SkyboxPaths {
    fn default() -> Self {
        Self::from_directory("data/skybox", "jpg")
    }
}

/// Renderer configuration
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Application name reported to the driver
    pub app_name: String,
    /// Enable validation/debug layers
    pub enable_validation: bool,
    /// Validation messages forwarded to the logger
    pub validation_severity: ValidationSeverity,
    /// Extensions a device must expose to be considered
    pub required_extensions: Vec<DeviceExtension>,
    /// Layers enabled when validation is on
    pub debug_layers: Vec<DebugLayer>,
    /// Shader program paths
    pub shaders: ShaderPaths,
    /// Skybox face paths
    pub skybox: SkyboxPaths,
    /// Clear color of the presentation pass
    pub clear_color: [f32; 4],
}

impl RendererConfig {
    /// Layers to enable at instance creation (empty when validation is off)
    pub fn active_layers(&self) -> &[DebugLayer] {
        if self.enable_validation {
            &self.debug_layers
        } else {
            &[]
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            app_name: "Skytrace".to_string(),
            enable_validation: cfg!(debug_assertions),
            validation_severity: ValidationSeverity::ErrorsAndWarnings,
            required_extensions: vec![DeviceExtension::Swapchain],
            debug_layers: vec![DebugLayer::Validation],
            shaders: ShaderPaths::default(),
            skybox: SkyboxPaths::default(),
            clear_color: [0.1, 0.1, 0.1, 1.0],
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
