//! Skybox face loading
//!
//! The six faces are decoded up front. A single failing face aborts the load
//! before anything reaches the GPU. Decoded pixels are converted from RGBA to
//! the BGRA order of the swapchain format and concatenated in layer order.

use std::path::Path;
use crate::config::SkyboxPaths;
use crate::error::Result;
use crate::{engine_debug, engine_err};

/// 4-channel, 8-bit pixels returned by an image decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA bytes, `width * height * 4` long
    pub pixels: Vec<u8>,
}

/// Image decoding routine used to load skybox faces
pub trait ImageDecoder {
    /// Decode one file to RGBA8
    fn decode(&self, path: &Path) -> Result<DecodedImage>;
}

/// Decoder backed by the `image` crate (PNG and JPEG)
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateDecoder;

impl ImageDecoder for ImageCrateDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage> {
        let img = image::open(path).map_err(|e| {
            engine_err!(
                "skytrace::skybox",
                InitializationFailed,
                "Failed to load skybox face {}: {}",
                path.display(),
                e
            )
        })?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        Ok(DecodedImage {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }
}

/// Six cube faces packed contiguously in layer order
#[derive(Debug, Clone)]
pub struct CubemapPixels {
    pub width: u32,
    pub height: u32,
    data: Vec<u8>,
}

impl CubemapPixels {
    /// Number of faces (array layers)
    pub const FACES: u32 = 6;

    /// Decode every face, check sizes, swizzle, then concatenate
    pub fn load(paths: &SkyboxPaths, decoder: &dyn ImageDecoder) -> Result<Self> {
        let faces = paths
            .iter()
            .map(|path| decoder.decode(path))
            .collect::<Result<Vec<_>>>()?;

        Self::from_faces(faces)
    }

    /// Pack already-decoded faces (back, front, top, bottom, right, left)
    pub fn from_faces(faces: Vec<DecodedImage>) -> Result<Self> {
        if faces.len() != Self::FACES as usize {
            return Err(engine_err!(
                "skytrace::skybox",
                InitializationFailed,
                "Cube map needs {} faces, got {}",
                Self::FACES,
                faces.len()
            ));
        }

        let width = faces[0].width;
        let height = faces[0].height;
        let face_size = width as usize * height as usize * 4;
        if face_size == 0 {
            return Err(engine_err!(
                "skytrace::skybox",
                InitializationFailed,
                "Skybox faces are empty ({}x{})",
                width,
                height
            ));
        }

        let mut data = Vec::with_capacity(face_size * faces.len());
        for (layer, face) in faces.into_iter().enumerate() {
            if face.width != width || face.height != height {
                return Err(engine_err!(
                    "skytrace::skybox",
                    InitializationFailed,
                    "Skybox face {} is {}x{}, expected {}x{}",
                    layer,
                    face.width,
                    face.height,
                    width,
                    height
                ));
            }
            if face.pixels.len() != face_size {
                return Err(engine_err!(
                    "skytrace::skybox",
                    InitializationFailed,
                    "Skybox face {} has {} bytes, expected {}",
                    layer,
                    face.pixels.len(),
                    face_size
                ));
            }

            let mut pixels = face.pixels;
            swap_red_blue(&mut pixels);
            data.extend_from_slice(&pixels);
        }

        engine_debug!(
            "skytrace::skybox",
            "Packed cube map {}x{} ({} bytes)",
            width,
            height,
            data.len()
        );

        Ok(Self { width, height, data })
    }

    /// Bytes of one face
    pub fn face_size(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    /// All six faces, contiguous
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Swap channel 0 and channel 2 of every 4-byte pixel
pub fn swap_red_blue(pixels: &mut [u8]) {
    for pixel in pixels.chunks_exact_mut(4) {
        pixel.swap(0, 2);
    }
}

#[cfg(test)]
#[path = "skybox_tests.rs"]
mod tests;
