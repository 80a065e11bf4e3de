//! Diffuse-map loading for `map_Kd` references.
//! Decodes PNG files into RGBA8.

use std::path::Path;

use anyhow::Context;

/// Texture data in CPU-friendly format.
#[derive(Clone, Debug)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Supported texture formats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextureFormat {
    Rgba8,
}

impl TextureData {
    /// Wrap raw RGBA8 pixels. Fails if `data` doesn't match the dimensions.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> anyhow::Result<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            anyhow::bail!(
                "RGBA8 data is {} bytes, expected {} for {}x{}",
                data.len(),
                expected,
                width,
                height
            );
        }
        Ok(Self {
            data,
            width,
            height,
            format: TextureFormat::Rgba8,
        })
    }

    /// Load a diffuse map from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        log::debug!("Loading texture from {:?}", path);

        let img = image::open(path).with_context(|| format!("Failed to open image {:?}", path))?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let data = rgba.into_raw();

        log::debug!("Loaded texture {}x{} with {} bytes", width, height, data.len());

        Self::from_rgba8(width, height, data)
    }

    /// Get the number of bytes per pixel for the format.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self.format {
            TextureFormat::Rgba8 => 4,
        }
    }

    /// Check if the texture data is valid.
    pub fn is_valid(&self) -> bool {
        let expected_size =
            self.width as usize * self.height as usize * self.bytes_per_pixel() as usize;
        self.data.len() == expected_size && self.width > 0 && self.height > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba8_size_is_checked() {
        let tex = TextureData::from_rgba8(2, 2, vec![255; 16]).unwrap();
        assert!(tex.is_valid());
        assert_eq!(tex.bytes_per_pixel(), 4);
        assert!(TextureData::from_rgba8(2, 2, vec![0; 15]).is_err());
    }

    #[test]
    fn zero_sized_texture_is_not_valid() {
        let tex = TextureData::from_rgba8(0, 4, Vec::new()).unwrap();
        assert!(!tex.is_valid());
    }

    #[test]
    fn missing_file_is_error() {
        assert!(TextureData::load("definitely/not/here.png").is_err());
    }
}
