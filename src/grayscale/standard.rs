use super::{gray_output_path, GrayscaleConverter};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// imageクレートによるグレースケール変換
#[derive(Clone, Debug, Default)]
pub struct ImageGrayscaleConverter;

impl ImageGrayscaleConverter {
    pub fn new() -> Self {
        Self
    }
}

impl GrayscaleConverter for ImageGrayscaleConverter {
    fn convert(&self, source: &Path) -> Result<PathBuf> {
        let image = image::open(source)
            .with_context(|| format!("Failed to open image: {}", source.display()))?;

        let output = gray_output_path(source);
        image
            .grayscale()
            .save(&output)
            .with_context(|| format!("Failed to save image: {}", output.display()))?;

        Ok(output)
    }

    fn converter_name(&self) -> &'static str {
        "image"
    }
}
