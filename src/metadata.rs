use serde::{Deserialize, Serialize};

/// Kind of image handed to a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    /// Raster input, the only kind this plugin converts.
    Pixel,
    /// Vector input, already an SVG.
    Svg,
    #[default]
    Unknown,
}

/// Aspect class of an image, used to pick size-dependent defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Landscape,
    Portrait,
    Square,
}

/// Per-image descriptor supplied with each `apply` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    #[serde(rename = "type", default)]
    pub image_type: ImageType,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub original_width: u32,
    #[serde(default)]
    pub original_height: u32,
}

impl ImageMetadata {
    /// Create metadata for an image whose working and original sizes match.
    pub fn new(image_type: ImageType, width: u32, height: u32) -> Self {
        Self {
            image_type,
            width,
            height,
            original_width: width,
            original_height: height,
        }
    }

    /// Metadata for a raster image of the given size.
    pub fn pixel(width: u32, height: u32) -> Self {
        Self::new(ImageType::Pixel, width, height)
    }

    pub fn orientation(&self) -> Orientation {
        match self.width.cmp(&self.height) {
            std::cmp::Ordering::Greater => Orientation::Landscape,
            std::cmp::Ordering::Less => Orientation::Portrait,
            std::cmp::Ordering::Equal => Orientation::Square,
        }
    }

    /// Ratio of the long side to the short side, `None` when a side is zero.
    pub fn aspect_ratio(&self) -> Option<f64> {
        let (long, short) = match self.orientation() {
            Orientation::Portrait => (self.height, self.width),
            _ => (self.width, self.height),
        };
        if short == 0 {
            return None;
        }
        Some(f64::from(long) / f64::from(short))
    }
}

impl Default for ImageMetadata {
    /// The stand-in metadata the pipeline uses for a 1024x768 source.
    fn default() -> Self {
        Self::new(ImageType::Unknown, 1024, 768)
    }
}
