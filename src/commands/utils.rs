use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::ImageReader;
use sqip_triangle::{ImageMetadata, ImageType, PluginConfig, ResolverSettings, TriangleResult};

use crate::cli::GlobalOptions;

/// Resolver settings with the vendor directory override applied.
pub fn resolver_settings(global: &GlobalOptions) -> ResolverSettings {
    let settings = ResolverSettings::default();
    match &global.vendor_dir {
        Some(dir) => settings.with_vendor_dir(dir.clone()),
        None => settings,
    }
}

/// Load the plugin configuration file, or start from an empty one.
pub async fn load_config(path: Option<&Path>) -> TriangleResult<PluginConfig> {
    match path {
        Some(path) => {
            let json = tokio::fs::read_to_string(path).await?;
            PluginConfig::from_json(&json)
        }
        None => Ok(PluginConfig::default()),
    }
}

/// Describe the input image the way the pipeline would.
pub fn read_metadata(path: &Path, bytes: &[u8]) -> TriangleResult<ImageMetadata> {
    let is_svg = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));
    if is_svg {
        return Ok(ImageMetadata::new(ImageType::Svg, 0, 0));
    }

    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()?;
    Ok(ImageMetadata::pixel(width, height))
}

/// Derive an SVG file path by changing the extension to "svg".
pub fn derive_svg_path(input: &Path) -> PathBuf {
    let mut path = input.to_path_buf();
    path.set_extension("svg");
    path
}
