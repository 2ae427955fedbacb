use std::io::ErrorKind;

use crate::arguments::{InvocationArguments, default_worker_count};
use crate::config::{PluginConfig, ResolverSettings};
use crate::metadata::{ImageMetadata, ImageType};
use crate::process::{CommandRunner, CommandSpec, TokioCommandRunner};
use crate::resolver::{BinaryResolver, ResolvedBinary};
use crate::{TriangleError, TriangleResult};

/// Name under which the pipeline lists this plugin.
pub const PLUGIN_NAME: &str = "triangle";

const TEMP_PREFIX: &str = "sqip-triangle-";
const OUTPUT_FILE_NAME: &str = "output.svg";
const FALLBACK_EXTENSION: &str = "png";

/// Pipeline stage that turns a raster image into a triangulated SVG.
#[derive(Debug, Clone)]
pub struct TrianglePlugin<R = TokioCommandRunner> {
    config: PluginConfig,
    resolver: BinaryResolver,
    runner: R,
    workers: u32,
}

impl TrianglePlugin {
    /// Construct the plugin from the pipeline's configuration.
    ///
    /// Plugin options are validated here so a bad option fails the run before
    /// any image is processed.
    pub fn new(config: PluginConfig) -> TriangleResult<Self> {
        config.plugin_options.validate()?;
        Ok(Self {
            config,
            resolver: BinaryResolver::new(ResolverSettings::default()),
            runner: TokioCommandRunner,
            workers: default_worker_count(),
        })
    }
}

impl<R> TrianglePlugin<R>
where
    R: CommandRunner,
{
    /// Replace the resolver settings (vendor directory, platform).
    pub fn with_resolver_settings(mut self, settings: ResolverSettings) -> Self {
        self.resolver = BinaryResolver::new(settings);
        self
    }

    /// Run subprocesses through a different runner.
    pub fn with_runner<R2: CommandRunner>(self, runner: R2) -> TrianglePlugin<R2> {
        TrianglePlugin {
            config: self.config,
            resolver: self.resolver,
            runner,
            workers: self.workers,
        }
    }

    /// Worker count passed as `-cw` when the options do not set one.
    pub fn with_worker_count(mut self, workers: u32) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn resolver(&self) -> &BinaryResolver {
        &self.resolver
    }

    /// Whether the pipeline configuration lists this plugin as active.
    pub fn is_active(&self) -> bool {
        self.config
            .sqip_config
            .plugins
            .iter()
            .any(|name| name == PLUGIN_NAME)
    }

    /// Make sure a usable `triangle` binary exists and report which one.
    pub async fn check_for_triangle(&self) -> TriangleResult<ResolvedBinary> {
        self.resolver.check_for_triangle(&self.runner).await
    }

    /// The argument list `apply` would use for an image, with path placeholders.
    pub fn arguments(&self, metadata: &ImageMetadata) -> InvocationArguments {
        InvocationArguments::build_with_workers(
            &self.config.plugin_options,
            metadata,
            self.workers,
        )
    }

    /// Triangulate `image` and return the SVG document produced by the binary.
    ///
    /// Resolution runs again on every call. The output is not validated as SVG.
    pub async fn apply(&self, image: &[u8], metadata: &ImageMetadata) -> TriangleResult<Vec<u8>> {
        if metadata.image_type == ImageType::Svg {
            return Err(TriangleError::UnsupportedInput(
                "SVG input cannot be triangulated".to_string(),
            ));
        }
        if image.is_empty() {
            return Err(TriangleError::UnsupportedInput(
                "image buffer is empty".to_string(),
            ));
        }

        let binary = self.check_for_triangle().await?;
        let arguments = self.arguments(metadata);
        tracing::debug!(arguments = %arguments, "built triangle arguments");

        let workdir = tempfile::Builder::new().prefix(TEMP_PREFIX).tempdir()?;
        let input = workdir
            .path()
            .join(format!("input.{}", input_extension(image)));
        let output = workdir.path().join(OUTPUT_FILE_NAME);
        tokio::fs::write(&input, image).await?;

        let command = CommandSpec::new(binary.path(), arguments.render(&input, &output));
        let result = self.runner.run(&command).await?;

        let svg = match tokio::fs::read(&output).await {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => result.stdout,
            Err(err) if err.kind() == ErrorKind::NotFound => result.stdout,
            Err(err) => return Err(err.into()),
        };
        if svg.is_empty() {
            return Err(TriangleError::EmptyOutput {
                program: command.program_name(),
            });
        }

        tracing::debug!(bytes = svg.len(), "triangle produced svg");
        Ok(svg)
    }
}

/// File extension matching the encoded image, so the binary can pick a decoder.
fn input_extension(image: &[u8]) -> &'static str {
    image::guess_format(image)
        .ok()
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or(FALLBACK_EXTENSION)
}
