pub mod arguments;
pub mod config;
pub mod error;
pub mod metadata;
pub mod platform;
pub mod plugin;
pub mod process;
pub mod resolver;

pub use arguments::{InvocationArguments, OPTION_TABLE, OptionKind, OptionSpec, Token};
pub use config::{
    ENV_VENDOR_DIR, OptionValue, PipelineOptions, PluginConfig, PluginOptions, ResolverSettings,
    SqipConfig,
};
pub use error::{TriangleError, TriangleResult};
pub use metadata::{ImageMetadata, ImageType, Orientation};
pub use platform::{OsFamily, Platform};
pub use plugin::{PLUGIN_NAME, TrianglePlugin};
pub use process::{CommandOutput, CommandRunner, CommandSpec, TokioCommandRunner};
pub use resolver::{BinaryResolver, ResolvedBinary};
