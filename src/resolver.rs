use std::path::{Path, PathBuf};

use crate::config::ResolverSettings;
use crate::platform::{BINARY_NAME, OsFamily};
use crate::process::{CommandRunner, CommandSpec};
use crate::{TriangleError, TriangleResult};

/// Which executable a triangulation run will use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedBinary {
    /// The prebuilt binary shipped for this platform.
    Bundled(PathBuf),
    /// A binary found on the system search path.
    Global(PathBuf),
}

impl ResolvedBinary {
    /// The program to hand to the process runner.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedBinary::Bundled(path) | ResolvedBinary::Global(path) => path,
        }
    }

    pub fn is_bundled(&self) -> bool {
        matches!(self, ResolvedBinary::Bundled(_))
    }
}

/// The command that asks the system whether `triangle` is on the search path.
pub fn lookup_command(family: OsFamily) -> CommandSpec {
    let args = vec![BINARY_NAME.to_string()];
    match family {
        OsFamily::Windows => CommandSpec::new("where", args),
        OsFamily::Posix => CommandSpec::builtin("type", args),
    }
}

/// Decides between the bundled binary and a globally installed one.
///
/// Nothing is cached: every check reads the filesystem again and, when the
/// bundled binary is unavailable, spawns one lookup subprocess.
#[derive(Debug, Clone)]
pub struct BinaryResolver {
    settings: ResolverSettings,
}

impl BinaryResolver {
    pub fn new(settings: ResolverSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Where the bundled binary would live for the configured platform.
    pub fn bundled_path(&self) -> Option<PathBuf> {
        self.settings
            .platform
            .bundled_binary_path(&self.settings.vendor_dir)
    }

    /// Resolve a usable binary, failing with [`TriangleError::BinaryNotFound`] when there is none.
    pub async fn check_for_triangle<R>(&self, runner: &R) -> TriangleResult<ResolvedBinary>
    where
        R: CommandRunner + ?Sized,
    {
        let bundled = self.bundled_path();
        if let Some(path) = &bundled {
            tracing::debug!(path = %path.display(), "probing bundled triangle binary");
            if is_regular_file(path).await {
                tracing::info!(path = %path.display(), "using bundled triangle binary");
                return Ok(ResolvedBinary::Bundled(path.clone()));
            }
            tracing::warn!(
                path = %path.display(),
                "bundled triangle binary not available, looking for a global install"
            );
        } else {
            tracing::warn!(
                platform = %self.settings.platform,
                "no bundled triangle binary for this platform, looking for a global install"
            );
        }

        let lookup = lookup_command(self.settings.platform.family());
        match runner.run(&lookup).await {
            Ok(_) => {
                tracing::info!("using globally installed triangle binary");
                Ok(ResolvedBinary::Global(PathBuf::from(BINARY_NAME)))
            }
            Err(err) => Err(TriangleError::BinaryNotFound {
                bundled,
                lookup: err.to_string(),
            }),
        }
    }
}

async fn is_regular_file(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata.is_file(),
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "bundled binary is not usable");
            false
        }
    }
}
