use sqip_triangle::{PluginConfig, ResolvedBinary, TrianglePlugin, TriangleResult};

use crate::cli::GlobalOptions;

use super::utils::resolver_settings;

/// Run the check command.
pub async fn run(global: &GlobalOptions) -> TriangleResult<()> {
    let plugin =
        TrianglePlugin::new(PluginConfig::default())?.with_resolver_settings(resolver_settings(global));

    match plugin.check_for_triangle().await? {
        ResolvedBinary::Bundled(path) => {
            println!("Using bundled triangle binary at {}", path.display());
        }
        ResolvedBinary::Global(path) => {
            println!("Using globally installed `{}`", path.display());
        }
    }

    Ok(())
}
