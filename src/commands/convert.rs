use sqip_triangle::{PLUGIN_NAME, TrianglePlugin, TriangleResult};

use crate::cli::{ConvertCommand, GlobalOptions};

use super::utils::{derive_svg_path, load_config, read_metadata, resolver_settings};

/// The main function to run the convert command.
pub async fn run(global: &GlobalOptions, cmd: ConvertCommand) -> TriangleResult<()> {
    let output_path = cmd
        .output
        .clone()
        .unwrap_or_else(|| derive_svg_path(&cmd.input));

    let mut config = load_config(cmd.config.as_deref()).await?;
    cmd.triangle_options.apply_to(&mut config.plugin_options);
    config.sqip_config.input = cmd.input.display().to_string();
    config.sqip_config.output = Some(output_path.display().to_string());
    if config.sqip_config.plugins.is_empty() {
        config.sqip_config.plugins = vec![PLUGIN_NAME.to_string()];
    }

    let plugin = TrianglePlugin::new(config)?.with_resolver_settings(resolver_settings(global));

    let image = tokio::fs::read(&cmd.input).await?;
    let metadata = read_metadata(&cmd.input, &image)?;
    if cmd.print_args {
        eprintln!("triangle {}", plugin.arguments(&metadata));
    }

    let svg = plugin.apply(&image, &metadata).await?;
    tokio::fs::write(&output_path, &svg).await?;
    println!("SVG saved to {}", output_path.display());

    Ok(())
}
