use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{ImageFormat, RgbaImage};
use sqip_triangle::{
    CommandOutput, CommandRunner, CommandSpec, ImageMetadata, ImageType, Platform, PluginConfig,
    PluginOptions, ResolverSettings, SqipConfig, TriangleError, TrianglePlugin, TriangleResult,
};
use tempfile::TempDir;

const MOCKED_SVG: &str = r##"<svg viewBox="0 0 1024 768"><rect width="100%" height="100%" fill="#bada5500"/><g><path fill="#fff" d="M300,188 L0,188 L174,146 L300,188"/></g></rect></svg>"##;

/// How the fake `triangle` binary answers.
#[derive(Clone, Copy)]
enum Triangle {
    /// Write the SVG to the `-out` path.
    WritesFile,
    /// Print the SVG on stdout only.
    PrintsStdout,
    /// Exit without producing anything.
    Silent,
    /// Fail to start.
    Crashes,
}

struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    lookup_succeeds: bool,
    triangle: Triangle,
}

impl RecordingRunner {
    fn new(lookup_succeeds: bool, triangle: Triangle) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            lookup_succeeds,
            triangle,
        })
    }

    fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }
}

fn spawn_error(command: &CommandSpec, message: &str) -> TriangleError {
    TriangleError::Spawn {
        program: command.program_name(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, message.to_string()),
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, command: &CommandSpec) -> TriangleResult<CommandOutput> {
        self.calls.lock().unwrap().push(command.clone());

        let program = command.program_name();
        if program == "type" || program == "where" {
            return if self.lookup_succeeds {
                Ok(CommandOutput::default())
            } else {
                Err(spawn_error(command, "not installed"))
            };
        }

        match self.triangle {
            Triangle::WritesFile => {
                let output = command.args.last().expect("output path");
                std::fs::write(output, MOCKED_SVG)?;
                Ok(CommandOutput::default())
            }
            Triangle::PrintsStdout => Ok(CommandOutput {
                stdout: MOCKED_SVG.as_bytes().to_vec(),
                stderr: Vec::new(),
            }),
            Triangle::Silent => Ok(CommandOutput::default()),
            Triangle::Crashes => Err(spawn_error(command, "segfault")),
        }
    }
}

fn mocked_config(plugin_options: PluginOptions) -> PluginConfig {
    PluginConfig::new(
        plugin_options,
        SqipConfig {
            input: "mocked".to_string(),
            output: Some("mocked".to_string()),
            plugins: vec!["triangle".to_string()],
        },
    )
}

fn triangle_metadata() -> ImageMetadata {
    ImageMetadata {
        image_type: ImageType::Pixel,
        ..ImageMetadata::default()
    }
}

fn transparent_png() -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    RgbaImage::new(1, 1)
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

fn plugin(
    options: PluginOptions,
    vendor: &Path,
    runner: Arc<RecordingRunner>,
) -> TrianglePlugin<Arc<RecordingRunner>> {
    TrianglePlugin::new(mocked_config(options))
        .unwrap()
        .with_resolver_settings(
            ResolverSettings::default()
                .with_vendor_dir(vendor)
                .with_platform(Platform::new("linux", "x86_64")),
        )
        .with_worker_count(1)
        .with_runner(runner)
}

/// Run `apply` and return the triangle call's arguments with both paths masked.
async fn masked_triangle_args(options: PluginOptions, metadata: ImageMetadata) -> Vec<String> {
    let vendor = TempDir::new().unwrap();
    let runner = RecordingRunner::new(true, Triangle::WritesFile);
    let plugin = plugin(options, vendor.path(), Arc::clone(&runner));

    let svg = plugin.apply(&transparent_png(), &metadata).await.unwrap();
    assert_eq!(svg, MOCKED_SVG.as_bytes());

    let calls = runner.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].program, PathBuf::from("triangle"));

    let mut args = calls[1].args.clone();
    assert_eq!(args[0], "-in");
    assert_eq!(args[args.len() - 2], "-out");
    args[1] = "mocked".to_string();
    let last = args.len() - 1;
    args[last] = "mocked".to_string();
    args
}

mod check_for_triangle {
    use super::*;

    #[tokio::test]
    async fn bundled_executable_exists() {
        let vendor = TempDir::new().unwrap();
        let bundled = vendor.path().join("linux-x86_64").join("triangle");
        std::fs::create_dir_all(bundled.parent().unwrap()).unwrap();
        std::fs::write(&bundled, b"binary").unwrap();
        let runner = RecordingRunner::new(false, Triangle::WritesFile);

        let resolved = plugin(PluginOptions::new(), vendor.path(), Arc::clone(&runner))
            .check_for_triangle()
            .await
            .unwrap();

        assert_eq!(resolved.path(), bundled.as_path());
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn globally_installed_when_bundled_is_missing() {
        let vendor = TempDir::new().unwrap();
        let runner = RecordingRunner::new(true, Triangle::WritesFile);

        let resolved = plugin(PluginOptions::new(), vendor.path(), Arc::clone(&runner))
            .check_for_triangle()
            .await
            .unwrap();

        assert!(!resolved.is_bundled());
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn not_installed_anywhere() {
        let vendor = TempDir::new().unwrap();
        let runner = RecordingRunner::new(false, Triangle::WritesFile);

        let err = plugin(PluginOptions::new(), vendor.path(), Arc::clone(&runner))
            .check_for_triangle()
            .await
            .unwrap_err();

        assert!(matches!(err, TriangleError::BinaryNotFound { .. }));
        assert!(err.to_string().contains("not installed"));
    }
}

mod apply {
    use super::*;

    #[tokio::test]
    async fn executes_triangle_with_default_config() {
        let args = masked_triangle_args(PluginOptions::new(), triangle_metadata()).await;
        assert_eq!(
            args,
            vec![
                "-in", "mocked", "-bl", "2", "-nf", "133", "-bf", "1", "-ef", "6", "-pr", "0.075",
                "-pth", "10", "-pts", "250", "-so", "10", "-wf", "0", "-st", "1", "-cw", "1",
                "-out", "mocked",
            ]
        );
    }

    #[tokio::test]
    async fn custom_triangle_count_keeps_other_defaults() {
        let defaulted = masked_triangle_args(PluginOptions::new(), triangle_metadata()).await;
        let custom =
            masked_triangle_args(PluginOptions::new().with("nf", 1u32), triangle_metadata()).await;

        assert_eq!(custom.len(), defaulted.len());
        assert_ne!(custom, defaulted);
        let nf = custom.iter().position(|arg| arg == "-nf").unwrap();
        assert_eq!(custom[nf + 1], "1");
    }

    #[tokio::test]
    async fn landscape_dimensions_change_arguments() {
        let landscape = masked_triangle_args(
            PluginOptions::new(),
            ImageMetadata {
                width: 600,
                height: 300,
                ..triangle_metadata()
            },
        )
        .await;
        let defaulted = masked_triangle_args(PluginOptions::new(), triangle_metadata()).await;

        assert_ne!(landscape, defaulted);
        let nf = landscape.iter().position(|arg| arg == "-nf").unwrap();
        assert_eq!(landscape[nf + 1], "200");
    }

    #[tokio::test]
    async fn allows_hex_as_value_for_background() {
        let args = masked_triangle_args(
            PluginOptions::new().with("bg", "#654321"),
            triangle_metadata(),
        )
        .await;
        let bg = args.iter().position(|arg| arg == "-bg").unwrap();
        assert_eq!(args[bg + 1], "#654321");
    }

    #[tokio::test]
    async fn same_input_gives_same_arguments() {
        let options = PluginOptions::new().with("bg", "#654321").with("nf", 42u32);
        let first = masked_triangle_args(options.clone(), triangle_metadata()).await;
        let second = masked_triangle_args(options, triangle_metadata()).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn input_file_holds_the_image() {
        let vendor = TempDir::new().unwrap();
        let png = transparent_png();
        let seen = Arc::new(Mutex::new(None));

        struct Inspecting {
            seen: Arc<Mutex<Option<Vec<u8>>>>,
        }

        #[async_trait]
        impl CommandRunner for Inspecting {
            async fn run(&self, command: &CommandSpec) -> TriangleResult<CommandOutput> {
                if command.program_name() == "triangle" {
                    assert!(command.args[1].ends_with("input.png"));
                    *self.seen.lock().unwrap() = Some(std::fs::read(&command.args[1])?);
                    std::fs::write(command.args.last().unwrap(), MOCKED_SVG)?;
                }
                Ok(CommandOutput::default())
            }
        }

        let plugin = TrianglePlugin::new(mocked_config(PluginOptions::new()))
            .unwrap()
            .with_resolver_settings(
                ResolverSettings::default()
                    .with_vendor_dir(vendor.path())
                    .with_platform(Platform::new("linux", "x86_64")),
            )
            .with_runner(Inspecting {
                seen: Arc::clone(&seen),
            });

        plugin.apply(&png, &triangle_metadata()).await.unwrap();
        assert_eq!(seen.lock().unwrap().as_deref(), Some(png.as_slice()));
    }

    #[tokio::test]
    async fn stdout_is_used_when_no_file_is_written() {
        let vendor = TempDir::new().unwrap();
        let runner = RecordingRunner::new(true, Triangle::PrintsStdout);
        let plugin = plugin(PluginOptions::new(), vendor.path(), Arc::clone(&runner));

        let svg = plugin
            .apply(&transparent_png(), &triangle_metadata())
            .await
            .unwrap();

        assert_eq!(String::from_utf8(svg).unwrap(), MOCKED_SVG);
    }

    #[tokio::test]
    async fn bundled_binary_means_a_single_spawn() {
        let vendor = TempDir::new().unwrap();
        let bundled = vendor.path().join("linux-x86_64").join("triangle");
        std::fs::create_dir_all(bundled.parent().unwrap()).unwrap();
        std::fs::write(&bundled, b"binary").unwrap();
        let runner = RecordingRunner::new(false, Triangle::WritesFile);
        let plugin = plugin(PluginOptions::new(), vendor.path(), Arc::clone(&runner));

        plugin
            .apply(&transparent_png(), &triangle_metadata())
            .await
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, bundled);
    }

    #[tokio::test]
    async fn missing_binary_stops_before_triangulation() {
        let vendor = TempDir::new().unwrap();
        let runner = RecordingRunner::new(false, Triangle::WritesFile);
        let plugin = plugin(PluginOptions::new(), vendor.path(), Arc::clone(&runner));

        let err = plugin
            .apply(&transparent_png(), &triangle_metadata())
            .await
            .unwrap_err();

        assert!(matches!(err, TriangleError::BinaryNotFound { .. }));
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, PathBuf::from("type"));
    }

    #[tokio::test]
    async fn subprocess_failure_propagates() {
        let vendor = TempDir::new().unwrap();
        let runner = RecordingRunner::new(true, Triangle::Crashes);
        let plugin = plugin(PluginOptions::new(), vendor.path(), Arc::clone(&runner));

        let err = plugin
            .apply(&transparent_png(), &triangle_metadata())
            .await
            .unwrap_err();

        assert!(matches!(err, TriangleError::Spawn { ref program, .. } if program == "triangle"));
        assert_eq!(runner.calls().len(), 2);
    }

    #[tokio::test]
    async fn work_dir_is_removed_after_success() {
        let vendor = TempDir::new().unwrap();
        let runner = RecordingRunner::new(true, Triangle::WritesFile);
        let plugin = plugin(PluginOptions::new(), vendor.path(), Arc::clone(&runner));

        plugin
            .apply(&transparent_png(), &triangle_metadata())
            .await
            .unwrap();

        let calls = runner.calls();
        let input = Path::new(&calls[1].args[1]);
        let work_dir = input.parent().unwrap();
        assert!(!input.exists());
        assert!(!work_dir.exists());
    }

    #[tokio::test]
    async fn work_dir_is_removed_after_failure() {
        let vendor = TempDir::new().unwrap();
        let runner = RecordingRunner::new(true, Triangle::Crashes);
        let plugin = plugin(PluginOptions::new(), vendor.path(), Arc::clone(&runner));

        plugin
            .apply(&transparent_png(), &triangle_metadata())
            .await
            .unwrap_err();

        let calls = runner.calls();
        let work_dir = Path::new(&calls[1].args[1]).parent().unwrap();
        assert!(!work_dir.exists());
    }

    #[tokio::test]
    async fn configured_workers_replace_the_default() {
        let args = masked_triangle_args(PluginOptions::new().with("cw", 4u32), triangle_metadata())
            .await;
        let cw = args.iter().position(|arg| arg == "-cw").unwrap();
        assert_eq!(args[cw + 1], "4");
    }

    #[tokio::test]
    async fn silent_binary_is_empty_output() {
        let vendor = TempDir::new().unwrap();
        let runner = RecordingRunner::new(true, Triangle::Silent);
        let plugin = plugin(PluginOptions::new(), vendor.path(), Arc::clone(&runner));

        let err = plugin
            .apply(&transparent_png(), &triangle_metadata())
            .await
            .unwrap_err();

        assert!(matches!(err, TriangleError::EmptyOutput { .. }));
    }

    #[tokio::test]
    async fn svg_input_is_rejected_without_spawning() {
        let vendor = TempDir::new().unwrap();
        let runner = RecordingRunner::new(true, Triangle::WritesFile);
        let plugin = plugin(PluginOptions::new(), vendor.path(), Arc::clone(&runner));
        let metadata = ImageMetadata {
            image_type: ImageType::Svg,
            ..triangle_metadata()
        };

        let err = plugin
            .apply(MOCKED_SVG.as_bytes(), &metadata)
            .await
            .unwrap_err();

        assert!(matches!(err, TriangleError::UnsupportedInput(_)));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn every_apply_resolves_again() {
        let vendor = TempDir::new().unwrap();
        let runner = RecordingRunner::new(true, Triangle::WritesFile);
        let plugin = plugin(PluginOptions::new(), vendor.path(), Arc::clone(&runner));
        let png = transparent_png();

        plugin.apply(&png, &triangle_metadata()).await.unwrap();
        plugin.apply(&png, &triangle_metadata()).await.unwrap();

        let programs: Vec<String> = runner
            .calls()
            .iter()
            .map(CommandSpec::program_name)
            .collect();
        assert_eq!(programs, vec!["type", "triangle", "type", "triangle"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_applies_are_independent() {
        let vendor = TempDir::new().unwrap();
        let runner = RecordingRunner::new(true, Triangle::WritesFile);
        let plugin = Arc::new(plugin(PluginOptions::new(), vendor.path(), Arc::clone(&runner)));
        let png = transparent_png();

        let square = {
            let plugin = Arc::clone(&plugin);
            let png = png.clone();
            tokio::spawn(async move { plugin.apply(&png, &ImageMetadata::pixel(10, 10)).await })
        };
        let wide = {
            let plugin = Arc::clone(&plugin);
            tokio::spawn(async move { plugin.apply(&png, &ImageMetadata::pixel(600, 300)).await })
        };

        assert_eq!(square.await.unwrap().unwrap(), MOCKED_SVG.as_bytes());
        assert_eq!(wide.await.unwrap().unwrap(), MOCKED_SVG.as_bytes());

        let triangle_calls: Vec<CommandSpec> = runner
            .calls()
            .into_iter()
            .filter(|call| call.program_name() == "triangle")
            .collect();
        assert_eq!(triangle_calls.len(), 2);
        assert_ne!(triangle_calls[0].args[1], triangle_calls[1].args[1]);
    }
}
