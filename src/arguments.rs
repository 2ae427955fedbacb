//! Command line construction for the `triangle` binary.
//!
//! Options are emitted by walking [`OPTION_TABLE`] in order, never by iterating
//! the supplied options, so identical configuration and metadata always give
//! the same argument list.

use std::fmt;
use std::path::Path;

use crate::config::{OptionValue, PluginOptions};
use crate::metadata::ImageMetadata;

/// Triangle count used for square images and when the size is unknown.
pub const DEFAULT_TRIANGLE_COUNT: u32 = 100;
/// Upper bound for the size-derived triangle count.
pub const MAX_DEFAULT_TRIANGLE_COUNT: u32 = 400;

const INPUT_FLAG: &str = "-in";
const OUTPUT_FLAG: &str = "-out";

/// Kind of value an option accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Number,
    /// Whole number of at least one.
    Count,
    Text,
    /// Boolean switch, emitted as a bare flag when set.
    Flag,
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptionKind::Number => "number",
            OptionKind::Count => "positive integer",
            OptionKind::Text => "string",
            OptionKind::Flag => "boolean",
        };
        f.write_str(name)
    }
}

impl OptionKind {
    /// Whether `value` is acceptable for an option of this kind.
    pub fn accepts(self, value: &OptionValue) -> bool {
        match (self, value) {
            (OptionKind::Number, OptionValue::Number(number)) => number.is_finite(),
            (OptionKind::Count, OptionValue::Number(number)) => {
                number.is_finite() && *number >= 1.0 && number.fract() == 0.0
            }
            (OptionKind::Text, OptionValue::Text(_)) => true,
            (OptionKind::Flag, OptionValue::Flag(_)) => true,
            _ => false,
        }
    }
}

/// Value used when an option is not supplied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OptionDefault {
    /// Leave the option off the command line.
    Omit,
    Number(f64),
    /// Derived from the image dimensions, see [`default_triangle_count`].
    FromDimensions,
    /// Worker count handed to the builder, see [`default_worker_count`].
    Workers,
}

/// One row of the option table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionSpec {
    pub key: &'static str,
    pub flag: &'static str,
    pub kind: OptionKind,
    pub default: OptionDefault,
    pub description: &'static str,
}

const fn spec(
    key: &'static str,
    flag: &'static str,
    kind: OptionKind,
    default: OptionDefault,
    description: &'static str,
) -> OptionSpec {
    OptionSpec {
        key,
        flag,
        kind,
        default,
        description,
    }
}

/// Every option the binary understands, in command line order.
pub const OPTION_TABLE: &[OptionSpec] = &[
    spec("bl", "-bl", OptionKind::Number, OptionDefault::Number(2.0), "Blur radius"),
    spec("nf", "-nf", OptionKind::Count, OptionDefault::FromDimensions, "Number of triangles"),
    spec("bf", "-bf", OptionKind::Number, OptionDefault::Number(1.0), "Blur factor"),
    spec("ef", "-ef", OptionKind::Number, OptionDefault::Number(6.0), "Edge factor"),
    spec("pr", "-pr", OptionKind::Number, OptionDefault::Number(0.075), "Point rate"),
    spec("pth", "-pth", OptionKind::Number, OptionDefault::Number(10.0), "Points threshold"),
    spec("pts", "-pts", OptionKind::Number, OptionDefault::Number(250.0), "Maximum number of points"),
    spec("so", "-so", OptionKind::Number, OptionDefault::Number(10.0), "Sobel filter threshold"),
    spec("sl", "-sl", OptionKind::Flag, OptionDefault::Omit, "Use solid stroke color"),
    spec("wf", "-wf", OptionKind::Number, OptionDefault::Number(0.0), "Wireframe mode (0, 1 or 2)"),
    spec("st", "-st", OptionKind::Number, OptionDefault::Number(1.0), "Stroke width"),
    spec("gr", "-gr", OptionKind::Flag, OptionDefault::Omit, "Output in grayscale"),
    spec("bg", "-bg", OptionKind::Text, OptionDefault::Omit, "Background color (hex)"),
    spec("cw", "-cw", OptionKind::Count, OptionDefault::Workers, "Number of concurrent workers"),
];

/// Look up an option by its key.
pub fn find_option(key: &str) -> Option<&'static OptionSpec> {
    OPTION_TABLE.iter().find(|spec| spec.key == key)
}

/// Triangle count for an image when none is configured.
///
/// Elongated images get proportionally more triangles so the long side keeps
/// the same density as a square image.
pub fn default_triangle_count(metadata: &ImageMetadata) -> u32 {
    match metadata.aspect_ratio() {
        Some(ratio) => {
            let scaled = (f64::from(DEFAULT_TRIANGLE_COUNT) * ratio).round();
            scaled.clamp(
                f64::from(DEFAULT_TRIANGLE_COUNT),
                f64::from(MAX_DEFAULT_TRIANGLE_COUNT),
            ) as u32
        }
        None => DEFAULT_TRIANGLE_COUNT,
    }
}

/// Worker count used when `cw` is not configured: the available parallelism, or 1.
pub fn default_worker_count() -> u32 {
    std::thread::available_parallelism()
        .map(|count| u32::try_from(count.get()).unwrap_or(u32::MAX))
        .unwrap_or(1)
}

/// A single command line token, with the two file paths left as placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(String),
    InputPath,
    OutputPath,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Literal(value) => f.write_str(value),
            Token::InputPath => f.write_str("<input>"),
            Token::OutputPath => f.write_str("<output>"),
        }
    }
}

/// Ordered argument list: `-in <input> [flag value]... -out <output>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationArguments {
    tokens: Vec<Token>,
}

impl InvocationArguments {
    /// Build the argument list for the given options and image.
    pub fn build(options: &PluginOptions, metadata: &ImageMetadata) -> Self {
        Self::build_with_workers(options, metadata, default_worker_count())
    }

    /// Like [`build`](Self::build), with an explicit fallback for `cw`.
    pub fn build_with_workers(
        options: &PluginOptions,
        metadata: &ImageMetadata,
        workers: u32,
    ) -> Self {
        let mut tokens = vec![Token::Literal(INPUT_FLAG.to_string()), Token::InputPath];

        for spec in OPTION_TABLE {
            match (options.get(spec.key), spec.default) {
                (Some(OptionValue::Flag(true)), _) => push_flag(&mut tokens, spec.flag),
                (Some(OptionValue::Flag(false)), _) => {}
                (Some(value), _) => push_pair(&mut tokens, spec.flag, value.to_string()),
                (None, OptionDefault::Omit) => {}
                (None, OptionDefault::Number(number)) => {
                    push_pair(&mut tokens, spec.flag, OptionValue::Number(number).to_string())
                }
                (None, OptionDefault::FromDimensions) => push_pair(
                    &mut tokens,
                    spec.flag,
                    default_triangle_count(metadata).to_string(),
                ),
                (None, OptionDefault::Workers) => {
                    push_pair(&mut tokens, spec.flag, workers.to_string())
                }
            }
        }

        tokens.push(Token::Literal(OUTPUT_FLAG.to_string()));
        tokens.push(Token::OutputPath);
        Self { tokens }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The value following `flag`, if the flag takes one and is present.
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        let takes_value = OPTION_TABLE
            .iter()
            .find(|spec| spec.flag == flag)
            .is_none_or(|spec| spec.kind != OptionKind::Flag);
        if !takes_value {
            return None;
        }
        self.tokens
            .windows(2)
            .find_map(|pair| match pair {
                [Token::Literal(name), Token::Literal(value)] if name == flag => {
                    Some(value.as_str())
                }
                _ => None,
            })
    }

    /// Whether `flag` appears anywhere in the list.
    pub fn contains_flag(&self, flag: &str) -> bool {
        self.tokens
            .iter()
            .any(|token| matches!(token, Token::Literal(name) if name == flag))
    }

    /// Substitute the placeholders with concrete paths.
    pub fn render(&self, input: &Path, output: &Path) -> Vec<String> {
        self.tokens
            .iter()
            .map(|token| match token {
                Token::Literal(value) => value.clone(),
                Token::InputPath => input.display().to_string(),
                Token::OutputPath => output.display().to_string(),
            })
            .collect()
    }
}

impl fmt::Display for InvocationArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for token in &self.tokens {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{token}")?;
            first = false;
        }
        Ok(())
    }
}

fn push_flag(tokens: &mut Vec<Token>, flag: &str) {
    tokens.push(Token::Literal(flag.to_string()));
}

fn push_pair(tokens: &mut Vec<Token>, flag: &str, value: String) {
    tokens.push(Token::Literal(flag.to_string()));
    tokens.push(Token::Literal(value));
}
