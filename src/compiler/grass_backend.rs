//! [`Compiler`] backed by the `grass` crate.

use std::fmt;

use codemap::SpanLoc;

use super::error::CompileError;
use super::loader::{PlaygroundLoader, LOAD_ERROR_MESSAGE};
use super::log::WarnOptions;
use super::span::{LineIndex, SourceSpan};
use super::{CompileLogger, CompileRequest, Compiler};
use crate::states::{InputFormat, OutputFormat};

/// Version of the grass release this backend is built against.
const GRASS_VERSION: &str = "0.13";

#[derive(Debug, Default, Clone, Copy)]
pub struct GrassCompiler;

impl GrassCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl Compiler for GrassCompiler {
    fn compile(
        &self,
        request: &CompileRequest<'_>,
        logger: &dyn CompileLogger,
    ) -> Result<String, CompileError> {
        let loader = PlaygroundLoader::default();
        let index = LineIndex::new(request.source);
        let bridge = LoggerBridge {
            sink: logger,
            source: request.source,
            index: &index,
        };
        let options = grass::Options::default()
            .input_syntax(input_syntax(request.syntax))
            .style(output_style(request.style))
            .fs(&loader)
            .logger(&bridge);

        match grass::from_string(request.source.to_owned(), &options) {
            // grass terminates the stylesheet with a newline; the output pane
            // and `output_value` hold it without one.
            Ok(css) => Ok(css.strip_suffix('\n').unwrap_or(&css).to_owned()),
            Err(err) => Err(convert_error(*err, &loader, request.source, &index)),
        }
    }

    fn version(&self) -> String {
        format!("grass {GRASS_VERSION}")
    }
}

fn input_syntax(format: InputFormat) -> grass::InputSyntax {
    match format {
        InputFormat::Scss => grass::InputSyntax::Scss,
        InputFormat::Indented => grass::InputSyntax::Sass,
    }
}

fn output_style(format: OutputFormat) -> grass::OutputStyle {
    match format {
        OutputFormat::Expanded => grass::OutputStyle::Expanded,
        OutputFormat::Compressed => grass::OutputStyle::Compressed,
    }
}

fn to_span(loc: &SpanLoc, source: &str, index: &LineIndex) -> SourceSpan {
    SourceSpan {
        start: index.location(source, loc.begin.line, loc.begin.column),
        end: index.location(source, loc.end.line, loc.end.column),
    }
}

fn convert_error(
    err: grass::Error,
    loader: &PlaygroundLoader,
    source: &str,
    index: &LineIndex,
) -> CompileError {
    let rendered = err.to_string();
    #[allow(unreachable_patterns)]
    match err.kind() {
        grass::ErrorKind::ParseError { loc, .. } => {
            let message = if loader.attempted() {
                tracing::debug!(attempts = ?loader.attempts(), "compile failed on a stylesheet load");
                LOAD_ERROR_MESSAGE.to_string()
            } else {
                rendered
            };
            CompileError::Exception {
                message,
                span: to_span(&loc, source, index),
            }
        }
        grass::ErrorKind::IoError(io) => CompileError::Unknown(Some(io.to_string())),
        grass::ErrorKind::FromUtf8Error(text) => CompileError::Unknown(Some(text)),
        _ => CompileError::Unknown(Some(rendered)),
    }
}

/// Forwards grass logger callbacks to a [`CompileLogger`], translating
/// codemap locations into offsets of the compiled buffer.
struct LoggerBridge<'a> {
    sink: &'a dyn CompileLogger,
    source: &'a str,
    index: &'a LineIndex,
}

impl fmt::Debug for LoggerBridge<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerBridge").finish_non_exhaustive()
    }
}

impl grass::Logger for LoggerBridge<'_> {
    fn debug(&self, location: SpanLoc, message: &str) {
        self.sink
            .debug(message, to_span(&location, self.source, self.index));
    }

    fn warn(&self, location: SpanLoc, message: &str) {
        self.sink.warn(
            message,
            WarnOptions {
                span: Some(to_span(&location, self.source, self.index)),
                ..WarnOptions::default()
            },
        );
    }
}
