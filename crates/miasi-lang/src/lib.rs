pub mod error;
pub mod runtime;
pub mod syntax;
pub mod types;

pub use error::{BuiltinError, Error, ErrorCode, ErrorKind, RuntimeError, Warning};
pub use runtime::builtins::Console;
pub use runtime::interpreter::{Evaluator, EvaluatorConfig};
pub use runtime::symbols::{Arity, DefinitionError};
pub use runtime::value::Value;
pub use syntax::ast::Program;
pub use syntax::token::{Token, TokenKind};
pub use types::color::Color;
pub use types::draw::{CommandQueue, DrawCommand, QueuedSurface, Surface, SurfaceState};
pub use types::shape::{Geometry, Shape, SharedShape};
pub use types::vector::Vector2;

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver};
use tracing::{error, info, warn};

// ─── Public API ───────────────────────────────────────────────────────────────

/// Lex and parse source text. Every syntax error is returned; none of them
/// let the program run.
pub fn compile(source: &str) -> Result<Program, Vec<Error>> {
    let tokens = syntax::lexer::Lexer::new(source).tokenize()?;
    syntax::parser::Parser::new(tokens).parse()
}

// ─── Configuration ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub window_width: u32,
    pub window_height: u32,
    /// Applied before the first statement runs.
    pub background: Color,
    pub evaluator: EvaluatorConfig,
    /// Stack size of the thread that runs the top-level program.
    pub script_stack_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            window_width: 800,
            window_height: 800,
            background: Color::rgb(125, 125, 255),
            evaluator: EvaluatorConfig::default(),
            script_stack_size: 64 * 1024 * 1024,
        }
    }
}

// ─── Runtime ──────────────────────────────────────────────────────────────────

/// An evaluator bound to a surface, past its top-level run.
///
/// Lifecycle:
///   1. `Runtime::new(...)`: installs the standard builtins, starts the
///      surface, applies the default window size and background, then runs
///      every top-level statement once. Failing statements are logged and kept in
///      `program_errors`; they do not stop later statements.
///   2. `runtime.dispatch(event, args)`: re-enters the same evaluator for
///      `on <event>(...)` handlers, once per tick or input. A failing
///      dispatch is reported and leaves the runtime usable.
///
/// `Runtime` is `Send`: phase 1 may run on one thread and the
/// value then moves to whichever thread drives dispatch.
pub struct Runtime {
    evaluator: Evaluator,
    surface: Arc<dyn Surface>,
    program_errors: Vec<RuntimeError>,
}

impl Runtime {
    pub fn new(
        program: &Program,
        surface: Arc<dyn Surface>,
        console: Console,
        config: &RuntimeConfig,
    ) -> Result<Self, DefinitionError> {
        let mut evaluator = Evaluator::with_config(config.evaluator.clone());
        runtime::builtins::install(&mut evaluator, surface.clone(), console)?;

        surface.start();
        surface.set_window_size(config.window_width, config.window_height);
        surface.set_background(config.background);

        let program_errors = match evaluator.execute_program(program) {
            Ok(()) => Vec::new(),
            Err(errors) => errors,
        };
        info!(errors = program_errors.len(), "program finished");

        Ok(Self { evaluator, surface, program_errors })
    }

    /// Run the `on <event>` handler if one exists.
    pub fn dispatch(&mut self, event: &str, args: Vec<Value>) -> Result<Option<Value>, RuntimeError> {
        let result = self.evaluator.execute_event(event, args);
        if let Err(e) = &result {
            warn!(event, %e, "event handler failed");
        }
        result
    }

    pub fn has_event(&self, event: &str) -> bool {
        self.evaluator.has_event(event)
    }

    pub fn program_errors(&self) -> &[RuntimeError] {
        &self.program_errors
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn evaluator_mut(&mut self) -> &mut Evaluator {
        &mut self.evaluator
    }

    pub fn surface(&self) -> &Arc<dyn Surface> {
        &self.surface
    }
}

// ─── Script thread ────────────────────────────────────────────────────────────

/// Handle to a running script thread. `runtime` yields the [`Runtime`] once
/// the top-level program has completed; nothing else ever touches it on the
/// script thread afterwards.
pub struct ScriptThread {
    pub handle: JoinHandle<()>,
    pub runtime: Receiver<Runtime>,
}

/// Run the program on its own thread with an enlarged stack, hand the
/// finished runtime over through a one-shot channel, then block until the
/// surface closes.
pub fn spawn_script(
    program: Program,
    surface: Arc<dyn Surface>,
    console: Console,
    config: RuntimeConfig,
) -> io::Result<ScriptThread> {
    let (tx, rx) = channel::bounded(1);

    let handle = thread::Builder::new()
        .name("miasi-script".into())
        .stack_size(config.script_stack_size)
        .spawn(move || {
            match Runtime::new(&program, surface.clone(), console, &config) {
                Ok(runtime) => {
                    if tx.send(runtime).is_err() {
                        warn!("frame loop is gone; dropping the runtime");
                    } else {
                        info!("evaluator handed off to the frame loop");
                    }
                }
                Err(e) => error!(%e, "failed to install builtins"),
            }
            surface.wait_for_close();
            info!("window closed");
        })?;

    Ok(ScriptThread { handle, runtime: rx })
}
