use std::fs::read_to_string;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use color_eyre::eyre::{eyre, Result, WrapErr};
use eframe::egui::{self, Color32, Pos2, Stroke};
use miasi_lang::{
    compile, spawn_script, Color, CommandQueue, Console, DrawCommand, EvaluatorConfig, Geometry,
    QueuedSurface, Runtime, RuntimeConfig, ScriptThread, SharedShape, SurfaceState, Value, Vector2,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit status for source that fails to lex or parse.
const EXIT_DATA_ERROR: u8 = 65;

#[derive(Debug, Parser)]
#[clap(name = "miasi", version, about = "Run a miasi drawing script")]
struct Args {
    /// Script to run.
    file: PathBuf,
    /// Initial window width in pixels.
    #[clap(long, default_value_t = 800)]
    width: u32,
    /// Initial window height in pixels.
    #[clap(long, default_value_t = 800)]
    height: u32,
    /// Draw commands applied per frame; 0 applies everything queued.
    #[clap(long = "drain-per-tick", default_value_t = 1)]
    drain_per_tick: usize,
    /// Nested user-function calls allowed before the script fails.
    #[clap(long = "max-call-depth", default_value_t = 256)]
    max_call_depth: usize,
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let source = read_to_string(&args.file)
        .wrap_err_with(|| format!("could not read {}", args.file.display()))?;
    info!(file = %args.file.display(), bytes = source.len(), "script loaded");

    let program = match compile(&source) {
        Ok(program) => program,
        Err(errors) => {
            for e in &errors {
                eprintln!("{}: {e}", args.file.display());
            }
            return Ok(ExitCode::from(EXIT_DATA_ERROR));
        }
    };

    let config = RuntimeConfig {
        window_width: args.width,
        window_height: args.height,
        evaluator: EvaluatorConfig { max_call_depth: args.max_call_depth },
        ..RuntimeConfig::default()
    };

    let queue = CommandQueue::new();
    let state = Arc::new(SurfaceState::new(f64::from(args.width), f64::from(args.height)));
    let surface = Arc::new(QueuedSurface::new(queue.clone(), state.clone()));
    let script = spawn_script(program, surface, Console::Stdout, config.clone())
        .wrap_err("could not start the script thread")?;

    let title = format!("miasi: {}", args.file.display());
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(title.clone())
            .with_inner_size([config.window_width as f32, config.window_height as f32]),
        ..Default::default()
    };
    let app = App::new(queue, state, script, args.drain_per_tick, config.background);
    eframe::run_native(&title, options, Box::new(|_cc| Ok(Box::new(app))))
        .map_err(|e| eyre!("window failed: {e}"))?;

    Ok(ExitCode::SUCCESS)
}

// ─── Scene ────────────────────────────────────────────────────────────────────

/// Everything drawn so far. Shapes are shared with the script, so property
/// writes made after `draw` show up on the next frame.
struct Scene {
    background: Color,
    shapes: Vec<(Vector2, SharedShape)>,
}

impl Scene {
    /// `current` is the canvas size this frame, used to keep the other
    /// extent when only one of them is set.
    fn apply(&mut self, cmd: DrawCommand, ctx: &egui::Context, current: egui::Vec2) {
        match cmd {
            DrawCommand::SetBackground(c) => self.background = c,
            DrawCommand::SetWindowSize { width, height } => resize(ctx, width as f32, height as f32),
            DrawCommand::SetWindowWidth(width) => resize(ctx, width as f32, current.y),
            DrawCommand::SetWindowHeight(height) => resize(ctx, current.x, height as f32),
            DrawCommand::DrawShape { position, shape } => self.shapes.push((position, shape)),
            DrawCommand::Clear => self.shapes.clear(),
        }
    }

    /// Scene coordinates are y-up with the origin at the bottom-left corner.
    fn paint(&self, painter: &egui::Painter, canvas: egui::Rect) {
        painter.rect_filled(canvas, 0.0, color32(self.background));

        let to_screen = |x: f64, y: f64| Pos2::new(canvas.min.x + x as f32, canvas.max.y - y as f32);

        for (at, shape) in &self.shapes {
            let shape = shape.lock();
            if !shape.is_visible {
                continue;
            }
            let fill = color32(shape.color);
            match &shape.geometry {
                Geometry::Rectangle { width, height } => {
                    let rect = egui::Rect::from_center_size(
                        to_screen(at.x, at.y),
                        egui::vec2(*width as f32, *height as f32),
                    );
                    painter.rect_filled(rect, 0.0, fill);
                }
                Geometry::Circle { radius } => {
                    painter.circle_filled(to_screen(at.x, at.y), *radius as f32, fill);
                }
                Geometry::Triangle { p2, p3 } => {
                    let points = vec![to_screen(at.x, at.y), to_screen(p2.x, p2.y), to_screen(p3.x, p3.y)];
                    painter.add(egui::Shape::convex_polygon(points, fill, Stroke::NONE));
                }
                Geometry::Line { x2, y2, thickness } => {
                    painter.line_segment(
                        [to_screen(at.x, at.y), to_screen(*x2, *y2)],
                        Stroke::new(*thickness as f32, fill),
                    );
                }
            }
        }
    }
}

fn resize(ctx: &egui::Context, width: f32, height: f32) {
    debug!(width, height, "resizing window");
    ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(egui::vec2(width, height)));
}

fn color32(c: Color) -> Color32 {
    Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a)
}

// ─── App state ────────────────────────────────────────────────────────────────

struct App {
    queue: CommandQueue,
    state: Arc<SurfaceState>,
    script: ScriptThread,
    /// `None` until the top-level program has finished on the script thread.
    runtime: Option<Runtime>,
    scene: Scene,
    drain_per_tick: usize,
    last_tick: Instant,
}

impl App {
    fn new(
        queue: CommandQueue,
        state: Arc<SurfaceState>,
        script: ScriptThread,
        drain_per_tick: usize,
        background: Color,
    ) -> Self {
        Self {
            queue,
            state,
            script,
            runtime: None,
            scene: Scene { background, shapes: Vec::new() },
            drain_per_tick,
            last_tick: Instant::now(),
        }
    }

    /// Deliver `update(dt)` and, on a primary click inside the canvas,
    /// `click(x, y)`. Failures were already logged by the runtime.
    fn dispatch_events(&mut self, dt: f64, click: Option<Vector2>) {
        let Some(rt) = &mut self.runtime else { return };
        let _ = rt.dispatch("update", vec![Value::Float(dt)]);
        if let Some(at) = click {
            let _ = rt.dispatch("click", vec![Value::Float(at.x), Value::Float(at.y)]);
        }
    }
}

// ─── Frame loop ───────────────────────────────────────────────────────────────

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_tick).as_secs_f64();
        self.last_tick = now;

        if self.runtime.is_none() {
            if let Ok(rt) = self.script.runtime.try_recv() {
                info!(update = rt.has_event("update"), click = rt.has_event("click"), "runtime received");
                self.runtime = Some(rt);
            }
        }

        egui::CentralPanel::default().frame(egui::Frame::NONE).show(ctx, |ui| {
            let (canvas, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::click());

            // script coordinates are y-up from the bottom-left corner
            let to_scene = |p: Pos2| Vector2::new(f64::from(p.x - canvas.min.x), f64::from(canvas.max.y - p.y));
            self.state.set_size(f64::from(canvas.width()), f64::from(canvas.height()));
            if let Some(p) = response.hover_pos() {
                self.state.set_mouse(to_scene(p));
            }
            let click = if response.clicked() { response.interact_pointer_pos().map(to_scene) } else { None };

            self.dispatch_events(dt, click);

            for cmd in self.queue.drain(self.drain_per_tick) {
                self.scene.apply(cmd, ctx, canvas.size());
            }

            self.scene.paint(&ui.painter_at(canvas), canvas);
        });

        ctx.request_repaint();
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if !self.queue.is_empty() {
            warn!(pending = self.queue.len(), "window closed with draw commands still queued");
        }
        self.state.close();
    }
}
