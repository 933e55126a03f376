//! Event dispatch and surface tests.
//!
//! Tests the part of the runtime that outlives the top-level program:
//! `on <event>` handlers re-entering the evaluator, the hand-off from the
//! script thread, and what builtins ask of the surface.

use std::sync::Arc;
use std::time::Duration;

use miasi_lang::{
    compile, spawn_script, Color, CommandQueue, Console, DrawCommand, ErrorKind, QueuedSurface,
    Runtime, RuntimeConfig, SharedShape, Surface, SurfaceState, Value, Vector2,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

// ─── Recording surface ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Call {
    Start,
    Background(Color),
    Size(u32, u32),
    Width(u32),
    Height(u32),
    Draw(Vector2, SharedShape),
    Clear,
}

struct RecordingSurface {
    calls: Mutex<Vec<Call>>,
    mouse: Vector2,
}

impl RecordingSurface {
    fn new(mouse: Vector2) -> Arc<Self> {
        Arc::new(Self { calls: Mutex::new(Vec::new()), mouse })
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn drawn(&self) -> Vec<SharedShape> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Draw(_, shape) => Some(shape),
                _ => None,
            })
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn start(&self) { self.calls.lock().push(Call::Start); }
    fn set_background(&self, color: Color) { self.calls.lock().push(Call::Background(color)); }
    fn set_window_size(&self, width: u32, height: u32) { self.calls.lock().push(Call::Size(width, height)); }
    fn set_window_width(&self, width: u32) { self.calls.lock().push(Call::Width(width)); }
    fn set_window_height(&self, height: u32) { self.calls.lock().push(Call::Height(height)); }
    fn draw_shape(&self, position: Vector2, shape: SharedShape) { self.calls.lock().push(Call::Draw(position, shape)); }
    fn clear(&self) { self.calls.lock().push(Call::Clear); }
    fn mouse_position(&self) -> Vector2 { self.mouse }
    fn window_width(&self) -> f64 { 320.0 }
    fn window_height(&self) -> f64 { 240.0 }
    fn wait_for_close(&self) {}
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn boot(src: &str) -> (Runtime, Arc<RecordingSurface>) {
    let surface = RecordingSurface::new(Vector2::new(10.0, 20.0));
    let prog = compile(src).unwrap_or_else(|errs| {
        panic!("compile failed: {errs:#?}");
    });
    let (console, _) = Console::capture();
    let rt = Runtime::new(&prog, surface.clone(), console, &RuntimeConfig::default())
        .unwrap_or_else(|e| panic!("Runtime::new failed: {e:?}"));
    if let Some(e) = rt.program_errors().first() {
        panic!("program failed: {e}");
    }
    (rt, surface)
}

fn var(rt: &Runtime, name: &str) -> Value {
    rt.evaluator()
        .get_variable(name)
        .cloned()
        .unwrap_or_else(|| panic!("variable `{name}` is not bound"))
}

// ─── Dispatch ─────────────────────────────────────────────────────────────────

#[test]
fn update_handler_accumulates_state() {
    let (mut rt, _) = boot("let t = 0; on update(dt) { t = t + dt; }");
    assert!(rt.has_event("update"));
    rt.dispatch("update", vec![Value::Float(0.5)]).unwrap();
    rt.dispatch("update", vec![Value::Float(0.25)]).unwrap();
    assert_eq!(var(&rt, "t"), Value::Float(0.75));
}

#[test]
fn unknown_event_is_a_no_op() {
    let (mut rt, _) = boot("let x = 1;");
    assert!(!rt.has_event("update"));
    assert_eq!(rt.dispatch("update", vec![Value::Float(0.1)]).unwrap(), None);
}

#[test]
fn handler_return_value_is_surfaced() {
    let (mut rt, _) = boot("on ping() { return 42; } on pong() { }");
    assert_eq!(rt.dispatch("ping", vec![]).unwrap(), Some(Value::Int(42)));
    assert_eq!(rt.dispatch("pong", vec![]).unwrap(), None);
}

#[test]
fn extra_event_arguments_are_ignored() {
    let (mut rt, _) = boot("let got = 0; on click(x, y) { got = x + y; }");
    rt.dispatch("click", vec![Value::Int(1), Value::Int(2), Value::Int(99)]).unwrap();
    assert_eq!(var(&rt, "got"), Value::Int(3));
}

#[test]
fn too_few_event_arguments_is_arity_error() {
    let (mut rt, _) = boot("on click(x, y) { }");
    let e = rt.dispatch("click", vec![Value::Int(1)]).unwrap_err();
    assert_eq!(e.kind, ErrorKind::Arity { expected: 2, actual: 1 });
}

#[test]
fn failing_handler_leaves_runtime_usable() {
    let src = "
        let ticks = 0;
        on update(dt) {
            ticks = ticks + 1;
            { let z = dt / 0; }
        }
    ";
    let (mut rt, _) = boot(src);
    for _ in 0..3 {
        let e = rt.dispatch("update", vec![Value::Int(1)]).unwrap_err();
        assert_eq!(e.kind, ErrorKind::Arithmetic);
        assert_eq!(rt.evaluator().scope_depth(), 1);
    }
    assert_eq!(var(&rt, "ticks"), Value::Int(3));
}

#[test]
fn break_escaping_handler_is_control_error() {
    let (mut rt, _) = boot("on update(dt) { break; }");
    let e = rt.dispatch("update", vec![Value::Float(0.1)]).unwrap_err();
    assert_eq!(e.kind, ErrorKind::Control);
}

#[test]
fn handler_params_do_not_leak() {
    let (mut rt, _) = boot("on update(dt) { let local = dt; }");
    rt.dispatch("update", vec![Value::Float(0.1)]).unwrap();
    assert!(rt.evaluator().get_variable("dt").is_none());
    assert!(rt.evaluator().get_variable("local").is_none());
}

#[test]
fn handlers_may_call_functions_defined_later() {
    let (mut rt, _) = boot("on update(dt) { bump(); } let n = 0; function bump() { n = n + 1; }");
    rt.dispatch("update", vec![Value::Float(0.1)]).unwrap();
    assert_eq!(var(&rt, "n"), Value::Int(1));
}

#[test]
fn duplicate_event_handler_is_program_error() {
    let prog = compile("on update(dt) { } on update(dt) { }").unwrap();
    let surface = RecordingSurface::new(Vector2::ZERO);
    let (console, _) = Console::capture();
    let rt = Runtime::new(&prog, surface, console, &RuntimeConfig::default()).unwrap();
    assert_eq!(rt.program_errors().len(), 1);
    assert_eq!(rt.program_errors()[0].kind, ErrorKind::Name);
    assert_eq!(rt.program_errors()[0].line, 1);
}

// ─── Surface interaction ─────────────────────────────────────────────────────

#[test]
fn prologue_runs_before_program() {
    let (_, surface) = boot("set bg_color = rgb(1, 2, 3);");
    let calls = surface.calls();
    assert!(matches!(calls[0], Call::Start));
    assert!(matches!(calls[1], Call::Size(800, 800)));
    assert!(matches!(calls[2], Call::Background(c) if c == Color::rgb(125, 125, 255)));
    assert!(matches!(calls[3], Call::Background(c) if c == Color::rgb(1, 2, 3)));
    assert_eq!(calls.len(), 4);
}

#[test]
fn queries_read_the_surface() {
    let (rt, _) = boot("let p = get_mouse_pos(); let w = get_window_width(); let h = get_window_height();");
    assert_eq!(var(&rt, "p"), Value::Vec2(Vector2::new(10.0, 20.0)));
    assert_eq!(var(&rt, "w"), Value::Int(320));
    assert_eq!(var(&rt, "h"), Value::Int(240));
}

#[test]
fn drawn_shape_tracks_later_writes() {
    let src = "
        let ball = circle(radius: 5, color: #ff0000);
        draw((100, 100), ball);
        on update(dt) { ball.radius = ball.radius + 1; }
    ";
    let (mut rt, surface) = boot(src);
    rt.dispatch("update", vec![Value::Float(0.016)]).unwrap();
    rt.dispatch("update", vec![Value::Float(0.016)]).unwrap();

    let drawn = surface.drawn();
    assert_eq!(drawn.len(), 1);
    assert_eq!(drawn[0].lock().get("radius"), Some(Value::Float(7.0)));
    assert_eq!(drawn[0].lock().color, Color::rgb(255, 0, 0));
}

#[test]
fn clear_and_redraw_from_handler() {
    let src = "
        on click(x, y) {
            clear();
            draw((x, y), rect(width: 4, height: 2));
        }
    ";
    let (mut rt, surface) = boot(src);
    rt.dispatch("click", vec![Value::Float(3.0), Value::Float(4.0)]).unwrap();
    let calls = surface.calls();
    let tail = &calls[calls.len() - 2..];
    assert!(matches!(tail[0], Call::Clear));
    assert!(matches!(&tail[1], Call::Draw(at, _) if *at == Vector2::new(3.0, 4.0)));
}

#[test]
fn window_property_reaches_surface() {
    let (_, surface) = boot("set width = 1024; set height = 300.7;");
    let calls = surface.calls();
    assert!(matches!(calls[3], Call::Width(1024)));
    assert!(matches!(calls[4], Call::Height(300)));
}

// ─── Command queue ────────────────────────────────────────────────────────────

#[test]
fn queue_drains_one_command_per_tick() {
    let queue = CommandQueue::new();
    let state = Arc::new(SurfaceState::new(800.0, 800.0));
    let surface = Arc::new(QueuedSurface::new(queue.clone(), state));
    let prog = compile("draw((1, 1), circle()); draw((2, 2), line()); clear();").unwrap();
    let (console, _) = Console::capture();
    let _rt = Runtime::new(&prog, surface, console, &RuntimeConfig::default()).unwrap();

    // window size, background, two shapes, clear
    assert_eq!(queue.len(), 5);
    let mut seen = Vec::new();
    while !queue.is_empty() {
        let tick = queue.drain(1);
        assert_eq!(tick.len(), 1);
        seen.extend(tick);
    }
    assert!(matches!(seen[2], DrawCommand::DrawShape { position, .. } if position == Vector2::new(1.0, 1.0)));
    assert!(matches!(seen[3], DrawCommand::DrawShape { position, .. } if position == Vector2::new(2.0, 2.0)));
    assert!(matches!(seen[4], DrawCommand::Clear));
}

#[test]
fn queued_surface_answers_size_eagerly() {
    let queue = CommandQueue::new();
    let state = Arc::new(SurfaceState::new(800.0, 800.0));
    let surface = QueuedSurface::new(queue.clone(), state.clone());
    surface.set_window_width(500);
    assert_eq!(surface.window_width(), 500.0);

    // the frame loop reports the real size later
    state.set_size(640.0, 480.0);
    assert_eq!(surface.window_width(), 640.0);
    assert_eq!(surface.window_height(), 480.0);
}

// ─── Script thread ────────────────────────────────────────────────────────────

#[test]
fn script_thread_hands_off_runtime() {
    let queue = CommandQueue::new();
    let state = Arc::new(SurfaceState::new(800.0, 800.0));
    let surface = Arc::new(QueuedSurface::new(queue.clone(), state.clone()));
    let prog = compile("let frames = 0; on update(dt) { frames = frames + 1; print(frames); }").unwrap();
    let (console, printed) = Console::capture();
    let config = RuntimeConfig { script_stack_size: 8 * 1024 * 1024, ..RuntimeConfig::default() };

    let script = spawn_script(prog, surface, console, config).unwrap();
    let mut rt = script.runtime.recv_timeout(Duration::from_secs(5)).unwrap();

    // the script thread is parked until the window closes
    assert!(!script.handle.is_finished());
    rt.dispatch("update", vec![Value::Float(0.016)]).unwrap();
    rt.dispatch("update", vec![Value::Float(0.016)]).unwrap();
    assert_eq!(var(&rt, "frames"), Value::Int(2));
    assert_eq!(printed.lock().clone(), vec!["1", "2"]);

    state.close();
    script.handle.join().unwrap();
    assert!(state.is_closed());
}
