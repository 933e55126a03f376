//! Everything that crosses from the evaluator to the presentation side.
//!
//! The evaluator only ever talks to a [`Surface`]. The windowed app uses
//! [`QueuedSurface`], which turns each call into a [`DrawCommand`] on a
//! [`CommandQueue`] and answers queries from a [`SurfaceState`] the frame
//! loop keeps current.

use std::sync::Arc;

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use parking_lot::{Condvar, Mutex, RwLock};
use tracing::{debug, trace};

use crate::types::color::Color;
use crate::types::shape::SharedShape;
use crate::types::vector::Vector2;

// ─── Draw command ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum DrawCommand {
    SetBackground(Color),
    SetWindowSize { width: u32, height: u32 },
    SetWindowWidth(u32),
    SetWindowHeight(u32),
    /// Adds the shape to the retained scene at `position`. The shape is
    /// shared, so later property writes still show up.
    DrawShape { position: Vector2, shape: SharedShape },
    /// Empties the retained scene.
    Clear,
}

// ─── Presentation contract ───────────────────────────────────────────────────

/// What the evaluator's builtins may ask of the window.
pub trait Surface: Send + Sync {
    fn start(&self);
    fn set_background(&self, color: Color);
    fn set_window_size(&self, width: u32, height: u32);
    fn set_window_width(&self, width: u32);
    fn set_window_height(&self, height: u32);
    fn draw_shape(&self, position: Vector2, shape: SharedShape);
    fn clear(&self);
    fn mouse_position(&self) -> Vector2;
    fn window_width(&self) -> f64;
    fn window_height(&self) -> f64;
    /// Block the calling thread until the window is gone.
    fn wait_for_close(&self);
}

// ─── Command queue ────────────────────────────────────────────────────────────

/// Ordered, thread-safe FIFO between the script thread and the frame loop.
#[derive(Clone)]
pub struct CommandQueue {
    tx: Sender<DrawCommand>,
    rx: Receiver<DrawCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        let (tx, rx) = channel::unbounded();
        Self { tx, rx }
    }

    pub fn push(&self, cmd: DrawCommand) {
        trace!(?cmd, "queued");
        // Both ends live in `self`, so the channel cannot be disconnected.
        let _ = self.tx.send(cmd);
    }

    /// Take up to `limit` commands in FIFO order; `0` takes everything
    /// currently queued.
    pub fn drain(&self, limit: usize) -> Vec<DrawCommand> {
        let mut out = Vec::new();
        while limit == 0 || out.len() < limit {
            match self.rx.try_recv() {
                Ok(cmd) => out.push(cmd),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        if !out.is_empty() {
            debug!(drained = out.len(), remaining = self.rx.len(), "command queue drained");
        }
        out
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for CommandQueue {
    fn default() -> Self { Self::new() }
}

// ─── Shared window state ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Snapshot {
    mouse: Vector2,
    width: f64,
    height: f64,
}

/// Window facts written by the frame loop and read by script queries.
pub struct SurfaceState {
    snapshot: RwLock<Snapshot>,
    closed: Mutex<bool>,
    close_signal: Condvar,
}

impl SurfaceState {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            snapshot: RwLock::new(Snapshot { mouse: Vector2::ZERO, width, height }),
            closed: Mutex::new(false),
            close_signal: Condvar::new(),
        }
    }

    pub fn set_mouse(&self, mouse: Vector2) {
        self.snapshot.write().mouse = mouse;
    }

    pub fn set_size(&self, width: f64, height: f64) {
        let mut s = self.snapshot.write();
        s.width = width;
        s.height = height;
    }

    pub fn set_width(&self, width: f64) {
        self.snapshot.write().width = width;
    }

    pub fn set_height(&self, height: f64) {
        self.snapshot.write().height = height;
    }

    pub fn mouse(&self) -> Vector2 {
        self.snapshot.read().mouse
    }

    pub fn size(&self) -> (f64, f64) {
        let s = self.snapshot.read();
        (s.width, s.height)
    }

    pub fn close(&self) {
        let mut closed = self.closed.lock();
        *closed = true;
        self.close_signal.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock()
    }

    pub fn wait_closed(&self) {
        let mut closed = self.closed.lock();
        while !*closed {
            self.close_signal.wait(&mut closed);
        }
    }
}

// ─── Queued surface ──────────────────────────────────────────────────────────

/// A [`Surface`] that forwards side effects through a [`CommandQueue`].
#[derive(Clone)]
pub struct QueuedSurface {
    queue: CommandQueue,
    state: Arc<SurfaceState>,
}

impl QueuedSurface {
    pub fn new(queue: CommandQueue, state: Arc<SurfaceState>) -> Self {
        Self { queue, state }
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub fn state(&self) -> &Arc<SurfaceState> {
        &self.state
    }
}

impl Surface for QueuedSurface {
    fn start(&self) {
        debug!("surface started");
    }

    fn set_background(&self, color: Color) {
        self.queue.push(DrawCommand::SetBackground(color));
    }

    // Size queries answer with the requested size right away; the frame
    // loop overwrites it with the real one once the window has resized.
    fn set_window_size(&self, width: u32, height: u32) {
        self.state.set_size(f64::from(width), f64::from(height));
        self.queue.push(DrawCommand::SetWindowSize { width, height });
    }

    fn set_window_width(&self, width: u32) {
        self.state.set_width(f64::from(width));
        self.queue.push(DrawCommand::SetWindowWidth(width));
    }

    fn set_window_height(&self, height: u32) {
        self.state.set_height(f64::from(height));
        self.queue.push(DrawCommand::SetWindowHeight(height));
    }

    fn draw_shape(&self, position: Vector2, shape: SharedShape) {
        self.queue.push(DrawCommand::DrawShape { position, shape });
    }

    fn clear(&self) {
        self.queue.push(DrawCommand::Clear);
    }

    fn mouse_position(&self) -> Vector2 {
        self.state.mouse()
    }

    fn window_width(&self) -> f64 {
        self.state.size().0
    }

    fn window_height(&self) -> f64 {
        self.state.size().1
    }

    fn wait_for_close(&self) {
        self.state.wait_closed();
    }
}
