//! The signature pad component.
//!
//! `SignPad` owns a [`Surface`] and drives it from pointer input:
//!
//! ```text
//! Idle ──down (snapshot)──▶ Drawing ──move (track + paint)──▶ Drawing
//!   ▲                          │
//!   └──── up / cancel / leave ─┘  (finalize at last known point)
//! ```
//!
//! Nothing here returns an error to the host. Backend failures are logged
//! and absorbed; an unsupported surface leaves the pad inert.

use crate::input::InputEvent;
use sign_core::config::Config;
use sign_core::debounce::Debouncer;
use sign_core::history::SnapshotHistory;
use sign_core::layout::{HostMetrics, SurfaceSize};
use sign_core::model::{ImageType, Ink, Point};
use sign_core::surface::Surface;
use sign_core::tracker::{StrokeTracker, WidthModel};
use sign_render::stroke::{StrokeRenderer, paint_segment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadState {
    Idle,
    Drawing,
}

/// A pre-stroke bitmap and the surface size it was taken at.
struct Capture<T> {
    bitmap: T,
    size: SurfaceSize,
}

pub struct SignPad<S: Surface> {
    surface: S,
    config: Config,
    tracker: StrokeTracker,
    renderer: StrokeRenderer,
    history: SnapshotHistory<Capture<S::Snapshot>>,
    resize_debounce: Debouncer,
    pending_host: Option<HostMetrics>,
    state: PadState,
    empty: bool,
    /// `false` when the surface could not be set up; every operation is then a no-op.
    ready: bool,
}

impl<S: Surface> SignPad<S> {
    /// Mount a pad on `surface` and initialize it for `host`.
    pub fn mount(surface: S, config: Config, host: HostMetrics) -> Self {
        let model = WidthModel::from_config(&config);
        let mut pad = Self {
            surface,
            tracker: StrokeTracker::new(model),
            renderer: StrokeRenderer::new(),
            history: SnapshotHistory::new(config.max_history),
            resize_debounce: Debouncer::new(config.resize_delay_ms),
            pending_host: None,
            state: PadState::Idle,
            empty: true,
            ready: false,
            config,
        };
        let config = pad.config.clone();
        pad.initialize(config, host);
        pad
    }

    /// (Re)initialize with `config`: allocate the bitmap, paint decoration,
    /// drop history. Returns `false` if the surface is unusable.
    pub fn initialize(&mut self, mut config: Config, host: HostMetrics) -> bool {
        config.normalize();
        self.tracker = StrokeTracker::new(WidthModel::from_config(&config));
        self.renderer = StrokeRenderer::new();
        self.history = SnapshotHistory::new(config.max_history);
        self.resize_debounce = Debouncer::new(config.resize_delay_ms);
        self.pending_host = None;
        self.state = PadState::Idle;
        self.empty = true;
        self.config = config;

        let size = SurfaceSize::resolve(&self.config, &host);
        match self.surface.allocate(size) {
            Ok(()) => {
                self.ready = true;
                self.paint_decoration();
                log::debug!(
                    "pad ready at {}x{} (ratio {})",
                    size.width,
                    size.height,
                    size.ratio
                );
            }
            Err(e) => {
                self.ready = false;
                log::warn!("signature pad disabled: {e}");
            }
        }
        self.ready
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Dispatch a pointer event. Returns `true` if the bitmap changed.
    pub fn handle(&mut self, event: &InputEvent) -> bool {
        match *event {
            InputEvent::PointerDown { x, y, time_ms } => {
                self.pointer_down(Point::new(x, y), time_ms)
            }
            InputEvent::PointerMove { x, y, time_ms } => {
                self.pointer_move(Point::new(x, y), time_ms)
            }
            InputEvent::PointerUp { .. }
            | InputEvent::PointerCancel { .. }
            | InputEvent::PointerLeave { .. } => self.end_stroke(),
        }
    }

    /// Begin a stroke. A stroke already in progress is finalized first.
    /// Non-finite samples are dropped.
    pub fn pointer_down(&mut self, point: Point, time_ms: f64) -> bool {
        if !self.ready || !finite_sample(point, time_ms) {
            return false;
        }
        let finished = self.end_stroke();
        let capture = Capture {
            bitmap: self.surface.snapshot(),
            size: self.surface.size(),
        };
        self.history.push(capture, self.empty);

        let sample = self.tracker.begin(point, time_ms);
        self.renderer.begin(sample.point, sample.width);
        self.state = PadState::Drawing;
        log::trace!("stroke start ({:.1}, {:.1})", point.x, point.y);
        finished
    }

    /// Extend the current stroke. Ignored while idle; non-finite samples
    /// are dropped and the stroke continues from the last good one.
    pub fn pointer_move(&mut self, point: Point, time_ms: f64) -> bool {
        if !self.ready || self.state != PadState::Drawing || !finite_sample(point, time_ms) {
            return false;
        }
        let Some(sample) = self.tracker.advance(point, time_ms) else {
            return false;
        };
        let Some(segment) = self.renderer.extend(sample.point, sample.width) else {
            return false;
        };
        let ink = self.ink();
        paint_segment(&mut self.surface, &segment, &ink);
        true
    }

    /// Finalize the current stroke at its last known point. Up, cancel and
    /// leave all land here.
    pub fn end_stroke(&mut self) -> bool {
        if self.state != PadState::Drawing {
            return false;
        }
        if let Some(tail) = self.renderer.finish() {
            let ink = self.ink();
            paint_segment(&mut self.surface, &tail, &ink);
        }
        self.tracker.end();
        self.state = PadState::Idle;
        self.empty = false;
        true
    }

    fn abort_stroke(&mut self) {
        self.tracker.end();
        self.renderer = StrokeRenderer::new();
        self.state = PadState::Idle;
    }

    // ─── Surface management ──────────────────────────────────────────────

    /// Reset to background and border only, dropping all history.
    pub fn clear(&mut self) {
        if !self.ready {
            return;
        }
        self.abort_stroke();
        self.paint_decoration();
        self.history.clear();
        self.empty = true;
    }

    /// Restore the state before the most recent stroke. Returns `false`
    /// (and changes nothing) when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        if !self.ready {
            return false;
        }
        let Some(entry) = self.history.pop() else {
            return false;
        };
        if self.state == PadState::Drawing {
            self.abort_stroke();
        }
        let Capture { bitmap, size } = &entry.snapshot;
        self.surface.restore(bitmap);
        // A bitmap from before a resize comes back scaled, border included.
        if *size != self.surface.size() {
            self.paint_border();
        }
        self.empty = entry.was_empty;
        true
    }

    /// Recompute the size for `host` and reallocate when it changed.
    /// Existing ink is scaled to the new size; an open stroke continues.
    pub fn resize(&mut self, host: HostMetrics) -> bool {
        if !self.ready {
            return false;
        }
        let size = SurfaceSize::resolve(&self.config, &host);
        if size == self.surface.size() {
            return false;
        }
        let capture =
            (!self.empty || self.state == PadState::Drawing).then(|| self.surface.snapshot());
        if let Err(e) = self.surface.allocate(size) {
            log::warn!("resize to {}x{} failed: {e}", size.width, size.height);
            return false;
        }
        match capture {
            Some(snapshot) => {
                self.surface.restore(&snapshot);
                self.paint_border();
            }
            None => self.paint_decoration(),
        }
        log::debug!(
            "resized to {}x{} (ratio {})",
            size.width,
            size.height,
            size.ratio
        );
        true
    }

    /// Record a resize signal. The actual resize runs from [`tick`](Self::tick)
    /// once no further signal arrived for the configured delay.
    pub fn notify_resize(&mut self, host: HostMetrics, now_ms: f64) {
        self.pending_host = Some(host);
        self.resize_debounce.schedule(now_ms);
    }

    /// Run a pending debounced resize if its delay elapsed.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        if !self.resize_debounce.poll(now_ms) {
            return false;
        }
        match self.pending_host.take() {
            Some(host) => self.resize(host),
            None => false,
        }
    }

    /// Run a pending resize right away against `host`, skipping the rest
    /// of the delay. Used when the host owns the timer.
    pub fn flush_resize(&mut self, host: HostMetrics) -> bool {
        if !self.resize_debounce.is_pending() {
            return false;
        }
        self.resize_debounce.cancel();
        self.pending_host = None;
        self.resize(host)
    }

    // ─── Export ──────────────────────────────────────────────────────────

    /// Encode the bitmap in `format`, or return the empty placeholder.
    pub fn export(&self, format: ImageType) -> String {
        if !self.ready || self.empty {
            return self.config.empty_placeholder.clone();
        }
        match self.surface.encode(format, self.config.image_quality) {
            Ok(url) => url,
            Err(e) => {
                log::warn!("export failed: {e}");
                self.config.empty_placeholder.clone()
            }
        }
    }

    /// Like [`export`](Self::export), taking a format name. Unknown or empty
    /// names use the configured image type.
    pub fn to_data_url(&self, format: &str) -> String {
        let format = if format.trim().is_empty() {
            self.config.image_type
        } else {
            ImageType::parse(format).unwrap_or_else(|| {
                log::warn!(
                    "unsupported export format {format:?}, using {}",
                    self.config.image_type
                );
                self.config.image_type
            })
        };
        self.export(format)
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn state(&self) -> PadState {
        self.state
    }

    pub fn is_drawing(&self) -> bool {
        self.state == PadState::Drawing
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tracker(&self) -> &StrokeTracker {
        &self.tracker
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn resize_pending(&self) -> bool {
        self.resize_debounce.is_pending()
    }

    // ─── Painting helpers ────────────────────────────────────────────────

    fn ink(&self) -> Ink {
        Ink {
            color: self.config.write_color,
            cap: self.config.line_cap,
            join: self.config.line_join,
        }
    }

    fn paint_decoration(&mut self) {
        self.surface.fill_background(self.config.background);
        self.paint_border();
    }

    fn paint_border(&mut self) {
        if self.config.show_border {
            self.surface
                .stroke_border(self.config.border_width, self.config.border_color);
        }
    }
}

fn finite_sample(point: Point, time_ms: f64) -> bool {
    if point.is_finite() && time_ms.is_finite() {
        return true;
    }
    log::warn!(
        "dropping non-finite pointer sample ({}, {}) at {time_ms}",
        point.x,
        point.y
    );
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use sign_render::RasterSurface;

    fn pad() -> SignPad<RasterSurface> {
        SignPad::mount(
            RasterSurface::new(),
            Config::default(),
            HostMetrics::fixed(100.0, 60.0, 1.0),
        )
    }

    #[test]
    fn state_machine_transitions() {
        let mut pad = pad();
        assert_eq!(pad.state(), PadState::Idle);
        assert!(!pad.handle(&InputEvent::moved(5.0, 5.0, 0.0)));

        pad.handle(&InputEvent::down(5.0, 5.0, 0.0));
        assert_eq!(pad.state(), PadState::Drawing);
        assert_eq!(pad.history_len(), 1);
        assert!(pad.handle(&InputEvent::moved(30.0, 20.0, 16.0)));

        assert!(pad.handle(&InputEvent::PointerCancel { time_ms: 32.0 }));
        assert_eq!(pad.state(), PadState::Idle);
        assert!(!pad.tracker().is_tracking());
        assert!(!pad.is_empty());
    }

    #[test]
    fn down_while_drawing_finalizes_previous_stroke() {
        let mut pad = pad();
        pad.pointer_down(Point::new(5.0, 5.0), 0.0);
        pad.pointer_move(Point::new(20.0, 5.0), 10.0);
        pad.pointer_down(Point::new(40.0, 40.0), 20.0);
        assert!(!pad.is_empty());
        assert!(pad.is_drawing());
        assert_eq!(pad.history_len(), 2);
    }

    #[test]
    fn leave_ends_stroke_like_up() {
        let mut pad = pad();
        pad.pointer_down(Point::new(5.0, 5.0), 0.0);
        pad.handle(&InputEvent::PointerLeave {
            x: -3.0,
            y: 5.0,
            time_ms: 8.0,
        });
        assert!(!pad.is_drawing());
        assert!(!pad.is_empty());
    }

    #[test]
    fn flush_resize_needs_a_pending_signal() {
        let mut pad = pad();
        let bigger = HostMetrics::fixed(140.0, 90.0, 1.0);
        assert!(!pad.flush_resize(bigger));

        pad.notify_resize(HostMetrics::fixed(120.0, 70.0, 1.0), 0.0);
        assert!(pad.flush_resize(bigger));
        assert!(!pad.resize_pending());
        assert_eq!(pad.surface().size().width, 140.0);
        assert!(!pad.tick(10_000.0));
    }
}
