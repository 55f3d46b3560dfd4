use egui::{Color32, PointerButton, Pos2};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::error::DocumentError;
use crate::file_handler;
use crate::history::History;
use crate::pixel_buffer::PixelBuffer;
use crate::redact;
use crate::renderer;
use crate::tools::{Interaction, StrokeParams, ToolKind};

/// Canvas size of a fresh document.
pub const DEFAULT_CANVAS_SIZE: (u32, u32) = (800, 600);

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 16.0;

/// Zoom step bound to the menu items and Ctrl+=/Ctrl+-.
pub const MENU_ZOOM_STEP: f32 = 1.2;
/// Zoom step bound to Ctrl+scroll.
pub const SCROLL_ZOOM_STEP: f32 = 1.1;

/// Notifications the document queues for the view layer; drained once per
/// frame. Errors are not events — fallible operations return them directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEvent {
    RepaintRequested,
    DirtyStateChanged(bool),
}

/// The editing façade: owns the live canvas, the tool state machine, and the
/// undo history. All mutation happens through its methods on the UI thread;
/// event handlers run to completion without yielding.
pub struct Document {
    canvas: PixelBuffer,
    tool: ToolKind,
    stroke: StrokeParams,
    zoom: f32,
    interaction: Interaction,
    history: History,
    modified: bool,
    /// Shared noise source for the redact filter, seeded once at startup.
    rng: SmallRng,
    events: Vec<DocumentEvent>,
}

impl Document {
    /// Creates a document with a fresh default-size white canvas.
    pub fn new() -> Result<Self, DocumentError> {
        let (w, h) = DEFAULT_CANVAS_SIZE;
        Ok(Self {
            canvas: PixelBuffer::new(w, h)?,
            tool: ToolKind::Pen,
            stroke: StrokeParams::new(),
            zoom: 1.0,
            interaction: Interaction::Idle,
            history: History::new(),
            modified: false,
            rng: SmallRng::from_entropy(),
            events: Vec::new(),
        })
    }

    /// File > New: fresh white canvas, empty history, zoom reset.
    pub fn new_document(&mut self) -> Result<(), DocumentError> {
        let (w, h) = DEFAULT_CANVAS_SIZE;
        self.install_canvas(PixelBuffer::new(w, h)?);
        log::info!("new {}x{} document", w, h);
        Ok(())
    }

    /// Installs a decoded image as the new canvas. Like New, except the
    /// canvas takes the image's size. Decoding happens in `file_handler`
    /// before this point, so a failed open never disturbs the current
    /// document.
    pub fn open_image(&mut self, image: PixelBuffer) {
        log::info!("opened {}x{} image", image.width(), image.height());
        self.install_canvas(image);
    }

    /// Encodes the canvas as a PNG at `path`. Clears the modified flag on
    /// success; a failed save leaves it set.
    pub fn save_as_png(&mut self, path: &std::path::Path) -> Result<(), DocumentError> {
        file_handler::save_png(&self.canvas, path)?;
        self.set_modified(false);
        Ok(())
    }

    fn install_canvas(&mut self, canvas: PixelBuffer) {
        self.canvas = canvas;
        self.history.clear();
        self.interaction = Interaction::Idle;
        self.zoom = 1.0;
        self.set_modified(false);
        self.request_repaint();
    }

    // --- Pointer state machine -------------------------------------------
    //
    // Input arrives in view coordinates; dividing by zoom at this boundary
    // keeps everything downstream in canvas pixels, so identical gestures
    // commit identical pixels at any zoom level.

    fn to_canvas(&self, view: Pos2) -> Pos2 {
        Pos2::new(view.x / self.zoom, view.y / self.zoom)
    }

    /// Primary-button press: snapshot the canvas and go active. Secondary
    /// buttons and presses while already active are ignored.
    pub fn pointer_pressed(&mut self, view: Pos2, button: PointerButton) {
        if button != PointerButton::Primary || self.interaction.is_active() {
            return;
        }
        let p = self.to_canvas(view);
        self.history.push_snapshot(&self.canvas);
        self.interaction = Interaction::Active {
            tool: self.tool,
            start: p,
            last: p,
            current: p,
        };
    }

    /// Pointer motion: the pen strokes a segment onto the canvas and
    /// advances; shape and redact tools only update the preview geometry.
    pub fn pointer_moved(&mut self, view: Pos2) {
        let Interaction::Active {
            tool,
            start,
            last,
            ..
        } = self.interaction
        else {
            return;
        };
        let p = self.to_canvas(view);
        if tool == ToolKind::Pen {
            renderer::stroke_segment(&mut self.canvas, last, p, self.stroke.color(), self.stroke.width());
        }
        self.interaction = Interaction::Active {
            tool,
            start,
            last: p,
            current: p,
        };
        self.request_repaint();
    }

    /// Release: commit the edit. The pen is already on the canvas; shapes
    /// stroke from `start` to the release point through the same primitives
    /// the preview used; redact runs its full pass count.
    pub fn pointer_released(&mut self, view: Pos2) {
        let Interaction::Active {
            tool, start, last, ..
        } = self.interaction
        else {
            return;
        };
        let p = self.to_canvas(view);
        self.interaction = Interaction::Idle;
        let color = self.stroke.color();
        let width = self.stroke.width();
        match tool {
            ToolKind::Pen => {
                // A click without motion still leaves a dot.
                if start == last && start == p {
                    renderer::stroke_segment(&mut self.canvas, start, p, color, width);
                }
            }
            ToolKind::Rectangle => renderer::stroke_rectangle(&mut self.canvas, start, p, color, width),
            ToolKind::Ellipse => renderer::stroke_ellipse(&mut self.canvas, start, p, color, width),
            ToolKind::Arrow => renderer::stroke_arrow(&mut self.canvas, start, p, color, width),
            ToolKind::Redact => {
                for _ in 0..redact::COMMIT_PASSES {
                    redact::apply_redact(&mut self.canvas, start, p, &mut self.rng);
                }
            }
        }
        log::debug!("committed {:?} at {:?}", tool, p);
        self.set_modified(true);
        self.request_repaint();
    }

    /// Escape: drop the in-flight edit and restore the pre-press canvas.
    /// The snapshot leaves the undo stack without touching redo, so
    /// cancellation leaves no trace in history.
    pub fn cancel_interaction(&mut self) {
        if !self.interaction.is_active() {
            return;
        }
        self.interaction = Interaction::Idle;
        if self.history.restore_last(&mut self.canvas) {
            log::debug!("cancelled active edit");
            self.request_repaint();
        }
    }

    // --- History ----------------------------------------------------------

    /// Undo the last commit. A no-op on an empty stack or while a drag is in
    /// flight.
    pub fn undo(&mut self) {
        if self.interaction.is_active() {
            return;
        }
        if self.history.undo(&mut self.canvas) {
            log::debug!("undo");
            self.set_modified(true);
            self.request_repaint();
        }
    }

    pub fn redo(&mut self) {
        if self.interaction.is_active() {
            return;
        }
        if self.history.redo(&mut self.canvas) {
            log::debug!("redo");
            self.set_modified(true);
            self.request_repaint();
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // --- Tool and view settings --------------------------------------------

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        if self.tool != tool {
            log::debug!("tool: {}", tool.label());
            self.tool = tool;
        }
    }

    pub fn stroke_params(&self) -> StrokeParams {
        self.stroke
    }

    pub fn set_stroke_color(&mut self, color: Color32) {
        self.stroke.set_color(color);
    }

    pub fn set_stroke_width(&mut self, width: f32) {
        self.stroke.set_width(width);
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        let clamped = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        if clamped != self.zoom {
            self.zoom = clamped;
            self.request_repaint();
        }
    }

    pub fn zoom_by(&mut self, factor: f32) {
        self.set_zoom(self.zoom * factor);
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by(MENU_ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(1.0 / MENU_ZOOM_STEP);
    }

    // --- View support -------------------------------------------------------

    pub fn canvas(&self) -> &PixelBuffer {
        &self.canvas
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn modified(&self) -> bool {
        self.modified
    }

    /// A copy of the canvas with the live preview rendered in, for the view
    /// layer to composite under the zoom transform. The live canvas is never
    /// mutated by previewing.
    pub fn preview_buffer(&mut self) -> PixelBuffer {
        let mut preview = self.canvas.clone();
        renderer::render_interaction(&mut preview, &self.interaction, &self.stroke, &mut self.rng);
        preview
    }

    /// Default name offered by the save dialog, stamped with local time.
    pub fn suggested_filename(&self) -> String {
        chrono::Local::now()
            .format("annotation-%d-%m-%Y_%H-%M.png")
            .to_string()
    }

    /// Takes the notifications queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<DocumentEvent> {
        std::mem::take(&mut self.events)
    }

    fn set_modified(&mut self, modified: bool) {
        if self.modified != modified {
            self.modified = modified;
            self.events.push(DocumentEvent::DirtyStateChanged(modified));
        }
    }

    fn request_repaint(&mut self) {
        if self.events.last() != Some(&DocumentEvent::RepaintRequested) {
            self.events.push(DocumentEvent::RepaintRequested);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_buffer::WHITE;
    use egui::pos2;

    fn doc() -> Document {
        Document::new().unwrap()
    }

    #[test]
    fn fresh_document_is_white_and_clean() {
        let d = doc();
        assert_eq!(d.canvas().width(), 800);
        assert_eq!(d.canvas().height(), 600);
        assert!(d.canvas().pixels().iter().all(|&p| p == WHITE));
        assert!(!d.modified());
        assert!(!d.can_undo());
        assert!(!d.can_redo());
    }

    #[test]
    fn secondary_button_is_ignored() {
        let mut d = doc();
        d.pointer_pressed(pos2(10.0, 10.0), PointerButton::Secondary);
        assert!(!d.interaction().is_active());
        assert!(!d.can_undo());
    }

    #[test]
    fn reentrant_press_is_ignored() {
        let mut d = doc();
        d.pointer_pressed(pos2(10.0, 10.0), PointerButton::Primary);
        d.pointer_pressed(pos2(90.0, 90.0), PointerButton::Primary);
        let Interaction::Active { start, .. } = *d.interaction() else {
            panic!("expected an active interaction");
        };
        assert_eq!(start, pos2(10.0, 10.0));
    }

    #[test]
    fn pen_motion_strokes_the_canvas_immediately() {
        let mut d = doc();
        d.pointer_pressed(pos2(100.0, 100.0), PointerButton::Primary);
        d.pointer_moved(pos2(200.0, 100.0));
        // Mid-drag the canvas already carries the segment.
        assert!(d.canvas().pixel(150, 100) != Some(WHITE));
        d.pointer_released(pos2(200.0, 100.0));
        assert!(d.modified());
    }

    #[test]
    fn shape_motion_leaves_the_canvas_untouched_until_release() {
        let mut d = doc();
        d.set_tool(ToolKind::Rectangle);
        d.pointer_pressed(pos2(50.0, 50.0), PointerButton::Primary);
        d.pointer_moved(pos2(300.0, 300.0));
        assert!(d.canvas().pixels().iter().all(|&p| p == WHITE));
        d.pointer_released(pos2(300.0, 300.0));
        assert!(d.canvas().pixels().iter().any(|&p| p != WHITE));
    }

    #[test]
    fn preview_does_not_mutate_the_canvas() {
        let mut d = doc();
        d.set_tool(ToolKind::Ellipse);
        d.pointer_pressed(pos2(20.0, 20.0), PointerButton::Primary);
        d.pointer_moved(pos2(120.0, 90.0));
        let preview = d.preview_buffer();
        assert!(preview.pixels().iter().any(|&p| p != WHITE));
        assert!(d.canvas().pixels().iter().all(|&p| p == WHITE));
    }

    #[test]
    fn zoom_divides_pointer_coordinates() {
        let mut d = doc();
        d.set_zoom(2.0);
        d.set_tool(ToolKind::Rectangle);
        d.pointer_pressed(pos2(100.0, 100.0), PointerButton::Primary);
        let Interaction::Active { start, .. } = *d.interaction() else {
            panic!("expected an active interaction");
        };
        assert_eq!(start, pos2(50.0, 50.0));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut d = doc();
        d.set_zoom(100.0);
        assert_eq!(d.zoom(), MAX_ZOOM);
        d.set_zoom(0.0001);
        assert_eq!(d.zoom(), MIN_ZOOM);
        d.zoom_by(0.0);
        assert_eq!(d.zoom(), MIN_ZOOM);
    }

    #[test]
    fn events_are_queued_and_drained() {
        let mut d = doc();
        d.pointer_pressed(pos2(10.0, 10.0), PointerButton::Primary);
        d.pointer_released(pos2(40.0, 40.0));
        let events = d.drain_events();
        assert!(events.contains(&DocumentEvent::DirtyStateChanged(true)));
        assert!(events.contains(&DocumentEvent::RepaintRequested));
        assert!(d.drain_events().is_empty());
    }

    #[test]
    fn new_document_resets_everything() {
        let mut d = doc();
        d.set_zoom(4.0);
        d.pointer_pressed(pos2(10.0, 10.0), PointerButton::Primary);
        d.pointer_moved(pos2(50.0, 50.0));
        d.pointer_released(pos2(50.0, 50.0));
        assert!(d.modified());

        d.new_document().unwrap();
        assert!(!d.modified());
        assert_eq!(d.zoom(), 1.0);
        assert!(!d.can_undo());
        assert!(d.canvas().pixels().iter().all(|&p| p == WHITE));
    }

    #[test]
    fn open_image_adopts_the_image_size() {
        let mut d = doc();
        let image = PixelBuffer::new(123, 45).unwrap();
        d.open_image(image);
        assert_eq!(d.canvas().width(), 123);
        assert_eq!(d.canvas().height(), 45);
        assert!(!d.modified());
        assert!(!d.can_undo());
    }
}
