use egui::{Color32, Pos2};

/// The drawing tools. Strokes rasterize into the canvas immediately on
/// commit; there is no retained vector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Pen,
    Rectangle,
    Ellipse,
    Arrow,
    Redact,
}

impl ToolKind {
    pub const ALL: [Self; 5] = [
        Self::Pen,
        Self::Rectangle,
        Self::Ellipse,
        Self::Arrow,
        Self::Redact,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pen => "Pen",
            Self::Rectangle => "Rectangle",
            Self::Ellipse => "Ellipse",
            Self::Arrow => "Arrow",
            Self::Redact => "Redact",
        }
    }
}

/// Stroke color and line width shared by all drawing tools.
#[derive(Debug, Clone, Copy)]
pub struct StrokeParams {
    color: Color32,
    width: f32,
}

impl StrokeParams {
    pub const MIN_WIDTH: f32 = 1.0;
    pub const MAX_WIDTH: f32 = 50.0;

    pub fn new() -> Self {
        Self {
            color: Color32::BLACK,
            width: 3.0,
        }
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn set_color(&mut self, color: Color32) {
        self.color = color;
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    /// Sets the line width, clamped to `[MIN_WIDTH, MAX_WIDTH]`.
    pub fn set_width(&mut self, width: f32) {
        self.width = width.clamp(Self::MIN_WIDTH, Self::MAX_WIDTH);
    }
}

impl Default for StrokeParams {
    fn default() -> Self {
        Self::new()
    }
}

/// The pointer interaction state.
///
/// `Active` exists only between press and release of the primary button. All
/// coordinates are in canvas pixels, already divided by the view zoom.
#[derive(Debug, Clone, Copy)]
pub enum Interaction {
    Idle,
    Active {
        tool: ToolKind,
        start: Pos2,
        /// Previous pointer position; the pen chains segments from here.
        last: Pos2,
        current: Pos2,
    },
}

impl Interaction {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }
}
