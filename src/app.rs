//! The eframe shell: window, menus, tool panel, canvas view, dialogs.
//!
//! All editing behavior lives in [`Document`]; this layer converts egui
//! input into document calls and composites the canvas (or the live preview)
//! to the screen under the zoom transform.

use std::path::PathBuf;

use eframe::egui::{
    self, Color32, ColorImage, Key, Modifiers, PointerButton, Pos2, Slider, TextureHandle,
    TextureOptions,
};

use crate::document::{Document, DocumentEvent, SCROLL_ZOOM_STEP};
use crate::error::DocumentError;
use crate::file_handler;
use crate::tools::{StrokeParams, ToolKind};

/// Actions gathered from the menu bar and keyboard accelerators each frame,
/// performed once so both input paths share one implementation.
#[derive(Default)]
struct Actions {
    new: bool,
    open: bool,
    save: bool,
    quit: bool,
    undo: bool,
    redo: bool,
    zoom_in: bool,
    zoom_out: bool,
    zoom_reset: bool,
    cancel: bool,
    about: bool,
    /// Ctrl+scroll notches; positive zooms in.
    scroll_zoom: i32,
}

pub struct CrayonsApp {
    document: Document,
    canvas_texture: Option<TextureHandle>,
    canvas_dirty: bool,
    /// Last pointer position forwarded to the document, in view coordinates.
    last_view_pos: Option<Pos2>,
    /// Set once the user has confirmed (or has nothing to lose) on close.
    allow_close: bool,
}

impl CrayonsApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        initial_image: Option<PathBuf>,
    ) -> Result<Self, DocumentError> {
        let mut document = Document::new()?;
        if let Some(path) = initial_image {
            match file_handler::load_image(&path) {
                Ok(image) => document.open_image(image),
                Err(err) => show_error(&err),
            }
        }
        Ok(Self {
            document,
            canvas_texture: None,
            canvas_dirty: true,
            last_view_pos: None,
            allow_close: false,
        })
    }

    fn collect_shortcuts(&mut self, ctx: &egui::Context, actions: &mut Actions) {
        ctx.input_mut(|i| {
            actions.new |= i.consume_key(Modifiers::COMMAND, Key::N);
            actions.open |= i.consume_key(Modifiers::COMMAND, Key::O);
            actions.save |= i.consume_key(Modifiers::COMMAND, Key::S);
            actions.quit |= i.consume_key(Modifiers::COMMAND, Key::Q);
            actions.undo |= i.consume_key(Modifiers::COMMAND, Key::Z);
            actions.redo |= i.consume_key(Modifiers::COMMAND, Key::Y);
            actions.zoom_in |= i.consume_key(Modifiers::COMMAND, Key::Equals);
            actions.zoom_out |= i.consume_key(Modifiers::COMMAND, Key::Minus);
            actions.cancel |= i.key_pressed(Key::Escape);
            if i.modifiers.command {
                let scroll = i.raw_scroll_delta.y;
                if scroll > 0.0 {
                    actions.scroll_zoom += 1;
                } else if scroll < 0.0 {
                    actions.scroll_zoom -= 1;
                }
            }
        });
    }

    fn menu_bar(&mut self, ctx: &egui::Context, actions: &mut Actions) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("New").clicked() {
                        actions.new = true;
                        ui.close_menu();
                    }
                    if ui.button("Open…").clicked() {
                        actions.open = true;
                        ui.close_menu();
                    }
                    if ui.button("Save As…").clicked() {
                        actions.save = true;
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        actions.quit = true;
                        ui.close_menu();
                    }
                });
                ui.menu_button("Edit", |ui| {
                    if ui
                        .add_enabled(self.document.can_undo(), egui::Button::new("Undo"))
                        .clicked()
                    {
                        actions.undo = true;
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(self.document.can_redo(), egui::Button::new("Redo"))
                        .clicked()
                    {
                        actions.redo = true;
                        ui.close_menu();
                    }
                });
                ui.menu_button("Tools", |ui| {
                    for tool in ToolKind::ALL {
                        if ui.radio(self.document.tool() == tool, tool.label()).clicked() {
                            self.document.set_tool(tool);
                            ui.close_menu();
                        }
                    }
                });
                ui.menu_button("View", |ui| {
                    if ui.button("Zoom In").clicked() {
                        actions.zoom_in = true;
                        ui.close_menu();
                    }
                    if ui.button("Zoom Out").clicked() {
                        actions.zoom_out = true;
                        ui.close_menu();
                    }
                    if ui.button("Reset Zoom").clicked() {
                        actions.zoom_reset = true;
                        ui.close_menu();
                    }
                });
                ui.menu_button("Help", |ui| {
                    if ui.button("About").clicked() {
                        actions.about = true;
                        ui.close_menu();
                    }
                });
            });
        });
    }

    fn tool_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("tool_panel")
            .resizable(false)
            .show(ctx, |ui| {
                ui.heading("Tools");
                ui.separator();

                for tool in ToolKind::ALL {
                    if ui
                        .selectable_label(self.document.tool() == tool, tool.label())
                        .clicked()
                    {
                        self.document.set_tool(tool);
                    }
                }

                ui.separator();

                let params = self.document.stroke_params();
                let mut color = params.color();
                ui.horizontal(|ui| {
                    ui.label("Color:");
                    if egui::color_picker::color_edit_button_srgba(
                        ui,
                        &mut color,
                        egui::color_picker::Alpha::Opaque,
                    )
                    .changed()
                    {
                        self.document.set_stroke_color(color);
                    }
                });

                let mut width = params.width();
                ui.horizontal(|ui| {
                    ui.label("Width:");
                    if ui
                        .add(Slider::new(
                            &mut width,
                            StrokeParams::MIN_WIDTH..=StrokeParams::MAX_WIDTH,
                        ))
                        .changed()
                    {
                        self.document.set_stroke_width(width);
                    }
                });

                ui.separator();
                ui.label(format!("Zoom: {:.0}%", self.document.zoom() * 100.0));
            });
    }

    fn perform(&mut self, ctx: &egui::Context, actions: Actions) {
        if actions.cancel {
            self.document.cancel_interaction();
        }
        if actions.new {
            if let Err(err) = self.document.new_document() {
                show_error(&err);
            }
        }
        if actions.open {
            self.open();
        }
        if actions.save {
            self.save_as();
        }
        if actions.undo {
            self.document.undo();
        }
        if actions.redo {
            self.document.redo();
        }
        if actions.zoom_in {
            self.document.zoom_in();
        }
        if actions.zoom_out {
            self.document.zoom_out();
        }
        if actions.zoom_reset {
            self.document.set_zoom(1.0);
        }
        for _ in 0..actions.scroll_zoom.abs() {
            if actions.scroll_zoom > 0 {
                self.document.zoom_by(SCROLL_ZOOM_STEP);
            } else {
                self.document.zoom_by(1.0 / SCROLL_ZOOM_STEP);
            }
        }
        if actions.about {
            rfd::MessageDialog::new()
                .set_level(rfd::MessageLevel::Info)
                .set_title("About Crayons")
                .set_description("Crayons 0.1.0\nA simple image annotation tool.")
                .show();
        }
        if actions.quit {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }

    fn process_events(&mut self, ctx: &egui::Context) {
        for event in self.document.drain_events() {
            match event {
                DocumentEvent::RepaintRequested => {
                    self.canvas_dirty = true;
                    ctx.request_repaint();
                }
                DocumentEvent::DirtyStateChanged(modified) => {
                    let title = if modified { "Crayons *" } else { "Crayons" };
                    ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.to_owned()));
                }
            }
        }
    }

    fn canvas_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both().show(ui, |ui| {
                let zoom = self.document.zoom();
                let canvas = self.document.canvas();
                let size = egui::vec2(
                    canvas.width() as f32 * zoom,
                    canvas.height() as f32 * zoom,
                );
                let (response, painter) =
                    ui.allocate_painter(size, egui::Sense::click_and_drag());
                let origin = response.rect.min;

                self.forward_pointer_events(ctx, origin, response.rect);
                self.refresh_texture(ctx);

                if let Some(texture) = &self.canvas_texture {
                    painter.image(
                        texture.id(),
                        response.rect,
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        Color32::WHITE,
                    );
                }
            });
        });
    }

    fn forward_pointer_events(&mut self, ctx: &egui::Context, origin: Pos2, rect: egui::Rect) {
        let (hover, pressed, released) = ctx.input(|i| {
            (
                i.pointer.interact_pos(),
                i.pointer.button_pressed(PointerButton::Primary),
                i.pointer.button_released(PointerButton::Primary),
            )
        });
        let Some(pos) = hover else {
            return;
        };
        let view = (pos - origin).to_pos2();

        if pressed && rect.contains(pos) {
            self.document.pointer_pressed(view, PointerButton::Primary);
            self.last_view_pos = Some(view);
        }
        if self.last_view_pos != Some(view) {
            self.document.pointer_moved(view);
            self.last_view_pos = Some(view);
        }
        if released {
            self.document.pointer_released(view);
        }
    }

    /// Re-uploads the canvas texture when something changed. During an
    /// active drag the preview is re-derived every repaint from a copy of
    /// the canvas; the live canvas stays untouched.
    fn refresh_texture(&mut self, ctx: &egui::Context) {
        let active = self.document.interaction().is_active();
        if !self.canvas_dirty && !active && self.canvas_texture.is_some() {
            return;
        }
        let buffer = if active {
            self.document.preview_buffer()
        } else {
            self.document.canvas().clone()
        };
        let image = ColorImage::from_rgba_unmultiplied(
            [buffer.width() as usize, buffer.height() as usize],
            &buffer.to_rgba_bytes(),
        );
        match &mut self.canvas_texture {
            Some(texture) => texture.set(image, TextureOptions::NEAREST),
            None => {
                self.canvas_texture = Some(ctx.load_texture("canvas", image, TextureOptions::NEAREST));
            }
        }
        self.canvas_dirty = false;
    }

    fn handle_close_request(&mut self, ctx: &egui::Context) {
        if !ctx.input(|i| i.viewport().close_requested()) {
            return;
        }
        if self.allow_close || !self.document.modified() {
            return;
        }
        ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
        let choice = rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Warning)
            .set_title("Unsaved changes")
            .set_description("Save your annotations before closing?")
            .set_buttons(rfd::MessageButtons::YesNoCancel)
            .show();
        match choice {
            rfd::MessageDialogResult::Yes => {
                if self.save_as() {
                    self.allow_close = true;
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            }
            rfd::MessageDialogResult::No => {
                self.allow_close = true;
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
            _ => {}
        }
    }

    fn open(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "gif", "webp", "bmp"])
            .pick_file()
        else {
            return;
        };
        match file_handler::load_image(&path) {
            Ok(image) => self.document.open_image(image),
            Err(err) => show_error(&err),
        }
    }

    /// Runs the save dialog and encodes the canvas. Returns whether a file
    /// was actually written.
    fn save_as(&mut self) -> bool {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG image", &["png"])
            .set_file_name(self.document.suggested_filename())
            .save_file()
        else {
            return false;
        };
        match self.document.save_as_png(&path) {
            Ok(()) => true,
            Err(err) => {
                show_error(&err);
                false
            }
        }
    }
}

impl eframe::App for CrayonsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut actions = Actions::default();
        self.collect_shortcuts(ctx, &mut actions);
        self.menu_bar(ctx, &mut actions);
        self.tool_panel(ctx);
        self.perform(ctx, actions);
        self.process_events(ctx);
        self.canvas_panel(ctx);
        self.handle_close_request(ctx);
    }
}

fn show_error(err: &DocumentError) {
    log::error!("{err}");
    rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title("Crayons")
        .set_description(err.to_string())
        .show();
}
