use egui::{ColorImage, Pos2, Sense, TextureHandle, TextureId, TextureOptions, Vec2};
use log::{debug, warn};
use maze::{ClickOutcome, Engine, Notification, RemoteService, ScrollOffset, Selection};

/// Splits a pointer position over the maze image into the position inside the
/// visible area and the scroll offset. `image_min` is where the image's top
/// left corner is drawn, already shifted by scrolling; the two parts always
/// add up to the whole pixel under the pointer.
fn click_position(pointer: Pos2, image_min: Pos2, scrolled: Vec2) -> (i32, i32, ScrollOffset) {
    let absolute = (pointer - image_min).floor();
    let scroll = scrolled.floor();
    let visible = absolute - scroll;
    (
        visible.x as i32,
        visible.y as i32,
        ScrollOffset::new(scroll.x as i32, scroll.y as i32),
    )
}

pub struct App {
    engine: Engine<RemoteService>,
    /// The uploaded maze image and the engine revision it was taken from.
    texture: Option<(TextureHandle, u64)>,
}

impl App {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>, mut engine: Engine<RemoteService>) -> Self {
        // responses arrive on a worker thread, wake the UI so they get polled
        let ctx = cc.egui_ctx.clone();
        engine.set_repaint_callback(move || ctx.request_repaint());

        App {
            engine,
            texture: None,
        }
    }

    /// Re-uploads the maze image only when the engine replaced it.
    fn texture(&mut self, ctx: &egui::Context) -> (TextureId, Vec2) {
        let revision = self.engine.display_revision();
        let texture = match self.texture.take() {
            Some((texture, uploaded)) if uploaded == revision => texture,
            Some((mut texture, _)) => {
                texture.set(self.color_image(), TextureOptions::NEAREST);
                texture
            }
            None => ctx.load_texture("maze", self.color_image(), TextureOptions::NEAREST),
        };
        let sized = (texture.id(), texture.size_vec2());
        self.texture = Some((texture, revision));
        sized
    }

    fn color_image(&self) -> ColorImage {
        let image = self.engine.display_image();
        let size = [image.width() as usize, image.height() as usize];
        ColorImage::from_rgb(size, image.as_raw())
    }

    fn handle_click(&mut self, x: i32, y: i32, scroll: ScrollOffset) {
        match self.engine.click(x, y, scroll) {
            ClickOutcome::Blocked(point) => debug!("{point} is a wall"),
            ClickOutcome::OutOfBounds | ClickOutcome::Ignored => {}
            outcome => debug!("click: {outcome:?}"),
        }
    }
}

impl eframe::App for App {
    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.engine.poll();
        while let Some(notification) = self.engine.pop_notification() {
            debug!("{notification:?}");
            if let Notification::SolveFailed(failure) = notification {
                warn!("solve failed: {failure}");
            }
        }

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.add_space(16.0);

                let ready = matches!(self.engine.selection(), Selection::BothSet { .. });
                if ui.add_enabled(ready, egui::Button::new("Solve Maze")).clicked() {
                    self.engine.solve();
                }
                if ui.button("Reset").clicked() {
                    self.engine.reset();
                }
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.engine.is_pending() {
                    ui.spinner();
                }
                ui.label(self.engine.status());
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let sized = self.texture(ctx);

            let mut click = None;
            egui::ScrollArea::both().show_viewport(ui, |ui, viewport| {
                let response = ui.add(
                    egui::Image::new(sized)
                        .fit_to_original_size(1.0)
                        .sense(Sense::click()),
                );
                if response.clicked() {
                    if let Some(pos) = response.interact_pointer_pos() {
                        click = Some(click_position(pos, response.rect.min, viewport.min.to_vec2()));
                    }
                }
            });

            if let Some((x, y, scroll)) = click {
                self.handle_click(x, y, scroll);
            }
        });
    }
}
