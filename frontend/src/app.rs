//! The mixdesk console window: track list on the left, mix console in the middle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use egui::{
    CentralPanel, Color32, Context, CornerRadius, Rect, Sense, SidePanel, Stroke, TopBottomPanel,
    Ui, Vec2,
};
use mixdesk_types::ToggleFlag;

use crate::api::ApiClient;
use crate::binder::{ButtonSet, ConsoleInput, PairId, Twin, TrackRowBinder, VisualPair};
use crate::fader::FaderGeometry;
use crate::gain::{format_db, percent_to_db};
use crate::state::ConnectionState;
use crate::ws::WebSocketClient;

const STRIP_WIDTH: f32 = 96.0;
const FADER_WIDTH: f32 = 24.0;
const FADER_HEIGHT: f32 = 220.0;
const THUMB_HEIGHT: f32 = 28.0;
const METER_WIDTH: f32 = 10.0;

const ZONE_GREEN_END: f32 = 0.7;
const ZONE_YELLOW_END: f32 = 0.85;
const ZONE_ORANGE_END: f32 = 0.9;

/// Meter zones from the bottom up: end of zone, lit colour, dim colour.
const METER_ZONES: [(f32, Color32, Color32); 4] = [
    (
        ZONE_GREEN_END,
        Color32::from_rgb(0, 220, 0),
        Color32::from_rgb(0, 60, 0),
    ),
    (
        ZONE_YELLOW_END,
        Color32::from_rgb(255, 220, 0),
        Color32::from_rgb(60, 60, 0),
    ),
    (
        ZONE_ORANGE_END,
        Color32::from_rgb(255, 165, 0),
        Color32::from_rgb(60, 45, 0),
    ),
    (
        1.0,
        Color32::from_rgb(255, 0, 0),
        Color32::from_rgb(60, 0, 0),
    ),
];

/// Main application.
pub struct MixdeskApp {
    binder: TrackRowBinder<ApiClient>,
    ws_client: WebSocketClient,
    /// Rename field that should grab focus on the next frame
    focus_rename: Option<PairId>,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl MixdeskApp {
    /// Must be created within a tokio runtime.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        server_url: &str,
        shutdown_flag: Option<Arc<AtomicBool>>,
    ) -> Self {
        tracing::info!("Connecting console to {}", server_url);

        let api = Arc::new(ApiClient::new(server_url));
        let mut binder = TrackRowBinder::new(api);

        let ctx = cc.egui_ctx.clone();
        let repaint: Arc<dyn Fn() + Send + Sync> = Arc::new(move || ctx.request_repaint());
        let for_binder = repaint.clone();
        binder.set_repaint(move || for_binder());

        let ws_client = WebSocketClient::for_server(server_url);
        ws_client.connect(binder.sender(), repaint);

        binder.refresh();

        Self {
            binder,
            ws_client,
            focus_rename: None,
            shutdown_flag,
        }
    }

    fn render_top_bar(&self, ctx: &Context, inputs: &mut Vec<ConsoleInput>) {
        TopBottomPanel::top("console_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Mixdesk");
                ui.separator();
                if ui.button("Add track").clicked() {
                    inputs.push(ConsoleInput::AddTrack);
                }
                if ui.button("Refresh").clicked() {
                    inputs.push(ConsoleInput::Refresh);
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let state = self.binder.connection();
                    let color = match state {
                        ConnectionState::Connected => Color32::from_rgb(0, 200, 0),
                        ConnectionState::Reconnecting { .. } => Color32::from_rgb(255, 165, 0),
                        ConnectionState::Disconnected => Color32::from_rgb(200, 50, 50),
                    };
                    let text = match state {
                        ConnectionState::Reconnecting { attempt } => {
                            format!("{} (attempt {})", state.description(), attempt)
                        }
                        _ => state.description().to_string(),
                    };
                    ui.colored_label(color, text)
                        .on_hover_text(self.ws_client.url());

                    if let Some(status) = self.binder.status() {
                        ui.colored_label(Color32::from_rgb(255, 120, 120), status);
                    }
                });
            });
        });
    }

    fn render_track_list(&mut self, ctx: &Context, inputs: &mut Vec<ConsoleInput>) {
        let focus_rename = self.focus_rename.take();
        SidePanel::left("track_list")
            .default_width(320.0)
            .resizable(true)
            .show(ctx, |ui| {
                ui.heading("Tracks");
                ui.add_space(4.0);

                egui::ScrollArea::vertical()
                    .id_salt("track_list_scroll")
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        if self.binder.pairs().is_empty() {
                            ui.label("No tracks yet");
                            ui.label("Click 'Add track' to get started");
                            return;
                        }
                        for pair in self.binder.pairs() {
                            render_track_row(ui, pair, focus_rename == Some(pair.id()), inputs);
                            ui.separator();
                        }
                    });
            });
    }

    fn render_console(&self, ctx: &Context, inputs: &mut Vec<ConsoleInput>) {
        CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::horizontal()
                .id_salt("console_scroll")
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.horizontal_top(|ui| {
                        for pair in self.binder.pairs() {
                            ui.allocate_ui(Vec2::new(STRIP_WIDTH, ui.available_height()), |ui| {
                                render_strip(ui, pair, inputs);
                            });
                            ui.separator();
                        }
                    });
                });
        });
    }
}

impl eframe::App for MixdeskApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        if let Some(ref flag) = self.shutdown_flag {
            if flag.load(Ordering::SeqCst) {
                tracing::info!("Shutdown flag set, closing GUI...");
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                return;
            }
        }

        self.binder.drain();

        let mut inputs = Vec::new();
        self.render_top_bar(ctx, &mut inputs);
        self.render_track_list(ctx, &mut inputs);
        self.render_console(ctx, &mut inputs);

        for input in inputs {
            if let ConsoleInput::BeginRename { pair } = input {
                self.focus_rename = Some(pair);
            }
            self.binder.handle(input);
        }

        // Keep polling for the shutdown flag while idle
        if self.shutdown_flag.is_some() {
            ctx.request_repaint_after(std::time::Duration::from_millis(250));
        }
    }
}

fn render_track_row(ui: &mut Ui, pair: &VisualPair, focus: bool, inputs: &mut Vec<ConsoleInput>) {
    let id = pair.id();
    ui.horizontal(|ui| {
        match &pair.row.edit {
            Some(edit) => {
                let mut text = edit.text.clone();
                let response = ui.add_enabled(
                    !edit.pending,
                    egui::TextEdit::singleline(&mut text).desired_width(140.0),
                );
                if focus {
                    response.request_focus();
                }
                if response.changed() {
                    inputs.push(ConsoleInput::EditRename { pair: id, text });
                }
                if response.lost_focus() {
                    if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                        inputs.push(ConsoleInput::CancelRename { pair: id });
                    } else {
                        inputs.push(ConsoleInput::CommitRename { pair: id });
                    }
                }
            }
            None => {
                let label = ui
                    .add(
                        egui::Label::new(egui::RichText::new(pair.name()).strong())
                            .sense(Sense::click()),
                    )
                    .on_hover_text("Double-click to rename");
                if label.double_clicked() {
                    inputs.push(ConsoleInput::BeginRename { pair: id });
                }
            }
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.small_button("x").on_hover_text("Remove track").clicked() {
                inputs.push(ConsoleInput::RemoveTrack { pair: id });
            }
            for flag in ToggleFlag::ALL.iter().rev() {
                if toggle_button(ui, &pair.row.buttons, *flag) {
                    inputs.push(ConsoleInput::Toggle {
                        pair: id,
                        twin: Twin::Row,
                        flag: *flag,
                    });
                }
            }
        });
    });

    if let Some(problem) = pair.row.edit.as_ref().and_then(|e| e.problem.as_deref()) {
        ui.colored_label(Color32::from_rgb(255, 120, 120), problem);
    }
}

fn render_strip(ui: &mut Ui, pair: &VisualPair, inputs: &mut Vec<ConsoleInput>) {
    let id = pair.id();
    ui.vertical_centered(|ui| {
        ui.label(egui::RichText::new(pair.name()).strong());
        ui.add_space(2.0);

        ui.horizontal(|ui| {
            for flag in [ToggleFlag::Mute, ToggleFlag::Solo] {
                if toggle_button(ui, &pair.strip.buttons, flag) {
                    inputs.push(ConsoleInput::Toggle {
                        pair: id,
                        twin: Twin::Strip,
                        flag,
                    });
                }
            }
        });
        ui.horizontal(|ui| {
            for flag in [ToggleFlag::Record, ToggleFlag::Monitor] {
                if toggle_button(ui, &pair.strip.buttons, flag) {
                    inputs.push(ConsoleInput::Toggle {
                        pair: id,
                        twin: Twin::Strip,
                        flag,
                    });
                }
            }
        });
        ui.add_space(4.0);

        ui.horizontal(|ui| {
            render_fader(ui, pair, inputs);
            render_meter(ui, pair);
        });

        ui.add_space(2.0);
        let percent = pair.strip.fader.percent();
        ui.label(format_db(percent_to_db(percent)));
        ui.small(pair.strip.meter.readout());
    });
}

fn render_fader(ui: &mut Ui, pair: &VisualPair, inputs: &mut Vec<ConsoleInput>) {
    let id = pair.id();
    let fader = &pair.strip.fader;
    let (rect, response) =
        ui.allocate_exact_size(Vec2::new(FADER_WIDTH, FADER_HEIGHT), Sense::click_and_drag());

    let geometry = FaderGeometry::new(rect.height(), THUMB_HEIGHT);
    if fader.geometry() != geometry {
        inputs.push(ConsoleInput::FaderResized { pair: id, geometry });
    }

    let thumb_rect = Rect::from_min_size(
        egui::pos2(rect.min.x, rect.min.y + fader.thumb_top()),
        Vec2::new(FADER_WIDTH, THUMB_HEIGHT),
    );

    if response.drag_started() {
        if let Some(pos) = response.interact_pointer_pos() {
            if thumb_rect.contains(pos) {
                inputs.push(ConsoleInput::FaderDown {
                    pair: id,
                    pointer_y: pos.y - rect.min.y,
                });
            }
        }
    } else if response.dragged() {
        if let Some(pos) = response.interact_pointer_pos() {
            inputs.push(ConsoleInput::PointerMove {
                pointer_y: pos.y - rect.min.y,
            });
        }
    }
    if response.drag_stopped() {
        inputs.push(ConsoleInput::PointerUp);
    }

    if response.hovered() {
        let (delta, modifiers) = ui.input(|i| (i.raw_scroll_delta, i.modifiers));
        let (scroll, fine) = wheel_motion(delta, modifiers);
        if scroll != 0.0 {
            // egui reports wheel-up as positive
            inputs.push(ConsoleInput::Wheel {
                pair: id,
                delta_y: -scroll,
                fine,
            });
            // The wheel moved the fader, not the console
            ui.ctx().input_mut(|i| {
                i.raw_scroll_delta = Vec2::ZERO;
                i.smooth_scroll_delta = Vec2::ZERO;
            });
        }
    }

    let painter = ui.painter();
    let track_rect = Rect::from_center_size(rect.center(), Vec2::new(4.0, rect.height() - 4.0));
    painter.rect_filled(track_rect, CornerRadius::same(2), Color32::from_gray(60));

    let thumb_color = if fader.is_dragging() {
        Color32::from_rgb(100, 150, 255)
    } else if response.hovered() {
        Color32::from_rgb(200, 200, 200)
    } else {
        Color32::from_rgb(160, 160, 160)
    };
    painter.rect_filled(thumb_rect, CornerRadius::same(3), thumb_color);
    painter.line_segment(
        [
            egui::pos2(thumb_rect.left() + 2.0, thumb_rect.center().y),
            egui::pos2(thumb_rect.right() - 2.0, thumb_rect.center().y),
        ],
        Stroke::new(1.5, Color32::from_gray(40)),
    );
}

/// Vertical meter lit from the bottom up to the current level.
/// Vertical wheel motion and whether it is fine. Shift turns the wheel
/// into horizontal scrolling on most platforms, so both axes count then.
fn wheel_motion(delta: Vec2, modifiers: egui::Modifiers) -> (f32, bool) {
    if modifiers.shift {
        (delta.x + delta.y, true)
    } else {
        (delta.y, false)
    }
}

fn render_meter(ui: &mut Ui, pair: &VisualPair) {
    let (rect, _) = ui.allocate_exact_size(Vec2::new(METER_WIDTH, FADER_HEIGHT), Sense::hover());
    let painter = ui.painter();
    let level = pair.strip.meter.fraction();
    // Screen y of the top of the lit part
    let edge_y = rect.min.y + pair.strip.meter.position() * rect.height();

    let mut zone_start = 0.0;
    for (zone_end, lit, dim) in METER_ZONES {
        let zone_rect = Rect::from_min_max(
            egui::pos2(rect.min.x, rect.max.y - zone_end * rect.height()),
            egui::pos2(rect.max.x, rect.max.y - zone_start * rect.height()),
        );
        painter.rect(
            zone_rect,
            CornerRadius::same(0),
            dim,
            Stroke::NONE,
            egui::epaint::StrokeKind::Inside,
        );
        if level > zone_start {
            let lit_rect = Rect::from_min_max(
                egui::pos2(zone_rect.min.x, zone_rect.min.y.max(edge_y)),
                zone_rect.max,
            );
            painter.rect(
                lit_rect,
                CornerRadius::same(0),
                lit,
                Stroke::NONE,
                egui::epaint::StrokeKind::Inside,
            );
        }
        zone_start = zone_end;
    }
}

/// Draw one toggle button. Returns true when clicked.
fn toggle_button(ui: &mut Ui, buttons: &ButtonSet, flag: ToggleFlag) -> bool {
    let active = buttons.is_active(flag);
    let fill = if active {
        match flag {
            ToggleFlag::Mute => Color32::from_rgb(200, 50, 50),
            ToggleFlag::Solo => Color32::from_rgb(220, 180, 0),
            ToggleFlag::Record => Color32::from_rgb(220, 40, 40),
            ToggleFlag::Monitor => Color32::from_rgb(60, 140, 220),
        }
    } else {
        Color32::from_rgb(55, 55, 60)
    };
    let text = egui::RichText::new(flag.label()).color(if active {
        Color32::BLACK
    } else {
        Color32::from_gray(200)
    });
    ui.add(egui::Button::new(text).fill(fill).min_size(Vec2::new(20.0, 18.0)))
        .on_hover_text(format!("{:?}", flag))
        .clicked()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wheel_motion_plain() {
        let (scroll, fine) = wheel_motion(Vec2::new(0.0, 3.0), egui::Modifiers::NONE);
        assert_eq!(scroll, 3.0);
        assert!(!fine);
    }

    #[test]
    fn test_shift_wheel_is_fine_on_either_axis() {
        // Shift+wheel arrives as horizontal motion
        let (scroll, fine) = wheel_motion(Vec2::new(-2.0, 0.0), egui::Modifiers::SHIFT);
        assert_eq!(scroll, -2.0);
        assert!(fine);

        let (scroll, fine) = wheel_motion(Vec2::new(0.0, 1.0), egui::Modifiers::SHIFT);
        assert_eq!(scroll, 1.0);
        assert!(fine);
    }
}
