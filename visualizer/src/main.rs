use iced::{
    mouse,
    widget::{
        button,
        canvas::{self, Canvas, Frame, Geometry, Path, Stroke},
        column, pick_list, row, scrollable, slider, text, text_input, Column, Container,
    },
    Alignment, Color, Element, Length, Pixels, Point, Rectangle, Renderer, Size, Task, Theme,
};
use log::info;
use repository::HttpMarkerRepository;
use serde::Deserialize;
use std::{ops::Range, sync::Arc};
use thermcore::annotation::{MarkerId, MarkerPatch, MarkerSnapshot, MarkerSync, PersistedMarker};
use thermcore::prelude::{CalibrationSeed, FrameError, PersistenceResult, ThermalFrame};
use thermcore::view::{CalibrationMode, InteractionMode, Viewport};
use thermcore::{InspectionSession, Palette};

mod repository;

const CANVAS_WIDTH: f32 = 800.0;
const CANVAS_HEIGHT: f32 = 600.0;
const CANVAS_PADDING: f64 = 40.0;
const WHEEL_ZOOM_STEP: f64 = 1.1;
const PALETTES: &[Palette] = &Palette::ALL;

fn main() -> iced::Result {
    env_logger::init();
    iced::application(Visualizer::boot, Visualizer::update, Visualizer::view)
        .title(application_title)
        .theme(application_theme)
        .run()
}

fn application_title(state: &Visualizer) -> String {
    format!("Thermal Inspector - {}", state.session.measurement_id())
}

fn application_theme(_: &Visualizer) -> Theme {
    Theme::Dark
}

/// Frame as published by the inspector bridge.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeasurementPayload {
    measurement_id: String,
    frame: ThermalFrame,
    #[serde(default)]
    calibration: Option<CalibrationSeed>,
    #[serde(default)]
    palette: Palette,
}

struct Visualizer {
    session: InspectionSession,
    sync: Arc<MarkerSync<HttpMarkerRepository>>,
    saving: bool,
    history: Vec<String>,
}

#[derive(Debug, Clone)]
enum Message {
    Reload,
    MeasurementFetched(Result<MeasurementPayload, String>),
    MarkersLoaded(PersistenceResult<Vec<PersistedMarker>>),
    PaletteSelected(Palette),
    CalibrationMin(f32),
    CalibrationMax(f32),
    ResetCalibration,
    ZoomIn,
    ZoomOut,
    ZoomAt(f64, Point),
    Fit,
    Panned(f32, f32),
    PointerMoved(Point),
    PointerLeft,
    CanvasClicked(Point),
    ToggleAddMarker,
    ElementTypeChanged(MarkerId, String),
    FinalActionChanged(MarkerId, String),
    RemoveMarker(MarkerId),
    Save,
    Saved(PersistenceResult<MarkerSnapshot>),
}

impl Visualizer {
    fn boot() -> (Self, Task<Message>) {
        let base_url = std::env::var("THERMAL_BRIDGE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:9000".into());
        let measurement_id =
            std::env::var("THERMAL_MEASUREMENT").unwrap_or_else(|_| "demo-measurement".into());
        let repository = HttpMarkerRepository::new(reqwest::Client::new(), base_url);
        let mut session = InspectionSession::new(measurement_id);
        session.fit_to_container(CANVAS_WIDTH as f64, CANVAS_HEIGHT as f64, CANVAS_PADDING);

        let state = Visualizer {
            session,
            sync: Arc::new(MarkerSync::new(Arc::new(repository))),
            saving: false,
            history: Vec::new(),
        };
        let task = state.fetch_measurement();
        (state, task)
    }

    fn fetch_measurement(&self) -> Task<Message> {
        let repository = self.sync.repository().clone();
        let url = repository.frame_url(self.session.measurement_id());
        Task::perform(
            async move { fetch_payload(repository.client(), &url).await },
            Message::MeasurementFetched,
        )
    }

    fn load_markers(&self) -> Task<Message> {
        let sync = self.sync.clone();
        let id = self.session.measurement_id().to_string();
        Task::perform(async move { sync.load(&id).await }, Message::MarkersLoaded)
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Reload => return state.fetch_measurement(),
            Message::MeasurementFetched(Ok(payload)) => {
                state.session.set_palette(payload.palette);
                state.session.open_frame(
                    payload.measurement_id,
                    Ok(payload.frame),
                    payload.calibration,
                );
                state.push_history(format!(
                    "Opened {} ({} palette)",
                    state.session.measurement_id(),
                    payload.palette
                ));
                return state.load_markers();
            }
            Message::MeasurementFetched(Err(err)) => {
                let id = state.session.measurement_id().to_string();
                state
                    .session
                    .open_frame(id, Err(FrameError::Unavailable(err)), None);
            }
            Message::MarkersLoaded(loaded) => {
                state.session.apply_loaded_markers(loaded);
                state.push_history(format!("{} markers loaded", state.session.markers().len()));
            }
            Message::PaletteSelected(palette) => state.session.set_palette(palette),
            Message::CalibrationMin(value) => {
                state.session.set_calibration_min(value);
            }
            Message::CalibrationMax(value) => {
                state.session.set_calibration_max(value);
            }
            Message::ResetCalibration => state.session.reset_calibration(),
            Message::ZoomIn => state.session.zoom_in(),
            Message::ZoomOut => state.session.zoom_out(),
            Message::ZoomAt(factor, anchor) => state
                .session
                .zoom_at(factor, (anchor.x as f64, anchor.y as f64)),
            Message::Fit => state.session.fit_to_container(
                CANVAS_WIDTH as f64,
                CANVAS_HEIGHT as f64,
                CANVAS_PADDING,
            ),
            Message::Panned(dx, dy) => state.session.pan_by(dx as f64, dy as f64),
            Message::PointerMoved(position) => {
                state
                    .session
                    .pointer_moved(position.x as f64, position.y as f64);
            }
            Message::PointerLeft => state.session.pointer_left(),
            Message::CanvasClicked(position) => {
                if let Some(id) = state.session.click(position.x as f64, position.y as f64) {
                    state.push_history(format!("Placed marker {}", id));
                }
            }
            Message::ToggleAddMarker => {
                state.session.toggle_add_marker();
            }
            Message::ElementTypeChanged(id, value) => {
                state.session.update_marker(id, MarkerPatch::element_type(value));
            }
            Message::FinalActionChanged(id, value) => {
                state.session.update_marker(id, MarkerPatch::final_action(value));
            }
            Message::RemoveMarker(id) => {
                if let Some(marker) = state.session.remove_marker(id) {
                    state.push_history(format!("Removed marker at ({}, {})", marker.x, marker.y));
                }
            }
            Message::Save => {
                if state.saving || state.session.frame().is_none() {
                    return Task::none();
                }
                state.saving = true;
                let sync = state.sync.clone();
                let id = state.session.measurement_id().to_string();
                let snapshot = state.session.marker_snapshot();
                return Task::perform(
                    async move { sync.save(&id, snapshot).await },
                    Message::Saved,
                );
            }
            Message::Saved(result) => {
                state.saving = false;
                state.session.apply_save_result(result);
                if let Some(status) = state.session.status() {
                    let entry = status.to_string();
                    info!("{}", entry);
                    state.push_history(entry);
                }
            }
        }
        Task::none()
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let session = &state.session;
        let calibration = session.calibration();
        let range = calibration.range();
        let domain = calibration.domain();

        let hover = match session.hover() {
            Some(hover) => format!(
                "({}, {}) {:.2} \u{b0}C",
                hover.x, hover.y, hover.temperature
            ),
            None => "Hover over the image".into(),
        };
        let adding = session.mode() == InteractionMode::AddingMarker;

        let controls = column![
            text("Display").size(22),
            pick_list(PALETTES, Some(session.palette()), Message::PaletteSelected),
            text(format!(
                "Calibration {:.1} .. {:.1} \u{b0}C ({})",
                range.min,
                range.max,
                match calibration.mode() {
                    CalibrationMode::Auto => "auto",
                    CalibrationMode::Manual => "manual",
                }
            ))
            .size(14),
            calibration_slider(domain.min, domain.max, range.min, Message::CalibrationMin),
            calibration_slider(domain.min, domain.max, range.max, Message::CalibrationMax),
            button("Reset calibration")
                .on_press(Message::ResetCalibration)
                .padding(6),
            row![
                button("-").on_press(Message::ZoomOut).padding(6),
                button("+").on_press(Message::ZoomIn).padding(6),
                button("Fit").on_press(Message::Fit).padding(6),
                button("Reload").on_press(Message::Reload).padding(6),
            ]
            .spacing(6),
            text(format!("Zoom {:.0}%", session.viewport().scale() * 100.0)).size(14),
            text(hover).size(16),
            text("Markers").size(22),
            row![
                button(if adding { "Cancel marker" } else { "Add marker" })
                    .on_press(Message::ToggleAddMarker)
                    .padding(6),
                button(if state.saving { "Saving..." } else { "Save markers" })
                    .on_press_maybe((!state.saving).then_some(Message::Save))
                    .padding(6),
            ]
            .spacing(6),
            Container::new(scrollable(marker_list(session)).height(Length::Fixed(260.0)))
                .padding(6),
            text(session.status().unwrap_or("")).size(14),
            text("Activity log").size(16),
            Container::new(scrollable(history_list(&state.history)).height(Length::Fixed(90.0)))
                .padding(6),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(380.0));

        let image = Canvas::new(ThermalCanvas { session })
            .width(Length::Fixed(CANVAS_WIDTH))
            .height(Length::Fixed(CANVAS_HEIGHT));

        let layout = row![image, controls]
            .spacing(20)
            .align_y(Alignment::Start)
            .padding(20);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > 20 {
            self.history.remove(0);
        }
    }
}

/// Manual windows may sit outside the frame's native domain; the handle is
/// pinned to the nearest end while the value itself is kept.
fn calibration_slider<'a>(
    low: f32,
    high: f32,
    value: f32,
    on_change: fn(f32) -> Message,
) -> Element<'a, Message> {
    slider(low..=high, value.clamp(low, high), on_change)
        .step(0.1)
        .into()
}

fn marker_list(session: &InspectionSession) -> Column<'_, Message> {
    let markers = session.markers();
    if markers.is_empty() {
        return Column::new().push(text("No markers yet").size(12));
    }
    markers
        .iter()
        .enumerate()
        .fold(Column::new().spacing(8), |col, (position, marker)| {
            let id = marker.id;
            let saved = if marker.persisted_index.is_some() {
                ""
            } else {
                " *"
            };
            col.push(
                column![
                    row![
                        text(format!(
                            "#{} ({}, {}) {:.2} \u{b0}C{}",
                            position + 1,
                            marker.x,
                            marker.y,
                            marker.temperature,
                            saved
                        ))
                        .size(13)
                        .width(Length::Fill),
                        button("Delete")
                            .on_press(Message::RemoveMarker(id))
                            .padding(4),
                    ]
                    .align_y(Alignment::Center),
                    text_input("Element type", &marker.element_type)
                        .on_input(move |value| Message::ElementTypeChanged(id, value))
                        .padding(4),
                    text_input("Final action", &marker.final_action)
                        .on_input(move |value| Message::FinalActionChanged(id, value))
                        .padding(4),
                ]
                .spacing(4),
            )
        })
}

fn history_list(history: &[String]) -> Column<'_, Message> {
    if history.is_empty() {
        Column::new().push(text("No activity yet").size(12))
    } else {
        history
            .iter()
            .rev()
            .fold(Column::new().spacing(4), |col, entry| {
                col.push(text(entry.as_str()).size(12))
            })
    }
}

async fn fetch_payload(client: &reqwest::Client, url: &str) -> Result<MeasurementPayload, String> {
    let response = client.get(url).send().await.map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(format!("{}: {}", status, text));
    }
    response
        .json::<MeasurementPayload>()
        .await
        .map_err(|e| e.to_string())
}

/// Data pixels whose cells intersect a `width` x `height` screen area.
fn visible_cells(viewport: &Viewport, width: f64, height: f64) -> (Range<u32>, Range<u32>) {
    let state = viewport.state();
    let (data_width, data_height) = viewport.data_size();
    let span = |offset: f64, extent: f64, limit: u32| {
        let start = ((-offset) / state.scale).floor().max(0.0);
        let end = ((extent - offset) / state.scale).ceil().min(limit as f64);
        if end <= start {
            0..0
        } else {
            start as u32..end as u32
        }
    };
    (
        span(state.offset_x, width, data_width),
        span(state.offset_y, height, data_height),
    )
}

#[derive(Debug, Default)]
struct CanvasState {
    hovering: bool,
    drag_from: Option<Point>,
}

struct ThermalCanvas<'a> {
    session: &'a InspectionSession,
}

impl canvas::Program<Message> for ThermalCanvas<'_> {
    type State = CanvasState;

    fn update(
        &self,
        state: &mut Self::State,
        event: &iced::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        let iced::Event::Mouse(event) = event else {
            return None;
        };
        let position = cursor.position_in(bounds);
        match (event, position) {
            (mouse::Event::CursorMoved { .. }, Some(position)) => {
                state.hovering = true;
                if let Some(from) = state.drag_from.replace(position) {
                    return Some(
                        canvas::Action::publish(Message::Panned(
                            position.x - from.x,
                            position.y - from.y,
                        ))
                        .and_capture(),
                    );
                }
                Some(canvas::Action::publish(Message::PointerMoved(position)))
            }
            (mouse::Event::CursorMoved { .. }, None) | (mouse::Event::CursorLeft, _) => {
                state.drag_from = None;
                if std::mem::take(&mut state.hovering) {
                    Some(canvas::Action::publish(Message::PointerLeft))
                } else {
                    None
                }
            }
            (mouse::Event::ButtonPressed(mouse::Button::Left), Some(position)) => Some(
                canvas::Action::publish(Message::CanvasClicked(position)).and_capture(),
            ),
            (mouse::Event::ButtonPressed(mouse::Button::Right), Some(position)) => {
                state.drag_from = Some(position);
                Some(canvas::Action::request_redraw().and_capture())
            }
            (mouse::Event::ButtonReleased(mouse::Button::Right), _) => {
                state.drag_from = None;
                None
            }
            (mouse::Event::WheelScrolled { delta }, Some(position)) => {
                let lines = match delta {
                    mouse::ScrollDelta::Lines { y, .. } => *y,
                    mouse::ScrollDelta::Pixels { y, .. } => *y / 40.0,
                };
                if lines == 0.0 {
                    return None;
                }
                let factor = WHEEL_ZOOM_STEP.powf(lines as f64);
                Some(canvas::Action::publish(Message::ZoomAt(factor, position)).and_capture())
            }
            _ => None,
        }
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.05, 0.05, 0.07),
        );

        let session = self.session;
        let Some(raster) = session.raster() else {
            let message = session.status().unwrap_or("Waiting for thermal data...");
            frame.fill_text(canvas::Text {
                content: message.to_string(),
                position: Point::new(20.0, bounds.height / 2.0),
                color: Color::from_rgb(0.8, 0.8, 0.8),
                size: Pixels(16.0),
                ..canvas::Text::default()
            });
            return vec![frame.into_geometry()];
        };

        let viewport = session.viewport();
        let scale = viewport.scale();
        let cell = Size::new(scale as f32, scale as f32);
        let (columns, rows) = visible_cells(viewport, bounds.width as f64, bounds.height as f64);
        for y in rows {
            for x in columns.clone() {
                let Some([r, g, b, a]) = raster.pixel(x, y) else {
                    continue;
                };
                let (sx, sy) = viewport.data_to_screen(x as f64, y as f64);
                frame.fill_rectangle(
                    Point::new(sx as f32, sy as f32),
                    cell,
                    Color::from_rgba8(r, g, b, a as f32 / 255.0),
                );
            }
        }

        let (fx, fy, fw, fh) = viewport.frame_bounds();
        frame.stroke(
            &Path::rectangle(
                Point::new(fx as f32, fy as f32),
                Size::new(fw as f32, fh as f32),
            ),
            Stroke::default()
                .with_width(1.0)
                .with_color(Color::from_rgb(0.35, 0.35, 0.45)),
        );

        let radius = (scale as f32 * 0.6).clamp(5.0, 14.0);
        for (position, marker) in session.markers().iter().enumerate() {
            let (cx, cy) = viewport.data_to_screen(marker.x as f64 + 0.5, marker.y as f64 + 0.5);
            let center = Point::new(cx as f32, cy as f32);
            let ring = Path::circle(center, radius);
            frame.stroke(
                &ring,
                Stroke::default()
                    .with_width(3.0)
                    .with_color(Color::BLACK),
            );
            frame.stroke(
                &ring,
                Stroke::default()
                    .with_width(1.5)
                    .with_color(Color::from_rgb(0.0, 1.0, 0.25)),
            );
            frame.fill_text(canvas::Text {
                content: format!("{}", position + 1),
                position: Point::new(center.x + radius + 2.0, center.y - radius - 2.0),
                color: Color::WHITE,
                size: Pixels(14.0),
                ..canvas::Text::default()
            });
        }

        vec![frame.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        state: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if !cursor.is_over(bounds) {
            return mouse::Interaction::default();
        }
        if state.drag_from.is_some() {
            mouse::Interaction::Grabbing
        } else if self.session.mode() == InteractionMode::AddingMarker {
            mouse::Interaction::Crosshair
        } else {
            mouse::Interaction::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_cells_cover_the_fitted_frame() {
        let mut viewport = Viewport::new(100, 50);
        viewport.fit_to_container(800.0, 600.0, 40.0);
        let (columns, rows) = visible_cells(&viewport, 800.0, 600.0);
        assert_eq!(columns, 0..100);
        assert_eq!(rows, 0..50);
    }

    #[test]
    fn visible_cells_cull_panned_out_columns() {
        let mut viewport = Viewport::new(100, 50);
        viewport.fit_to_container(800.0, 600.0, 40.0);
        viewport.pan_by(-400.0, 0.0);
        let (columns, _) = visible_cells(&viewport, 800.0, 600.0);
        assert!(columns.start > 0);
        assert_eq!(columns.end, 100);

        viewport.pan_by(-2000.0, 0.0);
        let (columns, _) = visible_cells(&viewport, 800.0, 600.0);
        assert!(columns.is_empty());
    }
}
