use iced::{
    mouse, time,
    widget::canvas::{self, Canvas, Frame, Geometry, Path, Stroke},
    widget::{image, Container},
    Color, Element, Length, Pixels, Point, Rectangle, Renderer, Size, Subscription, Task, Theme,
};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use warncore::{Freshness, SequenceState, WarningCode};

const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:9000";
const WIDTH: f32 = 1100.0;
const HEIGHT: f32 = 580.0;

// Grid of warning icons.
const BASE_X: f32 = 80.0;
const BASE_Y: f32 = 150.0;
const SPACE_HOR: f32 = 160.0;
const SPACE_VERT: f32 = 120.0;
const MAX_ICONS_PER_LINE: usize = 6;
const ICON_SIZE: f32 = 100.0;

fn main() -> iced::Result {
    iced::application(Board::boot, Board::update, Board::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .window_size(Size::new(WIDTH, HEIGHT))
        .run()
}

fn application_title(state: &Board) -> String {
    state
        .payload
        .as_ref()
        .map(|payload| payload.title.clone())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| "天氣警告".into())
}

fn application_subscription(_: &Board) -> Subscription<Message> {
    time::every(Duration::from_millis(250)).map(|_| Message::Tick)
}

fn application_theme(_: &Board) -> Theme {
    Theme::Light
}

type IconKey = (WarningCode, usize);

#[derive(Debug)]
struct Board {
    bridge_url: String,
    payload: Option<BoardPayload>,
    error: Option<String>,
    icons: HashMap<IconKey, image::Handle>,
    pending: HashSet<IconKey>,
}

#[derive(Debug, Clone)]
enum Message {
    Tick,
    StatusFetched(Result<BoardPayload, String>),
    IconFetched(IconKey, Result<Vec<u8>, String>),
}

impl Board {
    fn boot() -> (Self, Task<Message>) {
        let bridge_url =
            std::env::var("BOARD_BRIDGE_URL").unwrap_or_else(|_| DEFAULT_BRIDGE_URL.into());
        let bridge_url = bridge_url.trim_end_matches('/').to_string();
        (
            Board {
                bridge_url: bridge_url.clone(),
                payload: None,
                error: None,
                icons: HashMap::new(),
                pending: HashSet::new(),
            },
            Task::perform(fetch_status(bridge_url), Message::StatusFetched),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => Task::perform(
                fetch_status(state.bridge_url.clone()),
                Message::StatusFetched,
            ),
            Message::StatusFetched(Ok(payload)) => {
                let fetches = state.missing_icons(&payload);
                state.payload = Some(payload);
                state.error = None;
                Task::batch(fetches)
            }
            Message::StatusFetched(Err(err)) => {
                state.error = Some(err);
                Task::none()
            }
            Message::IconFetched(key, Ok(bytes)) => {
                state.pending.remove(&key);
                state.icons.insert(key, image::Handle::from_bytes(bytes));
                Task::none()
            }
            Message::IconFetched(key, Err(_)) => {
                // Retried on the next status poll.
                state.pending.remove(&key);
                Task::none()
            }
        }
    }

    /// Fetches for every displayed frame not cached or already requested.
    fn missing_icons(&mut self, payload: &BoardPayload) -> Vec<Task<Message>> {
        let mut fetches = Vec::new();
        for tile in &payload.warnings {
            let key = (tile.code, tile.frame_index);
            if self.icons.contains_key(&key) || !self.pending.insert(key) {
                continue;
            }
            let url = format!("{}{}", self.bridge_url, tile.icon_path);
            fetches.push(Task::perform(fetch_icon(url), move |result| {
                Message::IconFetched(key, result)
            }));
        }
        fetches
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let canvas = Canvas::new(BoardCanvas {
            payload: state.payload.clone(),
            icons: state.icons.clone(),
            error: state.error.clone(),
            now_unix_secs: unix_now(),
        })
        .width(Length::Fill)
        .height(Length::Fill);

        Container::new(canvas)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

async fn fetch_status(bridge_url: String) -> Result<BoardPayload, String> {
    let response = reqwest::get(format!("{}/status", bridge_url))
        .await
        .map_err(|e| e.to_string())?;
    response
        .json::<BoardPayload>()
        .await
        .map_err(|e| e.to_string())
}

async fn fetch_icon(url: String) -> Result<Vec<u8>, String> {
    let response = reqwest::get(&url)
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|e| e.to_string())?;
    let bytes = response.bytes().await.map_err(|e| e.to_string())?;
    Ok(bytes.to_vec())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Default, Deserialize)]
struct BoardPayload {
    #[serde(default)]
    title: String,
    #[serde(default)]
    freshness: Option<Freshness>,
    #[serde(default)]
    no_active: bool,
    #[serde(default)]
    warnings: Vec<TilePayload>,
    #[serde(default)]
    sound: SoundPayload,
    #[serde(default)]
    updated_unix_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct TilePayload {
    code: WarningCode,
    #[serde(default)]
    frame_index: usize,
    #[serde(default)]
    frame_count: usize,
    #[serde(default)]
    icon_path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SoundPayload {
    #[serde(default)]
    state: SequenceState,
    #[serde(default)]
    code: Option<WarningCode>,
}

/// Top-left corner of the `index`-th icon, six per line.
fn tile_origin(index: usize) -> Point {
    let line = index / MAX_ICONS_PER_LINE;
    let column = index % MAX_ICONS_PER_LINE;
    Point::new(
        BASE_X + column as f32 * SPACE_HOR,
        BASE_Y + line as f32 * SPACE_VERT,
    )
}

fn tile_color(code: WarningCode) -> Color {
    use WarningCode::*;
    match code {
        AmberRain => Color::from_rgb(0.96, 0.66, 0.0),
        RedRain | RedFire => Color::from_rgb(0.85, 0.1, 0.1),
        BlackRain => Color::from_rgb(0.1, 0.1, 0.1),
        YellowFire => Color::from_rgb(0.95, 0.85, 0.1),
        Signal1 | Signal3 | Signal8NorthEast | Signal8SouthEast | Signal8NorthWest
        | Signal8SouthWest | Signal9 | Signal10 => Color::from_rgb(0.15, 0.3, 0.7),
        VeryHot => Color::from_rgb(0.9, 0.4, 0.1),
        Cold | Frost => Color::from_rgb(0.3, 0.6, 0.9),
        Tsunami => Color::from_rgb(0.0, 0.45, 0.55),
        Thunderstorm | NorthernFlooding | Landslip | StrongMonsoon => {
            Color::from_rgb(0.35, 0.35, 0.4)
        }
    }
}

/// Dims later frames of a stand-in tile so it still visibly blinks.
fn frame_shade(color: Color, frame_index: usize, frame_count: usize) -> Color {
    if frame_count <= 1 {
        return color;
    }
    let fade = frame_index as f32 / frame_count as f32 * 0.6;
    Color::from_rgb(
        color.r + (1.0 - color.r) * fade,
        color.g + (1.0 - color.g) * fade,
        color.b + (1.0 - color.b) * fade,
    )
}

fn sound_line(sound: &SoundPayload) -> Option<String> {
    match (sound.state, sound.code) {
        (SequenceState::Playing(step), Some(code)) => {
            Some(format!("播放提示: {} ({}/3)", code, step + 1))
        }
        _ => None,
    }
}

#[derive(Clone)]
struct BoardCanvas {
    payload: Option<BoardPayload>,
    icons: HashMap<IconKey, image::Handle>,
    error: Option<String>,
    now_unix_secs: u64,
}

impl BoardCanvas {
    fn label(frame: &mut Frame, content: String, position: Point, size: f32, color: Color) {
        frame.fill_text(canvas::Text {
            content,
            position,
            color,
            size: Pixels(size),
            ..canvas::Text::default()
        });
    }
}

impl canvas::Program<Message> for BoardCanvas {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), Color::WHITE);

        let Some(payload) = &self.payload else {
            let message = match &self.error {
                Some(err) => format!("未能連接監察程式: {}", err),
                None => "等待天氣警告資料...".into(),
            };
            Self::label(
                &mut frame,
                message,
                Point::new(BASE_X, bounds.height / 2.0),
                24.0,
                Color::BLACK,
            );
            return vec![frame.into_geometry()];
        };

        if payload.no_active && payload.freshness == Some(Freshness::Fresh) {
            Self::label(
                &mut frame,
                "現時沒有生效的天氣警告".into(),
                Point::new(bounds.width / 2.0 - 150.0, bounds.height / 2.0 - 16.0),
                32.0,
                Color::BLACK,
            );
        }

        for (index, tile) in payload.warnings.iter().enumerate() {
            let origin = tile_origin(index);
            if let Some(handle) = self.icons.get(&(tile.code, tile.frame_index)) {
                frame.draw_image(
                    Rectangle::new(origin, Size::new(ICON_SIZE, ICON_SIZE)),
                    canvas::Image::new(handle.clone()),
                );
                continue;
            }
            // Colored stand-in until the frame arrives from the bridge.
            let fill = frame_shade(tile_color(tile.code), tile.frame_index, tile.frame_count);
            frame.fill_rectangle(origin, Size::new(ICON_SIZE, ICON_SIZE), fill);
            let outline = Path::rectangle(origin, Size::new(ICON_SIZE, ICON_SIZE));
            frame.stroke(
                &outline,
                Stroke::default()
                    .with_width(2.0)
                    .with_color(Color::from_rgb(0.2, 0.2, 0.2)),
            );
            Self::label(
                &mut frame,
                tile.code.to_string(),
                Point::new(origin.x + 8.0, origin.y + ICON_SIZE / 2.0 - 10.0),
                20.0,
                Color::WHITE,
            );
        }

        if payload.freshness == Some(Freshness::Stale) {
            Self::label(
                &mut frame,
                "資料未能更新，顯示最後已知警告".into(),
                Point::new(20.0, bounds.height - 60.0),
                16.0,
                Color::from_rgb(0.7, 0.1, 0.1),
            );
        }

        if let Some(line) = sound_line(&payload.sound) {
            Self::label(
                &mut frame,
                line,
                Point::new(20.0, bounds.height - 30.0),
                16.0,
                Color::BLACK,
            );
        }

        let age = self.now_unix_secs.saturating_sub(payload.updated_unix_secs);
        Self::label(
            &mut frame,
            format!("最後更新: {} 秒前", age),
            Point::new(bounds.width - 200.0, bounds.height - 30.0),
            16.0,
            Color::BLACK,
        );

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiles_wrap_after_six_per_line() {
        assert_eq!(tile_origin(0), Point::new(80.0, 150.0));
        assert_eq!(tile_origin(5), Point::new(880.0, 150.0));
        assert_eq!(tile_origin(6), Point::new(80.0, 270.0));
    }

    #[test]
    fn decodes_monitor_payload() {
        let payload: BoardPayload = serde_json::from_str(
            r#"{
                "title": "天氣警告",
                "tick": 12,
                "elapsed_secs": 0.2,
                "freshness": "fresh",
                "no_active": false,
                "warnings": [
                    {"code": "TC8NE", "frame_index": 1, "frame_count": 2, "policy": "toggle",
                     "icon_path": "/icon/TC8NE/1", "origin": "local"}
                ],
                "sound": {"state": {"state": "playing", "step": 1}, "code": "TC8NE"},
                "metrics": {"ticks": 12, "evaluations": 1, "feed_failures": 0, "notifications": 1, "aborted_sequences": 0},
                "updated_unix_secs": 1700000000
            }"#,
        )
        .unwrap();
        assert_eq!(payload.warnings[0].code, WarningCode::Signal8NorthEast);
        assert_eq!(payload.warnings[0].icon_path, "/icon/TC8NE/1");
        assert_eq!(sound_line(&payload.sound).unwrap(), "播放提示: TC8NE (2/3)");
    }

    #[test]
    fn single_frame_tiles_keep_their_color() {
        let color = tile_color(WarningCode::BlackRain);
        assert_eq!(frame_shade(color, 0, 1), color);
        assert_ne!(frame_shade(color, 1, 2), color);
    }

    fn board_with(payload: &BoardPayload) -> Board {
        let mut board = Board {
            bridge_url: DEFAULT_BRIDGE_URL.into(),
            payload: None,
            error: None,
            icons: HashMap::new(),
            pending: HashSet::new(),
        };
        board.icons.insert(
            (WarningCode::VeryHot, 0),
            image::Handle::from_rgba(1, 1, vec![255, 0, 0, 255]),
        );
        let _ = board.missing_icons(payload);
        board
    }

    #[test]
    fn requests_each_uncached_frame_once() {
        let tile = |code, frame_index| TilePayload {
            code,
            frame_index,
            frame_count: 2,
            icon_path: format!("/icon/{}/{}", code, frame_index),
        };
        let payload = BoardPayload {
            warnings: vec![
                tile(WarningCode::VeryHot, 0),
                tile(WarningCode::Cold, 1),
                tile(WarningCode::Cold, 1),
            ],
            ..Default::default()
        };

        let mut board = board_with(&payload);
        assert_eq!(board.pending.len(), 1);
        assert!(board.pending.contains(&(WarningCode::Cold, 1)));
        assert!(board.missing_icons(&payload).is_empty());
    }
}
