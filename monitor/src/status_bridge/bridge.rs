use crate::assets::icons::{encode_png, IconFrame};
use crate::status_bridge::model::BoardModel;
use log::{error, info, warn};
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, RwLock},
    thread,
};
use tokio::runtime::Builder;
use tokio::sync::mpsc;
use warncore::animation::DisplayedFrame;
use warncore::{FeedInput, WarningCode};
use warp::{http::StatusCode, Filter, Reply};

/// Every frame shown so far, keyed by warning and frame index.
type IconStore = Arc<RwLock<HashMap<(WarningCode, usize), IconFrame>>>;

#[derive(Debug)]
struct IngestClosed;

impl warp::reject::Reject for IngestClosed {}

/// Holds the latest board model and, when served, exposes it over HTTP.
///
/// `GET /status` returns the model; `GET /icon/<code>/<index>` returns a
/// displayed frame as PNG; `POST /ingest` queues a raw feed snapshot for the
/// next tick, for drills without the live feed.
pub struct StatusBridge {
    state: Arc<RwLock<BoardModel>>,
    icons: IconStore,
}

impl StatusBridge {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(BoardModel::default())),
            icons: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Starts the HTTP endpoint on its own thread and runtime.
    pub fn serve(&self, addr: SocketAddr, ingest: mpsc::UnboundedSender<FeedInput>) {
        let state_for_filter = self.state.clone();
        let state_filter = warp::any().map(move || state_for_filter.clone());
        let ingest_filter = warp::any().map(move || ingest.clone());
        let icons_for_filter = self.icons.clone();
        let icons_filter = warp::any().map(move || icons_for_filter.clone());

        let status_route = warp::path("status")
            .and(warp::get())
            .and(state_filter)
            .map(|state: Arc<RwLock<BoardModel>>| {
                let model = state
                    .read()
                    .map(|guard| guard.clone())
                    .unwrap_or_default();
                warp::reply::json(&model)
            });

        let icon_route = warp::path!("icon" / WarningCode / usize)
            .and(warp::get())
            .and(icons_filter)
            .map(|code: WarningCode, index: usize, icons: IconStore| {
                let frame = icons
                    .read()
                    .ok()
                    .and_then(|store| store.get(&(code, index)).cloned());
                let Some(frame) = frame else {
                    return StatusCode::NOT_FOUND.into_response();
                };
                match encode_png(&frame) {
                    Ok(bytes) => {
                        warp::reply::with_header(bytes, "content-type", "image/png").into_response()
                    }
                    Err(err) => {
                        warn!("icon {}/{} not served: {:#}", code, index, err);
                        StatusCode::INTERNAL_SERVER_ERROR.into_response()
                    }
                }
            });

        let ingest_route = warp::path("ingest")
            .and(warp::post())
            .and(warp::body::json())
            .and(ingest_filter)
            .and_then(
                |snapshot: Value, ingest: mpsc::UnboundedSender<FeedInput>| async move {
                    match ingest.send(FeedInput::Fetched(snapshot)) {
                        Ok(()) => Ok::<_, warp::Rejection>(warp::reply::with_status(
                            warp::reply::json(&json!({"status": "queued"})),
                            StatusCode::ACCEPTED,
                        )),
                        Err(_) => {
                            warn!("ingest received after the tick loop stopped");
                            Err(warp::reject::custom(IngestClosed))
                        }
                    }
                },
            );

        thread::spawn(move || {
            let routes = status_route.or(icon_route).or(ingest_route);
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("status bridge runtime failed to start: {}", err);
                    return;
                }
            };
            info!("status bridge listening on {}", addr);
            runtime.block_on(async move {
                warp::serve(routes).run(addr).await;
            });
        });
    }

    pub fn publish(&self, model: BoardModel) {
        if let Ok(mut guard) = self.state.write() {
            *guard = model;
        }
    }

    /// Remembers the frames displayed this tick so the board can fetch them.
    pub fn publish_frames(&self, frames: &[DisplayedFrame<IconFrame>]) {
        if let Ok(mut store) = self.icons.write() {
            for shown in frames {
                store
                    .entry((shown.code, shown.index))
                    .or_insert_with(|| shown.frame.clone());
            }
        }
    }

    pub fn icon(&self, code: WarningCode, index: usize) -> Option<IconFrame> {
        self.icons
            .read()
            .ok()
            .and_then(|store| store.get(&(code, index)).cloned())
    }

    pub fn snapshot(&self) -> BoardModel {
        self.state
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl Default for StatusBridge {
    fn default() -> Self {
        Self::new()
    }
}
