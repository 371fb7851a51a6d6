use crate::gui_bridge::model::{MeasurementPayload, SaveReceipt};
use crate::storage::FileMarkerRepository;
use anyhow::Result;
use log::{info, warn};
use serde_json::json;
use std::convert::Infallible;
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
    thread,
};
use thermcore::annotation::{MarkerSnapshot, MarkerSync, PersistedMarker};
use thermcore::prelude::PersistenceError;
use tokio::runtime::Builder;
use warp::http::StatusCode;
use warp::reply::{Reply, Response};
use warp::Filter;

const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// Shared state behind the bridge routes.
#[derive(Clone)]
pub struct BridgeState {
    measurement: Arc<RwLock<Option<MeasurementPayload>>>,
    sync: Arc<MarkerSync<FileMarkerRepository>>,
}

impl BridgeState {
    pub fn new(sync: Arc<MarkerSync<FileMarkerRepository>>) -> Self {
        Self {
            measurement: Arc::new(RwLock::new(None)),
            sync,
        }
    }

    fn current(&self) -> Option<MeasurementPayload> {
        match self.measurement.read() {
            Ok(guard) => guard.clone(),
            Err(_) => None,
        }
    }
}

fn error_reply(status: StatusCode, message: String) -> Response {
    warp::reply::with_status(warp::reply::json(&json!({ "error": message })), status)
        .into_response()
}

fn persistence_status(err: &PersistenceError) -> StatusCode {
    match err {
        PersistenceError::Rejected(_) => StatusCode::BAD_REQUEST,
        PersistenceError::Io(_) | PersistenceError::Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

async fn get_frame(measurement_id: String, state: BridgeState) -> Result<Response, Infallible> {
    match state
        .current()
        .filter(|payload| payload.measurement_id == measurement_id)
    {
        Some(payload) => Ok(warp::reply::json(&payload).into_response()),
        None => Ok(error_reply(
            StatusCode::NOT_FOUND,
            format!("no thermal frame for {}", measurement_id),
        )),
    }
}

async fn get_markers(measurement_id: String, state: BridgeState) -> Result<Response, Infallible> {
    match state.sync.load(&measurement_id).await {
        Ok(markers) => Ok(warp::reply::json(&markers).into_response()),
        Err(err) => Ok(error_reply(persistence_status(&err), err.to_string())),
    }
}

async fn put_markers(
    measurement_id: String,
    markers: Vec<PersistedMarker>,
    state: BridgeState,
) -> Result<Response, Infallible> {
    let count = markers.len();
    let snapshot = MarkerSnapshot {
        ids: Vec::new(),
        markers,
    };
    match state.sync.save(&measurement_id, snapshot).await {
        Ok(_) => {
            info!("bridge stored {} markers for {}", count, measurement_id);
            Ok(warp::reply::json(&SaveReceipt {
                status: "ok".into(),
                count,
            })
            .into_response())
        }
        Err(err) => {
            warn!("bridge save for {} failed: {}", measurement_id, err);
            Ok(error_reply(persistence_status(&err), err.to_string()))
        }
    }
}

/// `GET /measurements/{id}/frame`, `GET /measurements/{id}/markers`,
/// `PUT /measurements/{id}/markers`.
pub fn routes(
    state: BridgeState,
) -> impl Filter<Extract = (Response,), Error = warp::Rejection> + Clone {
    let state_filter = warp::any().map(move || state.clone());

    let frame_route = warp::path!("measurements" / String / "frame")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_frame);

    let load_route = warp::path!("measurements" / String / "markers")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_markers);

    let save_route = warp::path!("measurements" / String / "markers")
        .and(warp::put())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(state_filter)
        .and_then(put_markers);

    frame_route.or(load_route).unify().or(save_route).unify()
}

/// Hosts the bridge routes on a background thread.
pub struct GuiBridge {
    state: BridgeState,
}

impl GuiBridge {
    pub fn new(state: BridgeState) -> Self {
        Self { state }
    }

    pub fn spawn(&self, addr: SocketAddr) -> Result<thread::JoinHandle<()>> {
        let routes = routes(self.state.clone());
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let handle = thread::spawn(move || {
            runtime.block_on(async move {
                warp::serve(routes).run(addr).await;
            });
        });
        info!("bridge listening on http://{}", addr);
        Ok(handle)
    }

    pub fn publish(&self, payload: MeasurementPayload) -> Result<()> {
        let mut guard = self
            .state
            .measurement
            .write()
            .map_err(|_| anyhow::anyhow!("bridge state lock poisoned"))?;
        println!(
            "[BRIDGE] measurement {} ({}x{})",
            payload.measurement_id,
            payload.frame.width(),
            payload.frame.height()
        );
        *guard = Some(payload);
        Ok(())
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> Option<MeasurementPayload> {
        self.state.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermcore::prelude::ThermalFrame;
    use thermcore::Palette;

    fn state(dir: &std::path::Path) -> BridgeState {
        let repository = Arc::new(FileMarkerRepository::new(dir));
        BridgeState::new(Arc::new(MarkerSync::new(repository)))
    }

    fn payload() -> MeasurementPayload {
        MeasurementPayload {
            measurement_id: "panel-9".into(),
            frame: ThermalFrame::from_samples(2, 1, vec![20.0, 30.0]).unwrap(),
            calibration: None,
            palette: Palette::Rainbow,
        }
    }

    fn marker(index: u32) -> PersistedMarker {
        PersistedMarker {
            index,
            x: 1,
            y: 0,
            temperature: 30.0,
            element_type: "Busbar".into(),
            final_action: String::new(),
        }
    }

    #[tokio::test]
    async fn frame_route_serves_published_measurement() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = GuiBridge::new(state(dir.path()));
        bridge.publish(payload()).unwrap();
        assert_eq!(bridge.snapshot(), Some(payload()));

        let filter = routes(bridge.state.clone());
        let res = warp::test::request()
            .method("GET")
            .path("/measurements/panel-9/frame")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: MeasurementPayload = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body, payload());

        let res = warp::test::request()
            .method("GET")
            .path("/measurements/other/frame")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn markers_round_trip_over_http() {
        let dir = tempfile::tempdir().unwrap();
        let filter = routes(state(dir.path()));

        let res = warp::test::request()
            .method("PUT")
            .path("/measurements/panel-9/markers")
            .json(&vec![marker(1), marker(2)])
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let receipt: SaveReceipt = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(receipt.count, 2);

        let res = warp::test::request()
            .method("GET")
            .path("/measurements/panel-9/markers")
            .reply(&filter)
            .await;
        let markers: Vec<PersistedMarker> = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(markers, vec![marker(1), marker(2)]);
    }

    #[tokio::test]
    async fn invalid_measurement_id_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let filter = routes(state(dir.path()));
        let res = warp::test::request()
            .method("GET")
            .path("/measurements/.secret/markers")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
