use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Response};
use thermcore::annotation::{MarkerRepository, PersistedMarker};
use thermcore::prelude::{PersistenceError, PersistenceResult};

/// Marker repository backed by the inspector's HTTP bridge.
///
/// The bridge stores each list with an atomic file replace, so a failed
/// `replace_all` leaves the previous list in place.
pub struct HttpMarkerRepository {
    client: Client,
    base_url: String,
}

impl HttpMarkerRepository {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn markers_url(&self, measurement_id: &str) -> String {
        format!("{}/measurements/{}/markers", self.base_url, measurement_id)
    }

    pub fn frame_url(&self, measurement_id: &str) -> String {
        format!("{}/measurements/{}/frame", self.base_url, measurement_id)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

async fn check_status(response: Response) -> PersistenceResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = format!("{}: {}", status, body);
    if status.is_client_error() {
        Err(PersistenceError::Rejected(message))
    } else {
        Err(PersistenceError::Io(message))
    }
}

fn transport(err: reqwest::Error) -> PersistenceError {
    if err.is_decode() {
        PersistenceError::Serialization(err.to_string())
    } else {
        PersistenceError::Io(err.to_string())
    }
}

#[async_trait]
impl MarkerRepository for HttpMarkerRepository {
    async fn load(&self, measurement_id: &str) -> PersistenceResult<Vec<PersistedMarker>> {
        let url = self.markers_url(measurement_id);
        debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(transport)?;
        check_status(response)
            .await?
            .json::<Vec<PersistedMarker>>()
            .await
            .map_err(transport)
    }

    async fn replace_all(
        &self,
        measurement_id: &str,
        markers: &[PersistedMarker],
    ) -> PersistenceResult<()> {
        let url = self.markers_url(measurement_id);
        debug!("PUT {} ({} markers)", url, markers.len());
        let response = self
            .client
            .put(url)
            .json(markers)
            .send()
            .await
            .map_err(transport)?;
        check_status(response).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_built_from_trimmed_base() {
        let repo = HttpMarkerRepository::new(Client::new(), "http://127.0.0.1:9000/");
        assert_eq!(
            repo.markers_url("panel-1"),
            "http://127.0.0.1:9000/measurements/panel-1/markers"
        );
        assert_eq!(
            repo.frame_url("panel-1"),
            "http://127.0.0.1:9000/measurements/panel-1/frame"
        );
    }

    #[tokio::test]
    async fn unreachable_bridge_is_an_io_error() {
        let repo = HttpMarkerRepository::new(Client::new(), "http://127.0.0.1:9");
        let err = repo.load("panel-1").await.unwrap_err();
        assert!(matches!(err, PersistenceError::Io(_)));
        let err = repo.replace_all("panel-1", &[]).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Io(_)));
    }
}
