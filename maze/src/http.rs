//! JSON over HTTP/1 adapter for the remote path finder.
//!
//! `POST {address}/path` with a [`PathRequest`] body, answered by a
//! [`PathResponse`]. Field names follow the service's message definitions.

use std::future::Future;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{header, Method, Request, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde::{Deserialize, Serialize};

use crate::{
    client::PathService,
    coords::ServicePoint,
    error::{ConfigError, ServiceError},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRequest {
    pub start: ServicePoint,
    pub end: ServicePoint,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathResponse {
    #[serde(default)]
    pub path_points: Vec<ServicePoint>,
}

pub struct HttpPathService {
    endpoint: Uri,
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HttpPathService {
    /// `address` is the service base, e.g. `http://localhost:9999`.
    pub fn new(address: &str) -> Result<Self, ConfigError> {
        let endpoint = format!("{}/path", address.trim_end_matches('/'))
            .parse::<Uri>()
            .map_err(|err| ConfigError::InvalidAddress(format!("{address}: {err}")))?;

        Ok(Self {
            endpoint,
            client: Client::builder(TokioExecutor::new()).build_http(),
        })
    }

    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    async fn post(&self, body: Vec<u8>) -> Result<Vec<ServicePoint>, ServiceError> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body)))
            .map_err(|err| ServiceError::Transport(err.to_string()))?;

        let response = self.client.request(request).await.map_err(|err| {
            if err.is_connect() {
                ServiceError::Connect(err.to_string())
            } else {
                ServiceError::Transport(err.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status(status.as_u16()));
        }

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|err| ServiceError::Transport(err.to_string()))?
            .to_bytes();

        let response: PathResponse =
            serde_json::from_slice(&body).map_err(|err| ServiceError::Decode(err.to_string()))?;
        Ok(response.path_points)
    }
}

impl PathService for HttpPathService {
    fn find_path(
        &self,
        start: ServicePoint,
        end: ServicePoint,
    ) -> impl Future<Output = Result<Vec<ServicePoint>, ServiceError>> + Send {
        async move {
            let body = serde_json::to_vec(&PathRequest { start, end })
                .map_err(|err| ServiceError::Transport(err.to_string()))?;
            self.post(body).await
        }
    }
}
