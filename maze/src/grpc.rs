//! gRPC adapter for the remote path finder: `graph.PathService/GetPath`.
//!
//! The messages are declared by hand with `prost` derives and mirror
//! `proto/service.proto` field for field, so no code generation step is needed.

use std::future::Future;

use tonic::{
    client::Grpc,
    codec::ProstCodec,
    codegen::http::{uri::PathAndQuery, Uri},
    transport::Endpoint,
    Code, Request, Status,
};

use crate::{
    client::PathService,
    coords::ServicePoint,
    error::{ConfigError, ServiceError},
};

pub const GET_PATH: &str = "/graph.PathService/GetPath";

pub mod proto {
    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct Point {
        #[prost(int32, tag = "1")]
        pub x: i32,
        #[prost(int32, tag = "2")]
        pub y: i32,
    }

    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct PathRequest {
        #[prost(message, optional, tag = "1")]
        pub start: Option<Point>,
        #[prost(message, optional, tag = "2")]
        pub end: Option<Point>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PathResponse {
        #[prost(message, repeated, tag = "1")]
        pub path_points: Vec<Point>,
    }
}

impl From<ServicePoint> for proto::Point {
    fn from(point: ServicePoint) -> Self {
        Self {
            x: point.x,
            y: point.y,
        }
    }
}

impl From<proto::Point> for ServicePoint {
    fn from(point: proto::Point) -> Self {
        Self {
            x: point.x,
            y: point.y,
        }
    }
}

fn status_error(status: Status) -> ServiceError {
    match status.code() {
        Code::Unavailable => ServiceError::Connect(status.message().to_string()),
        code => ServiceError::Rpc {
            code: code.description().to_string(),
            message: status.message().to_string(),
        },
    }
}

pub struct GrpcPathService {
    endpoint: Endpoint,
}

impl GrpcPathService {
    /// `address` is the server base, e.g. `http://localhost:9999`.
    pub fn new(address: &str) -> Result<Self, ConfigError> {
        let endpoint = Endpoint::from_shared(address.trim_end_matches('/').to_string())
            .map_err(|err| ConfigError::InvalidAddress(format!("{address}: {err}")))?;
        Ok(Self { endpoint })
    }

    pub fn uri(&self) -> &Uri {
        self.endpoint.uri()
    }

    /// Opens a fresh channel per call, so a server started after the client
    /// is picked up on the next solve.
    async fn get_path(&self, request: proto::PathRequest) -> Result<proto::PathResponse, ServiceError> {
        let channel = self
            .endpoint
            .connect()
            .await
            .map_err(|err| ServiceError::Connect(err.to_string()))?;
        let mut client = Grpc::new(channel);
        client
            .ready()
            .await
            .map_err(|err| ServiceError::Connect(err.to_string()))?;

        let codec: ProstCodec<proto::PathRequest, proto::PathResponse> = ProstCodec::default();
        let response = client
            .unary(Request::new(request), PathAndQuery::from_static(GET_PATH), codec)
            .await
            .map_err(status_error)?;
        Ok(response.into_inner())
    }
}

impl PathService for GrpcPathService {
    fn find_path(
        &self,
        start: ServicePoint,
        end: ServicePoint,
    ) -> impl Future<Output = Result<Vec<ServicePoint>, ServiceError>> + Send {
        async move {
            let request = proto::PathRequest {
                start: Some(start.into()),
                end: Some(end.into()),
            };
            let response = self.get_path(request).await?;
            Ok(response.path_points.into_iter().map(ServicePoint::from).collect())
        }
    }
}
