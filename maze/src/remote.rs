use std::future::Future;

use log::info;

use crate::{
    client::PathService,
    config::{ServiceConfig, Transport},
    coords::ServicePoint,
    error::{ConfigError, ServiceError},
    grpc::GrpcPathService,
    http::HttpPathService,
};

/// The path service adapter picked by `[service] transport`.
pub enum RemoteService {
    Grpc(GrpcPathService),
    Http(HttpPathService),
}

impl RemoteService {
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ConfigError> {
        info!("path service: {} at {}", config.transport, config.address);
        Ok(match config.transport {
            Transport::Grpc => RemoteService::Grpc(GrpcPathService::new(&config.address)?),
            Transport::Http => RemoteService::Http(HttpPathService::new(&config.address)?),
        })
    }

    pub fn transport(&self) -> Transport {
        match self {
            RemoteService::Grpc(_) => Transport::Grpc,
            RemoteService::Http(_) => Transport::Http,
        }
    }
}

impl PathService for RemoteService {
    fn find_path(
        &self,
        start: ServicePoint,
        end: ServicePoint,
    ) -> impl Future<Output = Result<Vec<ServicePoint>, ServiceError>> + Send {
        async move {
            match self {
                RemoteService::Grpc(service) => service.find_path(start, end).await,
                RemoteService::Http(service) => service.find_path(start, end).await,
            }
        }
    }
}
