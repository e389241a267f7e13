use std::{net::SocketAddr, time::Duration};

use axum::{http::StatusCode, routing::post, Json, Router};
use maze::{
    http::{PathRequest, PathResponse},
    Config, Delivery, Engine, FailureReason, Grid, HttpPathService, Notification, PathService,
    Point, RemoteService, ScrollOffset, ServiceError, ServicePoint, Transport,
};

/// Steps along `x` until it matches, then along `y`. Good enough for an open grid.
async fn walk(Json(request): Json<PathRequest>) -> Json<PathResponse> {
    let (start, end) = (request.start, request.end);
    let mut path_points = vec![start];
    let mut at = start;
    while at != end {
        if at.x != end.x {
            at.x += (end.x - at.x).signum();
        } else {
            at.y += (end.y - at.y).signum();
        }
        path_points.push(at);
    }
    Json(PathResponse { path_points })
}

async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn sp(x: i32, y: i32) -> ServicePoint {
    ServicePoint { x, y }
}

#[tokio::test]
async fn posts_json_and_decodes_path() {
    let addr = spawn(Router::new().route("/path", post(walk))).await;
    let service = HttpPathService::new(&format!("http://{addr}")).unwrap();

    let path = service.find_path(sp(0, 0), sp(1, 2)).await.unwrap();
    assert_eq!(path, vec![sp(0, 0), sp(1, 0), sp(1, 1), sp(1, 2)]);
}

#[tokio::test]
async fn error_status_is_reported() {
    let app = Router::new().route("/path", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
    let addr = spawn(app).await;
    let service = HttpPathService::new(&format!("http://{addr}")).unwrap();

    assert!(matches!(
        service.find_path(sp(0, 0), sp(1, 1)).await,
        Err(ServiceError::Status(500))
    ));
}

#[tokio::test]
async fn garbage_body_is_a_decode_error() {
    let app = Router::new().route("/path", post(|| async { "no path for you" }));
    let addr = spawn(app).await;
    let service = HttpPathService::new(&format!("http://{addr}")).unwrap();

    assert!(matches!(
        service.find_path(sp(0, 0), sp(1, 1)).await,
        Err(ServiceError::Decode(_))
    ));
}

#[tokio::test]
async fn closed_port_is_a_connect_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let service = HttpPathService::new(&format!("http://{addr}")).unwrap();

    assert!(matches!(
        service.find_path(sp(0, 0), sp(1, 1)).await,
        Err(ServiceError::Connect(_))
    ));
}

#[test]
fn engine_solves_through_http() {
    // the engine blocks on its own runtime, so the server gets a separate one
    let server = tokio::runtime::Runtime::new().unwrap();
    let addr = server.block_on(spawn(Router::new().route("/path", post(walk))));

    let grid: Grid = "1 1 1\n1 1 1\n".parse().unwrap();
    let mut config = Config::default();
    config.service.transport = Transport::Http;
    config.service.address = format!("http://{addr}");
    config.service.timeout_ms = Some(5000);
    let service = RemoteService::from_config(&config.service).unwrap();
    let mut engine = Engine::from_config(grid, service, &config).unwrap();

    let none = ScrollOffset::default();
    engine.click(5, 5, none);
    engine.click(25, 15, none);
    engine.solve();
    assert_eq!(engine.wait(Duration::from_secs(10)), Some(Delivery::Applied));
    assert_eq!(engine.status(), "Path found!");

    // an unreachable service leaves the selection for a retry
    drop(server);
    engine.solve();
    assert_eq!(engine.wait(Duration::from_secs(10)), Some(Delivery::Applied));
    assert!(engine.status().starts_with("Error: "));
    assert_eq!(engine.selection().endpoints(), Some((Point::new(0, 0), Point::new(1, 2))));
}


#[test]
fn engine_reports_unreachable_grpc_service() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let grid: Grid = "1 1 1\n1 1 1\n".parse().unwrap();
    let mut config = Config::default();
    config.service.address = format!("http://{addr}");
    config.service.timeout_ms = Some(5000);
    let service = RemoteService::from_config(&config.service).unwrap();
    assert_eq!(service.transport(), Transport::Grpc);
    let mut engine = Engine::from_config(grid, service, &config).unwrap();

    let none = ScrollOffset::default();
    engine.click(5, 5, none);
    engine.click(25, 15, none);
    while engine.pop_notification().is_some() {}

    engine.solve();
    assert_eq!(engine.wait(Duration::from_secs(10)), Some(Delivery::Applied));
    assert!(engine.status().starts_with("Error: "));
    let failed = std::iter::from_fn(|| engine.pop_notification())
        .find_map(|notification| match notification {
            Notification::SolveFailed(failure) => Some(failure),
            _ => None,
        })
        .unwrap();
    assert_eq!(failed.reason, FailureReason::Connectivity);
}
