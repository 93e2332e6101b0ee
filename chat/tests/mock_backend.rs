use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use warp::Filter;

/// Serve `POST /chat` with a body streamed as the given frames, one
/// `send_data` per frame so chunk boundaries land exactly where the test
/// placed them.
pub async fn spawn_mock_backend(frames: Vec<&'static [u8]>) -> (String, mpsc::Sender<()>) {
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
    let queue = Arc::new(Mutex::new(VecDeque::from(frames)));
    let shared = warp::any().map(move || queue.clone());

    let route = warp::post()
        .and(warp::path("chat"))
        .and(shared)
        .map(|queue: Arc<Mutex<VecDeque<&'static [u8]>>>| {
            let (mut tx, body) = warp::hyper::Body::channel();
            tokio::spawn(async move {
                loop {
                    let item = { queue.lock().unwrap().pop_front() };
                    match item {
                        Some(frame) => {
                            let bytes = warp::hyper::body::Bytes::from_static(frame);
                            if tx.send_data(bytes).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            });
            warp::reply::Response::new(body)
        });

    let (addr, server) =
        warp::serve(route).bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async move {
            shutdown_rx.recv().await;
        });
    tokio::spawn(server);
    (format!("http://{}", addr), shutdown_tx)
}

/// Serve `POST /chat` with a plain 500 response.
pub async fn spawn_failing_backend() -> (String, mpsc::Sender<()>) {
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
    let route = warp::post().and(warp::path("chat")).map(|| {
        warp::reply::with_status("busy", warp::http::StatusCode::INTERNAL_SERVER_ERROR)
    });
    let (addr, server) =
        warp::serve(route).bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async move {
            shutdown_rx.recv().await;
        });
    tokio::spawn(server);
    (format!("http://{}", addr), shutdown_tx)
}
