use std::net::SocketAddr;

use tower_http::trace::TraceLayer;

use super::{router, AppState};

pub async fn serve(bind_addr: &str, state: AppState) -> std::io::Result<()> {
    let app = router(state).layer(TraceLayer::new_for_http());
    let addr: SocketAddr = bind_addr
        .parse()
        .unwrap_or_else(|_| panic!("invalid bind address: {bind_addr}"));
    tracing::info!(%addr, "starting rest api surface");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}
