mod crds;
mod discovery;
mod envelope;
mod resources;
pub mod server;
mod table;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::queue::InMemoryQueue;
use crate::store::ResourceStore;

/// Built-in API group under which CRD management lives, alongside
/// whatever groups have been registered dynamically through it.
pub const CRD_GROUP: &str = "apiextensions.ferrite.io";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ResourceStore>,
    pub queue: Arc<InMemoryQueue>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/apis", get(discovery::list_groups))
        .route("/apis/:group", get(discovery::list_versions))
        .route("/apis/:group/:version", get(discovery::list_resources_for_version))
        .route(
            &format!("/apis/{CRD_GROUP}/v1/customresourcedefinitions"),
            get(crds::list).post(crds::create),
        )
        .route(
            &format!("/apis/{CRD_GROUP}/v1/customresourcedefinitions/:name"),
            get(crds::get).delete(crds::delete),
        )
        .route(
            "/apis/:group/:version/:plural",
            get(resources::list_cluster).post(resources::create_cluster),
        )
        .route(
            "/apis/:group/:version/:plural/:name",
            get(resources::get_cluster)
                .patch(resources::patch_cluster)
                .delete(resources::delete_cluster),
        )
        .route(
            "/apis/:group/:version/namespaces/:namespace/:plural",
            get(resources::list_namespaced).post(resources::create_namespaced),
        )
        .route(
            "/apis/:group/:version/namespaces/:namespace/:plural/:name",
            get(resources::get_namespaced)
                .patch(resources::patch_namespaced)
                .delete(resources::delete_namespaced),
        )
        .route("/healthz", get(|| async { "ok" }))
        .with_state(state)
}
