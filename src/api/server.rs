use crate::api::routes;
use crate::config::SharedConfig;
use crate::notify::Notifier;
use crate::user_store::DynUserStore;
use std::future::Future;
use std::sync::Arc;

#[derive(Clone)]
pub(super) struct AppState {
    pub config: SharedConfig,
    pub users: DynUserStore,
    pub notifier: Arc<Notifier>,
}

pub fn new(
    config: SharedConfig,
    users: DynUserStore,
    notifier: Arc<Notifier>,
) -> impl Future<Output = hyper::Result<()>> {
    let bind_addr = config.api_bind_addr;
    axum::Server::bind(&bind_addr)
        .serve(routes::router(config, users, notifier).into_make_service())
}
