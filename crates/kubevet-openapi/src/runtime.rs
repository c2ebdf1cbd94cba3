//! Shared async runtime
//!
//! The source API is synchronous and caller-driven, but the cluster and
//! remote sources are built on async clients. They share one lazily created
//! multi-thread runtime and block on it.

use once_cell::sync::Lazy;
use tokio::runtime::Runtime;

static RUNTIME: Lazy<Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build async runtime")
});

pub fn block_on<F: std::future::Future>(future: F) -> F::Output {
    RUNTIME.block_on(future)
}
