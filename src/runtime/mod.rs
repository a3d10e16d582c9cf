//! Runtime adapters and the request/response surface.

pub mod api;
#[cfg(feature = "tokio-runtime")]
pub mod tokio_spawner;

pub use api::{
    cancel_order, enter_order, exit_order, pay_order, reserve_spot, ErrorResponse, OrderView,
    PayRequest, ReserveRequest, SpotView,
};
#[cfg(feature = "tokio-runtime")]
pub use tokio_spawner::TokioSpawner;
