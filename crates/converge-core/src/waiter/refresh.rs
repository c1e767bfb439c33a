//! What a poller tick observes.

use std::future::Future;

use async_trait::async_trait;
use converge_api::ApiError;

/// Result of one successful refresh.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation<T> {
    /// The resource exists and is in `status`.
    Found { object: T, status: String },
    /// The resource does not exist (yet, or any more).
    Missing,
}

impl<T> Observation<T> {
    pub fn found(object: T, status: impl Into<String>) -> Self {
        Observation::Found {
            object,
            status: status.into(),
        }
    }

    pub fn status(&self) -> Option<&str> {
        match self {
            Observation::Found { status, .. } => Some(status),
            Observation::Missing => None,
        }
    }
}

/// A side-effect-free status fetch, called once per tick.
///
/// `&mut self` lets a refresher cache what it discovered on earlier ticks.
#[async_trait]
pub trait Refresh: Send {
    type Object: Send;

    async fn refresh(&mut self) -> Result<Observation<Self::Object>, ApiError>;
}

/// Adapts an async closure into a [`Refresh`].
pub struct FnRefresh<F>(pub F);

#[async_trait]
impl<F, Fut, T> Refresh for FnRefresh<F>
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<Observation<T>, ApiError>> + Send,
    T: Send,
{
    type Object = T;

    async fn refresh(&mut self) -> Result<Observation<T>, ApiError> {
        (self.0)().await
    }
}
