//! "Not found means deleted", in one place.

use converge_api::ApiResult;

use crate::waiter::Observation;

/// Terminal status of a deleted resource.
pub const STATUS_INACTIVE: &str = "INACTIVE";

/// Classify a describe result for a deletion waiter.
///
/// A found resource reports its own status; a not-found error becomes a
/// synthesized `INACTIVE` observation with no object. Other errors pass
/// through.
pub fn classify_deletion_status<T>(
    result: ApiResult<T>,
    status_of: impl FnOnce(&T) -> String,
) -> ApiResult<Observation<Option<T>>> {
    match result {
        Ok(object) => {
            let status = status_of(&object);
            Ok(Observation::Found {
                object: Some(object),
                status,
            })
        }
        Err(e) if e.is_not_found() => Ok(Observation::Found {
            object: None,
            status: STATUS_INACTIVE.to_string(),
        }),
        Err(e) => Err(e),
    }
}
