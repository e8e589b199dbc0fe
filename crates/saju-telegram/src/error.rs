//! Maps teloxide errors onto the shared error kinds. `PlatformUserBlocked`
//! must stay distinguishable — the push scheduler deactivates on it.

use teloxide::{ApiError, RequestError};

use saju_core::error::SajuError;

pub fn map_request_error(e: RequestError) -> SajuError {
    match e {
        RequestError::Api(ApiError::BotBlocked) | RequestError::Api(ApiError::UserDeactivated) => {
            SajuError::PlatformUserBlocked
        }
        RequestError::Network(err) => SajuError::UpstreamUnavailable {
            what: "telegram".into(),
            reason: err.to_string(),
        },
        other => SajuError::UpstreamUnavailable {
            what: "telegram".into(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_maps_to_platform_user_blocked() {
        let mapped = map_request_error(RequestError::Api(ApiError::BotBlocked));
        assert!(matches!(mapped, SajuError::PlatformUserBlocked));
        let mapped = map_request_error(RequestError::Api(ApiError::UserDeactivated));
        assert!(matches!(mapped, SajuError::PlatformUserBlocked));
    }

    #[test]
    fn other_api_errors_are_upstream() {
        let mapped = map_request_error(RequestError::Api(ApiError::MessageNotModified));
        assert!(matches!(mapped, SajuError::UpstreamUnavailable { .. }));
    }
}
