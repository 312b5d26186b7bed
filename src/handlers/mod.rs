//! # Vehicle Telemetry Handlers
//!
//! Sample handlers for the car telemetry stream and the static registration
//! table that binds them to message types.
//!
//! Adding a message type means adding one handler and one entry in
//! [`registrations`].

pub mod long_running;
pub mod throws_exception;
pub mod update_engine_notification;
pub mod update_location;

use std::sync::Arc;

use crate::config::HandlerSettings;
use crate::registry::{HandlerRegistration, MessageRegistration};

pub use long_running::LongRunningHandler;
pub use throws_exception::{JustForTestingError, ThrowsExceptionHandler};
pub use update_engine_notification::UpdateEngineNotificationHandler;
pub use update_location::UpdateLocationHandler;

pub const UPDATE_LOCATION_MESSAGE: &str = "UpdateLocationMessage";
pub const UPDATE_ENGINE_NOTIFICATION_MESSAGE: &str = "UpdateEngineNotificationMessage";
pub const LONG_RUNNING_MESSAGE: &str = "LongRunningMessage";
pub const THROWS_EXCEPTION_MESSAGE: &str = "ThrowsExceptionMessage";

/// The static registration table for the telemetry handlers
pub fn registrations(settings: &HandlerSettings) -> Vec<HandlerRegistration> {
    let long_running_duration = settings.long_running_task_duration();

    vec![
        HandlerRegistration::new(MessageRegistration::new(UPDATE_LOCATION_MESSAGE, 1), || {
            Ok(Arc::new(UpdateLocationHandler))
        }),
        HandlerRegistration::new(
            MessageRegistration::new(UPDATE_ENGINE_NOTIFICATION_MESSAGE, 1),
            || Ok(Arc::new(UpdateEngineNotificationHandler)),
        ),
        HandlerRegistration::new(MessageRegistration::new(LONG_RUNNING_MESSAGE, 1), move || {
            Ok(Arc::new(LongRunningHandler::new(long_running_duration)))
        }),
        HandlerRegistration::new(MessageRegistration::new(THROWS_EXCEPTION_MESSAGE, 1), || {
            Ok(Arc::new(ThrowsExceptionHandler))
        }),
    ]
}
