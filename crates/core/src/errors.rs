use thiserror::Error;

use crate::events::SinkError;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
    #[error("product {product_id} has invalid base demand {rate}")]
    InvalidDemandRate { product_id: String, rate: f64 },
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApplicationError {
    #[error("event sink failure: {0}")]
    EventSink(String),
    #[error("metrics failure: {0}")]
    Metrics(String),
}

impl From<SinkError> for ApplicationError {
    fn from(value: SinkError) -> Self {
        Self::EventSink(value.to_string())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "An unexpected internal error occurred.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::ServiceUnavailable { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::EventSink(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Metrics(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use crate::errors::{ApplicationError, InterfaceError};
    use crate::events::SinkError;

    #[test]
    fn sink_error_maps_to_service_unavailable() {
        let sink_error = SinkError::from(io::Error::new(io::ErrorKind::Other, "disk full"));
        let interface = ApplicationError::from(sink_error).into_interface("tick-7");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(interface.correlation_id(), "tick-7");
        assert_eq!(
            interface.user_message(),
            "The service is temporarily unavailable. Please retry shortly."
        );
    }

    #[test]
    fn metrics_error_maps_to_internal_with_safe_message() {
        let interface =
            ApplicationError::Metrics("encode failed".to_owned()).into_interface("scrape");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "An unexpected internal error occurred.");
    }
}
