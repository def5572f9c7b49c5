use thiserror::Error;

use crate::name::ServiceName;

#[derive(Debug, Error)]
pub enum ServiceGraphError {
    #[error("service {0} is already registered")]
    AlreadyRegistered(ServiceName),

    #[error("service {0} is not registered")]
    Unknown(ServiceName),

    #[error("dependency cycle detected among services: {0:?}")]
    DependencyCycle(Vec<ServiceName>),

    #[error("service {service} depends on {dependency}, which has not started")]
    DependencyNotStarted {
        service: ServiceName,
        dependency: ServiceName,
    },

    #[error("service {service} failed to start: {source}")]
    StartFailed {
        service: ServiceName,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("service {0} is not started")]
    NotStarted(ServiceName),

    #[error("service {name} is registered under a different type than requested")]
    TypeMismatch { name: ServiceName },
}

impl From<ServiceGraphError> for rangechain_errors::CoreError {
    fn from(err: ServiceGraphError) -> Self {
        match err {
            ServiceGraphError::DependencyCycle(names) => rangechain_errors::CoreError::DependencyCycle(
                names.iter().map(ServiceName::to_string).collect::<Vec<_>>().join(" -> "),
            ),
            ServiceGraphError::DependencyNotStarted { service, dependency } => {
                rangechain_errors::CoreError::DependencyNotStarted {
                    service: service.to_string(),
                    dependency: dependency.to_string(),
                }
            }
            ServiceGraphError::NotStarted(name) => {
                rangechain_errors::CoreError::ServiceNotStarted(name.to_string())
            }
            other => rangechain_errors::CoreError::InvalidInput(other.to_string()),
        }
    }
}
