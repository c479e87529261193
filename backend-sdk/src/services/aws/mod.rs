//! AWS clients: ECS for service context, CloudWatch Logs as the baseline
//! log store and the failure record store.

mod cloudwatch;
mod ecs;

pub use cloudwatch::{locate_log_target, stream_name, CloudWatchLogSearch, CloudWatchLogsClient, LogTarget, StoredEvent};
pub use ecs::{summarize_task_definition, EcsClient};

use aws_config::retry::RetryConfig as AwsRetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_ecs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};

use crate::error::{ErrorContext, ServiceError};
use crate::services::common::HttpSettings;

/// Load shared AWS configuration with the monitor's timeout and retry budget.
///
/// The region comes from the environment unless one is given.
pub async fn load_sdk_config(region: Option<&str>, settings: &HttpSettings) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .retry_config(AwsRetryConfig::standard().with_max_attempts(settings.retry.max_retries + 1))
        .timeout_config(TimeoutConfig::builder().operation_timeout(settings.timeout).build());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    loader.load().await
}

/// Classify an AWS error code
pub fn classify_error_code(code: &str, message: String) -> ServiceError {
    match code {
        "AccessDeniedException" | "AccessDenied" | "UnauthorizedOperation" => ServiceError::authorization(message),
        "UnrecognizedClientException" | "InvalidClientTokenId" | "ExpiredToken" | "ExpiredTokenException" => {
            ServiceError::authentication(message)
        }
        "ThrottlingException" | "Throttling" | "TooManyRequestsException" | "LimitExceededException" => {
            ServiceError::rate_limit(message)
        }
        "ServerException" | "ServiceUnavailableException" | "ServiceUnavailable" | "InternalFailure" => {
            ServiceError::unavailable(message)
        }
        "InvalidParameterException" | "ValidationException" => ServiceError::validation(message),
        code if code.ends_with("NotFoundException") => ServiceError::not_found(message),
        _ => ServiceError::service(message),
    }
}

/// Convert an SDK error into the shared taxonomy
pub(crate) fn map_sdk_error<E, R>(service: &str, operation: &str, err: SdkError<E, R>) -> ServiceError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    let detail = DisplayErrorContext(&err).to_string();
    let mut context = ErrorContext::for_service(service).endpoint(operation);

    let mapped = match &err {
        SdkError::TimeoutError(_) => ServiceError::timeout(format!("{} timed out: {}", operation, detail)),
        SdkError::DispatchFailure(_) => ServiceError::network(format!("{} dispatch failed: {}", operation, detail)),
        SdkError::ResponseError(_) => ServiceError::parsing(format!("{} returned an unreadable response: {}", operation, detail)),
        SdkError::ConstructionFailure(_) => ServiceError::configuration(format!("{} could not be built: {}", operation, detail)),
        _ => {
            let code = err.code().unwrap_or("Unknown");
            context = context.error_code(code);
            let message = format!("{} failed ({}): {}", operation, code, err.message().unwrap_or(&detail));
            classify_error_code(code, message)
        }
    };
    mapped.with_context(context)
}
