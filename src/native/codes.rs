//! Engine status codes
//!
//! Status codes returned by the native engine. `0` is success; everything
//! else is an error.

/// Success
pub const SUCCESS: i32 = 0;

// =============================================================================
// Operation Errors
// =============================================================================

/// Asynchronous operation was cancelled (e.g. network stopped first)
pub const OPERATION_CANCELLED: i32 = 1101;

/// Future was released before it could be used
pub const FUTURE_RELEASED: i32 = 1102;

/// Cluster file could not be found
pub const NO_CLUSTER_FILE_FOUND: i32 = 1515;

// =============================================================================
// Client Errors
// =============================================================================

/// Operation is not valid in the current state
pub const CLIENT_INVALID_OPERATION: i32 = 2000;

/// Option value could not be applied
pub const INVALID_OPTION_VALUE: i32 = 2006;

/// Option code is unknown to the engine
pub const INVALID_OPTION: i32 = 2007;

/// Network was used before setup
pub const NETWORK_NOT_SETUP: i32 = 2008;

/// Network setup was called more than once
pub const NETWORK_ALREADY_SETUP: i32 = 2009;

/// Database name other than `DB`
pub const INVALID_DATABASE_NAME: i32 = 2013;

/// Result requested from a future that is not ready
pub const FUTURE_NOT_SET: i32 = 2015;

/// Cluster file contents are malformed
pub const CONNECTION_STRING_INVALID: i32 = 2104;

// =============================================================================
// API Version Errors
// =============================================================================

/// Engine used before an API version was selected
pub const API_VERSION_UNSET: i32 = 2200;

/// A different API version was already selected
pub const API_VERSION_ALREADY_SET: i32 = 2201;

/// API version is below the minimum the engine accepts
pub const API_VERSION_INVALID: i32 = 2202;

/// API version is newer than the engine supports
pub const API_VERSION_NOT_SUPPORTED: i32 = 2203;

/// Human-readable description for a status code
pub fn describe(code: i32) -> &'static str {
    match code {
        SUCCESS => "Success",
        OPERATION_CANCELLED => "Asynchronous operation cancelled",
        FUTURE_RELEASED => "Future has been released",
        NO_CLUSTER_FILE_FOUND => "Cluster file not found",
        CLIENT_INVALID_OPERATION => "Invalid API call",
        INVALID_OPTION_VALUE => "Option set with an invalid value",
        INVALID_OPTION => "Option not valid in this context",
        NETWORK_NOT_SETUP => "Action not possible before the network is configured",
        NETWORK_ALREADY_SETUP => "Network can be configured only once",
        INVALID_DATABASE_NAME => "Invalid database name",
        FUTURE_NOT_SET => "Result not ready",
        CONNECTION_STRING_INVALID => "Connection string invalid",
        API_VERSION_UNSET => "API version is not set",
        API_VERSION_ALREADY_SET => "API version may be set only once",
        API_VERSION_INVALID => "API version is not valid",
        API_VERSION_NOT_SUPPORTED => "API version not supported",
        _ => "Unknown error",
    }
}
