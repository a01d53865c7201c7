// Macros file - tracing macros are imported within the macro definitions

/// Logging macros that keep field names and message patterns consistent
/// across the scanner, the stores and the study session.

// ============================================================================
// Session Logging Macros
// ============================================================================

/// Log the start of a study session
#[macro_export]
macro_rules! log_session_start {
    ($mode:expr, session_id = $session_id:expr, questions = $count:expr) => {
        tracing::info!(
            component = "session",
            mode = %$mode,
            session_id = %$session_id,
            questions = $count,
            "Study session started"
        );
    };
}

/// Log one answered question or the end of a session
#[macro_export]
macro_rules! log_session_success {
    (answer, question_id = $id:expr, outcome = $outcome:expr, interval = $interval:expr) => {
        tracing::info!(
            component = "session",
            question_id = $id,
            outcome = %$outcome,
            interval_days = $interval,
            "Answer recorded"
        );
    };
    (finished, session_id = $session_id:expr, correct = $c:expr, wrong = $w:expr, unanswered = $u:expr) => {
        tracing::info!(
            component = "session",
            session_id = %$session_id,
            correct = $c,
            wrong = $w,
            unanswered = $u,
            "Study session finished"
        );
    };
}

/// Log session warnings with context
#[macro_export]
macro_rules! log_session_warn {
    (question_id = $id:expr, $msg:expr) => {
        tracing::warn!(
            component = "session",
            question_id = $id,
            "Session warning: {}", $msg
        );
    };
    ($msg:expr) => {
        tracing::warn!(component = "session", "Session warning: {}", $msg);
    };
}

/// Log session errors that did not stop the session
#[macro_export]
macro_rules! log_session_error {
    (question_id = $id:expr, error = $error:expr, $msg:expr) => {
        tracing::error!(
            component = "session",
            question_id = $id,
            error = %$error,
            "Session error: {}", $msg
        );
    };
}

// ============================================================================
// Service Layer Logging Macros
// ============================================================================

/// Log service operation start with context
#[macro_export]
macro_rules! log_service_start {
    ($service:expr, $operation:expr, path = $path:expr) => {
        tracing::info!(
            service = $service,
            operation = $operation,
            path = %$path,
            "Service operation started"
        );
    };
}

/// Log service operation success
#[macro_export]
macro_rules! log_service_success {
    ($service:expr, $operation:expr, count = $count:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            service = $service,
            operation = $operation,
            count = $count,
            duration_ms = $duration,
            "Service operation completed successfully"
        );
    };
}

/// Log service warnings
#[macro_export]
macro_rules! log_service_warn {
    ($service:expr, $operation:expr, $msg:expr) => {
        tracing::warn!(
            service = $service,
            operation = $operation,
            "Service warning: {}",
            $msg
        );
    };
}

// ============================================================================
// Store Logging Macros
// ============================================================================

/// Log reads and writes of the JSON stores
#[macro_export]
macro_rules! log_store_operation {
    (debug, $operation:expr, store = $store:expr, path = $path:expr) => {
        tracing::debug!(
            component = "store",
            operation = $operation,
            store = $store,
            path = %$path,
            "Store operation completed"
        );
    };
    (info, $operation:expr, store = $store:expr, $msg:expr) => {
        tracing::info!(
            component = "store",
            operation = $operation,
            store = $store,
            "Store operation: {}", $msg
        );
    };
    (error, $operation:expr, store = $store:expr, error = $error:expr) => {
        tracing::error!(
            component = "store",
            operation = $operation,
            store = $store,
            error = %$error,
            "Store operation failed"
        );
    };
}

/// Log index reconciliation steps
#[macro_export]
macro_rules! log_reconcile {
    (drop, path = $path:expr, ids = $count:expr) => {
        tracing::info!(
            component = "reconciler",
            path = %$path,
            ids = $count,
            "Archiving questions of a file that is no longer live"
        );
    };
    (done, files = $files:expr, reused = $reused:expr, allocated = $allocated:expr, archived = $archived:expr) => {
        tracing::info!(
            component = "reconciler",
            files = $files,
            reused = $reused,
            allocated = $allocated,
            archived = $archived,
            "Reconciliation completed"
        );
    };
}

// ============================================================================
// System Event Logging Macros
// ============================================================================

/// Log system startup and shutdown events
#[macro_export]
macro_rules! log_system_event {
    (startup, component = $component:expr, $msg:expr) => {
        tracing::info!(
            event_type = "startup",
            component = $component,
            "System event: {}",
            $msg
        );
    };
    (shutdown, component = $component:expr, $msg:expr) => {
        tracing::info!(
            event_type = "shutdown",
            component = $component,
            "System event: {}",
            $msg
        );
    };
    (config, $msg:expr) => {
        tracing::info!(event_type = "configuration", "System event: {}", $msg);
    };
}

// ============================================================================
// Performance Logging Macros
// ============================================================================

/// Log performance metrics with consistent structure
#[macro_export]
macro_rules! log_performance {
    ($operation:expr, duration_ms = $duration:expr) => {
        tracing::debug!(
            event_type = "performance",
            operation = $operation,
            duration_ms = $duration,
            "Performance metrics"
        );
    };
}

// ============================================================================
// Validation Logging Macros
// ============================================================================

/// Log validation results consistently
#[macro_export]
macro_rules! log_validation {
    (success, $component:expr, $msg:expr) => {
        tracing::debug!(
            event_type = "validation",
            component = $component,
            result = "success",
            "Validation completed: {}", $msg
        );
    };
    (failure, $component:expr, error = $error:expr) => {
        tracing::warn!(
            event_type = "validation",
            component = $component,
            result = "failure",
            error = %$error,
            "Validation failed"
        );
    };
}
