use tracing::{debug, error, info, warn};

pub fn log_request_received(endpoint: &str, method: &str) {
    info!("Request received: {} {}", method, endpoint);
}

pub fn log_request_processed(endpoint: &str, status: u16, duration_ms: u64) {
    info!(
        "Request processed: {} - Status: {} - Duration: {}ms",
        endpoint, status, duration_ms
    );
}

pub fn log_tool_call(tool: &str, request_id: &str) {
    info!("🔧 Tool call: {} (request_id: {})", tool, request_id);
}

pub fn log_tool_completed(tool: &str, duration_ms: u64) {
    info!("✅ Tool completed: {} - Duration: {}ms", tool, duration_ms);
}

pub fn log_tool_failed(tool: &str, kind: &str, message: &str) {
    warn!("❌ Tool failed: {} - Kind: {} - Error: {}", tool, kind, message);
}

pub fn log_config_loaded(env: &str) {
    info!("Configuration loaded successfully for environment: {}", env);
}

pub fn log_server_startup(port: u16) {
    info!("🚀 Slack Lists middleware server starting on port {}", port);
}

pub fn log_server_ready(host: &str, port: u16) {
    info!("✅ Server ready and listening on http://{}:{}", host, port);
}

pub fn log_health_check() {
    debug!("Health check requested");
}

pub fn log_info(message: &str) {
    info!("{}", message);
}

pub fn log_error(message: &str) {
    error!("{}", message);
}

pub fn log_warning(message: &str) {
    warn!("{}", message);
}
