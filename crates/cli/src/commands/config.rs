use harborcall_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ConfigReport {
    database_url: String,
    database_max_connections: u32,
    ussd_service_code: String,
    ussd_max_reply_chars: usize,
    sms_base_url: String,
    sms_username: String,
    sms_api_key: &'static str,
    sms_sender_id: String,
    email_base_url: String,
    email_from_address: String,
    email_api_key: &'static str,
    server_bind_address: String,
    server_port: u16,
    server_health_check_port: u16,
    logging_level: String,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return format!("{{\"status\":\"error\",\"message\":\"{}\"}}", escape_json(&error.to_string()));
        }
    };

    let report = ConfigReport {
        database_url: config.database.url.clone(),
        database_max_connections: config.database.max_connections,
        ussd_service_code: config.ussd.service_code.clone(),
        ussd_max_reply_chars: config.ussd.max_reply_chars,
        sms_base_url: config.sms.base_url.clone(),
        sms_username: config.sms.username.clone(),
        sms_api_key: redact(config.sms.api_key.expose_secret()),
        sms_sender_id: config.sms.sender_id.clone(),
        email_base_url: config.email.base_url.clone(),
        email_from_address: config.email.from_address.clone(),
        email_api_key: redact(config.email.api_key.expose_secret()),
        server_bind_address: config.server.bind_address.clone(),
        server_port: config.server.port,
        server_health_check_port: config.server.health_check_port,
        logging_level: config.logging.level.clone(),
    };

    serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
        format!("{{\"status\":\"error\",\"message\":\"{}\"}}", escape_json(&error.to_string()))
    })
}

fn redact(secret: &str) -> &'static str {
    if secret.trim().is_empty() {
        "(unset)"
    } else {
        "***redacted***"
    }
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn config_output_never_contains_raw_secrets() {
        let output = run();
        let parsed: serde_json::Value =
            serde_json::from_str(&output).expect("config output must parse as json");
        let sms_key = parsed.get("sms_api_key").and_then(|value| value.as_str()).unwrap_or("");
        assert!(sms_key == "(unset)" || sms_key == "***redacted***");
    }
}
