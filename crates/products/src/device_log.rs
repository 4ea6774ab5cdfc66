//! Device check-in logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nova_core::{DeviceLogId, DomainError, DomainResult, LifecycleStatus};

/// One check-in from a device in the field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceLog {
    pub id: DeviceLogId,
    /// Device serial number.
    pub device_id: String,
    /// Product name at the time of the report.
    pub device_name: String,
    pub version: Option<String>,
    /// Free-form device information, stored as JSON text.
    pub device_info: String,
    pub device_status: Option<String>,
    pub software_ip: Option<String>,
    pub lifecycle: LifecycleStatus,
    pub created_at: DateTime<Utc>,
}

/// What a device sends when it checks in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceReport {
    pub model_id: String,
    pub device_id: String,
    pub version: Option<String>,
    #[serde(default)]
    pub device_info: Option<serde_json::Value>,
    pub device_status: Option<String>,
}

impl DeviceReport {
    pub fn validate(&self) -> DomainResult<()> {
        if self.device_id.trim().is_empty() {
            return Err(DomainError::validation("deviceId cannot be empty"));
        }
        if self.model_id.trim().is_empty() {
            return Err(DomainError::validation("modelId cannot be empty"));
        }
        Ok(())
    }

    /// Device info as stored text; empty when absent.
    pub fn device_info_text(&self) -> String {
        match &self.device_info {
            None | Some(serde_json::Value::Null) => String::new(),
            Some(value) => value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDeviceLog {
    pub id: DeviceLogId,
    pub device_id: String,
    pub device_name: String,
    pub version: Option<String>,
    pub device_info: String,
    pub device_status: Option<String>,
    pub software_ip: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceLogQuery {
    pub device_id: Option<String>,
    /// Substring match on the device (product) name.
    pub device_name: Option<String>,
    pub version: Option<String>,
}

impl DeviceLogQuery {
    pub fn matches(&self, log: &DeviceLog) -> bool {
        log.lifecycle.is_active()
            && self.device_id.as_deref().is_none_or(|d| log.device_id == d)
            && self
                .device_name
                .as_deref()
                .is_none_or(|n| log.device_name.contains(n))
            && self
                .version
                .as_deref()
                .is_none_or(|v| log.version.as_deref() == Some(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(info: Option<serde_json::Value>) -> DeviceReport {
        DeviceReport {
            model_id: "GW-01".into(),
            device_id: "SN0001".into(),
            version: Some("1.0.0".into()),
            device_info: info,
            device_status: None,
        }
    }

    #[test]
    fn device_info_is_serialized_to_text() {
        let r = report(Some(serde_json::json!({"cpu": 12})));
        assert_eq!(r.device_info_text(), r#"{"cpu":12}"#);
        assert_eq!(report(None).device_info_text(), "");
    }

    #[test]
    fn report_requires_serial_number() {
        let mut r = report(None);
        r.device_id = String::new();
        assert!(r.validate().is_err());
    }

    #[test]
    fn report_deserializes_camel_case() {
        let r: DeviceReport = serde_json::from_str(
            r#"{"modelId":"GW-01","deviceId":"SN1","version":"1.0.0","deviceStatus":"ok"}"#,
        )
        .unwrap();
        assert_eq!(r.model_id, "GW-01");
        assert_eq!(r.device_status.as_deref(), Some("ok"));
        assert!(r.device_info.is_none());
    }
}
