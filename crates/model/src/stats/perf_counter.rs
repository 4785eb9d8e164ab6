use serde::{Deserialize, Serialize};

pub const RESULT_OK: &str = "OK";

/// One counter in a `perf-counters` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerfCounterMetric {
    pub name: String,
    #[serde(rename = "type", default)]
    pub counter_type: String,
    pub value: f64,
}

/// JSON body a replica server returns for `perf-counters <filter>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerfCounterInfo {
    pub result: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub timestamp_str: String,
    #[serde(default)]
    pub counters: Vec<PerfCounterMetric>,
}

impl PerfCounterInfo {
    pub fn decode(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    pub fn is_ok(&self) -> bool {
        self.result == RESULT_OK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_reply() {
        let payload = r#"{
            "result": "OK",
            "timestamp": 1700000000,
            "timestamp_str": "2023-11-14 22:13:20",
            "counters": [
                {"name": "replica*app.pegasus*get_qps@1.0", "type": "NUMBER", "value": 5.0}
            ]
        }"#;
        let info = PerfCounterInfo::decode(payload).unwrap();
        assert!(info.is_ok());
        assert_eq!(info.counters.len(), 1);
        assert_eq!(info.counters[0].counter_type, "NUMBER");
        assert_eq!(info.counters[0].value, 5.0);
    }

    #[test]
    fn test_decode_error_reply() {
        let info = PerfCounterInfo::decode(r#"{"result": "ERR_INVALID_PARAMETERS"}"#).unwrap();
        assert!(!info.is_ok());
        assert!(info.counters.is_empty());
    }

    #[test]
    fn test_decode_garbage() {
        assert!(PerfCounterInfo::decode("unknown command 'perf-counters'").is_err());
    }
}
