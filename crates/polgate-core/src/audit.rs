//! Access-log entries streamed from the admin service (`cerbos.audit.v1`).

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

#[derive(Clone, PartialEq, prost::Message)]
pub struct AccessLogEntry {
    #[prost(string, tag = "1")]
    pub call_id: String,
    #[prost(message, optional, tag = "2")]
    pub timestamp: Option<prost_types::Timestamp>,
    #[prost(message, optional, tag = "3")]
    pub peer: Option<Peer>,
    #[prost(btree_map = "string, message", tag = "4")]
    pub metadata: BTreeMap<String, MetaValues>,
    #[prost(string, tag = "5")]
    pub method: String,
    #[prost(uint32, tag = "6")]
    pub status_code: u32,
    #[prost(bool, tag = "7")]
    pub oversized: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Peer {
    #[prost(string, tag = "1")]
    pub address: String,
    #[prost(string, tag = "2")]
    pub auth_info: String,
    #[prost(string, tag = "3")]
    pub user_agent: String,
    #[prost(string, tag = "4")]
    pub forwarded_for: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MetaValues {
    #[prost(string, repeated, tag = "1")]
    pub values: Vec<String>,
}

impl AccessLogEntry {
    /// One compact JSON object, no trailing newline. Empty fields are omitted.
    pub fn render_line(&self) -> String {
        let mut obj = Map::new();
        put_str(&mut obj, "callId", &self.call_id);
        if let Some(ts) = &self.timestamp {
            obj.insert("timestamp".into(), Value::String(ts.to_string()));
        }
        if let Some(peer) = &self.peer {
            let mut p = Map::new();
            put_str(&mut p, "address", &peer.address);
            put_str(&mut p, "authInfo", &peer.auth_info);
            put_str(&mut p, "userAgent", &peer.user_agent);
            put_str(&mut p, "forwardedFor", &peer.forwarded_for);
            obj.insert("peer".into(), Value::Object(p));
        }
        if !self.metadata.is_empty() {
            let meta: Map<String, Value> = self
                .metadata
                .iter()
                .map(|(k, v)| (k.clone(), json!({ "values": v.values })))
                .collect();
            obj.insert("metadata".into(), Value::Object(meta));
        }
        put_str(&mut obj, "method", &self.method);
        if self.status_code != 0 {
            obj.insert("statusCode".into(), json!(self.status_code));
        }
        if self.oversized {
            obj.insert("oversized".into(), Value::Bool(true));
        }
        Value::Object(obj).to_string()
    }
}

fn put_str(obj: &mut Map<String, Value>, k: &str, v: &str) {
    if !v.is_empty() {
        obj.insert(k.to_string(), Value::String(v.to_string()));
    }
}
