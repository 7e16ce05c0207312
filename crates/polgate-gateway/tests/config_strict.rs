#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use polgate_core::GatewayError;
use polgate_gateway::config::{self, GatewayConfig};

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
gateway:
  listen: "0.0.0.0:8090"
admin:
  hots: "cerbos.internal" # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(matches!(err, GatewayError::Config(_)), "{err:?}");
    assert!(err.to_string().contains("hots"), "{err}");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.gateway.listen, "0.0.0.0:8090");
    assert_eq!(cfg.gateway.audit_tail, 100);
    assert_eq!(cfg.admin.target_uri(), "http://cerbos:3593");
    assert_eq!(cfg.admin.connect_timeout_ms, None);
}

#[test]
fn full_config() {
    let ok = r#"
version: 1
gateway:
  listen: "127.0.0.1:9000"
  static_dir: "/srv/ui"
  audit_tail: 25
admin:
  host: "pdp.internal"
  port: 3592
  username: "admin"
  password: "s3cret"
  connect_timeout_ms: 2000
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.gateway.listen_addr().unwrap().port(), 9000);
    assert_eq!(cfg.gateway.static_dir, "/srv/ui");
    assert_eq!(cfg.gateway.audit_tail, 25);
    assert_eq!(cfg.admin.target_uri(), "http://pdp.internal:3592");
    assert_eq!(cfg.admin.connect_timeout_ms, Some(2000));
}

#[test]
fn out_of_range_values_fail_validation() {
    for bad in [
        "version: 2\n",
        "version: 1\ngateway: { listen: \"not-an-addr\" }\n",
        "version: 1\ngateway: { audit_tail: 0 }\n",
        "version: 1\nadmin: { host: \"\" }\n",
        "version: 1\nadmin: { port: 0 }\n",
    ] {
        let err = config::load_from_str(bad).expect_err(bad);
        assert!(matches!(err, GatewayError::Config(_)), "{bad}: {err:?}");
    }
}

#[test]
fn defaults_match_minimal_file() {
    let from_file = config::load_from_str("version: 1\n").unwrap();
    let built_in = GatewayConfig::default();
    assert_eq!(from_file.gateway.listen, built_in.gateway.listen);
    assert_eq!(from_file.admin.target_uri(), built_in.admin.target_uri());
    built_in.validate().unwrap();
}

#[test]
fn host_override_replaces_only_when_set() {
    let cfg = GatewayConfig::default().with_host_override(Some("pdp".into()));
    assert_eq!(cfg.admin.target_uri(), "http://pdp:3593");

    let cfg = GatewayConfig::default().with_host_override(Some(String::new()));
    assert_eq!(cfg.admin.host, "cerbos");

    let cfg = GatewayConfig::default().with_host_override(None);
    assert_eq!(cfg.admin.host, "cerbos");
}
