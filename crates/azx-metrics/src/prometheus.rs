//! Prometheus text exposition format.
//!
//! Renders a snapshot copy into the text format for scraping by a
//! Prometheus server or compatible agent.

use std::fmt::Write;

use crate::snapshot::SnapshotData;

/// Render a snapshot into Prometheus text format.
///
/// Every series name is prefixed with `namespace`. Connection series carry
/// `name` and `group` labels.
pub fn render_prometheus(namespace: &str, data: &SnapshotData) -> String {
    let mut out = String::new();

    header(&mut out, namespace, "up", "Was the last scrape of azure successful.", "gauge");
    let _ = writeln!(out, "{namespace}_up {}", data.up);

    header(&mut out, namespace, "vpn_status", "Status of the VPN connection.", "gauge");
    for (key, s) in &data.series {
        let _ = writeln!(
            out,
            "{namespace}_vpn_status{{name=\"{}\",group=\"{}\"}} {}",
            escape_label(&key.name),
            escape_label(&key.group),
            s.status
        );
    }

    header(&mut out, namespace, "vpn_ingress_bytes", "Inbound bytes transferred", "counter");
    for (key, s) in &data.series {
        let _ = writeln!(
            out,
            "{namespace}_vpn_ingress_bytes{{name=\"{}\",group=\"{}\"}} {}",
            escape_label(&key.name),
            escape_label(&key.group),
            s.ingress_bytes
        );
    }

    header(&mut out, namespace, "vpn_egress_bytes", "Outbound bytes transferred", "counter");
    for (key, s) in &data.series {
        let _ = writeln!(
            out,
            "{namespace}_vpn_egress_bytes{{name=\"{}\",group=\"{}\"}} {}",
            escape_label(&key.name),
            escape_label(&key.group),
            s.egress_bytes
        );
    }

    out
}

fn header(out: &mut String, namespace: &str, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {namespace}_{name} {help}");
    let _ = writeln!(out, "# TYPE {namespace}_{name} {kind}");
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
