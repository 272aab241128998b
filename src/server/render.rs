//! HTML rendering of cluster snapshots

use std::fmt::Write;

use crate::monitor::{Severity, Snapshot};

/// CSS class for a classification token; neutral tokens get no class
pub fn css_class(severity: Severity) -> &'static str {
    match severity {
        Severity::Success => "success",
        Severity::Warning => "warning",
        Severity::Danger => "danger",
        Severity::Normal | Severity::Unknown => "",
    }
}

/// `1234567` -> `1,234,567`
pub fn with_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn shard_movement(snapshot: &Snapshot) -> String {
    match snapshot.cluster.shard_movement_delta {
        Some(delta) => delta.to_string(),
        None => "n/a".to_string(),
    }
}

/// Overview page: one section per cluster, in configuration order
pub fn overview_page(snapshots: &[std::sync::Arc<Snapshot>], refresh_secs: u64) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <meta http-equiv=\"refresh\" content=\"{}\">\n<title>Cluster overview</title>\n\
         <style>\n\
         table {{ border-collapse: collapse; margin-bottom: 2em; }}\n\
         td, th {{ padding: 2px 8px; text-align: right; }}\n\
         .success {{ background: #dff0d8; }}\n\
         .warning {{ background: #fcf8e3; }}\n\
         .danger {{ background: #f2dede; }}\n\
         .stale {{ color: #999; }}\n\
         </style>\n</head>\n<body>\n",
        refresh_secs.max(1)
    );

    for snapshot in snapshots {
        cluster_section(&mut html, snapshot);
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn cluster_section(html: &mut String, snapshot: &Snapshot) {
    let cluster = &snapshot.cluster;
    let _ = writeln!(
        html,
        "<h2 class=\"{}\">{} <small>{}</small></h2>",
        css_class(cluster.health_class),
        escape(&snapshot.host),
        cluster.health_color
    );

    if snapshot.is_pending() {
        html.push_str("<p class=\"stale\">waiting for first poll</p>\n");
        return;
    }

    let updated = snapshot
        .published_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_default();
    let _ = writeln!(
        html,
        "<p{}>docs {} &middot; disk {:.2} TB &middot; shard movement {} &middot; updated {}{}</p>",
        if snapshot.stale { " class=\"stale\"" } else { "" },
        with_thousands(cluster.doc_count),
        cluster.disk_used_terabytes,
        shard_movement(snapshot),
        updated,
        if snapshot.stale { " (partial)" } else { "" }
    );

    html.push_str("<table>\n<tr><th>node</th><th>heap %</th><th>gc ms</th><th>disk %</th></tr>\n");
    for node in &snapshot.nodes {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td class=\"{}\">{}</td><td class=\"{}\">{}</td><td>{:.2}</td></tr>",
            escape(&node.name),
            css_class(node.heap_class),
            node.heap_used_percent,
            css_class(node.gc_class),
            node.gc_delta_ms,
            node.disk_used_percent
        );
    }
    html.push_str("</table>\n");
}
