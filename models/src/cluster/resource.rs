//! Parsing of Kubernetes `Quantity` resource values into the plain integers the
//! rebalancing strategies do arithmetic on (millicores, bytes, counts).

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

/// Parses a CPU `Quantity` (e.g. `"4"`, `"4000m"`) into millicores.
///
/// Unparseable values are treated as zero rather than failing the whole utilization
/// computation over one malformed container spec.
pub fn cpu_millicores(q: &Quantity) -> i64 {
    let s = q.0.trim();
    if let Some(milli) = s.strip_suffix('m') {
        milli.parse::<f64>().map(|v| v.round() as i64).unwrap_or(0)
    } else {
        s.parse::<f64>()
            .map(|v| (v * 1000.0).round() as i64)
            .unwrap_or(0)
    }
}

/// Parses a memory `Quantity` (e.g. `"512Mi"`, `"2Gi"`, `"1000000"`) into bytes.
pub fn memory_bytes(q: &Quantity) -> i64 {
    let s = q.0.trim();

    const BINARY_SUFFIXES: &[(&str, i64)] = &[
        ("Ki", 1 << 10),
        ("Mi", 1 << 20),
        ("Gi", 1 << 30),
        ("Ti", 1 << 40),
        ("Pi", 1 << 50),
        ("Ei", 1 << 60),
    ];
    const DECIMAL_SUFFIXES: &[(&str, i64)] = &[
        ("k", 1_000),
        ("M", 1_000_000),
        ("G", 1_000_000_000),
        ("T", 1_000_000_000_000),
        ("P", 1_000_000_000_000_000),
        ("E", 1_000_000_000_000_000_000),
    ];

    for (suffix, multiplier) in BINARY_SUFFIXES {
        if let Some(base) = s.strip_suffix(suffix) {
            return base
                .parse::<f64>()
                .map(|v| (v * *multiplier as f64).round() as i64)
                .unwrap_or(0);
        }
    }
    for (suffix, multiplier) in DECIMAL_SUFFIXES {
        if let Some(base) = s.strip_suffix(suffix) {
            return base
                .parse::<f64>()
                .map(|v| (v * *multiplier as f64).round() as i64)
                .unwrap_or(0);
        }
    }
    s.parse::<f64>().map(|v| v.round() as i64).unwrap_or(0)
}

/// Parses a dimensionless `Quantity` (e.g. allocatable pod count) into an integer.
pub fn count(q: &Quantity) -> i64 {
    q.0.trim().parse::<f64>().map(|v| v.round() as i64).unwrap_or(0)
}
