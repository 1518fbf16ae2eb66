// ── Raw status normalization ──
//
// Maps whatever a vendor reports onto the four-value health taxonomy.
// Total: unseen vocabulary degrades to `Unknown` instead of failing.

use crate::model::HealthStatus;

/// Normalize a raw vendor status token.
///
/// Rules, first match wins:
/// 1. absent or blank → `Unknown`
/// 2. case-folded `"online"` / `"offline"` → `Online` / `Offline`
/// 3. contains `"unstable"` or `"degraded"` → `Unstable`
/// 4. anything else → `Unknown`
pub fn normalize(raw: Option<&str>) -> HealthStatus {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return HealthStatus::Unknown;
    };

    let folded = raw.to_lowercase();
    match folded.as_str() {
        "online" => HealthStatus::Online,
        "offline" => HealthStatus::Offline,
        s if s.contains("unstable") || s.contains("degraded") => HealthStatus::Unstable,
        _ => HealthStatus::Unknown,
    }
}
