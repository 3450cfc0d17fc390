//! Fixed and vendor-merged endpoint lists for the four probe families.

pub const GENERIC_RTSP_PATHS: &[&str] = &["/live.sdp", "/stream1", "/video1", "/media/video1", "/ch0_0.264"];

pub const GENERIC_SNAPSHOT_PATHS: &[&str] = &["/snapshot.jpg", "/snap.jpg", "/jpg/image.jpg", "/cgi-bin/snapshot.cgi"];

pub const CONFIG_DISCLOSURE_PATHS: &[&str] = &[
    "/config.xml",
    "/cgi-bin/export",
    "/system.ini",
    "/backup.cfg",
    "/cgi-bin/configManager.cgi?action=getConfig",
];

pub const ADMIN_DEBUG_PATHS: &[&str] = &["/admin", "/debug", "/cgi-bin/debug.cgi", "/system_log.htm", "/diagnostics"];

/// Merges a vendor-specific list ahead of the generic list, deduplicated.
pub fn merged(vendor_specific: &[&'static str], generic: &[&'static str]) -> Vec<&'static str> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for path in vendor_specific.iter().chain(generic.iter()) {
        if seen.insert(*path) {
            out.push(*path);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_deduplicates_while_preserving_vendor_priority() {
        let vendor = &["/stream1", "/videoMain"];
        let merged = merged(vendor, GENERIC_RTSP_PATHS);
        assert_eq!(merged[0], "/stream1");
        assert_eq!(merged[1], "/videoMain");
        assert_eq!(merged.iter().filter(|p| **p == "/stream1").count(), 1);
    }
}
