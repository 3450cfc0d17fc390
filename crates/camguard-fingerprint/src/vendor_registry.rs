//! The vendor signature registry: pure data, modeled as an immutable array
//! of records keyed by the `Vendor` enum rather than any inheritance or
//! dynamic-dispatch hierarchy, per the design note that vendor detection
//! doesn't need polymorphism.

use camguard_core::Vendor;
use once_cell::sync::Lazy;
use regex::Regex;

pub struct VendorSignature {
    pub vendor: Vendor,
    /// Matched against the `Server` header (and other raw headers).
    pub header_regex: Option<Regex>,
    /// Matched against the response body when the header match misses.
    pub body_regex: Option<Regex>,
    /// "Known-existence" probe paths: a 2xx/3xx on any one of these probes
    /// the vendor in when neither regex matched.
    pub probe_paths: &'static [&'static str],
    /// Vendor-specific device-info endpoint queried on a vendor hit.
    pub device_info_endpoint: Option<&'static str>,
    /// Preferred RTSP stream paths, most specific first.
    pub rtsp_paths: &'static [&'static str],
    /// Vendor-specific credential-test / login endpoints, preferred over
    /// the generic list by the credential tester.
    pub login_endpoints: &'static [&'static str],
    /// Vendor-specific snapshot endpoints.
    pub snapshot_paths: &'static [&'static str],
}

fn ci_regex(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){}", pattern)).expect("static vendor regex must compile")
}

pub static VENDOR_REGISTRY: Lazy<Vec<VendorSignature>> = Lazy::new(|| {
    vec![
        VendorSignature {
            vendor: Vendor::Hikvision,
            header_regex: Some(ci_regex("hikvision")),
            body_regex: Some(ci_regex("hikvision|isapi")),
            probe_paths: &["/ISAPI/System/deviceInfo"],
            device_info_endpoint: Some("/ISAPI/System/deviceInfo"),
            rtsp_paths: &["/Streaming/Channels/101", "/Streaming/Channels/1"],
            login_endpoints: &["/ISAPI/Security/userCheck"],
            snapshot_paths: &["/ISAPI/Streaming/channels/101/picture"],
        },
        VendorSignature {
            vendor: Vendor::Dahua,
            header_regex: Some(ci_regex("dahua")),
            body_regex: Some(ci_regex("dahua")),
            probe_paths: &["/cgi-bin/magicBox.cgi?action=getDeviceType"],
            device_info_endpoint: Some("/cgi-bin/magicBox.cgi?action=getDeviceType"),
            rtsp_paths: &["/cam/realmonitor?channel=1&subtype=0"],
            login_endpoints: &["/RPC2_Login"],
            snapshot_paths: &["/cgi-bin/snapshot.cgi"],
        },
        VendorSignature {
            vendor: Vendor::Axis,
            header_regex: Some(ci_regex("axis")),
            body_regex: Some(ci_regex("axis communications|axis camera")),
            probe_paths: &["/axis-cgi/basicdeviceinfo.cgi"],
            device_info_endpoint: Some("/axis-cgi/basicdeviceinfo.cgi"),
            rtsp_paths: &["/axis-media/media.amp"],
            login_endpoints: &["/axis-cgi/admin/param.cgi?action=list"],
            snapshot_paths: &["/axis-cgi/jpg/image.cgi"],
        },
        VendorSignature {
            vendor: Vendor::Reolink,
            header_regex: Some(ci_regex("reolink")),
            body_regex: Some(ci_regex("reolink")),
            probe_paths: &["/api.cgi?cmd=GetDevInfo"],
            device_info_endpoint: Some("/api.cgi?cmd=GetDevInfo"),
            rtsp_paths: &["/h264Preview_01_main"],
            login_endpoints: &["/api.cgi?cmd=Login"],
            snapshot_paths: &["/cgi-bin/api.cgi?cmd=Snap&channel=0"],
        },
        VendorSignature {
            vendor: Vendor::Amcrest,
            header_regex: Some(ci_regex("amcrest")),
            body_regex: Some(ci_regex("amcrest")),
            probe_paths: &["/cgi-bin/magicBox.cgi?action=getDeviceType"],
            device_info_endpoint: Some("/cgi-bin/magicBox.cgi?action=getDeviceType"),
            rtsp_paths: &["/cam/realmonitor?channel=1&subtype=0"],
            login_endpoints: &["/RPC2_Login"],
            snapshot_paths: &["/cgi-bin/snapshot.cgi"],
        },
        VendorSignature {
            vendor: Vendor::Foscam,
            header_regex: Some(ci_regex("foscam")),
            body_regex: Some(ci_regex("foscam")),
            probe_paths: &["/cgi-bin/CGIProxy.fcgi?cmd=getDevInfo"],
            device_info_endpoint: Some("/cgi-bin/CGIProxy.fcgi?cmd=getDevInfo"),
            rtsp_paths: &["/videoMain"],
            login_endpoints: &["/cgi-bin/CGIProxy.fcgi?cmd=logIn"],
            snapshot_paths: &["/cgi-bin/CGIProxy.fcgi?cmd=snapPicture2"],
        },
        VendorSignature {
            vendor: Vendor::TpLink,
            header_regex: Some(ci_regex("tp-link|tplink|tapo")),
            body_regex: Some(ci_regex("tp-link|tapo")),
            probe_paths: &["/cgi-bin/info"],
            device_info_endpoint: Some("/cgi-bin/info"),
            rtsp_paths: &["/stream1"],
            login_endpoints: &["/stok=login"],
            snapshot_paths: &["/snapshot.jpg"],
        },
        VendorSignature {
            vendor: Vendor::Uniview,
            header_regex: Some(ci_regex("uniview")),
            body_regex: Some(ci_regex("uniview")),
            probe_paths: &["/LAPI/V1.0/System/DeviceInfo"],
            device_info_endpoint: Some("/LAPI/V1.0/System/DeviceInfo"),
            rtsp_paths: &["/media/video1"],
            login_endpoints: &["/LAPI/V1.0/System/Security/userLogin"],
            snapshot_paths: &["/snap.jpg"],
        },
        VendorSignature {
            vendor: Vendor::Vivotek,
            header_regex: Some(ci_regex("vivotek")),
            body_regex: Some(ci_regex("vivotek")),
            probe_paths: &["/cgi-bin/admin/getparam.cgi?system_info"],
            device_info_endpoint: Some("/cgi-bin/admin/getparam.cgi?system_info"),
            rtsp_paths: &["/live.sdp"],
            login_endpoints: &["/cgi-bin/admin/login.cgi"],
            snapshot_paths: &["/cgi-bin/viewer/video.jpg"],
        },
        VendorSignature {
            vendor: Vendor::Hanwha,
            header_regex: Some(ci_regex("hanwha|wisenet|samsung")),
            body_regex: Some(ci_regex("hanwha|wisenet")),
            probe_paths: &["/stw-cgi/system.cgi?msubmenu=deviceinfo"],
            device_info_endpoint: Some("/stw-cgi/system.cgi?msubmenu=deviceinfo"),
            rtsp_paths: &["/profile2/media.smp"],
            login_endpoints: &["/stw-cgi/login.cgi"],
            snapshot_paths: &["/stw-cgi/video.cgi?msubmenu=snapshot"],
        },
        VendorSignature {
            vendor: Vendor::Bosch,
            header_regex: Some(ci_regex("bosch")),
            body_regex: Some(ci_regex("bosch security")),
            probe_paths: &["/rcp.xml?command=0x0407"],
            device_info_endpoint: Some("/rcp.xml?command=0x0407"),
            rtsp_paths: &["/rtsp_tunnel"],
            login_endpoints: &["/login.htm"],
            snapshot_paths: &["/snap.jpg"],
        },
    ]
});

/// Matches the registry, in order: header regex first, then body regex.
pub fn match_by_regex(headers_blob: &str, body: &str) -> Option<Vendor> {
    for sig in VENDOR_REGISTRY.iter() {
        if let Some(re) = &sig.header_regex {
            if re.is_match(headers_blob) {
                return Some(sig.vendor);
            }
        }
    }
    for sig in VENDOR_REGISTRY.iter() {
        if let Some(re) = &sig.body_regex {
            if re.is_match(body) {
                return Some(sig.vendor);
            }
        }
    }
    None
}

pub fn signature_for(vendor: Vendor) -> Option<&'static VendorSignature> {
    VENDOR_REGISTRY.iter().find(|s| s.vendor == vendor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_match_takes_priority_over_body() {
        let vendor = match_by_regex("Server: Hikvision-Webs", "mentions dahua somewhere");
        assert_eq!(vendor, Some(Vendor::Hikvision));
    }

    #[test]
    fn falls_back_to_body_match() {
        let vendor = match_by_regex("Server: nginx", "Powered by Dahua DVR");
        assert_eq!(vendor, Some(Vendor::Dahua));
    }

    #[test]
    fn no_match_returns_none() {
        assert_eq!(match_by_regex("Server: nginx", "generic landing page"), None);
    }

    #[test]
    fn every_signature_has_a_device_info_endpoint() {
        for sig in VENDOR_REGISTRY.iter() {
            assert!(sig.device_info_endpoint.is_some(), "{:?}", sig.vendor);
        }
    }
}
