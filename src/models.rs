//! Data models for the HG659 management API

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

/// Anti-forgery parameter name and token served in the landing page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Csrf {
    #[serde(rename = "csrf_param")]
    pub param: String,

    #[serde(rename = "csrf_token")]
    pub token: String,
}

impl Csrf {
    pub fn new(param: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            token: token.into(),
        }
    }

    /// The device rejects authenticated POSTs unless both fields are set
    pub fn is_complete(&self) -> bool {
        !self.param.is_empty() && !self.token.is_empty()
    }
}

/// Body of an authenticated POST: `{"csrf": {...}, "data": ...}`
#[derive(Debug, Serialize)]
pub struct Envelope<'a, T: Serialize> {
    pub csrf: &'a Csrf,
    pub data: &'a T,
}

/// Payload of `/api/system/user_login`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    #[serde(rename = "UserName")]
    pub username: String,

    /// Hashed password, see [`crate::auth::hash_password`]
    #[serde(rename = "Password")]
    pub password: String,
}

/// Response from `/api/system/user_login`
///
/// The rotated CSRF pair sits at the top level next to the error fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub csrf_param: Option<String>,

    #[serde(default)]
    pub csrf_token: Option<String>,

    #[serde(rename = "errorCategory", default)]
    pub error_category: Option<String>,

    #[serde(rename = "errcode", default, deserialize_with = "null_as_default")]
    pub error_code: i64,
}

impl LoginResponse {
    /// Fresh CSRF pair, if the device sent one
    pub fn csrf(&self) -> Option<Csrf> {
        if self.csrf_param.is_none() && self.csrf_token.is_none() {
            return None;
        }

        Some(Csrf {
            param: self.csrf_param.clone().unwrap_or_default(),
            token: self.csrf_token.clone().unwrap_or_default(),
        })
    }
}

/// Deserialize a field the device may send as `null`, falling back to the
/// type's default like a missing key would
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Response from `/api/system/deviceinfo`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct RawDeviceInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub device_name: String,
    #[serde(rename = "ManufacturerOUI", deserialize_with = "null_as_default")]
    pub manufacturer_oui: String,
    #[serde(deserialize_with = "null_as_default")]
    pub serial_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub software_version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub hardware_version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub up_time: u64,
}

/// One record of `/api/system/HostInfo`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawHost {
    #[serde(rename = "HostName", deserialize_with = "null_as_default")]
    pub host_name: String,

    #[serde(rename = "Active46", deserialize_with = "null_as_default")]
    pub active: bool,

    #[serde(rename = "Layer2Interface", deserialize_with = "null_as_default")]
    pub layer2_interface: String,

    #[serde(rename = "MACAddress", deserialize_with = "null_as_default")]
    pub mac_address: String,

    #[serde(rename = "IPAddress", deserialize_with = "null_as_default")]
    pub ip_address: String,

    #[serde(rename = "Ipv6Addrs", deserialize_with = "null_as_default")]
    pub ipv6_addrs: Vec<RawIpv6Addr>,

    #[serde(rename = "LeaseTime", deserialize_with = "null_as_default")]
    pub lease_time: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawIpv6Addr {
    #[serde(rename = "Ipv6Addr", default, deserialize_with = "null_as_default")]
    pub addr: String,
}

/// Device metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    #[serde(rename = "DeviceID")]
    pub device_id: String,

    #[serde(rename = "Model")]
    pub model: String,

    #[serde(rename = "Version")]
    pub version: String,

    /// Seconds since boot
    #[serde(rename = "Uptime")]
    pub uptime: u64,
}

impl From<RawDeviceInfo> for DeviceInfo {
    fn from(raw: RawDeviceInfo) -> Self {
        Self {
            device_id: format!("{}-{}", raw.manufacturer_oui, raw.serial_number),
            model: format!("{} {}", raw.device_name, raw.hardware_version),
            version: raw.software_version,
            uptime: raw.up_time,
        }
    }
}

/// A host known to the router
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Host {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "IsConnected")]
    pub is_connected: bool,

    #[serde(rename = "MACAddr")]
    pub mac_addr: MacAddr,

    #[serde(rename = "IPAddrs")]
    pub ip_addrs: Vec<IpAddr>,

    #[serde(rename = "InterfaceName")]
    pub interface_name: String,

    #[serde(rename = "LeaseTime")]
    pub lease_time: i64,
}

impl TryFrom<RawHost> for Host {
    type Error = Error;

    fn try_from(raw: RawHost) -> Result<Self> {
        let mac_addr = raw.mac_address.parse()?;

        let mut ip_addrs = Vec::with_capacity(1 + raw.ipv6_addrs.len());
        if !raw.ip_address.is_empty() {
            let v4 = Ipv4Addr::from_str(&raw.ip_address).map_err(|_| {
                Error::parse(format!("invalid IPv4 address: {:?}", raw.ip_address))
            })?;
            ip_addrs.push(IpAddr::V4(v4));
        }
        for entry in &raw.ipv6_addrs {
            let addr = IpAddr::from_str(&entry.addr)
                .map_err(|_| Error::parse(format!("invalid IPv6 address: {:?}", entry.addr)))?;
            ip_addrs.push(addr);
        }

        Ok(Self {
            name: strip_interface_suffix(&raw.host_name).to_string(),
            is_connected: raw.active,
            mac_addr,
            ip_addrs,
            interface_name: raw.layer2_interface,
            lease_time: raw.lease_time,
        })
    }
}

/// Drop the `_Wireless` or `_Ethernet` suffix the router appends to names
pub fn strip_interface_suffix(name: &str) -> &str {
    name.strip_suffix("_Wireless")
        .or_else(|| name.strip_suffix("_Ethernet"))
        .unwrap_or(name)
}

/// 48-bit hardware address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddr(pub [u8; 6]);

impl FromStr for MacAddr {
    type Err = Error;

    /// Accepts `aa:bb:cc:dd:ee:ff`, `aa-bb-cc-dd-ee-ff` and `aabb.ccdd.eeff`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::parse(format!("invalid MAC address: {:?}", s));

        let hex: String = if s.contains('.') {
            let groups: Vec<&str> = s.split('.').collect();
            if groups.len() != 3 || groups.iter().any(|g| g.len() != 4) {
                return Err(invalid());
            }
            groups.concat()
        } else {
            let sep = if s.contains('-') { '-' } else { ':' };
            let octets: Vec<&str> = s.split(sep).collect();
            if octets.len() != 6 || octets.iter().any(|o| o.len() != 2) {
                return Err(invalid());
            }
            octets.concat()
        };

        let mut bytes = [0u8; 6];
        hex::decode_to_slice(&hex, &mut bytes).map_err(|_| invalid())?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            a, b, c, d, e, g
        )
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("PC_Wireless", "PC")]
    #[case("PC_Ethernet", "PC")]
    #[case("PC", "PC")]
    #[case("PC_Wireless_Ethernet", "PC_Wireless")]
    #[case("_Wireless", "")]
    fn test_strip_interface_suffix(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(strip_interface_suffix(raw), expected);
    }

    #[rstest]
    #[case("00:11:22:aa:BB:cc")]
    #[case("00-11-22-aa-bb-cc")]
    #[case("0011.22aa.bbcc")]
    fn test_parse_mac(#[case] raw: &str) {
        let mac: MacAddr = raw.parse().unwrap();
        assert_eq!(mac, MacAddr([0x00, 0x11, 0x22, 0xaa, 0xbb, 0xcc]));
        assert_eq!(mac.to_string(), "00:11:22:aa:bb:cc");
    }

    #[rstest]
    #[case("")]
    #[case("00:11:22:aa:bb")]
    #[case("00:11:22:aa:bb:zz")]
    #[case("0:11:22:aa:bb:cc0")]
    #[case("0011.22aa.bbc")]
    fn test_parse_mac_rejects_malformed(#[case] raw: &str) {
        assert!(matches!(raw.parse::<MacAddr>(), Err(Error::Parse(_))));
    }

    #[test]
    fn test_device_info_composition() {
        let raw = RawDeviceInfo {
            device_name: "HG659".to_string(),
            manufacturer_oui: "001122".to_string(),
            serial_number: "XYZ".to_string(),
            software_version: "V100R001C206B020".to_string(),
            hardware_version: "v2".to_string(),
            up_time: 3600,
        };

        let info = DeviceInfo::from(raw);
        assert_eq!(info.device_id, "001122-XYZ");
        assert_eq!(info.model, "HG659 v2");
        assert_eq!(info.version, "V100R001C206B020");
        assert_eq!(info.uptime, 3600);
    }

    #[test]
    fn test_host_from_raw_json() {
        let json = r#"{
            "HostName": "laptop_Wireless",
            "Active46": true,
            "Layer2Interface": "SSID1",
            "MACAddress": "aa:bb:cc:dd:ee:ff",
            "IPAddress": "192.168.1.10",
            "Ipv6Addrs": [{"Ipv6Addr": "fe80::1"}, {"Ipv6Addr": "2001:db8::2"}],
            "LeaseTime": 86400
        }"#;
        let raw: RawHost = serde_json::from_str(json).unwrap();
        let host = Host::try_from(raw).unwrap();

        assert_eq!(host.name, "laptop");
        assert!(host.is_connected);
        assert_eq!(host.interface_name, "SSID1");
        assert_eq!(host.lease_time, 86400);
        assert_eq!(
            host.ip_addrs,
            vec![
                "192.168.1.10".parse::<IpAddr>().unwrap(),
                "fe80::1".parse::<IpAddr>().unwrap(),
                "2001:db8::2".parse::<IpAddr>().unwrap(),
            ]
        );
    }

    #[test]
    fn test_null_fields_read_as_defaults() {
        let json = r#"{
            "HostName": null,
            "Active46": null,
            "Layer2Interface": null,
            "MACAddress": "00:11:22:33:44:55",
            "IPAddress": null,
            "Ipv6Addrs": null,
            "LeaseTime": null
        }"#;
        let raw: RawHost = serde_json::from_str(json).unwrap();
        let host = Host::try_from(raw).unwrap();
        assert_eq!(host.name, "");
        assert!(!host.is_connected);
        assert!(host.ip_addrs.is_empty());
        assert_eq!(host.lease_time, 0);

        let raw: RawDeviceInfo = serde_json::from_str(
            r#"{"DeviceName": "HG659", "ManufacturerOUI": null, "SerialNumber": "XYZ", "UpTime": null}"#,
        )
        .unwrap();
        assert_eq!(raw.manufacturer_oui, "");
        assert_eq!(raw.up_time, 0);

        let resp: LoginResponse =
            serde_json::from_str(r#"{"errorCategory": "ok", "errcode": null}"#).unwrap();
        assert_eq!(resp.error_code, 0);
    }

    #[test]
    fn test_host_without_ipv4_skips_it() {
        let raw = RawHost {
            host_name: "tv".to_string(),
            mac_address: "aa:bb:cc:dd:ee:ff".to_string(),
            ..Default::default()
        };
        let host = Host::try_from(raw).unwrap();
        assert!(host.ip_addrs.is_empty());
    }

    #[test]
    fn test_host_with_bad_ip_fails() {
        let raw = RawHost {
            mac_address: "aa:bb:cc:dd:ee:ff".to_string(),
            ip_address: "192.168.1.300".to_string(),
            ..Default::default()
        };
        assert!(matches!(Host::try_from(raw), Err(Error::Parse(_))));
    }

    #[test]
    fn test_host_serializes_with_device_field_names() {
        let host = Host {
            name: "PC".to_string(),
            is_connected: false,
            mac_addr: MacAddr([0, 0x11, 0x22, 0x33, 0x44, 0x55]),
            ip_addrs: vec!["10.0.0.2".parse().unwrap()],
            interface_name: "LAN1".to_string(),
            lease_time: 0,
        };
        let value = serde_json::to_value(&host).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "Name": "PC",
                "IsConnected": false,
                "MACAddr": "00:11:22:33:44:55",
                "IPAddrs": ["10.0.0.2"],
                "InterfaceName": "LAN1",
                "LeaseTime": 0
            })
        );
    }

    #[test]
    fn test_login_response_csrf_rotation() {
        let resp: LoginResponse = serde_json::from_str(
            r#"{"csrf_param":"p2","csrf_token":"t2","errorCategory":"ok","errcode":0}"#,
        )
        .unwrap();
        assert_eq!(resp.csrf(), Some(Csrf::new("p2", "t2")));
        assert_eq!(resp.error_category.as_deref(), Some("ok"));

        let resp: LoginResponse = serde_json::from_str(r#"{"errorCategory":"ok"}"#).unwrap();
        assert_eq!(resp.csrf(), None);
    }
}
