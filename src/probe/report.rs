use super::*;

use crate::info::InfoValue;

/// Identity keys and their labels, in display order.
const IDENTITY_FIELDS: &[(&str, &str)] = &[
    ("switch_model", "Model"),
    ("switch_mac", "MAC Address"),
    ("switch_ip", "IP Address"),
    ("switch_firmware", "Firmware"),
    ("switch_hardware", "Hardware"),
];

const VLAN_DETAIL_MARKERS: &[&str] = &["_name", "_tagged_ports", "_untagged_ports"];

/// Formats `n` with `,` between groups of three digits.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn text_or(value: Option<&InfoValue>, default: &str) -> String {
    value.map_or_else(|| default.to_string(), ToString::to_string)
}

fn counter(value: Option<&InfoValue>) -> String {
    match value {
        None => "0".to_string(),
        Some(value) => value
            .as_u64()
            .map(group_thousands)
            .unwrap_or_else(|| value.to_string()),
    }
}

fn is_vlan_detail(key: &str) -> bool {
    key.starts_with("vlan_") && VLAN_DETAIL_MARKERS.iter().any(|m| key.contains(m))
}

fn render_identity(info: &SwitchInfo, out: &mut impl Write) -> io::Result<()> {
    for (key, label) in IDENTITY_FIELDS {
        if let Some(value) = info.get(key) {
            writeln!(out, "{label}: {value}")?;
        }
    }
    writeln!(out)
}

fn render_ports(info: &SwitchInfo, ports: usize, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Port Status:")?;
    rule(out, '-')?;
    for port in 1..=ports {
        let status = text_or(info.get(&format!("port_{port}_status")), "unknown");
        let speed = text_or(info.get(&format!("port_{port}_connection_speed")), "unknown");
        let tx = counter(info.get(&format!("port_{port}_tx_good")));
        let rx = counter(info.get(&format!("port_{port}_rx_good")));
        writeln!(
            out,
            "Port {port}: {status:<4} | Speed: {speed:<15} | TX: {tx:>12} | RX: {rx:>12}"
        )?;
    }
    writeln!(out)
}

fn render_vlans(info: &SwitchInfo, out: &mut impl Write) -> io::Result<()> {
    if !info.contains_key("vlan_enabled") {
        return Ok(());
    }
    let count = info.get("vlan_count");

    writeln!(out, "VLAN Information:")?;
    rule(out, '-')?;
    let enabled = info
        .get("vlan_enabled")
        .and_then(InfoValue::as_bool)
        .unwrap_or(false);
    writeln!(
        out,
        "802.1Q VLAN Enabled: {}",
        if enabled { "True" } else { "False" }
    )?;
    writeln!(out, "VLAN Type: {}", text_or(info.get("vlan_type"), "Unknown"))?;
    writeln!(out, "VLAN Count: {}", text_or(count, "0"))?;
    writeln!(out)?;

    if count.and_then(InfoValue::as_u64).unwrap_or(0) > 0 {
        writeln!(out, "VLAN Details:")?;
        for (key, value) in info.iter().filter(|(key, _)| is_vlan_detail(key)) {
            writeln!(out, "  {key}: {value}")?;
        }
    }
    Ok(())
}

fn render_keys(info: &SwitchInfo, out: &mut impl Write) -> io::Result<()> {
    banner(out, "All available keys in switch_info:")?;
    for key in info.keys() {
        writeln!(out, "  - {key}")?;
    }
    Ok(())
}

/// Writes the report sections: identity, ports `1..=ports`, VLANs, all keys.
pub fn render_report(info: &SwitchInfo, ports: usize, out: &mut impl Write) -> io::Result<()> {
    banner(out, "Switch Information:")?;
    render_identity(info, out)?;
    render_ports(info, ports, out)?;
    render_vlans(info, out)?;
    writeln!(out)?;
    render_keys(info, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(info: &SwitchInfo, ports: usize) -> String {
        let mut out = Vec::new();
        render_report(info, ports, &mut out).expect("render");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn thousands_are_grouped() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn missing_port_keys_fall_back_to_defaults() {
        let info: SwitchInfo = [("port_1_status", "up")].into_iter().collect();
        let report = rendered(&info, 2);

        assert!(report.contains(&format!(
            "Port 2: {:<4} | Speed: {:<15} | TX: {:>12} | RX: {:>12}",
            "unknown", "unknown", "0", "0"
        )));
        assert!(report.contains("Port 1: up   | Speed: unknown"));
    }

    #[test]
    fn counters_are_right_aligned_with_separators() {
        let mut info = SwitchInfo::new();
        info.insert("port_1_status", "up");
        info.insert("port_1_connection_speed", "1000M Full");
        info.insert("port_1_tx_good", 1234567u64);
        info.insert("port_1_rx_good", 42u64);
        let report = rendered(&info, 1);

        assert!(report.contains(
            "Port 1: up   | Speed: 1000M Full      | TX:    1,234,567 | RX:           42"
        ));
    }

    #[test]
    fn identity_lines_only_for_present_keys() {
        let mut info = SwitchInfo::new();
        info.insert("switch_model", "SG108Pro");
        info.insert("switch_ip", "192.168.1.10");
        let report = rendered(&info, 0);

        assert!(report.contains("Model: SG108Pro\n"));
        assert!(report.contains("IP Address: 192.168.1.10\n"));
        assert!(!report.contains("MAC Address:"));
        assert!(!report.contains("Firmware:"));
    }

    #[test]
    fn vlan_details_list_only_matching_keys() {
        let mut info = SwitchInfo::new();
        info.insert("vlan_enabled", true);
        info.insert("vlan_count", 1u64);
        info.insert("vlan_1_name", "Default");
        info.insert("vlan_type", "802.1Q");
        let report = rendered(&info, 0);

        let details = report
            .split("VLAN Details:\n")
            .nth(1)
            .expect("details section");
        let lines: Vec<&str> = details
            .lines()
            .take_while(|line| line.starts_with("  "))
            .collect();
        assert_eq!(lines, vec!["  vlan_1_name: Default"]);
        assert!(report.contains("802.1Q VLAN Enabled: True"));
    }

    #[test]
    fn vlan_section_skipped_without_flag_and_details_skipped_without_count() {
        let info: SwitchInfo = [("vlan_1_name", "Default")].into_iter().collect();
        assert!(!rendered(&info, 0).contains("VLAN Information:"));

        let mut info = SwitchInfo::new();
        info.insert("vlan_enabled", false);
        info.insert("vlan_count", 0u64);
        let report = rendered(&info, 0);
        assert!(report.contains("802.1Q VLAN Enabled: False"));
        assert!(report.contains("VLAN Type: Unknown"));
        assert!(!report.contains("VLAN Details:"));
    }

    #[test]
    fn key_listing_covers_every_key_sorted() {
        let mut info = SwitchInfo::new();
        info.insert("switch_model", "SG108Pro");
        info.insert("port_1_status", "up");
        info.insert("vlan_enabled", true);
        let report = rendered(&info, 1);

        let listing = report
            .split("All available keys in switch_info:\n")
            .nth(1)
            .expect("listing");
        let keys: Vec<&str> = listing
            .lines()
            .filter_map(|line| line.strip_prefix("  - "))
            .collect();
        assert_eq!(keys, vec!["port_1_status", "switch_model", "vlan_enabled"]);
    }
}
