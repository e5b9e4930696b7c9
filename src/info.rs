//! The flat switch-info mapping and its builders.
//!
//! A fetch produces one [`SwitchInfo`]: string keys such as `switch_mac`,
//! `port_3_status` or `vlan_10_name` mapped to [`InfoValue`]s. The builders in
//! this module turn the data blocks of the three status pages into those keys.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SwitchError};
use crate::page::DataBlock;

/// A single value of the switch-info mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InfoValue {
    Bool(bool),
    Integer(u64),
    Text(String),
}

impl InfoValue {
    /// Numeric view of the value. Text is parsed, booleans are not numbers.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            InfoValue::Integer(n) => Some(*n),
            InfoValue::Text(s) => s.trim().parse().ok(),
            InfoValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            InfoValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for InfoValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfoValue::Bool(b) => write!(f, "{b}"),
            InfoValue::Integer(n) => write!(f, "{n}"),
            InfoValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for InfoValue {
    fn from(value: bool) -> Self {
        InfoValue::Bool(value)
    }
}

impl From<u64> for InfoValue {
    fn from(value: u64) -> Self {
        InfoValue::Integer(value)
    }
}

impl From<&str> for InfoValue {
    fn from(value: &str) -> Self {
        InfoValue::Text(value.to_string())
    }
}

impl From<String> for InfoValue {
    fn from(value: String) -> Self {
        InfoValue::Text(value)
    }
}

/// Snapshot of everything one fetch returned, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwitchInfo {
    entries: BTreeMap<String, InfoValue>,
}

impl SwitchInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<InfoValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&InfoValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in lexicographic order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in lexicographic key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &InfoValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<InfoValue>> FromIterator<(K, V)> for SwitchInfo {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut info = SwitchInfo::new();
        for (key, value) in iter {
            info.insert(key, value);
        }
        info
    }
}

/// Decodes the link status code of the port statistics page.
pub fn link_speed(code: u64) -> &'static str {
    match code {
        0 => "Link Down",
        1 => "Auto",
        2 => "10M Half",
        3 => "10M Full",
        4 => "100M Half",
        5 => "100M Full",
        6 => "1000M Full",
        _ => "Unknown",
    }
}

/// Turns a VLAN membership bitmap into a comma separated port list.
///
/// Bit `i` stands for port `i + 1`; bits beyond `ports` are ignored.
pub fn member_ports(mask: u64, ports: usize) -> String {
    (0..ports.min(64))
        .filter(|bit| mask & (1u64 << bit) != 0)
        .map(|bit| (bit + 1).to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Adds the `switch_*` identity keys from the `info_ds` block.
///
/// `model_name` is the detected model; the description string stands in when
/// detection did not succeed.
pub fn add_system_info(
    info: &mut SwitchInfo,
    block: &DataBlock,
    model_name: Option<&str>,
) -> Result<()> {
    let description = block.scalar("descriStr")?;
    info.insert("switch_model", model_name.unwrap_or(description));
    info.insert("switch_name", description);
    info.insert("switch_mac", block.scalar("macStr")?);
    info.insert("switch_ip", block.scalar("ipStr")?);
    info.insert("switch_firmware", block.scalar("firmwareStr")?);
    info.insert("switch_hardware", block.scalar("hardwareStr")?);
    Ok(())
}

/// Adds the `port_<n>_*` keys from the `all_info` block and returns the
/// number of ports the page describes.
///
/// `max_ports` is the page's own `max_port_num`. Some firmware pads the
/// arrays past the physical ports, so entries beyond it are dropped.
pub fn add_port_statistics(
    info: &mut SwitchInfo,
    block: &DataBlock,
    max_ports: Option<usize>,
) -> Result<usize> {
    let states = block.numbers("state")?;
    let links = block.numbers("link_status")?;
    let pkts = block.numbers("pkts")?;
    let ports = max_ports.map_or(states.len(), |max| max.min(states.len()));
    if links.len() < ports {
        return Err(SwitchError::Parse(format!(
            "'{}' has {} port states but {} link states",
            block.name(),
            ports,
            links.len()
        )));
    }

    for (index, (state, link)) in states.iter().zip(links.iter()).take(ports).enumerate() {
        let port = index + 1;
        info.insert(format!("port_{port}_enabled"), *state != 0);
        info.insert(
            format!("port_{port}_status"),
            if *link != 0 { "up" } else { "down" },
        );
        info.insert(format!("port_{port}_connection_speed"), link_speed(*link));

        let counters = ["tx_good", "tx_bad", "rx_good", "rx_bad"];
        for (offset, name) in counters.iter().enumerate() {
            if let Some(value) = pkts.get(index * counters.len() + offset) {
                info.insert(format!("port_{port}_{name}"), *value);
            }
        }
    }
    Ok(ports)
}

/// Adds the `vlan_*` keys from the `qvlan_ds` block.
///
/// `ports` bounds the membership bitmaps when the block does not carry its
/// own `portNum`.
pub fn add_vlans(info: &mut SwitchInfo, block: &DataBlock, ports: usize) -> Result<()> {
    let enabled = block.number("state")? != 0;
    let ports = block
        .number("portNum")
        .ok()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(ports);

    info.insert("vlan_enabled", enabled);
    info.insert("vlan_type", "802.1Q");

    let vids = block.numbers("vids").unwrap_or_default();
    let count = block.number("count").unwrap_or(vids.len() as u64);
    info.insert("vlan_count", count);
    if vids.is_empty() {
        return Ok(());
    }

    let names = block.list("names")?;
    let tagged = block.numbers("tagMbrs")?;
    let untagged = block.numbers("untagMbrs")?;
    for (index, vid) in vids.iter().enumerate() {
        if let Some(name) = names.get(index) {
            info.insert(format!("vlan_{vid}_name"), *name);
        }
        if let Some(mask) = tagged.get(index) {
            info.insert(format!("vlan_{vid}_tagged_ports"), member_ports(*mask, ports));
        }
        if let Some(mask) = untagged.get(index) {
            info.insert(
                format!("vlan_{vid}_untagged_ports"),
                member_ports(*mask, ports),
            );
        }
    }
    Ok(())
}
