//! Predefined switch model templates.
//!
//! Each template names a model, its port count and the rules used to
//! recognise it from pages served before login.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A page to fetch and the pattern its body must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectRule {
    pub path: &'static str,
    pub pattern: &'static str,
}

/// A supported switch model.
#[derive(Debug, PartialEq, Eq)]
pub struct SwitchModel {
    /// Model name as printed on the device, e.g. `SG108Pro`.
    pub name: &'static str,
    /// Number of front panel ports.
    pub ports: usize,
    pub autodetect: &'static [DetectRule],
}

pub static SG105PRO: SwitchModel = SwitchModel {
    name: "SG105Pro",
    ports: 5,
    autodetect: &[DetectRule {
        path: "/",
        pattern: r"(?i)\bSG105\s*Pro\b",
    }],
};

pub static SG108PRO: SwitchModel = SwitchModel {
    name: "SG108Pro",
    ports: 8,
    autodetect: &[DetectRule {
        path: "/",
        pattern: r"(?i)\bSG108\s*Pro\b",
    }],
};

pub static SG116PRO: SwitchModel = SwitchModel {
    name: "SG116Pro",
    ports: 16,
    autodetect: &[DetectRule {
        path: "/",
        pattern: r"(?i)\bSG116\s*Pro\b",
    }],
};

/// All models, in detection order.
pub static MODELS: &[&SwitchModel] = &[&SG105PRO, &SG108PRO, &SG116PRO];

/// Built-in model names supported by this crate.
pub const BUILTIN_MODELS: &[&str] = &["SG105Pro", "SG108Pro", "SG116Pro"];

/// Metadata for a built-in model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub name: String,
    pub vendor: String,
    pub ports: usize,
}

static DETECT_RULES: Lazy<Vec<(&'static SwitchModel, &'static str, Regex)>> = Lazy::new(|| {
    MODELS
        .iter()
        .flat_map(|model| {
            model.autodetect.iter().map(move |rule| {
                let re = match Regex::new(rule.pattern) {
                    Ok(re) => re,
                    Err(err) => panic!("invalid detection pattern for {}: {err}", model.name),
                };
                (*model, rule.path, re)
            })
        })
        .collect()
});

/// Returns names of all built-in models.
pub fn available_models() -> &'static [&'static str] {
    BUILTIN_MODELS
}

/// Returns metadata for all built-in models.
pub fn model_catalog() -> Vec<ModelMetadata> {
    MODELS
        .iter()
        .map(|model| ModelMetadata {
            name: model.name.to_string(),
            vendor: "Mercury".to_string(),
            ports: model.ports,
        })
        .collect()
}

/// Looks up a model by name, ignoring case.
pub fn by_name(name: &str) -> Option<&'static SwitchModel> {
    MODELS
        .iter()
        .copied()
        .find(|model| model.name.eq_ignore_ascii_case(name.trim()))
}

/// Distinct pages the detection rules need, in first-use order.
pub fn detection_paths() -> Vec<&'static str> {
    let mut paths: Vec<&'static str> = Vec::new();
    for (_, path, _) in DETECT_RULES.iter() {
        if !paths.contains(path) {
            paths.push(*path);
        }
    }
    paths
}

/// Returns the first model whose rule for `path` matches `body`.
pub fn detect(path: &str, body: &str) -> Option<&'static SwitchModel> {
    DETECT_RULES
        .iter()
        .find(|(_, rule_path, re)| *rule_path == path && re.is_match(body))
        .map(|(model, _, _)| *model)
}
