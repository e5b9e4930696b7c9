//! Extraction of the data blocks embedded in the switch's web pages.
//!
//! The switch renders every page client side: the HTML carries the data as
//! JavaScript assignments such as
//!
//! ```text
//! var info_ds = {descriStr:['SG108Pro'], macStr:['AA-BB-CC-DD-EE-FF']};
//! var logonInfo = new Array(0, 0, 0);
//! ```
//!
//! This module pulls those assignments apart into strings. It does not try to
//! be a JavaScript parser: values are scalars or flat lists, which is all the
//! firmware emits.

use std::collections::HashMap;

use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, SwitchError};

/// One field value of a data block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsValue {
    Scalar(String),
    List(Vec<String>),
}

/// Fields of a `var name = {...};` assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataBlock {
    name: String,
    fields: HashMap<String, JsValue>,
}

static FIELD: Lazy<Regex> = Lazy::new(|| {
    match Regex::new(r#"(?s)(\w+)\s*:\s*(\[[^\]]*\]|'[^']*'|"[^"]*"|[^,\s}]+)"#) {
        Ok(re) => re,
        Err(err) => panic!("invalid FIELD regex: {err}"),
    }
});

static ITEM: Lazy<Regex> = Lazy::new(|| match Regex::new(r#"'[^']*'|"[^"]*"|[^,\s]+"#) {
    Ok(re) => re,
    Err(err) => panic!("invalid ITEM regex: {err}"),
});

static LOGIN_FORM: Lazy<Regex> = Lazy::new(|| {
    match Regex::new(r#"(?i)<form[^>]*action\s*=\s*["']?/?logon\.cgi"#) {
        Ok(re) => re,
        Err(err) => panic!("invalid LOGIN_FORM regex: {err}"),
    }
});

fn unquote(raw: &str) -> String {
    let raw = raw.trim();
    let quoted = raw.len() >= 2
        && ((raw.starts_with('\'') && raw.ends_with('\''))
            || (raw.starts_with('"') && raw.ends_with('"')));
    if quoted {
        raw[1..raw.len() - 1].to_string()
    } else {
        raw.to_string()
    }
}

fn split_items(inner: &str) -> Vec<String> {
    ITEM.find_iter(inner).map(|m| unquote(m.as_str())).collect()
}

fn missing(block: &str, what: &str) -> SwitchError {
    SwitchError::Parse(format!("{what} not found in '{block}'"))
}

impl DataBlock {
    /// Name of the JavaScript variable the block was read from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<&JsValue> {
        self.fields.get(key)
    }

    /// Returns a scalar field. A one-element list is accepted too, the
    /// firmware wraps some scalars that way.
    pub fn scalar(&self, key: &str) -> Result<&str> {
        match self.get(key) {
            Some(JsValue::Scalar(value)) => Ok(value),
            Some(JsValue::List(items)) if items.len() == 1 => Ok(&items[0]),
            Some(JsValue::List(_)) => Err(SwitchError::Parse(format!(
                "field '{key}' of '{}' is a list",
                self.name
            ))),
            None => Err(missing(&self.name, &format!("field '{key}'"))),
        }
    }

    /// Returns a list field; a scalar is returned as a one-element list.
    pub fn list(&self, key: &str) -> Result<Vec<&str>> {
        match self.get(key) {
            Some(JsValue::List(items)) => Ok(items.iter().map(String::as_str).collect()),
            Some(JsValue::Scalar(value)) => Ok(vec![value.as_str()]),
            None => Err(missing(&self.name, &format!("field '{key}'"))),
        }
    }

    /// Parses a scalar field as an unsigned integer.
    pub fn number(&self, key: &str) -> Result<u64> {
        let raw = self.scalar(key)?;
        parse_number(raw).ok_or_else(|| {
            SwitchError::Parse(format!(
                "field '{key}' of '{}' is not a number: '{raw}'",
                self.name
            ))
        })
    }

    /// Parses every element of a list field as an unsigned integer.
    pub fn numbers(&self, key: &str) -> Result<Vec<u64>> {
        self.list(key)?
            .into_iter()
            .map(|raw| {
                parse_number(raw).ok_or_else(|| {
                    SwitchError::Parse(format!(
                        "field '{key}' of '{}' holds a non-number: '{raw}'",
                        self.name
                    ))
                })
            })
            .collect()
    }
}

/// Parses decimal or `0x` prefixed hexadecimal numbers.
pub fn parse_number(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

/// Returns the text between the opening brace at `start` and its matching
/// closing brace. Braces inside quoted values do not count.
fn object_body(body: &str, start: usize) -> Option<&str> {
    let rest = &body[start..];
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut depth = 0usize;
    for (offset, ch) in rest.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '{' => depth += 1,
            '}' if depth == 0 => return Some(&rest[..offset]),
            '}' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Extracts `var <name> = {...};` from `body`.
pub fn extract_object(body: &str, name: &str) -> Result<DataBlock> {
    let pattern = format!(r"var\s+{}\s*=\s*\{{", regex::escape(name));
    let re = Regex::new(&pattern)
        .map_err(|err| SwitchError::Parse(format!("bad pattern for '{name}': {err}")))?;
    let open = re.find(body).ok_or_else(|| missing(name, "data block"))?;
    let inner = object_body(body, open.end())
        .ok_or_else(|| SwitchError::Parse(format!("data block '{name}' is not closed")))?;

    let mut fields = HashMap::new();
    for cap in FIELD.captures_iter(inner) {
        let (Some(key), Some(raw)) = (cap.get(1), cap.get(2)) else {
            continue;
        };
        let raw = raw.as_str();
        let value = match raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            Some(items) => JsValue::List(split_items(items)),
            None => JsValue::Scalar(unquote(raw)),
        };
        fields.insert(key.as_str().to_string(), value);
    }
    trace!("Extracted '{}' with {} fields", name, fields.len());

    Ok(DataBlock {
        name: name.to_string(),
        fields,
    })
}

/// Extracts the value of a plain `var <name> = value;` assignment.
pub fn extract_scalar(body: &str, name: &str) -> Result<String> {
    let pattern = format!(
        r#"var\s+{}\s*=\s*('[^']*'|"[^"]*"|[^;\s]+)\s*;"#,
        regex::escape(name)
    );
    let re = Regex::new(&pattern)
        .map_err(|err| SwitchError::Parse(format!("bad pattern for '{name}': {err}")))?;
    let caps = re.captures(body).ok_or_else(|| missing(name, "variable"))?;
    Ok(unquote(caps.get(1).map(|m| m.as_str()).unwrap_or_default()))
}

/// Extracts `var <name> = new Array(...);` from `body`.
pub fn extract_array(body: &str, name: &str) -> Result<Vec<String>> {
    let pattern = format!(
        r"(?s)var\s+{}\s*=\s*new\s+Array\s*\((.*?)\)\s*;",
        regex::escape(name)
    );
    let re = Regex::new(&pattern)
        .map_err(|err| SwitchError::Parse(format!("bad pattern for '{name}': {err}")))?;
    let caps = re.captures(body).ok_or_else(|| missing(name, "array"))?;
    Ok(split_items(caps.get(1).map(|m| m.as_str()).unwrap_or_default()))
}

/// Returns true if `body` is the login page rather than a data page.
pub fn is_login_page(body: &str) -> bool {
    LOGIN_FORM.is_match(body)
}
