//! Then/now timeline entries.
//!
//! The timezones section stores people as flat numbered keys:
//!
//! ```json
//! {
//!   "master-1": "Ana",
//!   "master-1-then": "2015",
//!   "master-1-then-desc": "Started as a barista",
//!   "master-1-now-desc": "Runs the roastery"
//! }
//! ```
//!
//! Entries are read from `master-1` upwards and stop at the first index whose
//! name key is missing or falsy, so a gap hides everything after it.

use crate::text;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub index: usize,
    pub name: String,
    pub then_label: String,
    pub then_description: String,
    pub now_description: String,
    pub then_image: String,
    pub now_image: String,
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Extract `master-N` entries in index order, stopping at the first gap.
pub fn extract_masters(data: &Value) -> Vec<TimelineEntry> {
    (1..)
        .map_while(|index| {
            let key = format!("master-{index}");
            truthy(data.get(&key)).then(|| TimelineEntry {
                index,
                name: text::field(data, &key),
                then_label: text::field(data, &format!("{key}-then")),
                then_description: text::field(data, &format!("{key}-then-desc")),
                now_description: text::field(data, &format!("{key}-now-desc")),
                then_image: format!("{key}-then.png"),
                now_image: format!("{key}-now.png"),
            })
        })
        .collect()
}
