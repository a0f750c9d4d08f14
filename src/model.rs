use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::density::Thresholds;
use crate::{Error, Result};

/// Role of a zone in the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    Entry,
    Exit,
    Corridor,
    #[default]
    #[serde(other)]
    Zone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneNode {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: ZoneKind,
    /// Floor area in m².
    pub area: f64,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub capacity: Option<u64>,
}

impl ZoneNode {
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

/// Directed connection between two zones. Only drawn as an undirected segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub from: String,
    pub to: String,
}

/// Venue graph as delivered by the data layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDescription {
    pub nodes: Vec<ZoneNode>,
    #[serde(default)]
    pub edges: Vec<Connection>,
    /// Venue-specific density thresholds overriding the configured pair.
    #[serde(default)]
    pub thresholds: Option<Thresholds>,
}

impl GraphDescription {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Thresholds to use for this venue: the override when it is valid,
    /// otherwise `fallback`.
    pub fn effective_thresholds(&self, fallback: Thresholds) -> Thresholds {
        match self.thresholds {
            Some(t) if t.is_valid() => t,
            Some(t) => {
                warn!(low = t.low, high = t.high, "ignoring invalid venue thresholds");
                fallback
            }
            None => fallback,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneState {
    pub current_count: u64,
    #[serde(default)]
    pub is_blocked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occupant {
    pub current_node: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Load on one connection as reported by the producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeLoad {
    pub from: String,
    pub to: String,
    /// 0 (free flowing) to 1 (jammed).
    pub congestion: f64,
}

/// Canonical point-in-time read of occupancy. Agents are keyed by id and
/// kept in the order the producer listed them, which is the roster order
/// used for marker packing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(default)]
    pub nodes: BTreeMap<String, ZoneState>,
    #[serde(default)]
    pub agents: IndexMap<String, Occupant>,
    #[serde(default)]
    pub reached_goal: u64,
    #[serde(default)]
    pub active: Option<u64>,
    #[serde(default)]
    pub time: Option<f64>,
    #[serde(default)]
    pub danger_zones: Option<Vec<String>>,
    #[serde(default)]
    pub edges: Vec<EdgeLoad>,
}

impl StateSnapshot {
    /// Parse a snapshot payload in any of the known producer shapes.
    pub fn from_json(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        Self::normalize(&value)
    }

    /// Fold the payload variants seen across producers into the canonical
    /// shape. Only a payload that is not an object at all is rejected.
    pub fn normalize(value: &Value) -> Result<Self> {
        let root = value
            .as_object()
            .ok_or_else(|| Error::Payload("snapshot must be a JSON object".to_string()))?;

        let nodes = match root.get("nodes") {
            None | Some(Value::Null) => BTreeMap::new(),
            Some(Value::Object(map)) => map
                .iter()
                .map(|(id, entry)| (id.clone(), zone_state_from(entry)))
                .collect(),
            Some(_) => return Err(Error::Payload("`nodes` must be an object".to_string())),
        };

        let agents = match root.get("agents") {
            None | Some(Value::Null) => IndexMap::new(),
            Some(Value::Object(map)) => map
                .iter()
                .filter_map(|(id, entry)| occupant_from(entry).map(|o| (id.clone(), o)))
                .collect(),
            Some(Value::Array(list)) => list
                .iter()
                .filter_map(|entry| {
                    let id = entry.get("id").and_then(id_string)?;
                    occupant_from(entry).map(|o| (id, o))
                })
                .collect(),
            Some(_) => {
                return Err(Error::Payload(
                    "`agents` must be an object or an array".to_string(),
                ));
            }
        };

        let reached_goal = root
            .get("reached_goal")
            .and_then(count_from)
            .or_else(|| {
                root.get("stats")
                    .and_then(|s| s.get("agents_reached_goal"))
                    .and_then(count_from)
            })
            .unwrap_or(0);

        let active = root
            .get("active_agents")
            .or_else(|| root.get("active"))
            .and_then(count_from);

        let danger_zones = root.get("danger_zones").and_then(Value::as_array).map(|list| {
            list.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        });

        let edges = match root.get("edges") {
            Some(Value::Array(list)) => {
                list.iter().filter_map(|e| edge_load_from(None, e)).collect()
            }
            Some(Value::Object(map)) => map
                .iter()
                .filter_map(|(key, e)| edge_load_from(Some(key.as_str()), e))
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self {
            nodes,
            agents,
            reached_goal,
            active,
            time: root.get("time").and_then(Value::as_f64),
            danger_zones,
            edges,
        })
    }

    pub fn count_for(&self, zone_id: &str) -> u64 {
        self.nodes.get(zone_id).map_or(0, |z| z.current_count)
    }

    pub fn is_blocked(&self, zone_id: &str) -> bool {
        self.nodes.get(zone_id).is_some_and(|z| z.is_blocked)
    }

    /// Congestion of a connection, looked up in either direction.
    pub fn congestion_for(&self, from: &str, to: &str) -> Option<f64> {
        let find = |a: &str, b: &str| {
            self.edges
                .iter()
                .find(|e| e.from == a && e.to == b)
                .map(|e| e.congestion)
        };
        find(from, to).or_else(|| find(to, from))
    }

    /// Active occupants as reported by the producer, or the roster size.
    pub fn active_total(&self) -> u64 {
        self.active.unwrap_or(self.agents.len() as u64)
    }
}

fn count_from(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    if let Some(n) = value.as_i64() {
        return Some(n.max(0) as u64);
    }
    value
        .as_f64()
        .filter(|f| f.is_finite())
        .map(|f| f.max(0.0).round() as u64)
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_of<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| map.get(*k))
}

fn zone_state_from(entry: &Value) -> ZoneState {
    match entry {
        Value::Object(map) => ZoneState {
            current_count: first_of(map, &["current_count", "count", "occupancy"])
                .and_then(count_from)
                .unwrap_or(0),
            is_blocked: first_of(map, &["is_blocked", "blocked"])
                .and_then(Value::as_bool)
                .unwrap_or(false),
        },
        other => ZoneState {
            current_count: count_from(other).unwrap_or(0),
            is_blocked: false,
        },
    }
}

/// Edge entries carry `from`/`to` fields, or are keyed `"from->to"` when
/// the producer sends a map.
fn edge_load_from(key: Option<&str>, entry: &Value) -> Option<EdgeLoad> {
    let map = entry.as_object()?;
    let from = map.get("from").and_then(id_string);
    let to = map.get("to").and_then(id_string);
    let (from, to) = match (from, to) {
        (Some(from), Some(to)) => (from, to),
        _ => {
            let (from, to) = key?.split_once("->")?;
            (from.trim().to_string(), to.trim().to_string())
        }
    };
    let congestion = map
        .get("congestion")
        .and_then(Value::as_f64)
        .filter(|c| c.is_finite())
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);
    Some(EdgeLoad { from, to, congestion })
}

fn occupant_from(entry: &Value) -> Option<Occupant> {
    let map = entry.as_object()?;
    let current_node = first_of(map, &["current_node", "node", "zone"]).and_then(id_string)?;
    let kind = first_of(map, &["type", "agent_type"])
        .and_then(Value::as_str)
        .map(str::to_string);
    Some(Occupant { current_node, kind })
}
