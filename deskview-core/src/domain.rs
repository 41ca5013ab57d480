//! Snapshot records returned by the portfolio backend.
//!
//! The backend mixes two wire shapes: model-serialized rows
//! (`{"model": ..., "pk": ..., "fields": {...}}`) for desks and exclusions,
//! and flat aggregate rows for positions and currencies. Decimal columns
//! arrive either as JSON numbers or as strings such as `"1234.50000"`.
//! Records here are the flattened, typed view of both.

use std::fmt;

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of the latest ingested snapshot. Monotonically increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EventId(pub u64);

impl EventId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Loose::deserialize(deserializer)? {
            Loose::Int(n) => Ok(EventId(n)),
            Loose::Float(f) if f >= 0.0 && f.fract() == 0.0 => Ok(EventId(f as u64)),
            Loose::Float(f) => Err(de::Error::custom(format!("invalid event id: {f}"))),
            Loose::Text(s) => s
                .trim()
                .parse::<u64>()
                .map(EventId)
                .map_err(|_| de::Error::custom(format!("invalid event id: {s:?}"))),
        }
    }
}

/// Desk-level cash balance.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "ModelRecord<CashFields>")]
pub struct DeskCashRecord {
    pub desk: String,
    pub cash: f64,
    pub updated: i64,
}

/// Position aggregated by desk, trader and book.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PositionRecord {
    #[serde(deserialize_with = "de_key")]
    pub desk: String,
    #[serde(deserialize_with = "de_key")]
    pub trader: String,
    #[serde(deserialize_with = "de_key")]
    pub book: String,
    #[serde(deserialize_with = "de_number")]
    pub position: f64,
    #[serde(rename = "NV", alias = "nv", deserialize_with = "de_number")]
    pub nv: f64,
}

/// A single bond holding within a book.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "BondWire")]
pub struct BondPositionRecord {
    pub desk: String,
    pub trader: String,
    pub book: String,
    pub bond: String,
    /// Currency of the bond when the backend includes the bond model fields.
    pub currency: Option<String>,
    pub position: f64,
    pub nv: f64,
}

/// Position aggregated by desk and currency.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurrencyPositionRecord {
    #[serde(deserialize_with = "de_key")]
    pub desk: String,
    #[serde(deserialize_with = "de_key")]
    pub currency: String,
    #[serde(deserialize_with = "de_number")]
    pub position: f64,
    #[serde(rename = "NV", alias = "nv", deserialize_with = "de_number")]
    pub nv: f64,
}

/// A trade event excluded from the portfolio (insufficient cash, unknown bond, ...).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "ModelRecord<ExclusionFields>")]
pub struct ExclusionRecord {
    pub id: String,
    pub desk: String,
    pub trader: String,
    pub book: String,
    pub buy_sell: String,
    pub quantity: f64,
    pub bond: String,
    pub price: Option<f64>,
    pub exclusion_type: String,
}

/// Decode a snapshot collection.
///
/// Model-serialized collections are sometimes sent double-encoded: the body is
/// a JSON string whose content is the JSON array. Both forms decode the same.
pub fn decode_snapshot<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, serde_json::Error> {
    serde_json::from_value(unwrap_encoded(serde_json::from_str(body)?)?)
}

/// Decode the latest-event-id body (a bare number, or a numeric string).
pub fn decode_event_id(body: &str) -> Result<EventId, serde_json::Error> {
    serde_json::from_str(body)
}

fn unwrap_encoded(value: Value) -> Result<Value, serde_json::Error> {
    match value {
        Value::String(inner) if looks_like_json(&inner) => serde_json::from_str(&inner),
        other => Ok(other),
    }
}

fn looks_like_json(s: &str) -> bool {
    matches!(s.trim_start().chars().next(), Some('[') | Some('{'))
}

// ── Wire shapes ──────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Int(u64),
    Float(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Key {
    Text(String),
    Int(i64),
}

impl Key {
    fn into_string(self) -> String {
        match self {
            Key::Text(s) => s,
            Key::Int(n) => n.to_string(),
        }
    }
}

/// An identifier that is either a bare key or a nested model object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Ident {
    Model {
        pk: Key,
        #[serde(default)]
        fields: Option<IdentFields>,
    },
    Bare(Key),
}

#[derive(Debug, Default, Deserialize)]
struct IdentFields {
    #[serde(default)]
    currency: Option<Key>,
}

impl Ident {
    fn key(&self) -> String {
        match self {
            Ident::Model { pk, .. } | Ident::Bare(pk) => match pk {
                Key::Text(s) => s.clone(),
                Key::Int(n) => n.to_string(),
            },
        }
    }

    fn currency(self) -> Option<String> {
        match self {
            Ident::Model {
                fields: Some(IdentFields { currency: Some(c) }),
                ..
            } => Some(c.into_string()),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct ModelRecord<F> {
    pk: Key,
    fields: F,
}

#[derive(Deserialize)]
struct CashFields {
    #[serde(deserialize_with = "de_number")]
    cash: f64,
    #[serde(default)]
    updated: i64,
}

impl From<ModelRecord<CashFields>> for DeskCashRecord {
    fn from(row: ModelRecord<CashFields>) -> Self {
        Self {
            desk: row.pk.into_string(),
            cash: row.fields.cash,
            updated: row.fields.updated,
        }
    }
}

#[derive(Deserialize)]
struct ExclusionFields {
    #[serde(default, deserialize_with = "de_key")]
    desk: String,
    #[serde(default, deserialize_with = "de_key")]
    trader: String,
    #[serde(default, deserialize_with = "de_key")]
    book: String,
    #[serde(default)]
    buy_sell: String,
    #[serde(default, deserialize_with = "de_number")]
    quantity: f64,
    #[serde(default, deserialize_with = "de_key")]
    bond: String,
    #[serde(default, deserialize_with = "de_opt_number")]
    price: Option<f64>,
    #[serde(default, alias = "exception_name")]
    exclusion_type: String,
}

impl From<ModelRecord<ExclusionFields>> for ExclusionRecord {
    fn from(row: ModelRecord<ExclusionFields>) -> Self {
        let f = row.fields;
        Self {
            id: row.pk.into_string(),
            desk: f.desk,
            trader: f.trader,
            book: f.book,
            buy_sell: f.buy_sell,
            quantity: f.quantity,
            bond: f.bond,
            price: f.price,
            exclusion_type: f.exclusion_type,
        }
    }
}

#[derive(Deserialize)]
struct BondWire {
    desk: Ident,
    trader: Ident,
    book: Ident,
    bond: Ident,
    #[serde(deserialize_with = "de_number")]
    position: f64,
    #[serde(rename = "NV", alias = "nv", deserialize_with = "de_number")]
    nv: f64,
}

impl From<BondWire> for BondPositionRecord {
    fn from(w: BondWire) -> Self {
        let bond = w.bond.key();
        Self {
            desk: w.desk.key(),
            trader: w.trader.key(),
            book: w.book.key(),
            bond,
            currency: w.bond.currency(),
            position: w.position,
            nv: w.nv,
        }
    }
}

fn de_key<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ident::deserialize(deserializer).map(|ident| ident.key())
}

fn de_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Loose::deserialize(deserializer)? {
        Loose::Int(n) => Ok(n as f64),
        Loose::Float(f) => Ok(f),
        Loose::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("expected a number, got {s:?}"))),
    }
}

fn de_opt_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match Option::<Loose>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Loose::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Loose::Int(n)) => Ok(Some(n as f64)),
        Some(Loose::Float(f)) => Ok(Some(f)),
        Some(Loose::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected a number, got {s:?}"))),
    }
}
