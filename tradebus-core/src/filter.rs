//! Consumer filters and the matching rule used to route payloads.
//!
//! A [`FilterSet`] maps routing keys to a concrete value or the wildcard.
//! Consumers are registered with one filter set; producers broadcast under a
//! target filter set derived from the payload. See [`matches`] for the rule.

use compact_str::CompactString;
use smallvec::SmallVec;
use std::fmt;
use tradebus_sdk::objects::{ChannelPayload, Symbol, TimeFrame};

/// Routing keys understood by exchange channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterKey {
    Symbol,
    TimeFrame,
}

impl FilterKey {
    pub const ALL: [FilterKey; 2] = [FilterKey::Symbol, FilterKey::TimeFrame];

    pub const fn as_str(self) -> &'static str {
        match self {
            FilterKey::Symbol => "symbol",
            FilterKey::TimeFrame => "time_frame",
        }
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filter value: either a concrete value or the wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterValue {
    Wildcard,
    Exact(CompactString),
}

impl FilterValue {
    pub fn exact(value: impl Into<CompactString>) -> Self {
        FilterValue::Exact(value.into())
    }

    /// Wildcard on either side matches, otherwise values must be equal.
    pub fn accepts(&self, other: &FilterValue) -> bool {
        match (self, other) {
            (FilterValue::Wildcard, _) | (_, FilterValue::Wildcard) => true,
            (FilterValue::Exact(a), FilterValue::Exact(b)) => a == b,
        }
    }
}

impl From<&Symbol> for FilterValue {
    fn from(symbol: &Symbol) -> Self {
        FilterValue::Exact(symbol.clone())
    }
}

impl From<TimeFrame> for FilterValue {
    fn from(time_frame: TimeFrame) -> Self {
        FilterValue::exact(time_frame.as_str())
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Wildcard => f.write_str("*"),
            FilterValue::Exact(value) => f.write_str(value),
        }
    }
}

/// An ordered key to value mapping.
///
/// A key that is absent means "no constraint" for that key, which is not
/// the same as an explicit [`FilterValue::Wildcard`]: an absent key in a
/// target is never checked, an absent key in a consumer filter accepts any
/// target value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    entries: SmallVec<[(FilterKey, FilterValue); 2]>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wildcard on every known key. Matches every consumer.
    pub fn any() -> Self {
        FilterKey::ALL
            .into_iter()
            .fold(Self::new(), |set, key| set.with(key, FilterValue::Wildcard))
    }

    /// A target scoped to one exact symbol.
    pub fn symbol(symbol: &Symbol) -> Self {
        Self::new().with(FilterKey::Symbol, symbol.into())
    }

    /// The target a payload is broadcast under: its routing keys, exact.
    pub fn for_payload(payload: &ChannelPayload) -> Self {
        let mut set = Self::new();
        if let Some(symbol) = payload.symbol() {
            set.insert(FilterKey::Symbol, symbol.into());
        }
        if let Some(time_frame) = payload.time_frame() {
            set.insert(FilterKey::TimeFrame, time_frame.into());
        }
        set
    }

    pub fn with(mut self, key: FilterKey, value: FilterValue) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace the value of `key`, keeping its original position.
    pub fn insert(&mut self, key: FilterKey, value: FilterValue) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: FilterKey) -> Option<&FilterValue> {
        self.entries
            .iter()
            .find_map(|(k, v)| (*k == key).then_some(v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (FilterKey, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}={value}")?;
        }
        f.write_str("}")
    }
}

/// Whether a consumer registered with `consumer` should see an emission
/// broadcast under `target`.
///
/// Every key present in `target` is checked: a key absent from `consumer`
/// puts no constraint, otherwise the two values must be accepted by
/// [`FilterValue::accepts`]. An empty consumer filter matches everything.
pub fn matches(consumer: &FilterSet, target: &FilterSet) -> bool {
    target.iter().all(|(key, target_value)| {
        consumer
            .get(key)
            .is_none_or(|consumer_value| consumer_value.accepts(target_value))
    })
}
