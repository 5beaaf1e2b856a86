//! How each variable collapses when a group of days becomes one value.
//!
//! Additive quantities (precipitation, evaporation) accumulate over a period
//! and are summed; everything else is intensive and averaged. The policy is a
//! plain value so every grouping mode, and both passes of the across-years
//! modes, read the same table.

use std::collections::{BTreeMap, BTreeSet};

/// Variables summed by the standard policy.
pub const ADDITIVE_VARIABLES: [&str; 2] = ["PRECIP", "EVAP"];

/// One reduced value per variable, `None` where nothing was observed.
pub type Values = BTreeMap<String, Option<f64>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    Sum,
    Mean,
}

impl Reducer {
    /// Collapse an accumulated `sum` of `count` observations.
    ///
    /// A group without observations is `None` for both reducers.
    pub fn finish(&self, sum: f64, count: usize) -> Option<f64> {
        if count == 0 {
            return None;
        }
        match self {
            Reducer::Sum => Some(sum),
            Reducer::Mean => Some(sum / count as f64),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationPolicy {
    additive: BTreeSet<String>,
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        AggregationPolicy::standard()
    }
}

impl AggregationPolicy {
    /// PRECIP and EVAP summed, everything else averaged.
    pub fn standard() -> Self {
        AggregationPolicy::with_additive(ADDITIVE_VARIABLES)
    }

    /// Every variable averaged.
    pub fn uniform_mean() -> Self {
        AggregationPolicy {
            additive: BTreeSet::new(),
        }
    }

    pub fn with_additive<I, S>(variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AggregationPolicy {
            additive: variables.into_iter().map(Into::into).collect(),
        }
    }

    /// The policy used for the day-of-year climatology.
    ///
    /// A climatology describes the typical value of a calendar day, so
    /// additive variables are averaged there too.
    pub fn climatology(&self) -> Self {
        AggregationPolicy::uniform_mean()
    }

    pub fn is_additive(&self, variable: &str) -> bool {
        self.additive.contains(variable)
    }

    pub fn reducer_for(&self, variable: &str) -> Reducer {
        if self.is_additive(variable) {
            Reducer::Sum
        } else {
            Reducer::Mean
        }
    }
}

/// Group rows by key and reduce each variable with `policy`.
///
/// This is the single-pass reducer every grouping mode is built from. Rows
/// are `(key, values)` pairs; null values are skipped. Keys come back in
/// ascending order.
pub fn reduce_groups<'a, K, I>(rows: I, variables: &[String], policy: &AggregationPolicy) -> BTreeMap<K, Values>
where
    K: Ord,
    I: IntoIterator<Item = (K, &'a Values)>,
{
    let mut groups: BTreeMap<K, Vec<(f64, usize)>> = BTreeMap::new();
    for (key, values) in rows {
        let slots = groups
            .entry(key)
            .or_insert_with(|| vec![(0.0, 0); variables.len()]);
        for (slot, variable) in slots.iter_mut().zip(variables) {
            if let Some(value) = values.get(variable).copied().flatten() {
                slot.0 += value;
                slot.1 += 1;
            }
        }
    }

    groups
        .into_iter()
        .map(|(key, slots)| {
            let reduced = variables
                .iter()
                .zip(slots)
                .map(|(variable, (sum, count))| {
                    (variable.clone(), policy.reducer_for(variable).finish(sum, count))
                })
                .collect();
            (key, reduced)
        })
        .collect()
}
