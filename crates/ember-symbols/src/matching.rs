//! Assignability weights and implicit coercions
//!
//! A weight of `0.0` means the two types are identical. Positive weights mean
//! the source is assignable to the target through super types or registered
//! coercions; the further away, the larger the weight. Negative weights
//! ([`NOT_ASSIGNABLE`]) mean the types are incompatible.
//!
//! The relation is not symmetric: `weight(a, b) >= 0` says nothing about
//! `weight(b, a)`.

use crate::config::MatchConfig;
use crate::symbol::SymbolId;
use crate::table::SymbolTable;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Weight of an incompatible match
pub const NOT_ASSIGNABLE: f64 = -1.0;

/// Implicit promotions each type declares
#[derive(Debug, Clone, Default)]
pub struct CoercionRegistry {
    promotions: FxHashMap<SymbolId, Vec<SymbolId>>,
}

impl CoercionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that `from` can be implicitly promoted to `to`
    pub fn register(&mut self, from: SymbolId, to: SymbolId) {
        let targets = self.promotions.entry(from).or_default();
        if !targets.contains(&to) {
            targets.push(to);
        }
    }

    /// Direct promotions declared by `from`
    pub fn promotions(&self, from: SymbolId) -> &[SymbolId] {
        self.promotions.get(&from).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True if `from` declares a direct promotion to `to`
    pub fn is_coercible(&self, from: SymbolId, to: SymbolId) -> bool {
        self.promotions(from).contains(&to)
    }

    /// Fewest promotions needed to get from `from` to `to`, at most `max_hops`
    pub fn distance(&self, from: SymbolId, to: SymbolId, max_hops: usize) -> Option<usize> {
        if from == to {
            return Some(0);
        }

        let mut visited = FxHashSet::default();
        let mut queue = VecDeque::new();
        visited.insert(from);
        queue.push_back((from, 0usize));

        while let Some((current, hops)) = queue.pop_front() {
            if hops == max_hops {
                continue;
            }
            for &next in self.promotions(current) {
                if next == to {
                    return Some(hops + 1);
                }
                if visited.insert(next) {
                    queue.push_back((next, hops + 1));
                }
            }
        }
        None
    }
}

/// Computes assignability weights against a symbol table
#[derive(Debug, Clone, Copy)]
pub struct TypeMatcher<'a> {
    table: &'a SymbolTable,
    coercions: &'a CoercionRegistry,
    config: &'a MatchConfig,
}

impl<'a> TypeMatcher<'a> {
    pub fn new(table: &'a SymbolTable, coercions: &'a CoercionRegistry, config: &'a MatchConfig) -> Self {
        TypeMatcher {
            table,
            coercions,
            config,
        }
    }

    pub fn config(&self) -> &'a MatchConfig {
        self.config
    }

    /// Same category and same fully qualified name
    pub fn is_exact_same_type(&self, a: SymbolId, b: SymbolId) -> bool {
        if a == b {
            return true;
        }
        let (Ok(left), Ok(right)) = (self.table.symbol(a), self.table.symbol(b)) else {
            return false;
        };
        if left.category() != right.category() {
            return false;
        }
        matches!(
            (self.table.fully_qualified_name(a), self.table.fully_qualified_name(b)),
            (Ok(x), Ok(y)) if x == y
        )
    }

    /// Weight of assigning a value of type `from` to `to`
    pub fn weight(&self, from: SymbolId, to: SymbolId) -> f64 {
        let uncoerced = self.uncoerced_weight(from, to);
        if uncoerced >= 0.0 {
            return uncoerced;
        }
        match self.coercions.distance(from, to, self.config.max_coercion_chain) {
            Some(hops) => self.config.coercion_weight * hops as f64,
            None => NOT_ASSIGNABLE,
        }
    }

    /// Weight using type identity and the super-type hierarchy only
    pub fn uncoerced_weight(&self, from: SymbolId, to: SymbolId) -> f64 {
        if self.is_exact_same_type(from, to) {
            return 0.0;
        }
        match self.supertype_distance(from, to) {
            Some(hops) => self.config.supertype_weight * hops as f64,
            None => NOT_ASSIGNABLE,
        }
    }

    /// Weight where either side may still be untyped; untyped never matches
    pub fn weight_of(&self, from: Option<SymbolId>, to: Option<SymbolId>) -> f64 {
        match (from, to) {
            (Some(from), Some(to)) => self.weight(from, to),
            _ => NOT_ASSIGNABLE,
        }
    }

    pub fn is_assignable(&self, from: SymbolId, to: SymbolId) -> bool {
        self.weight(from, to) >= 0.0
    }

    /// Assignable, but only through an implicit coercion
    pub fn needs_coercion(&self, from: SymbolId, to: SymbolId) -> bool {
        self.uncoerced_weight(from, to) < 0.0 && self.is_assignable(from, to)
    }

    /// Summed weight of passing `from` arguments to `to` parameters
    ///
    /// Unequal lengths or any incompatible position give [`NOT_ASSIGNABLE`].
    pub fn parameter_list_weight(&self, from: &[SymbolId], to: &[Option<SymbolId>]) -> f64 {
        if from.len() != to.len() {
            return NOT_ASSIGNABLE;
        }

        let mut total = 0.0;
        for (&argument, &parameter) in from.iter().zip(to) {
            let weight = self.weight_of(Some(argument), parameter);
            if weight < 0.0 {
                return NOT_ASSIGNABLE;
            }
            total += weight;
        }
        total
    }

    /// Hops from `from` up its super types and traits to `to`
    fn supertype_distance(&self, from: SymbolId, to: SymbolId) -> Option<usize> {
        let mut visited = FxHashSet::default();
        let mut queue = VecDeque::new();
        visited.insert(from);
        queue.push_back((from, 0usize));

        while let Some((current, hops)) = queue.pop_front() {
            let supers = self.table.super_types(current).ok()?;
            for next in supers {
                if self.is_exact_same_type(next, to) {
                    return Some(hops + 1);
                }
                if visited.insert(next) {
                    queue.push_back((next, hops + 1));
                }
            }
        }
        None
    }
}

/// A candidate and its match weight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedMatch {
    pub symbol: SymbolId,
    pub weight: f64,
}

/// Ranked overload candidates, lowest weight first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodMatches {
    matches: Vec<WeightedMatch>,
    tolerance: f64,
}

impl MethodMatches {
    /// Weights closer than `tolerance` count as a tie
    pub fn new(tolerance: f64) -> Self {
        MethodMatches {
            matches: Vec::new(),
            tolerance,
        }
    }

    /// Record a candidate; negative weights are ignored
    pub fn add(&mut self, symbol: SymbolId, weight: f64) {
        if weight < 0.0 {
            return;
        }
        let pos = self.matches.partition_point(|m| m.weight <= weight);
        self.matches.insert(pos, WeightedMatch { symbol, weight });
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeightedMatch> {
        self.matches.iter()
    }

    pub fn contains(&self, symbol: SymbolId) -> bool {
        self.matches.iter().any(|m| m.symbol == symbol)
    }

    /// Lowest-weight candidate, even if tied
    pub fn best(&self) -> Option<WeightedMatch> {
        self.matches.first().copied()
    }

    /// Every candidate tied with the best
    pub fn best_candidates(&self) -> Vec<SymbolId> {
        let Some(best) = self.best() else {
            return Vec::new();
        };
        self.matches
            .iter()
            .take_while(|m| m.weight - best.weight < self.tolerance)
            .map(|m| m.symbol)
            .collect()
    }

    pub fn is_ambiguous(&self) -> bool {
        self.best_candidates().len() > 1
    }

    /// The unique best candidate; `None` when empty or tied
    pub fn single_best(&self) -> Option<SymbolId> {
        if self.is_ambiguous() {
            return None;
        }
        self.best().map(|m| m.symbol)
    }
}
