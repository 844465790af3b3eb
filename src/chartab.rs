// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Sparse character tables

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// A sparse map from code point to value
///
/// Values are stored as non-overlapping inclusive ranges. Code points not
/// covered by any range map to the table's default value.
#[derive(Clone, Debug, PartialEq)]
pub struct CharTable<T> {
    default: T,
    // start → (end, value); ranges never overlap
    ranges: BTreeMap<u32, (u32, T)>,
}

impl<T: Clone> CharTable<T> {
    /// Construct an empty table
    pub fn new(default: T) -> Self {
        CharTable {
            default,
            ranges: BTreeMap::new(),
        }
    }

    /// The value of unmapped code points
    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// Get the value for `code`
    pub fn get(&self, code: u32) -> &T {
        self.ranges
            .range(..=code)
            .next_back()
            .filter(|(_, (end, _))| *end >= code)
            .map(|(_, (_, value))| value)
            .unwrap_or(&self.default)
    }

    /// Set the value of a single code point
    pub fn set(&mut self, code: u32, value: T) {
        self.set_range(code, code, value);
    }

    /// Set the value of all code points in `from..=to`
    ///
    /// Overrides (and if necessary splits) existing ranges. Does nothing if
    /// `from > to`.
    pub fn set_range(&mut self, from: u32, to: u32, value: T) {
        if from > to {
            return;
        }

        // Ends are ordered like starts, so walking back from `to` we can
        // stop at the first range ending before `from`.
        let overlapping: Vec<u32> = self
            .ranges
            .range(..=to)
            .rev()
            .take_while(|(_, (end, _))| *end >= from)
            .map(|(start, _)| *start)
            .collect();

        for start in overlapping {
            let Some((end, old)) = self.ranges.remove(&start) else {
                continue;
            };
            if start < from {
                self.ranges.insert(start, (from - 1, old.clone()));
            }
            if end > to {
                self.ranges.insert(to + 1, (end, old));
            }
        }

        self.ranges.insert(from, (to, value));
    }

    /// Iterate over all explicitly set ranges, in order
    pub fn ranges(&self) -> impl Iterator<Item = (RangeInclusive<u32>, &T)> + '_ {
        self.ranges
            .iter()
            .map(|(start, (end, value))| (*start..=*end, value))
    }

    /// True if no range is set
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}
