// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font scoring
//!
//! A score packs per-axis distances into one integer so that candidates
//! compare with a single integer comparison. Each scored axis owns a bit
//! field; the axis listed first in the [`ScorePriority`] gets the most
//! significant field. Bit 0 flags a scalable font, so that a bitmap font of
//! exactly the requested size beats an otherwise equal scalable one.
//!
//! ```none
//! bit 30        penalty: size deviates but size is limited
//! bits 13..=28  size        (16 bits, default priority)
//! bits 11..=12  adstyle
//! bits  9..=10  family
//! bits  7..=8   weight
//! bits  5..=6   style
//! bits  3..=4   stretch
//! bits  1..=2   foundry
//! bit 0         scalable
//! ```

use super::{FontProperty, FontSpec};
use crate::Error;
use std::fmt;

/// Closeness of a font to a request; lower is better
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score(u32);

impl Score {
    /// The best possible score
    pub const EXACT: Score = Score(0);
    /// The font may not be used; worse than any other score
    pub const REJECT: Score = Score(u32::MAX);

    const SCALABLE: u32 = 1;
    const SIZE_PENALTY: u32 = 1 << 30;

    /// True if this is [`Score::REJECT`]
    #[inline]
    pub fn is_reject(self) -> bool {
        self == Score::REJECT
    }

    /// The packed value
    #[inline]
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_reject() {
            write!(f, "Score(REJECT)")
        } else {
            write!(f, "Score({:#x})", self.0)
        }
    }
}

/// Order in which font properties matter when scoring
///
/// The default order is size, adstyle, family, weight, style, stretch,
/// foundry (most important first). The registry is never scored: fonts of
/// another registry are not candidates at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScorePriority {
    order: [FontProperty; 7],
    shift: [u32; FontProperty::COUNT],
}

impl Default for ScorePriority {
    fn default() -> Self {
        use FontProperty::*;
        Self::from_order([Size, Adstyle, Family, Weight, Style, Stretch, Foundry])
    }
}

impl ScorePriority {
    fn from_order(order: [FontProperty; 7]) -> Self {
        let mut shift = [0; FontProperty::COUNT];
        let mut next = 1;
        for prop in order.iter().rev() {
            shift[prop.index()] = next;
            next += if *prop == FontProperty::Size { 16 } else { 2 };
        }
        ScorePriority { order, shift }
    }

    /// Get the current order, most important first
    pub fn get(&self) -> [FontProperty; 7] {
        self.order
    }

    /// Set the order, most important first
    ///
    /// `order` must list each of foundry, family, weight, style, stretch,
    /// adstyle and size exactly once. On error the order is unchanged.
    pub fn set(&mut self, order: &[FontProperty]) -> Result<(), Error> {
        let order: [FontProperty; 7] = order
            .try_into()
            .map_err(|_| Error::InvalidFont("selection priority must name seven properties"))?;
        for (i, prop) in order.iter().enumerate() {
            if matches!(prop, FontProperty::Registry | FontProperty::Resy) {
                return Err(Error::InvalidFont("property cannot be prioritized"));
            }
            if order[..i].contains(prop) {
                return Err(Error::InvalidFont("duplicate property in selection priority"));
            }
        }
        *self = Self::from_order(order);
        Ok(())
    }

    /// Score `font` against `request`
    ///
    /// Only axes specified in `request` are scored. The font is rejected if,
    /// on any such axis, both it and `spec` are specified but differ. If
    /// `limited_size` is true, a bitmap font of another size is penalized
    /// beyond any other difference.
    pub fn score(
        &self,
        font: &FontSpec,
        spec: &FontSpec,
        request: &FontSpec,
        limited_size: bool,
    ) -> Score {
        let mut score = 0;
        for prop in self.order {
            let wanted = request.number(prop);
            if wanted == 0 {
                continue;
            }
            let have = font.number(prop);
            let pinned = spec.number(prop);
            if have != 0 && pinned != 0 && have != pinned {
                return Score::REJECT;
            }
            let diff = if have != 0 { have.abs_diff(wanted) } else { 0 };
            let shift = self.shift[prop.index()];

            if prop == FontProperty::Size {
                if font.is_scalable() {
                    score |= Score::SCALABLE;
                } else {
                    score |= diff.min(0xFFFF) << shift;
                    if limited_size && diff > 0 {
                        score |= Score::SIZE_PENALTY;
                    }
                }
            } else {
                score |= diff.min(3) << shift;
            }
        }
        Score(score)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fonts::PropertyTable;
    use FontProperty::*;

    struct Fixture {
        table: PropertyTable,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                table: PropertyTable::default(),
            }
        }

        fn spec(&mut self, props: &[(FontProperty, &str)], size: u32, resy: u32) -> FontSpec {
            let mut spec = FontSpec::new();
            for (prop, value) in props {
                spec = spec.with(&mut self.table, *prop, value);
            }
            spec.set_size(size);
            spec.set_resy(resy);
            spec
        }
    }

    #[test]
    fn default_shifts() {
        let p = ScorePriority::default();
        assert_eq!(p.shift[Foundry.index()], 1);
        assert_eq!(p.shift[Stretch.index()], 3);
        assert_eq!(p.shift[Adstyle.index()], 11);
        assert_eq!(p.shift[Size.index()], 13);
        assert_eq!(p.get()[0], Size);
    }

    #[test]
    fn reject_dominates() {
        let mut f = Fixture::new();
        let font = f.spec(&[(Family, "times"), (Weight, "bold")], 120, 75);
        let spec = f.spec(&[(Family, "courier")], 0, 0);
        let request = f.spec(&[(Family, "times"), (Weight, "bold")], 120, 0);
        let p = ScorePriority::default();
        assert_eq!(p.score(&font, &spec, &request, false), Score::REJECT);

        let other = f.spec(&[(Family, "fixed"), (Weight, "light")], 990, 75);
        let worst = p.score(&other, &FontSpec::new(), &request, true);
        assert!(!worst.is_reject());
        assert!(worst < Score::REJECT);
    }

    #[test]
    fn distances() {
        let mut f = Fixture::new();
        let p = ScorePriority::default();
        let request = f.spec(&[(Weight, "medium")], 120, 0);
        let none = FontSpec::new();

        let exact = f.spec(&[(Weight, "medium")], 120, 75);
        assert_eq!(p.score(&exact, &none, &request, false), Score::EXACT);

        let scalable = f.spec(&[(Weight, "medium")], 0, 0);
        assert_eq!(p.score(&scalable, &none, &request, false).value(), 1);

        // medium=7, demibold=9, black=13: capped at 3
        let demibold = f.spec(&[(Weight, "demibold")], 120, 75);
        assert_eq!(p.score(&demibold, &none, &request, false).value(), 2 << 7);
        let black = f.spec(&[(Weight, "black")], 120, 75);
        assert_eq!(p.score(&black, &none, &request, false).value(), 3 << 7);

        let small = f.spec(&[(Weight, "medium")], 100, 75);
        assert_eq!(p.score(&small, &none, &request, false).value(), 20 << 13);
        assert_eq!(
            p.score(&small, &none, &request, true).value(),
            (20 << 13) | (1 << 30)
        );
    }

    #[test]
    fn monotonic_per_axis() {
        let mut f = Fixture::new();
        let p = ScorePriority::default();
        let request = f.spec(&[(Weight, "medium"), (Stretch, "normal")], 120, 0);
        let none = FontSpec::new();
        let weights = ["medium", "regular", "demibold", "bold", "extrabold"];
        let scores: Vec<Score> = weights
            .iter()
            .map(|w| {
                let font = f.spec(&[(Weight, *w), (Stretch, "normal")], 120, 75);
                p.score(&font, &none, &request, false)
            })
            .collect();
        assert!(scores.windows(2).all(|w| w[0] <= w[1]));

        let sizes: Vec<Score> = [120, 110, 100, 60]
            .iter()
            .map(|size| {
                let font = f.spec(&[(Weight, "medium"), (Stretch, "normal")], *size, 75);
                p.score(&font, &none, &request, false)
            })
            .collect();
        assert!(sizes.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn set_priority() {
        let mut p = ScorePriority::default();
        assert!(p.set(&[Size, Family]).is_err());
        assert!(p
            .set(&[Size, Family, Family, Weight, Style, Stretch, Foundry])
            .is_err());
        assert!(p
            .set(&[Registry, Family, Adstyle, Weight, Style, Stretch, Foundry])
            .is_err());
        assert_eq!(p, ScorePriority::default());

        p.set(&[Family, Size, Adstyle, Weight, Style, Stretch, Foundry])
            .unwrap();
        assert_eq!(p.shift[Size.index()], 11);
        assert_eq!(p.shift[Family.index()], 27);

        // Family now outranks size
        let mut f = Fixture::new();
        let request = f.spec(&[(Family, "times")], 120, 0);
        let none = FontSpec::new();
        let wrong_family = f.spec(&[(Family, "courier")], 120, 75);
        let wrong_size = f.spec(&[(Family, "times")], 80, 75);
        assert!(
            p.score(&wrong_size, &none, &request, false)
                < p.score(&wrong_family, &none, &request, false)
        );
    }
}
