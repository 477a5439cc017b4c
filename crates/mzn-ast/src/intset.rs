use std::fmt;

/// A set of integers stored as sorted, disjoint, non-adjacent closed ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct IntSetVal {
    ranges: Vec<(i64, i64)>,
}

impl IntSetVal {
    pub fn empty() -> Self {
        Self { ranges: Vec::new() }
    }

    pub fn range(lo: i64, hi: i64) -> Self {
        Self::from_ranges(vec![(lo, hi)])
    }

    pub fn from_values(values: impl IntoIterator<Item = i64>) -> Self {
        Self::from_ranges(values.into_iter().map(|v| (v, v)).collect())
    }

    /// Normalise arbitrary ranges; empty ranges (`lo > hi`) are dropped.
    pub fn from_ranges(mut ranges: Vec<(i64, i64)>) -> Self {
        ranges.retain(|(lo, hi)| lo <= hi);
        ranges.sort_unstable();
        let mut out: Vec<(i64, i64)> = Vec::with_capacity(ranges.len());
        for (lo, hi) in ranges {
            match out.last_mut() {
                Some(last) if lo <= last.1.saturating_add(1) => last.1 = last.1.max(hi),
                _ => out.push((lo, hi)),
            }
        }
        Self { ranges: out }
    }

    pub fn ranges(&self) -> &[(i64, i64)] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn min(&self) -> Option<i64> {
        self.ranges.first().map(|r| r.0)
    }

    pub fn max(&self) -> Option<i64> {
        self.ranges.last().map(|r| r.1)
    }

    /// Number of elements, saturating at `u64::MAX`.
    pub fn card(&self) -> u64 {
        self.ranges.iter().fold(0u64, |acc, (lo, hi)| {
            let width = (*hi as i128 - *lo as i128 + 1) as u64;
            acc.saturating_add(width)
        })
    }

    pub fn contains(&self, v: i64) -> bool {
        self.ranges
            .binary_search_by(|(lo, hi)| {
                if *hi < v {
                    std::cmp::Ordering::Less
                } else if *lo > v {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    pub fn is_subset_of(&self, other: &IntSetVal) -> bool {
        self.ranges.iter().all(|(lo, hi)| {
            other
                .ranges
                .iter()
                .any(|(olo, ohi)| olo <= lo && hi <= ohi)
        })
    }

    pub fn union(&self, other: &IntSetVal) -> IntSetVal {
        let mut ranges = self.ranges.clone();
        ranges.extend_from_slice(&other.ranges);
        Self::from_ranges(ranges)
    }

    pub fn intersect(&self, other: &IntSetVal) -> IntSetVal {
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.ranges.len() && j < other.ranges.len() {
            let (alo, ahi) = self.ranges[i];
            let (blo, bhi) = other.ranges[j];
            let lo = alo.max(blo);
            let hi = ahi.min(bhi);
            if lo <= hi {
                out.push((lo, hi));
            }
            if ahi < bhi {
                i += 1;
            } else {
                j += 1;
            }
        }
        Self::from_ranges(out)
    }

    pub fn diff(&self, other: &IntSetVal) -> IntSetVal {
        let mut out = Vec::new();
        for &(lo, hi) in &self.ranges {
            let mut cur = lo;
            let mut done = false;
            for &(olo, ohi) in &other.ranges {
                if ohi < cur || olo > hi {
                    continue;
                }
                if olo > cur {
                    out.push((cur, olo - 1));
                }
                if ohi >= hi {
                    done = true;
                    break;
                }
                cur = ohi + 1;
            }
            if !done {
                out.push((cur, hi));
            }
        }
        Self::from_ranges(out)
    }

    pub fn symdiff(&self, other: &IntSetVal) -> IntSetVal {
        self.diff(other).union(&other.diff(self))
    }

    /// Iterate over the elements in increasing order.
    pub fn values(&self) -> impl Iterator<Item = i64> + '_ {
        self.ranges.iter().flat_map(|&(lo, hi)| lo..=hi)
    }
}

impl fmt::Display for IntSetVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [(lo, hi)] = self.ranges.as_slice() {
            if lo != hi {
                return write!(f, "{}..{}", lo, hi);
            }
        }
        write!(f, "{{")?;
        for (i, v) in self.values().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "}}")
    }
}
