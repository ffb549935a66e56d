//! Running path length along a track and percentage based lookups into it
use super::Trackpoint;

/// Running total of path length in meters up to and including each trackpoint.
///
/// The table is index aligned with the trackpoints it was built from, starts at 0 and never
/// decreases.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CumulativeDistanceTable {
    distances: Vec<f64>,
}

impl CumulativeDistanceTable {
    /// Walk the points once summing the great-circle distance between neighbours
    pub fn build(points: &[Trackpoint]) -> Self {
        let mut distances = Vec::with_capacity(points.len());
        let mut total = 0.0;
        let mut previous = None;
        for point in points {
            if let Some(prev) = previous {
                total += point.location().distance_to(prev);
            }
            distances.push(total);
            previous = Some(point.location());
        }
        CumulativeDistanceTable { distances }
    }

    /// Length of the whole path in meters, 0 for an empty table
    pub fn total(&self) -> f64 {
        self.distances.last().copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.distances.get(index).copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.distances
    }

    /// Index of the first entry that is at least `target`, `None` if every entry is smaller
    pub fn lower_bound(&self, target: f64) -> Option<usize> {
        if target.is_nan() {
            return None;
        }
        let idx = self.distances.partition_point(|&d| d < target);
        if idx < self.distances.len() {
            Some(idx)
        } else {
            None
        }
    }

    /// Resolve a slider percentage (0-100) of the total distance to a trackpoint index.
    ///
    /// Ties go to the earlier point and there is no interpolation between neighbours.
    /// Percentages outside 0-100 resolve to nothing, as does a target past the last entry,
    /// which can happen at 100% through rounding.
    pub fn resolve(&self, percentage: f64) -> Option<usize> {
        // also rejects NaN
        if !(0.0..=100.0).contains(&percentage) {
            return None;
        }
        let target = self.total() * percentage / 100.0;
        self.lower_bound(target)
    }
}

impl From<Vec<f64>> for CumulativeDistanceTable {
    fn from(distances: Vec<f64>) -> Self {
        CumulativeDistanceTable { distances }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps::Location;
    use proptest::prelude::*;

    fn points(coords: &[(f64, f64)]) -> Vec<Trackpoint> {
        coords
            .iter()
            .map(|&(lat, lon)| Trackpoint::new(Location::new(lat, lon), None))
            .collect()
    }

    #[test]
    fn test_empty_track() {
        let table = CumulativeDistanceTable::build(&[]);
        assert!(table.is_empty());
        assert_eq!(table.total(), 0.0);
        assert_eq!(table.resolve(0.0), None);
        assert_eq!(table.resolve(50.0), None);
    }

    #[test]
    fn test_single_point_resolves_everywhere() {
        let table = CumulativeDistanceTable::build(&points(&[(39.46, -80.15)]));
        assert_eq!(table.as_slice(), &[0.0]);
        for pct in &[0.0, 0.5, 25.0, 50.0, 99.9, 100.0] {
            assert_eq!(table.resolve(*pct), Some(0), "percentage {}", pct);
        }
        assert_eq!(table.resolve(150.0), None);
        assert_eq!(table.resolve(-1.0), None);
    }

    #[test]
    fn test_out_of_range_percentages_are_not_resolved() {
        let table = CumulativeDistanceTable::from(vec![0.0, 10.0, 25.0, 40.0]);
        for pct in &[-25.0, -0.001, 100.001, 150.0, f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            assert_eq!(table.resolve(*pct), None, "percentage {}", pct);
        }
    }

    #[test]
    fn test_first_entry_at_least_target_wins() {
        let table = CumulativeDistanceTable::from(vec![0.0, 10.0, 25.0, 40.0]);
        assert_eq!(table.total(), 40.0);
        // 20m: 25 is the first entry >= 20
        assert_eq!(table.resolve(50.0), Some(2));
        // exactly on an entry picks that entry
        assert_eq!(table.resolve(25.0), Some(1));
        assert_eq!(table.resolve(100.0), Some(3));
        assert_eq!(table.resolve(0.0), Some(0));
    }

    #[test]
    fn test_ties_favor_the_earlier_point() {
        // repeated points produce zero length steps
        let table = CumulativeDistanceTable::from(vec![0.0, 0.0, 10.0, 10.0, 20.0]);
        assert_eq!(table.resolve(0.0), Some(0));
        assert_eq!(table.resolve(50.0), Some(2));
    }

    #[test]
    fn test_target_past_the_end_is_not_resolved() {
        let table = CumulativeDistanceTable::from(vec![0.0, 10.0, 25.0, 40.0]);
        assert_eq!(table.resolve(100.5), None);
        assert_eq!(table.lower_bound(40.000001), None);
        assert_eq!(table.resolve(f64::NAN), None);
        assert_eq!(table.resolve(f64::INFINITY), None);
    }

    #[test]
    fn test_build_sums_segment_lengths() {
        let track = points(&[(0.0, 0.0), (0.0, 1.0), (0.0, 1.0), (0.0, 3.0)]);
        let table = CumulativeDistanceTable::build(&track);
        let degree = crate::gps::EARTH_RADIUS * std::f64::consts::PI / 180.0;
        assert_eq!(table.len(), 4);
        assert_eq!(table.get(0), Some(0.0));
        assert!((table.get(1).unwrap() - degree).abs() < 1e-6);
        assert_eq!(table.get(1), table.get(2));
        assert!((table.total() - 3.0 * degree).abs() < 1e-6);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_table_starts_at_zero_and_never_decreases(
            coords in prop::collection::vec((-89.0f64..89.0, -179.0f64..179.0), 1..64)
        ) {
            let table = CumulativeDistanceTable::build(&points(&coords));
            prop_assert_eq!(table.len(), coords.len());
            prop_assert_eq!(table.get(0), Some(0.0));
            for pair in table.as_slice().windows(2) {
                prop_assert!(pair[1] >= pair[0]);
            }
        }

        #[test]
        fn prop_resolve_returns_leftmost_entry_at_least_target(
            steps in prop::collection::vec(0.0f64..500.0, 0..32),
            percentage in 0.0f64..=100.0,
        ) {
            let mut distances = vec![0.0];
            for step in &steps {
                let last = *distances.last().unwrap();
                distances.push(last + step);
            }
            let table = CumulativeDistanceTable::from(distances.clone());
            let target = table.total() * percentage / 100.0;
            match table.resolve(percentage) {
                Some(idx) => {
                    prop_assert!(distances[idx] >= target);
                    prop_assert!(idx == 0 || distances[idx - 1] < target);
                }
                None => prop_assert!(distances.iter().all(|&d| d < target)),
            }
        }

        #[test]
        fn prop_zero_percent_is_first_point(
            coords in prop::collection::vec((-89.0f64..89.0, -179.0f64..179.0), 1..64)
        ) {
            let table = CumulativeDistanceTable::build(&points(&coords));
            prop_assert_eq!(table.resolve(0.0), Some(0));
        }
    }
}
