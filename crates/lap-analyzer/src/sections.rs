//! Track section taxonomy

use serde::{Deserialize, Serialize};

/// Named track sections given by the lap distance (m) at which each begins.
///
/// Distances before the first start fall in section 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<f64>", into = "Vec<f64>")]
pub struct SectionTaxonomy {
    starts: Vec<f64>,
}

impl SectionTaxonomy {
    /// Build from section start distances in any order. Non-finite and
    /// duplicate starts are dropped.
    pub fn new(mut starts: Vec<f64>) -> Self {
        starts.retain(|s| s.is_finite());
        starts.sort_by(f64::total_cmp);
        starts.dedup();
        Self { starts }
    }

    /// Section containing a lap distance
    pub fn section_of(&self, distance: f64) -> usize {
        self.starts
            .partition_point(|start| *start <= distance)
            .saturating_sub(1)
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    pub fn starts(&self) -> &[f64] {
        &self.starts
    }
}

impl From<Vec<f64>> for SectionTaxonomy {
    fn from(starts: Vec<f64>) -> Self {
        Self::new(starts)
    }
}

impl From<SectionTaxonomy> for Vec<f64> {
    fn from(taxonomy: SectionTaxonomy) -> Self {
        taxonomy.starts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_section_lookup() {
        let sections = SectionTaxonomy::new(vec![1200.0, 0.0, 450.0]);
        assert_eq!(sections.starts(), &[0.0, 450.0, 1200.0]);
        assert_eq!(sections.section_of(0.0), 0);
        assert_eq!(sections.section_of(449.9), 0);
        assert_eq!(sections.section_of(450.0), 1);
        assert_eq!(sections.section_of(5000.0), 2);
    }

    #[test]
    fn test_before_first_start_is_section_zero() {
        let sections = SectionTaxonomy::new(vec![100.0, 300.0]);
        assert_eq!(sections.section_of(20.0), 0);
        assert_eq!(sections.section_of(150.0), 0);
        assert_eq!(sections.section_of(300.0), 1);
    }

    #[test]
    fn test_drops_invalid_starts() {
        let sections = SectionTaxonomy::new(vec![f64::NAN, 10.0, 10.0, f64::INFINITY]);
        assert_eq!(sections.len(), 1);
    }

    #[test]
    fn test_deserialize_from_list() {
        let sections: SectionTaxonomy = serde_json::from_str("[800.0, 0.0]").unwrap();
        assert_eq!(sections.starts(), &[0.0, 800.0]);
    }

    proptest! {
        #[test]
        fn prop_section_ids_follow_distance(
            starts in prop::collection::vec(0.0f64..5000.0, 1..12),
            mut distances in prop::collection::vec(0.0f64..6000.0, 1..100),
        ) {
            let sections = SectionTaxonomy::new(starts);
            distances.sort_by(f64::total_cmp);
            let ids: Vec<usize> = distances.iter().map(|d| sections.section_of(*d)).collect();
            prop_assert!(ids.windows(2).all(|w| w[0] <= w[1]));
            prop_assert!(ids.iter().all(|id| *id < sections.len()));
        }
    }
}
