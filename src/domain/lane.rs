//! Status lane projections
//!
//! Pure views over the collection: which tricks sit in a given lane, in
//! obstacle order and then insertion order. A deselected lane shows nothing.

use serde::{Deserialize, Serialize};

use super::obstacle::{Obstacle, ObstacleId};
use super::trick::{Trick, TrickStatus};

/// The lane currently picked in the lane bar, or none.
///
/// Picking the active lane again turns it off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneSelection(Option<TrickStatus>);

impl Default for LaneSelection {
    fn default() -> Self {
        Self(Some(TrickStatus::Learning))
    }
}

impl LaneSelection {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn of(status: TrickStatus) -> Self {
        Self(Some(status))
    }

    pub fn current(&self) -> Option<TrickStatus> {
        self.0
    }

    pub fn toggle(&mut self, status: TrickStatus) -> Option<TrickStatus> {
        self.0 = if self.0 == Some(status) { None } else { Some(status) };
        self.0
    }
}

impl From<TrickStatus> for LaneSelection {
    fn from(value: TrickStatus) -> Self {
        Self(Some(value))
    }
}

impl From<Option<TrickStatus>> for LaneSelection {
    fn from(value: Option<TrickStatus>) -> Self {
        Self(value)
    }
}

/// A trick seen from an aggregated lane view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneEntry<'a> {
    pub obstacle_id: &'a ObstacleId,
    pub obstacle_name: &'a str,
    pub trick: &'a Trick,
}

/// Tricks of one obstacle in the selected lane
pub fn tricks_in_lane(obstacle: &Obstacle, selection: impl Into<LaneSelection>) -> Vec<&Trick> {
    let Some(status) = selection.into().current() else {
        return Vec::new();
    };
    obstacle.tricks.iter().filter(|t| t.status == status).collect()
}

/// Tricks of every obstacle in the selected lane
pub fn lane_across(
    obstacles: &[Obstacle],
    selection: impl Into<LaneSelection>,
) -> Vec<LaneEntry<'_>> {
    let Some(status) = selection.into().current() else {
        return Vec::new();
    };
    obstacles
        .iter()
        .flat_map(|obstacle| {
            obstacle
                .tricks
                .iter()
                .filter(move |t| t.status == status)
                .map(move |trick| LaneEntry {
                    obstacle_id: &obstacle.id,
                    obstacle_name: &obstacle.name,
                    trick,
                })
        })
        .collect()
}

/// Number of tricks per lane, in `TrickStatus::ALL` order
pub fn lane_counts(obstacles: &[Obstacle]) -> [(TrickStatus, usize); 3] {
    TrickStatus::ALL.map(|status| {
        let count = obstacles
            .iter()
            .flat_map(|o| o.tricks.iter())
            .filter(|t| t.status == status)
            .count();
        (status, count)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obstacle(id: &str, name: &str, tricks: &[(&str, TrickStatus)]) -> Obstacle {
        let mut o = Obstacle::new(id.to_string(), name.to_string());
        for (i, (trick, status)) in tricks.iter().enumerate() {
            o.tricks
                .push(Trick::new(format!("{}-{}", id, i), trick.to_string(), *status));
        }
        o
    }

    fn names(tricks: &[&Trick]) -> Vec<String> {
        tricks.iter().map(|t| t.name.clone()).collect()
    }

    #[test]
    fn test_filter_single_obstacle_keeps_order() {
        let rail = obstacle(
            "r",
            "Rail",
            &[
                ("Grind", TrickStatus::Learning),
                ("50-50", TrickStatus::Improving),
                ("Boardslide", TrickStatus::Learning),
            ],
        );
        assert_eq!(
            names(&tricks_in_lane(&rail, TrickStatus::Learning)),
            vec!["Grind", "Boardslide"]
        );
        assert_eq!(names(&tricks_in_lane(&rail, Some(TrickStatus::Mastered))), Vec::<String>::new());
    }

    #[test]
    fn test_deselected_lane_shows_nothing() {
        let rail = obstacle("r", "Rail", &[("Grind", TrickStatus::Learning)]);
        assert!(tricks_in_lane(&rail, LaneSelection::none()).is_empty());
        assert!(lane_across(&[rail], LaneSelection::none()).is_empty());
    }

    #[test]
    fn test_toggle_same_lane_turns_off() {
        let rail = obstacle("r", "Rail", &[("Grind", TrickStatus::Improving)]);
        let mut selection = LaneSelection::none();

        selection.toggle(TrickStatus::Improving);
        assert_eq!(tricks_in_lane(&rail, selection).len(), 1);

        selection.toggle(TrickStatus::Improving);
        assert!(tricks_in_lane(&rail, selection).is_empty());

        selection.toggle(TrickStatus::Mastered);
        selection.toggle(TrickStatus::Improving);
        assert_eq!(selection.current(), Some(TrickStatus::Improving));
    }

    #[test]
    fn test_default_selection_is_learning() {
        assert_eq!(LaneSelection::default().current(), Some(TrickStatus::Learning));
    }

    #[test]
    fn test_lane_across_keeps_obstacle_order() {
        let obstacles = vec![
            obstacle("a", "Ledge", &[("Crooked", TrickStatus::Mastered), ("Smith", TrickStatus::Learning)]),
            obstacle("b", "Rail", &[("Grind", TrickStatus::Learning)]),
        ];
        let entries = lane_across(&obstacles, TrickStatus::Learning);
        let seen: Vec<(&str, &str)> = entries
            .iter()
            .map(|e| (e.obstacle_name, e.trick.name.as_str()))
            .collect();
        assert_eq!(seen, vec![("Ledge", "Smith"), ("Rail", "Grind")]);
        assert_eq!(entries[1].obstacle_id, "b");
    }

    #[test]
    fn test_lane_counts() {
        let obstacles = vec![
            obstacle("a", "Ledge", &[("Crooked", TrickStatus::Mastered), ("Smith", TrickStatus::Learning)]),
            obstacle("b", "Rail", &[("Grind", TrickStatus::Learning)]),
        ];
        assert_eq!(
            lane_counts(&obstacles),
            [
                (TrickStatus::Learning, 2),
                (TrickStatus::Improving, 0),
                (TrickStatus::Mastered, 1),
            ]
        );
    }
}
