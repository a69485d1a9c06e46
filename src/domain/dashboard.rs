// Dashboard root aggregate and grid occupancy queries
use crate::domain::component::ComponentRecord;
use crate::domain::grid::{GridSpec, extract_areas};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    pub grid: GridSpec,
    #[serde(default)]
    pub components: BTreeMap<String, ComponentRecord>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridStats {
    pub total_areas: usize,
    pub occupied_areas: usize,
    pub available_areas: usize,
    pub occupancy_rate: u32,
    pub all_area_names: Vec<String>,
    pub occupied_area_names: Vec<String>,
    pub available_area_names: Vec<String>,
}

impl DashboardState {
    pub fn occupied_areas(&self) -> Vec<String> {
        self.components.values().map(|c| c.grid_area.clone()).collect()
    }

    pub fn available_areas(&self) -> Vec<String> {
        let occupied = self.occupied_areas();
        self.grid
            .areas()
            .into_iter()
            .filter(|area| !occupied.contains(area))
            .collect()
    }

    pub fn is_area_occupied(&self, area: &str) -> bool {
        self.components.values().any(|c| c.grid_area == area)
    }

    pub fn occupant_of(&self, area: &str) -> Option<&ComponentRecord> {
        self.components.values().find(|c| c.grid_area == area)
    }

    /// Components whose area would no longer exist under a candidate
    /// template. A non-empty result blocks the layout edit.
    pub fn orphaned_by(&self, template_areas: &[String]) -> Vec<&ComponentRecord> {
        let new_areas = extract_areas(template_areas);
        self.components
            .values()
            .filter(|c| !new_areas.iter().any(|a| *a == c.grid_area))
            .collect()
    }

    pub fn grid_stats(&self) -> GridStats {
        let all = self.grid.areas();
        let occupied = self.occupied_areas();
        let available = self.available_areas();
        let occupancy_rate = if all.is_empty() {
            0
        } else {
            ((occupied.len() as f64 / all.len() as f64) * 100.0).round() as u32
        };

        GridStats {
            total_areas: all.len(),
            occupied_areas: occupied.len(),
            available_areas: available.len(),
            occupancy_rate,
            all_area_names: all,
            occupied_area_names: occupied,
            available_area_names: available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::component::{ComponentMetadata, ComponentRecord, ComponentType};
    use serde_json::Value;

    fn state_with(areas: &[&str], placed: &[(&str, &str)]) -> DashboardState {
        let mut state = DashboardState {
            grid: GridSpec::new(
                "1fr 1fr".to_string(),
                "auto".to_string(),
                "8px".to_string(),
                areas.iter().map(|s| s.to_string()).collect(),
            ),
            components: BTreeMap::new(),
        };
        for (id, area) in placed {
            state.components.insert(
                id.to_string(),
                ComponentRecord {
                    id: id.to_string(),
                    component_type: ComponentType::Chart,
                    grid_area: area.to_string(),
                    title: None,
                    description: None,
                    data: Value::Null,
                    data_config: None,
                    style: None,
                    metadata: ComponentMetadata::new("2026-01-01T00:00:00Z".to_string()),
                },
            );
        }
        state
    }

    #[test]
    fn test_occupancy_queries() {
        let state = state_with(&["a b", "c d"], &[("c1", "a"), ("c2", "c")]);
        assert!(state.is_area_occupied("a"));
        assert!(!state.is_area_occupied("b"));
        assert_eq!(state.occupant_of("c").unwrap().id, "c2");
        assert_eq!(state.available_areas(), vec!["b", "d"]);
    }

    #[test]
    fn test_grid_stats() {
        let state = state_with(&["a b", "c d"], &[("c1", "a")]);
        let stats = state.grid_stats();
        assert_eq!(stats.total_areas, 4);
        assert_eq!(stats.occupied_areas, 1);
        assert_eq!(stats.available_areas, 3);
        assert_eq!(stats.occupancy_rate, 25);
        assert_eq!(stats.all_area_names, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_grid_stats_empty_grid() {
        let state = state_with(&[], &[]);
        let stats = state.grid_stats();
        assert_eq!(stats.total_areas, 0);
        assert_eq!(stats.occupancy_rate, 0);
    }

    #[test]
    fn test_orphaned_by() {
        let state = state_with(&["a b"], &[("c1", "a"), ("c2", "b")]);
        let orphans = state.orphaned_by(&["a c".to_string()]);
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].id, "c2");

        assert!(state.orphaned_by(&["a b c".to_string()]).is_empty());
    }
}
