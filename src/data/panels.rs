use super::{Sensor, SensorId};

/// Ordered set of sensor ids rendered as chart panels, top to bottom.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PanelSet {
    ids: Vec<SensorId>,
    seeded: bool,
}

impl PanelSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn from_ids(ids: impl IntoIterator<Item = SensorId>) -> Self {
        let mut set = Self::new();
        for id in ids {
            set.add(Some(id));
        }
        set
    }

    pub fn ids(&self) -> &[SensorId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: SensorId) -> bool {
        self.ids.contains(&id)
    }

    /// Appends `id` unless it's missing or already shown. Returns whether
    /// the set changed.
    pub fn add(&mut self, id: Option<SensorId>) -> bool {
        match id {
            Some(id) if !self.contains(id) => {
                self.ids.push(id);
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, id: SensorId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|&existing| existing != id);
        self.ids.len() != before
    }

    /// Sensors not yet on screen, in the order of `all_sensors`.
    pub fn candidates<'a>(&self, all_sensors: &'a [Sensor]) -> Vec<&'a Sensor> {
        all_sensors
            .iter()
            .filter(|s| !self.contains(s.sensor_id))
            .collect()
    }

    /// Shows every known sensor the first time a sensor list arrives.
    /// Later refreshes leave the set alone.
    pub fn seed(&mut self, sensors: &[Sensor]) -> bool {
        if self.seeded || sensors.is_empty() {
            return false;
        }
        for sensor in sensors {
            self.add(Some(sensor.sensor_id));
        }
        self.seeded = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor(id: SensorId, name: &str) -> Sensor {
        Sensor {
            sensor_id: id,
            name: name.to_string(),
            unit: String::new(),
        }
    }

    #[test]
    fn add_add_remove() {
        let mut set = PanelSet::new();
        assert!(set.add(Some(7)));
        assert_eq!(set.ids(), &[7]);
        assert!(!set.add(Some(7)));
        assert_eq!(set.ids(), &[7]);
        assert!(set.remove(7));
        assert!(set.is_empty());
    }

    #[test]
    fn add_without_selection_is_a_no_op() {
        let mut set = PanelSet::from_ids([1, 2]);
        assert!(!set.add(None));
        assert_eq!(set.ids(), &[1, 2]);
    }

    #[test]
    fn add_appends_in_insertion_order() {
        let mut set = PanelSet::from_ids([3, 1]);
        set.add(Some(2));
        assert_eq!(set.ids(), &[3, 1, 2]);
    }

    #[test]
    fn remove_absent_keeps_order() {
        let mut set = PanelSet::from_ids([4, 2, 9]);
        assert!(!set.remove(5));
        assert_eq!(set.ids(), &[4, 2, 9]);
    }

    #[test]
    fn add_then_remove_restores_set() {
        let original = PanelSet::from_ids([1, 2]);
        let mut set = original.clone();
        set.add(Some(3));
        set.remove(3);
        assert_eq!(set, original);
    }

    #[test]
    fn candidates_are_disjoint_from_visible() {
        let sensors = vec![sensor(1, "pH"), sensor(2, "Temp"), sensor(3, "EC"), sensor(4, "DO")];
        let mut set = PanelSet::from_ids([3, 1]);
        let names: Vec<&str> = set.candidates(&sensors).iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Temp", "DO"]);

        set.add(Some(4));
        set.remove(1);
        for candidate in set.candidates(&sensors) {
            assert!(!set.contains(candidate.sensor_id));
        }
        assert_eq!(set.candidates(&sensors).len() + set.len(), sensors.len());
    }

    #[test]
    fn seed_only_applies_once() {
        let sensors = vec![sensor(1, "pH"), sensor(2, "Temp")];
        let mut set = PanelSet::new();
        assert!(!set.seed(&[]));
        assert!(set.seed(&sensors));
        assert_eq!(set.ids(), &[1, 2]);

        set.remove(1);
        assert!(!set.seed(&sensors));
        assert_eq!(set.ids(), &[2]);
    }
}
