use crate::annotation::marker::{
    Marker, MarkerId, MarkerPatch, PersistedMarker, DEFAULT_ELEMENT_TYPE,
};

/// Markers captured for a save, paired with the ids they were taken from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerSnapshot {
    pub ids: Vec<MarkerId>,
    pub markers: Vec<PersistedMarker>,
}

/// Ordered in-memory marker collection. Order is insertion order.
#[derive(Debug, Clone, Default)]
pub struct MarkerStore {
    markers: Vec<Marker>,
    next_id: u64,
}

impl MarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_id(&mut self) -> MarkerId {
        self.next_id += 1;
        MarkerId(self.next_id)
    }

    pub fn add(&mut self, x: u32, y: u32, temperature: f32) -> &Marker {
        let id = self.fresh_id();
        self.markers.push(Marker {
            id,
            x,
            y,
            temperature,
            element_type: DEFAULT_ELEMENT_TYPE.to_string(),
            final_action: String::new(),
            persisted_index: None,
        });
        &self.markers[self.markers.len() - 1]
    }

    /// Returns `false` when no marker has `id`.
    pub fn update(&mut self, id: MarkerId, patch: MarkerPatch) -> bool {
        match self.markers.iter_mut().find(|marker| marker.id == id) {
            Some(marker) => {
                patch.apply(marker);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: MarkerId) -> Option<Marker> {
        let position = self.markers.iter().position(|marker| marker.id == id)?;
        Some(self.markers.remove(position))
    }

    pub fn get(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.iter().find(|marker| marker.id == id)
    }

    /// 1-based on-screen number of a marker.
    pub fn number_of(&self, id: MarkerId) -> Option<usize> {
        self.markers
            .iter()
            .position(|marker| marker.id == id)
            .map(|position| position + 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    /// Replaces the whole collection, ordering by the persisted `index`.
    pub fn load_all(&mut self, mut records: Vec<PersistedMarker>) {
        records.sort_by_key(|record| record.index);
        self.markers.clear();
        for record in records {
            let id = self.fresh_id();
            self.markers.push(Marker {
                id,
                x: record.x,
                y: record.y,
                temperature: record.temperature,
                element_type: record.element_type,
                final_action: record.final_action,
                persisted_index: Some(record.index),
            });
        }
    }

    /// Current collection in save layout: `index = position + 1`.
    pub fn snapshot(&self) -> MarkerSnapshot {
        let (ids, markers) = self
            .markers
            .iter()
            .enumerate()
            .map(|(position, marker)| {
                (
                    marker.id,
                    PersistedMarker {
                        index: position as u32 + 1,
                        x: marker.x,
                        y: marker.y,
                        temperature: marker.temperature,
                        element_type: marker.element_type.clone(),
                        final_action: marker.final_action.clone(),
                    },
                )
            })
            .unzip();
        MarkerSnapshot { ids, markers }
    }

    /// Stamps saved indices onto markers that still exist.
    pub fn mark_persisted(&mut self, snapshot: &MarkerSnapshot) {
        for (id, record) in snapshot.ids.iter().zip(&snapshot.markers) {
            if let Some(marker) = self.markers.iter_mut().find(|marker| marker.id == *id) {
                marker.persisted_index = Some(record.index);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: u32, x: u32) -> PersistedMarker {
        PersistedMarker {
            index,
            x,
            y: 0,
            temperature: 20.0 + x as f32,
            element_type: "Breaker".into(),
            final_action: String::new(),
        }
    }

    #[test]
    fn add_assigns_defaults_and_fresh_ids() {
        let mut store = MarkerStore::new();
        let first = store.add(3, 4, 55.5).clone();
        let second = store.add(5, 6, 40.0).clone();
        assert_ne!(first.id, second.id);
        assert_eq!(first.element_type, DEFAULT_ELEMENT_TYPE);
        assert_eq!(first.final_action, "");
        assert_eq!(first.persisted_index, None);
        assert_eq!(store.number_of(second.id), Some(2));
    }

    #[test]
    fn snapshot_indices_follow_insertion_order() {
        let mut store = MarkerStore::new();
        for x in 0..4 {
            store.add(x, x, x as f32);
        }
        let snapshot = store.snapshot();
        let indices: Vec<u32> = snapshot.markers.iter().map(|m| m.index).collect();
        let xs: Vec<u32> = snapshot.markers.iter().map(|m| m.x).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
        assert_eq!(xs, vec![0, 1, 2, 3]);
    }

    #[test]
    fn removal_keeps_order_and_persisted_indices_until_next_save() {
        let mut store = MarkerStore::new();
        store.load_all(vec![record(1, 10), record(2, 20), record(3, 30)]);
        let second = store.iter().nth(1).unwrap().id;
        store.remove(second).unwrap();

        let remaining: Vec<(u32, Option<u32>)> =
            store.iter().map(|m| (m.x, m.persisted_index)).collect();
        assert_eq!(remaining, vec![(10, Some(1)), (30, Some(3))]);

        let snapshot = store.snapshot();
        store.mark_persisted(&snapshot);
        let renumbered: Vec<Option<u32>> = store.iter().map(|m| m.persisted_index).collect();
        assert_eq!(renumbered, vec![Some(1), Some(2)]);
    }

    #[test]
    fn load_orders_by_index_not_arrival() {
        let mut store = MarkerStore::new();
        store.add(99, 99, 1.0);
        store.load_all(vec![record(3, 30), record(1, 10), record(2, 20)]);
        let xs: Vec<u32> = store.iter().map(|m| m.x).collect();
        assert_eq!(xs, vec![10, 20, 30]);
    }

    #[test]
    fn update_applies_only_given_fields() {
        let mut store = MarkerStore::new();
        let id = store.add(1, 1, 70.0).id;
        assert!(store.update(id, MarkerPatch::final_action("Replace fuse")));
        assert!(store.update(id, MarkerPatch::element_type("Transformer")));
        let marker = store.get(id).unwrap();
        assert_eq!(marker.element_type, "Transformer");
        assert_eq!(marker.final_action, "Replace fuse");
        assert_eq!(marker.temperature, 70.0);
        assert!(!store.update(MarkerId(999), MarkerPatch::default()));
        assert!(store.remove(MarkerId(999)).is_none());
    }

    #[test]
    fn persisted_marker_uses_camel_case_fields() {
        let json = serde_json::to_value(record(1, 2)).unwrap();
        assert_eq!(json["elementType"], "Breaker");
        assert_eq!(json["finalAction"], "");
        assert_eq!(json["index"], 1);
    }
}
