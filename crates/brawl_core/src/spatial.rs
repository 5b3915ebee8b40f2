//! Spatial queries over the host world's units.
//!
//! The index is rebuilt from [`GameWorld`] once per tick and queried many
//! times; queries are pure reads over that snapshot. Squared distance is
//! the only order key - no square roots on the query path.

use brawl_net::{PlayerId, UnitId};
use glam::Vec3;

use crate::world::{GameWorld, UnitKind};

/// Exclusion set applied to every query.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    /// Skip every unit belonging to this player (a caster's own units).
    pub exclude_owner: Option<PlayerId>,
    /// Skip these specific units.
    pub exclude_units: Vec<UnitId>,
    /// Skip these classifications.
    pub exclude_kinds: Vec<UnitKind>,
}

impl Filter {
    /// Exclude a player's units.
    #[must_use]
    pub fn without_owner(mut self, owner: PlayerId) -> Self {
        self.exclude_owner = Some(owner);
        self
    }

    /// Exclude one specific unit.
    #[must_use]
    pub fn without_unit(mut self, unit: UnitId) -> Self {
        self.exclude_units.push(unit);
        self
    }

    /// Exclude a classification.
    #[must_use]
    pub fn without_kind(mut self, kind: UnitKind) -> Self {
        self.exclude_kinds.push(kind);
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct IndexedUnit {
    id: UnitId,
    position: Vec3,
    owner: Option<PlayerId>,
    kind: Option<UnitKind>,
}

/// Per-tick snapshot of unit positions, owners, and kinds.
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    units: Vec<IndexedUnit>,
}

impl SpatialIndex {
    /// Snapshot every living unit the world reports. Units whose position
    /// cannot be resolved are skipped.
    #[must_use]
    pub fn build(world: &dyn GameWorld) -> Self {
        let units = world
            .units()
            .into_iter()
            .filter_map(|id| {
                let position = world.unit_position(id)?;
                Some(IndexedUnit {
                    id,
                    position,
                    owner: world.unit_owner(id),
                    kind: world.unit_kind(id),
                })
            })
            .collect();
        Self { units }
    }

    fn admits(&self, unit: &IndexedUnit, filter: &Filter) -> bool {
        if let (Some(excluded), Some(owner)) = (filter.exclude_owner, unit.owner) {
            if excluded == owner {
                return false;
            }
        }
        if filter.exclude_units.contains(&unit.id) {
            return false;
        }
        if let Some(kind) = unit.kind {
            if filter.exclude_kinds.contains(&kind) {
                return false;
            }
        }
        true
    }

    /// All units within `radius` of `center`, minus the filter. Boundary
    /// inclusive (`d² <= r²`). Result order is unspecified.
    #[must_use]
    pub fn query_radius(&self, center: Vec3, radius: f32, filter: &Filter) -> Vec<UnitId> {
        let radius_sq = radius * radius;
        self.units
            .iter()
            .filter(|u| self.admits(u, filter))
            .filter(|u| u.position.distance_squared(center) <= radius_sq)
            .map(|u| u.id)
            .collect()
    }

    /// The nearest admitted unit to `center` by squared distance, rejecting
    /// exact zero distance so a scan centred on a unit never returns that
    /// unit itself.
    #[must_use]
    pub fn nearest(&self, center: Vec3, filter: &Filter) -> Option<UnitId> {
        self.units
            .iter()
            .filter(|u| self.admits(u, filter))
            .filter_map(|u| {
                let d = u.position.distance_squared(center);
                (d > 0.0).then_some((u.id, d))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Nearest admitted unit within `radius`, or `None` when the scan
    /// comes up empty.
    #[must_use]
    pub fn nearest_within(&self, center: Vec3, radius: f32, filter: &Filter) -> Option<UnitId> {
        let id = self.nearest(center, filter)?;
        let position = self.position_of(id)?;
        (position.distance_squared(center) <= radius * radius).then_some(id)
    }

    /// Position of a unit in this snapshot.
    #[must_use]
    pub fn position_of(&self, unit: UnitId) -> Option<Vec3> {
        self.units
            .iter()
            .find(|u| u.id == unit)
            .map(|u| u.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(units: &[(u64, Vec3, u32, UnitKind)]) -> SpatialIndex {
        SpatialIndex {
            units: units
                .iter()
                .map(|&(id, position, owner, kind)| IndexedUnit {
                    id: UnitId(id),
                    position,
                    owner: Some(PlayerId(owner)),
                    kind: Some(kind),
                })
                .collect(),
        }
    }

    #[test]
    fn radius_query_is_boundary_inclusive() {
        let idx = index(&[
            (1, Vec3::new(5.0, 0.0, 0.0), 1, UnitKind::Wizard),
            (2, Vec3::new(5.1, 0.0, 0.0), 1, UnitKind::Wizard),
        ]);
        let hits = idx.query_radius(Vec3::ZERO, 5.0, &Filter::default());
        assert_eq!(hits, vec![UnitId(1)]);
    }

    #[test]
    fn excluded_owner_is_never_returned() {
        let idx = index(&[
            (1, Vec3::new(1.0, 0.0, 0.0), 1, UnitKind::Wizard),
            (2, Vec3::new(2.0, 0.0, 0.0), 2, UnitKind::Wizard),
        ]);
        let filter = Filter::default().without_owner(PlayerId(1));
        assert_eq!(idx.query_radius(Vec3::ZERO, 10.0, &filter), vec![UnitId(2)]);
        assert_eq!(idx.nearest(Vec3::ZERO, &filter), Some(UnitId(2)));
    }

    #[test]
    fn kind_exclusion() {
        let idx = index(&[
            (1, Vec3::new(1.0, 0.0, 0.0), 1, UnitKind::Crystal),
            (2, Vec3::new(9.0, 0.0, 0.0), 2, UnitKind::Wizard),
        ]);
        let filter = Filter::default().without_kind(UnitKind::Crystal);
        assert_eq!(idx.nearest(Vec3::ZERO, &filter), Some(UnitId(2)));
    }

    #[test]
    fn nearest_uses_squared_distance_order() {
        let idx = index(&[
            (1, Vec3::new(4.0, 0.0, 0.0), 1, UnitKind::Wizard),
            (2, Vec3::new(-2.0, 0.0, 0.0), 2, UnitKind::Wizard),
        ]);
        assert_eq!(idx.nearest(Vec3::ZERO, &Filter::default()), Some(UnitId(2)));
    }

    #[test]
    fn nearest_rejects_zero_distance() {
        let idx = index(&[
            (1, Vec3::ZERO, 1, UnitKind::Wizard),
            (2, Vec3::new(3.0, 0.0, 0.0), 2, UnitKind::Wizard),
        ]);
        assert_eq!(idx.nearest(Vec3::ZERO, &Filter::default()), Some(UnitId(2)));
    }

    #[test]
    fn nearest_within_respects_the_radius() {
        let idx = index(&[(1, Vec3::new(20.0, 0.0, 0.0), 1, UnitKind::Wizard)]);
        assert_eq!(
            idx.nearest_within(Vec3::ZERO, 10.0, &Filter::default()),
            None
        );
        assert_eq!(
            idx.nearest_within(Vec3::ZERO, 25.0, &Filter::default()),
            Some(UnitId(1))
        );
    }
}
