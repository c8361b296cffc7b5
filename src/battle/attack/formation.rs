//! Formation groups: units moving together with fixed offsets
//!
//! A group exists only while formation mode is active. Each member keeps its
//! offset from the group's reference unit, so a shared destination becomes
//! one slot per member.

use serde::{Deserialize, Serialize};

use crate::battle::units::{FormationSlot, Unit};
use crate::battle::world::BattleWorld;
use crate::core::types::{Cell, FormationGroupId, PlayerId, UnitId};

/// A member and its offset from the reference unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub unit: UnitId,
    pub offset: (i32, i32),
}

/// An active formation group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationGroup {
    pub id: FormationGroupId,
    pub owner: PlayerId,
    pub reference: UnitId,
    pub members: Vec<GroupMember>,
}

impl FormationGroup {
    /// Slot a member should occupy when the reference stands on `dest`
    pub fn slot_for(&self, unit: UnitId, dest: Cell) -> Option<Cell> {
        self.members
            .iter()
            .find(|m| m.unit == unit)
            .map(|m| dest.offset(m.offset.0, m.offset.1))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// All active groups
#[derive(Debug, Clone, Default)]
pub struct FormationRegistry {
    groups: Vec<FormationGroup>,
    next_id: u32,
}

impl FormationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group the given living units of one owner around the first of them
    ///
    /// Units already in another group leave it. Returns None when fewer than
    /// two eligible units remain.
    pub fn form_group(&mut self, world: &mut BattleWorld, ids: &[UnitId]) -> Option<FormationGroupId> {
        let reference = ids.iter().find_map(|id| world.unit(*id).filter(|u| u.is_alive()))?;
        let (owner, origin) = (reference.owner, reference.cell);

        let mut members = Vec::new();
        for id in ids {
            let Some(unit) = world.unit(*id) else { continue };
            if !unit.is_alive() || unit.owner != owner || members.iter().any(|m: &GroupMember| m.unit == *id) {
                continue;
            }
            members.push(GroupMember {
                unit: *id,
                offset: (unit.cell.x - origin.x, unit.cell.y - origin.y),
            });
        }
        if members.len() < 2 {
            return None;
        }

        for member in &members {
            self.leave(world, member.unit);
        }

        let id = FormationGroupId(self.next_id);
        self.next_id += 1;
        for member in &members {
            if let Some(unit) = world.unit_mut(member.unit) {
                unit.formation = Some(FormationSlot {
                    group: id,
                    offset: member.offset,
                });
            }
        }
        self.groups.push(FormationGroup {
            id,
            owner,
            reference: members[0].unit,
            members,
        });
        Some(id)
    }

    /// End formation mode for a group; returns whether it existed
    pub fn disband_group(&mut self, world: &mut BattleWorld, id: FormationGroupId) -> bool {
        let Some(pos) = self.groups.iter().position(|g| g.id == id) else {
            return false;
        };
        let group = self.groups.remove(pos);
        for member in group.members {
            if let Some(unit) = world.unit_mut(member.unit) {
                unit.formation = None;
            }
        }
        true
    }

    pub fn get(&self, id: FormationGroupId) -> Option<&FormationGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn groups(&self) -> &[FormationGroup] {
        &self.groups
    }

    /// Remove dead members; disband groups that fall below two members.
    /// Returns the ids of disbanded groups.
    pub fn prune(&mut self, world: &mut BattleWorld) -> Vec<FormationGroupId> {
        for group in &mut self.groups {
            group
                .members
                .retain(|m| world.unit(m.unit).map(Unit::is_alive).unwrap_or(false));
            if !group.members.iter().any(|m| m.unit == group.reference) {
                rebase(group);
                write_slots(world, group);
            }
        }

        let doomed: Vec<FormationGroupId> = self
            .groups
            .iter()
            .filter(|g| g.members.len() < 2)
            .map(|g| g.id)
            .collect();
        for id in &doomed {
            self.disband_group(world, *id);
        }
        doomed
    }

    fn leave(&mut self, world: &mut BattleWorld, unit: UnitId) {
        let mut emptied = Vec::new();
        for group in &mut self.groups {
            group.members.retain(|m| m.unit != unit);
            if group.members.len() < 2 {
                emptied.push(group.id);
            } else if group.reference == unit {
                rebase(group);
                write_slots(world, group);
            }
        }
        for id in emptied {
            self.disband_group(world, id);
        }
    }
}

fn write_slots(world: &mut BattleWorld, group: &FormationGroup) {
    for member in &group.members {
        if let Some(unit) = world.unit_mut(member.unit) {
            unit.formation = Some(FormationSlot {
                group: group.id,
                offset: member.offset,
            });
        }
    }
}

/// Make the first remaining member the reference and shift offsets
fn rebase(group: &mut FormationGroup) {
    let Some(first) = group.members.first().copied() else {
        return;
    };
    for member in &mut group.members {
        member.offset = (
            member.offset.0 - first.offset.0,
            member.offset.1 - first.offset.1,
        );
    }
    group.reference = first.unit;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::terrain::TerrainMap;
    use crate::battle::unit_type::UnitType;
    use crate::battle::world::PlayerRoster;

    fn world() -> BattleWorld {
        let mut world = BattleWorld::new(TerrainMap::new(20, 20), PlayerRoster::new(2, None));
        world.add_unit(Unit::new(UnitId(1), PlayerId(0), UnitType::MediumTank, Cell::new(5, 5)));
        world.add_unit(Unit::new(UnitId(2), PlayerId(0), UnitType::MediumTank, Cell::new(6, 5)));
        world.add_unit(Unit::new(UnitId(3), PlayerId(0), UnitType::LightTank, Cell::new(5, 7)));
        world.add_unit(Unit::new(UnitId(4), PlayerId(1), UnitType::LightTank, Cell::new(9, 9)));
        world
    }

    #[test]
    fn test_form_group_offsets() {
        let mut world = world();
        let mut registry = FormationRegistry::new();
        let id = registry
            .form_group(&mut world, &[UnitId(1), UnitId(2), UnitId(3), UnitId(4)])
            .unwrap();

        let group = registry.get(id).unwrap();
        assert_eq!(group.len(), 3, "enemy unit excluded");
        assert_eq!(group.reference, UnitId(1));
        assert_eq!(group.slot_for(UnitId(3), Cell::new(10, 10)), Some(Cell::new(10, 12)));
        assert_eq!(
            world.unit(UnitId(2)).unwrap().formation.map(|f| f.offset),
            Some((1, 0))
        );
    }

    #[test]
    fn test_disband_clears_slots() {
        let mut world = world();
        let mut registry = FormationRegistry::new();
        let id = registry.form_group(&mut world, &[UnitId(1), UnitId(2)]).unwrap();
        assert!(registry.disband_group(&mut world, id));
        assert!(world.unit(UnitId(1)).unwrap().formation.is_none());
        assert!(!registry.disband_group(&mut world, id));
    }

    #[test]
    fn test_single_unit_is_not_a_group() {
        let mut world = world();
        let mut registry = FormationRegistry::new();
        assert!(registry.form_group(&mut world, &[UnitId(1)]).is_none());
    }

    #[test]
    fn test_prune_rebases_and_disbands() {
        let mut world = world();
        let mut registry = FormationRegistry::new();
        let id = registry
            .form_group(&mut world, &[UnitId(1), UnitId(2), UnitId(3)])
            .unwrap();

        world.unit_mut(UnitId(1)).unwrap().health = 0.0;
        assert!(registry.prune(&mut world).is_empty());
        let group = registry.get(id).unwrap();
        assert_eq!(group.reference, UnitId(2));
        assert_eq!(group.slot_for(UnitId(3), Cell::new(0, 0)), Some(Cell::new(-1, 2)));
        assert_eq!(
            world.unit(UnitId(3)).unwrap().formation.map(|f| f.offset),
            Some((-1, 2))
        );

        world.unit_mut(UnitId(2)).unwrap().health = 0.0;
        assert_eq!(registry.prune(&mut world), vec![id]);
        assert!(world.unit(UnitId(3)).unwrap().formation.is_none());
    }

    #[test]
    fn test_regrouping_leaves_old_group() {
        let mut world = world();
        let mut registry = FormationRegistry::new();
        let first = registry.form_group(&mut world, &[UnitId(1), UnitId(2)]).unwrap();
        let second = registry.form_group(&mut world, &[UnitId(2), UnitId(3)]).unwrap();
        assert!(registry.get(first).is_none());
        assert_eq!(registry.groups().len(), 1);
        assert_eq!(world.unit(UnitId(2)).unwrap().formation.map(|f| f.group), Some(second));
    }
}
