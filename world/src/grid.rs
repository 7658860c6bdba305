//! Cell occupancy and the actor registry.

use std::collections::{BTreeMap, BTreeSet};

use centipede_core::{ActorId, ActorKind, CellCoord, SpawnError};

/// Dense occupancy grid paired with a registry of placed actors.
///
/// A cell may hold several actors at once, e.g. a bullet crossing a mushroom.
/// The registry groups actors by kind and remembers the cell of each one; the
/// registry entry and the cell occupancy are always updated together.
#[derive(Clone, Debug)]
pub(crate) struct Grid {
    rows: u32,
    columns: u32,
    cells: Vec<Vec<(ActorId, ActorKind)>>,
    registry: BTreeMap<ActorKind, BTreeSet<ActorId>>,
    placements: BTreeMap<ActorId, CellCoord>,
}

impl Grid {
    pub(crate) fn new(rows: u32, columns: u32) -> Self {
        let capacity_u64 = u64::from(columns) * u64::from(rows);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            rows,
            columns,
            cells: vec![Vec::new(); capacity],
            registry: BTreeMap::new(),
            placements: BTreeMap::new(),
        }
    }

    pub(crate) const fn rows(&self) -> u32 {
        self.rows
    }

    pub(crate) const fn columns(&self) -> u32 {
        self.columns
    }

    pub(crate) fn contains(&self, cell: CellCoord) -> bool {
        cell.row() < self.rows && cell.column() < self.columns
    }

    /// Places the actor at `cell` and registers it under its kind.
    pub(crate) fn add_actor(
        &mut self,
        actor: ActorId,
        kind: ActorKind,
        cell: CellCoord,
    ) -> Result<(), SpawnError> {
        let index = self.index(cell).ok_or(SpawnError::OutOfBounds)?;
        if let Some(previous) = self.placements.insert(actor, cell) {
            self.vacate(actor, previous);
        }
        self.cells[index].push((actor, kind));
        let _ = self.registry.entry(kind).or_default().insert(actor);
        Ok(())
    }

    /// Moves a registered actor into `to`, vacating its old cell first.
    pub(crate) fn relocate(&mut self, actor: ActorId, to: CellCoord) {
        let Some(from) = self.placements.get(&actor).copied() else {
            return;
        };
        let Some(kind) = self.kind_at(actor, from) else {
            return;
        };
        let Some(index) = self.index(to) else {
            return;
        };

        self.vacate(actor, from);
        self.cells[index].push((actor, kind));
        let _ = self.placements.insert(actor, to);
    }

    /// Drops the actor from both the occupancy cells and the registry.
    pub(crate) fn remove(&mut self, actor: ActorId) -> Option<CellCoord> {
        let cell = self.placements.remove(&actor)?;
        if let Some(kind) = self.kind_at(actor, cell) {
            if let Some(group) = self.registry.get_mut(&kind) {
                let _ = group.remove(&actor);
                if group.is_empty() {
                    let _ = self.registry.remove(&kind);
                }
            }
        }
        self.vacate(actor, cell);
        Some(cell)
    }

    pub(crate) fn is_cell_occupied(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .map_or(false, |index| !self.cells[index].is_empty())
    }

    pub(crate) fn is_mushroom_in_cell(&self, cell: CellCoord) -> bool {
        self.index(cell).map_or(false, |index| {
            self.cells[index]
                .iter()
                .any(|(_, kind)| *kind == ActorKind::Mushroom)
        })
    }

    pub(crate) fn actor_cell(&self, actor: ActorId) -> Option<CellCoord> {
        self.placements.get(&actor).copied()
    }

    pub(crate) fn occupants(&self, cell: CellCoord) -> impl Iterator<Item = ActorId> + '_ {
        self.index(cell)
            .map(|index| self.cells[index].as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|(actor, _)| *actor)
    }

    pub(crate) fn group(&self, kind: ActorKind) -> impl Iterator<Item = ActorId> + '_ {
        self.registry
            .get(&kind)
            .into_iter()
            .flat_map(|group| group.iter().copied())
    }

    /// Cells shared by more than one actor, in row-major order.
    pub(crate) fn crowded_cells(&self) -> impl Iterator<Item = &[(ActorId, ActorKind)]> + '_ {
        self.cells
            .iter()
            .filter(|occupants| occupants.len() > 1)
            .map(Vec::as_slice)
    }

    fn kind_at(&self, actor: ActorId, cell: CellCoord) -> Option<ActorKind> {
        let index = self.index(cell)?;
        self.cells[index]
            .iter()
            .find(|(occupant, _)| *occupant == actor)
            .map(|(_, kind)| *kind)
    }

    fn vacate(&mut self, actor: ActorId, cell: CellCoord) {
        if let Some(index) = self.index(cell) {
            self.cells[index].retain(|(occupant, _)| *occupant != actor);
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if self.contains(cell) {
            let row = usize::try_from(cell.row()).ok()?;
            let column = usize::try_from(cell.column()).ok()?;
            let width = usize::try_from(self.columns).ok()?;
            Some(row * width + column)
        } else {
            None
        }
    }
}
