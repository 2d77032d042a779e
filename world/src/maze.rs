//! Hex maze arena owned by a loaded level.

use glam::Vec3;
use haggis_hunt_core::{
    hex::{self, Ray},
    CellCode, CellCoord, ItemKind, LevelSpec, LoadError, Side, MAX_DIMENSION, MIN_DIMENSION,
};
use rand::Rng;

use crate::EntityRef;

/// Single hexagonal cell of the maze.
#[derive(Clone, Debug)]
pub struct Cell {
    coord: CellCoord,
    base: Vec3,
    wall_height: u8,
    visible: bool,
    selectable: bool,
    highlighted: bool,
    occupied: bool,
    entities: Vec<EntityRef>,
    neighbours: Vec<CellCoord>,
}

impl Cell {
    fn new(coord: CellCoord, base: Vec3, neighbours: Vec<CellCoord>) -> Self {
        Self {
            coord,
            base,
            wall_height: 0,
            visible: true,
            selectable: false,
            highlighted: false,
            occupied: false,
            entities: Vec::new(),
            neighbours,
        }
    }

    /// Coordinate of the cell within the maze.
    #[must_use]
    pub const fn coord(&self) -> CellCoord {
        self.coord
    }

    /// Centre of the cell's top face, raised by any remaining wall.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.base + Vec3::Y * f32::from(self.wall_height)
    }

    /// Reports whether the cell still carries a wall.
    #[must_use]
    pub const fn is_wall(&self) -> bool {
        self.wall_height > 0
    }

    /// Remaining wall height; zero for open cells.
    #[must_use]
    pub const fn wall_height(&self) -> u8 {
        self.wall_height
    }

    /// Reports whether the cell exists; invisible cells are holes.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Reports whether the cell is a legal target of the pending selection.
    #[must_use]
    pub const fn is_selectable(&self) -> bool {
        self.selectable
    }

    /// Reports whether the cursor hovers the cell.
    #[must_use]
    pub const fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    /// Reports whether an agent stands on the cell.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.occupied
    }

    /// Reports whether an agent could step onto the cell.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.visible && !self.is_wall() && !self.occupied
    }

    /// Entities resting on the cell.
    #[must_use]
    pub fn entities(&self) -> &[EntityRef] {
        &self.entities
    }

    /// Coordinates of the adjacent cells.
    #[must_use]
    pub fn neighbours(&self) -> &[CellCoord] {
        &self.neighbours
    }

    /// Distance along `ray` to the cell's footprint, if the ray hits it.
    #[must_use]
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        hex::footprint_hit(self.position(), ray)
    }

    /// Knocks one layer off the wall and returns the height left.
    pub(crate) fn hit_wall(&mut self) -> u8 {
        self.wall_height = self.wall_height.saturating_sub(1);
        self.wall_height
    }

    pub(crate) fn set_selectable(&mut self, selectable: bool) {
        self.selectable = selectable;
    }

    pub(crate) fn set_highlighted(&mut self, highlighted: bool) {
        self.highlighted = highlighted;
    }

    pub(crate) fn add_entity(&mut self, entity: EntityRef) {
        if let EntityRef::Player(_) = entity {
            self.occupied = true;
        }
        self.entities.push(entity);
    }

    pub(crate) fn remove_entity(&mut self, entity: EntityRef) {
        self.entities.retain(|candidate| *candidate != entity);
        self.occupied = self
            .entities
            .iter()
            .any(|candidate| matches!(candidate, EntityRef::Player(_)));
    }

    /// Side of the agent standing on the cell, if any.
    #[must_use]
    pub fn player(&self) -> Option<Side> {
        self.entities.iter().find_map(|entity| match entity {
            EntityRef::Player(side) => Some(*side),
            EntityRef::Item(_) => None,
        })
    }
}

/// Row-major arena of cells plus the start positions recorded at load.
#[derive(Clone, Debug)]
pub struct Maze {
    height: u32,
    width: u32,
    cells: Vec<Cell>,
    hero_start: CellCoord,
    opponent_start: CellCoord,
}

/// Items listed by a layout, in row-major order.
pub(crate) type ItemPlacements = Vec<(CellCoord, ItemKind)>;

impl Maze {
    /// Builds a maze from a layout, drawing wall heights from `rng`.
    pub(crate) fn from_spec<R: Rng>(
        spec: &LevelSpec,
        rng: &mut R,
    ) -> Result<(Self, ItemPlacements), LoadError> {
        let (height, width) = (spec.height(), spec.width());
        let range = MIN_DIMENSION..=MAX_DIMENSION;
        if !range.contains(&height) || !range.contains(&width) {
            return Err(LoadError::DimensionsOutOfRange { height, width });
        }

        let expected = height as usize * width as usize;
        if spec.codes().len() != expected {
            return Err(LoadError::CellCountMismatch {
                expected,
                found: spec.codes().len(),
            });
        }

        let mut cells = Vec::with_capacity(expected);
        let mut items = Vec::new();
        let mut hero_start = None;
        let mut opponent_start = None;

        for (index, &code) in spec.codes().iter().enumerate() {
            let coord = CellCoord::new((index / width as usize) as u32, (index % width as usize) as u32);
            let Some(decoded) = CellCode::from_code(code) else {
                return Err(LoadError::UnknownCellCode { cell: coord, code });
            };

            let neighbours = hex::hex_neighbours(coord, height, width).collect();
            let mut cell = Cell::new(coord, hex::base_position(coord, height, width), neighbours);
            match decoded {
                CellCode::Hole => cell.visible = false,
                CellCode::Floor => {}
                CellCode::Wall => cell.wall_height = rng.gen_range(1..=3),
                CellCode::HeroStart => hero_start = Some(coord),
                CellCode::OpponentStart => opponent_start = Some(coord),
                CellCode::Item(kind) => items.push((coord, kind)),
            }
            cells.push(cell);
        }

        let hero_start = hero_start.ok_or(LoadError::MissingHeroStart)?;
        let opponent_start = opponent_start.ok_or(LoadError::MissingOpponentStart)?;

        let maze = Self {
            height,
            width,
            cells,
            hero_start,
            opponent_start,
        };
        Ok((maze, items))
    }

    /// Number of cell rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of cell columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Cell the hero was placed on at load.
    #[must_use]
    pub const fn hero_start(&self) -> CellCoord {
        self.hero_start
    }

    /// Cell the opponent was placed on at load.
    #[must_use]
    pub const fn opponent_start(&self) -> CellCoord {
        self.opponent_start
    }

    /// Reports whether `coord` lies inside the maze.
    #[must_use]
    pub const fn contains(&self, coord: CellCoord) -> bool {
        coord.row() < self.height && coord.column() < self.width
    }

    /// Returns the cell at `coord`.
    ///
    /// # Panics
    ///
    /// Panics when `coord` lies outside the maze.
    #[must_use]
    pub fn get_cell(&self, coord: CellCoord) -> &Cell {
        assert!(
            self.contains(coord),
            "cell ({}, {}) is outside the {}x{} maze",
            coord.row(),
            coord.column(),
            self.height,
            self.width
        );
        &self.cells[self.index(coord)]
    }

    /// Returns the cell at `coord`, or `None` when it lies outside the maze.
    #[must_use]
    pub fn cell(&self, coord: CellCoord) -> Option<&Cell> {
        if self.contains(coord) {
            self.cells.get(self.index(coord))
        } else {
            None
        }
    }

    pub(crate) fn cell_mut(&mut self, coord: CellCoord) -> Option<&mut Cell> {
        if self.contains(coord) {
            let index = self.index(coord);
            self.cells.get_mut(index)
        } else {
            None
        }
    }

    /// Iterates over every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Neighbours of `coord`, empty when it lies outside the maze.
    #[must_use]
    pub fn neighbours(&self, coord: CellCoord) -> &[CellCoord] {
        self.cell(coord).map_or(&[][..], Cell::neighbours)
    }

    /// Nearest visible cell hit by `ray` within the viewing distance.
    #[must_use]
    pub fn pick(&self, ray: &Ray) -> Option<CellCoord> {
        self.cells
            .iter()
            .filter(|cell| cell.visible)
            .filter_map(|cell| cell.intersect(ray).map(|distance| (distance, cell.coord)))
            .filter(|(distance, _)| *distance < hex::MAX_PICK_DISTANCE)
            .min_by(|left, right| left.0.total_cmp(&right.0))
            .map(|(_, coord)| coord)
    }

    /// Cells currently flagged selectable.
    #[must_use]
    pub fn selectable_cells(&self) -> Vec<CellCoord> {
        self.cells
            .iter()
            .filter(|cell| cell.selectable)
            .map(Cell::coord)
            .collect()
    }

    pub(crate) fn clear_selectable(&mut self) {
        for cell in &mut self.cells {
            cell.set_selectable(false);
        }
    }

    pub(crate) fn highlight(&mut self, coord: Option<CellCoord>) {
        for cell in &mut self.cells {
            cell.set_highlighted(false);
        }
        if let Some(cell) = coord.and_then(|coord| self.cell_mut(coord)) {
            cell.set_highlighted(true);
        }
    }

    fn index(&self, coord: CellCoord) -> usize {
        coord.row() as usize * self.width as usize + coord.column() as usize
    }
}
