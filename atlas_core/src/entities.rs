//! Overlay entity records and the index-addressed lists that hold them.

use serde::{Deserialize, Serialize};

use crate::{geometry::Point, pack::CellId};

pub type EntityId = u16;

/// Record addressed by a stable index. Deletion is soft: the slot stays and
/// `removed` is raised.
pub trait Entity {
    fn index(&self) -> EntityId;
    fn is_removed(&self) -> bool;
    /// Raise `removed` and clear any lock.
    fn mark_removed(&mut self);
}

/// Entity with a representative centre cell.
pub trait Centered: Entity {
    fn center(&self) -> Option<CellId>;
    fn set_center(&mut self, cell: CellId);
}

macro_rules! impl_entity {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Entity for $ty {
                fn index(&self) -> EntityId {
                    self.i
                }

                fn is_removed(&self) -> bool {
                    self.removed
                }

                fn mark_removed(&mut self) {
                    self.removed = true;
                    self.lock = false;
                }
            }
        )+
    };
}

macro_rules! impl_centered {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Centered for $ty {
                fn center(&self) -> Option<CellId> {
                    self.center
                }

                fn set_center(&mut self, cell: CellId) {
                    self.center = Some(cell);
                }
            }
        )+
    };
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Culture {
    pub i: EntityId,
    pub name: String,
    pub center: Option<CellId>,
    pub color: Option<String>,
    pub removed: bool,
    pub lock: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Religion {
    pub i: EntityId,
    pub name: String,
    pub center: Option<CellId>,
    pub culture: EntityId,
    pub removed: bool,
    pub lock: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Regiment {
    pub i: u16,
    pub name: String,
    pub cell: CellId,
    pub x: f64,
    pub y: f64,
    /// Home base.
    pub bx: f64,
    pub by: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct State {
    pub i: EntityId,
    pub name: String,
    /// Capital burg, `0` when the state has none.
    pub capital: EntityId,
    pub center: Option<CellId>,
    pub pole: Option<Point>,
    pub neighbors: Vec<EntityId>,
    pub military: Vec<Regiment>,
    pub removed: bool,
    pub lock: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Province {
    pub i: EntityId,
    pub name: String,
    pub state: EntityId,
    /// Capital burg, `0` when the province has none.
    pub burg: EntityId,
    pub center: Option<CellId>,
    pub pole: Option<Point>,
    pub removed: bool,
    pub lock: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Burg {
    pub i: EntityId,
    pub name: String,
    pub cell: CellId,
    pub x: f64,
    pub y: f64,
    pub population: f64,
    pub state: EntityId,
    pub culture: EntityId,
    pub capital: bool,
    /// Feature id of the water body the port opens to, `0` for inland burgs.
    pub port: u16,
    pub removed: bool,
    pub lock: bool,
}

impl Burg {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct River {
    pub i: EntityId,
    pub name: String,
    pub source: CellId,
    pub mouth: CellId,
    /// River this one flows into, `0` for main stems.
    pub parent: EntityId,
    pub basin: EntityId,
    pub cells: Vec<CellId>,
    pub points: Vec<Point>,
    pub width_factor: f64,
    pub length: f64,
    pub removed: bool,
    pub lock: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub point: Point,
    pub cell: CellId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Route {
    pub i: EntityId,
    pub group: String,
    pub feature: u16,
    pub points: Vec<RoutePoint>,
    pub removed: bool,
    pub lock: bool,
}

/// Point of interest. Markers have no soft delete; a marker leaving the map
/// is dropped from the list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Marker {
    pub i: u32,
    pub kind: String,
    pub x: f64,
    pub y: f64,
    pub cell: CellId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Zone {
    pub i: u32,
    pub name: String,
    pub kind: String,
    pub cells: Vec<CellId>,
    pub hidden: bool,
}

impl_entity!(Culture, Religion, State, Province, Burg, River, Route);
impl_centered!(Culture, Religion, State, Province);

/// Entity arena where slot `n` always holds the entity with `i == n`.
/// Slot `0` is the sentinel ("no entity").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityList<T> {
    items: Vec<T>,
}

impl<T> Default for EntityList<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> EntityList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.items.get(id as usize)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        self.items.get_mut(id as usize)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    /// Non-sentinel entities that are not removed.
    pub fn active(&self) -> impl Iterator<Item = &T> {
        self.items
            .iter()
            .filter(|item| item.index() != 0 && !item.is_removed())
    }

    pub fn active_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items
            .iter_mut()
            .filter(|item| item.index() != 0 && !item.is_removed())
    }

    pub fn is_active(&self, id: EntityId) -> bool {
        id != 0 && self.get(id).is_some_and(|item| !item.is_removed())
    }

    /// First slot whose stored index disagrees with its position.
    pub fn misplaced(&self) -> Option<(usize, EntityId)> {
        self.items
            .iter()
            .enumerate()
            .find(|(pos, item)| item.index() as usize != *pos)
            .map(|(pos, item)| (pos, item.index()))
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: Entity> FromIterator<T> for EntityList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a EntityList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
