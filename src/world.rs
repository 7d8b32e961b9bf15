//! World descriptors
//!
//! A world is a themed campaign of waves. Clearing the last wave of a world
//! unlocks the next one in [`WORLDS`].

use serde::Serialize;

/// Palette handed to renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorldColors {
    pub bg: &'static str,
    pub floor: &'static str,
    pub grid: &'static str,
    pub wall: &'static str,
    pub wall_top: &'static str,
    pub wall_shadow: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct World {
    pub id: &'static str,
    pub name: &'static str,
    /// Waves to clear before victory
    pub waves: u32,
    /// Informational; enemy scaling is driven by the wave number alone
    pub difficulty_offset: u32,
    pub colors: WorldColors,
}

pub const WORLDS: [World; 4] = [
    World {
        id: "tech",
        name: "CYBER SECTOR",
        waves: 30,
        difficulty_offset: 0,
        colors: WorldColors {
            bg: "#111",
            floor: "#222",
            grid: "#333",
            wall: "#34495e",
            wall_top: "#ecf0f1",
            wall_shadow: "#2c3e50",
        },
    },
    World {
        id: "magma",
        name: "MAGMA CORE",
        waves: 30,
        difficulty_offset: 30,
        colors: WorldColors {
            bg: "#1a0505",
            floor: "#2c0e0e",
            grid: "#e74c3c",
            wall: "#c0392b",
            wall_top: "#f1c40f",
            wall_shadow: "#7f2c2c",
        },
    },
    World {
        id: "ice",
        name: "FROZEN WASTE",
        waves: 30,
        difficulty_offset: 60,
        colors: WorldColors {
            bg: "#05101a",
            floor: "#0e1a2c",
            grid: "#3498db",
            wall: "#2980b9",
            wall_top: "#ecf0f1",
            wall_shadow: "#1a5276",
        },
    },
    World {
        id: "void",
        name: "THE VOID",
        waves: 9999,
        difficulty_offset: 90,
        colors: WorldColors {
            bg: "#05000a",
            floor: "#0a0014",
            grid: "#8e44ad",
            wall: "#4b0082",
            wall_top: "#9b59b6",
            wall_shadow: "#26004d",
        },
    },
];

impl Default for World {
    fn default() -> Self {
        WORLDS[0]
    }
}

/// Look up a world by id, falling back to the first world
pub fn world_by_id(id: &str) -> World {
    WORLDS.iter().copied().find(|w| w.id == id).unwrap_or_default()
}

/// The world unlocked by clearing `id`, if any
pub fn next_world(id: &str) -> Option<World> {
    let index = WORLDS.iter().position(|w| w.id == id)?;
    WORLDS.get(index + 1).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_falls_back_to_first() {
        assert_eq!(world_by_id("ice").name, "FROZEN WASTE");
        assert_eq!(world_by_id("atlantis").id, "tech");
        assert_eq!(World::default().waves, 30);
    }

    #[test]
    fn test_next_world_chain() {
        assert_eq!(next_world("tech").map(|w| w.id), Some("magma"));
        assert_eq!(next_world("ice").map(|w| w.id), Some("void"));
        assert_eq!(next_world("void"), None);
        assert_eq!(next_world("atlantis"), None);
    }
}
