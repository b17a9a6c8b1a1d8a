use std::collections::HashSet;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::GRID_CELLS;

/// Number of rooms on the playfield.
pub const ROOM_COUNT: usize = 5;

/// Identifies one of the five fixed rooms: four corner rooms and one in the
/// middle of the 14x14 playfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomId {
    UpperLeft,
    UpperRight,
    LowerLeft,
    LowerRight,
    Middle,
}

impl RoomId {
    /// All rooms, in the fixed iteration order used when opening doorways.
    pub const ALL: [RoomId; ROOM_COUNT] = [
        RoomId::UpperLeft,
        RoomId::UpperRight,
        RoomId::LowerLeft,
        RoomId::LowerRight,
        RoomId::Middle,
    ];
}

/// Static geometry of a single room.
///
/// `door_gaps` maps each wall cell that can serve as a doorway to the pair
/// of cells on either side of it; both must be cleared to floor when the
/// gap is opened.
#[derive(Debug, Clone, Copy)]
pub struct Room {
    pub wall_idxs: &'static [usize],
    pub inner_idxs: &'static [usize],
    pub door_gaps: &'static [(usize, [usize; 2])],
}

impl Room {
    /// Looks up the pair of cells adjacent to a given door gap.
    pub fn gap_adjacent(&self, gap: usize) -> Option<[usize; 2]> {
        self.door_gaps
            .iter()
            .find(|(idx, _)| *idx == gap)
            .map(|(_, adjacent)| *adjacent)
    }

    /// True if `idx` lies in this room's interior.
    pub fn contains_inner(&self, idx: usize) -> bool {
        self.inner_idxs.contains(&idx)
    }
}

const UPPER_LEFT: Room = Room {
    wall_idxs: &[4, 18, 32, 45, 56, 57, 58],
    inner_idxs: &[0, 1, 2, 14, 15, 16, 28, 29, 30, 31, 44],
    door_gaps: &[(4, [3, 5]), (18, [17, 19]), (56, [42, 70]), (57, [43, 71])],
};

const UPPER_RIGHT: Room = Room {
    wall_idxs: &[9, 23, 37, 52, 67, 68, 69],
    inner_idxs: &[11, 12, 13, 25, 26, 27, 38, 39, 40, 41, 53],
    door_gaps: &[(9, [8, 10]), (23, [22, 24]), (68, [54, 82]), (69, [55, 83])],
};

const LOWER_LEFT: Room = Room {
    wall_idxs: &[126, 127, 128, 143, 158, 172, 186],
    inner_idxs: &[142, 154, 155, 156, 157, 168, 169, 170, 182, 183, 184],
    door_gaps: &[
        (126, [112, 140]),
        (127, [113, 141]),
        (172, [171, 173]),
        (186, [185, 187]),
    ],
};

const LOWER_RIGHT: Room = Room {
    wall_idxs: &[137, 138, 139, 150, 163, 177, 191],
    inner_idxs: &[151, 164, 165, 166, 167, 179, 180, 181, 193, 194, 195],
    door_gaps: &[
        (138, [124, 152]),
        (139, [125, 153]),
        (177, [176, 178]),
        (191, [190, 192]),
    ],
};

const MIDDLE: Room = Room {
    wall_idxs: &[62, 63, 75, 78, 88, 93, 102, 107, 117, 120, 132, 133],
    inner_idxs: &[90, 91, 104, 105],
    door_gaps: &[
        (62, [48, 76]),
        (63, [49, 77]),
        (88, [87, 89]),
        (93, [92, 94]),
        (102, [101, 103]),
        (107, [106, 108]),
        (132, [118, 146]),
        (133, [119, 147]),
    ],
};

/// Structural connective cells between rooms. They stay floor but are never
/// eligible for item or agent placement.
pub const CORRIDOR_IDXS: [usize; 28] = [
    46, 47, 59, 60, 61, 73, 74, 50, 51, 64, 65, 66, 79, 80, 115, 116, 129, 130, 131, 144, 145,
    121, 122, 134, 135, 136, 148, 149,
];

/// The full room layout, plus the derived pool of cells reserved by no room.
#[derive(Debug)]
pub struct RoomTopology {
    rooms: [Room; ROOM_COUNT],
    non_reserved: Vec<usize>,
}

impl RoomTopology {
    fn build() -> Self {
        let rooms = [UPPER_LEFT, UPPER_RIGHT, LOWER_LEFT, LOWER_RIGHT, MIDDLE];

        let mut reserved = HashSet::new();
        for room in &rooms {
            reserved.extend(room.wall_idxs.iter().copied());
            reserved.extend(room.inner_idxs.iter().copied());
            for &(gap, adjacent) in room.door_gaps {
                reserved.insert(gap);
                reserved.extend(adjacent);
            }
        }
        debug_assert!(
            reserved.iter().all(|&idx| idx < GRID_CELLS),
            "room geometry references a cell outside the grid"
        );
        let non_reserved = (0..GRID_CELLS).filter(|idx| !reserved.contains(idx)).collect();

        RoomTopology {
            rooms,
            non_reserved,
        }
    }

    /// Returns the static geometry of a room.
    pub fn room(&self, id: RoomId) -> &Room {
        match id {
            RoomId::UpperLeft => &self.rooms[0],
            RoomId::UpperRight => &self.rooms[1],
            RoomId::LowerLeft => &self.rooms[2],
            RoomId::LowerRight => &self.rooms[3],
            RoomId::Middle => &self.rooms[4],
        }
    }

    /// Cells not claimed by any room's walls, interior, or doorway
    /// neighborhoods. These host corridors and generic floor decoration.
    pub fn non_reserved(&self) -> &[usize] {
        &self.non_reserved
    }

    /// The room whose interior contains `idx`, if any.
    pub fn room_of_inner(&self, idx: usize) -> Option<RoomId> {
        RoomId::ALL
            .into_iter()
            .find(|&id| self.room(id).contains_inner(idx))
    }
}

/// The room topology, built once at first use and treated as read-only
/// configuration from then on.
pub static TOPOLOGY: LazyLock<RoomTopology> = LazyLock::new(RoomTopology::build);
