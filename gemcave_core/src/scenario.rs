use std::collections::HashSet;

use rand::{
    Rng, SeedableRng,
    rngs::StdRng,
    seq::{IndexedRandom, SliceRandom},
};
use serde::{Deserialize, Serialize};

use crate::{
    GRID_HEIGHT, GRID_WIDTH, KeyColor,
    map::GridMap,
    rooms::{CORRIDOR_IDXS, RoomId, TOPOLOGY},
    tile::Tile,
};

/// Probability that a non-wall cell of the base map is dirt.
pub const DIRT_PROBABILITY: f64 = 0.1;
/// Probability that an opened doorway is decorated with a cosmetic open gate.
const OPEN_GATE_PROBABILITY: f64 = 0.75;
/// Probability that a decoy key is placed alongside the agent and exit.
const DECOY_KEY_PROBABILITY: f64 = 0.5;

/// Represents errors that can occur while constructing a scenario.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenError {
    #[error(
        "seed {seed}: placement needs {requested} free cells but only {available} remain unblocked"
    )]
    Exhausted {
        seed: u64,
        requested: usize,
        available: usize,
    },
}

/// Selects how keys, gates, and rewards are wired together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// One diamond behind a single locked gate; the key sits in another room.
    SingleGate,
    /// A dependency chain of three locked gates, each key one room deeper.
    ThreeKeyChain,
    /// The single-gate layout plus extra diamonds scattered in the open.
    MultiReward,
}

impl Strategy {
    /// Number of diamonds a scenario of this strategy contains.
    pub fn num_diamonds(self) -> usize {
        match self {
            Strategy::MultiReward => 4,
            _ => 1,
        }
    }

    /// Length of the locked-gate chain.
    fn chain_len(self) -> usize {
        match self {
            Strategy::ThreeKeyChain => 3,
            _ => 1,
        }
    }

    /// Whether final placement may drop a decoy key of an unused color.
    fn places_decoy(self) -> bool {
        !matches!(self, Strategy::ThreeKeyChain)
    }
}

/// The final output unit: one generated level, ready for serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub width: usize,
    pub height: usize,
    pub num_diamonds: usize,
    pub map: GridMap,
}

impl ScenarioRecord {
    /// Serializes the record as one pipe-delimited dataset line:
    /// `width|height|num_diamonds|` followed by every cell code zero-padded
    /// to two digits, with no trailing pipe.
    pub fn to_line(&self) -> String {
        let cells: Vec<String> = self
            .map
            .iter()
            .map(|tile| format!("{:02}", tile.code()))
            .collect();
        format!(
            "{}|{}|{}|{}",
            self.width,
            self.height,
            self.num_diamonds,
            cells.join("|")
        )
    }
}

/// Generates one scenario for the given seed.
///
/// Each call owns its grid, blocked set, and RNG; two calls with the same
/// seed and strategy produce identical records.
pub fn generate(seed: u64, strategy: Strategy) -> Result<ScenarioRecord, GenError> {
    ScenarioBuilder::new(seed).run(strategy)
}

/// Construction context for a single generation run.
///
/// Owns the grid under construction, the set of cells already committed to
/// a placement, and the run's RNG. The blocked set only ever grows; it is
/// discarded with the builder once the record is produced.
pub struct ScenarioBuilder {
    seed: u64,
    map: GridMap,
    blocked: HashSet<usize>,
    rng: StdRng,
}

impl ScenarioBuilder {
    /// Builds the base map for `seed`: room walls stamped and blocked,
    /// corridor cells blocked but left as floor, and every non-wall cell
    /// resampled as dirt with probability [`DIRT_PROBABILITY`].
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut map = GridMap::new(GRID_WIDTH, GRID_HEIGHT);
        let mut blocked = HashSet::new();

        for id in RoomId::ALL {
            for &idx in TOPOLOGY.room(id).wall_idxs {
                map[idx] = Tile::Wall;
                blocked.insert(idx);
            }
        }
        blocked.extend(CORRIDOR_IDXS);

        for idx in 0..map.len() {
            if map[idx] != Tile::Wall && rng.random_bool(DIRT_PROBABILITY) {
                map[idx] = Tile::Dirt;
            }
        }

        ScenarioBuilder {
            seed,
            map,
            blocked,
            rng,
        }
    }

    /// Applies one strategy to the base map and assembles the record.
    ///
    /// All three strategies share the same pipeline: thread a locked-gate
    /// chain across a shuffled room order, open the remaining rooms, then
    /// sample the final free-cell placements.
    pub fn run(mut self, strategy: Strategy) -> Result<ScenarioRecord, GenError> {
        let mut room_order = RoomId::ALL.to_vec();
        room_order.shuffle(&mut self.rng);
        let mut color_pool = KeyColor::ALL.to_vec();
        color_pool.shuffle(&mut self.rng);

        let chain_len = strategy.chain_len();
        let reward_room = room_order[0];

        // Thread the chain: room k in the shuffled order is locked with
        // color k and holds the item the previous link needs (the diamond
        // for the reward room, otherwise the key one step closer to it).
        // The last key's room is left unlocked so the chain has an entry.
        let mut chain_colors = Vec::with_capacity(chain_len);
        self.seal_room(reward_room);
        chain_colors.push(self.lock_room(reward_room, &mut color_pool));
        self.place_in_room(reward_room, Tile::Diamond);
        for step in 1..=chain_len {
            let key_room = room_order[step];
            self.place_in_room(key_room, Tile::Key(chain_colors[step - 1]));
            if step < chain_len {
                self.seal_room(key_room);
                chain_colors.push(self.lock_room(key_room, &mut color_pool));
            }
        }

        // Open a doorway into every room outside the locked chain.
        let locked_rooms = &room_order[..chain_len];
        for room in RoomId::ALL {
            if locked_rooms.contains(&room) {
                continue;
            }
            self.open_room(room, &mut color_pool);
        }

        let num_diamonds = strategy.num_diamonds();
        if num_diamonds > 1 {
            for idx in self.sample_free(num_diamonds - 1)? {
                self.map[idx] = Tile::Diamond;
                self.blocked.insert(idx);
            }
        }

        self.place_agent_and_exit(strategy, chain_colors[0])?;

        Ok(ScenarioRecord {
            width: self.map.width(),
            height: self.map.height(),
            num_diamonds,
            map: self.map,
        })
    }

    /// Marks a room's interior and doorway neighborhoods as ineligible for
    /// later random placement.
    fn seal_room(&mut self, room: RoomId) {
        let room = TOPOLOGY.room(room);
        self.blocked.extend(room.inner_idxs.iter().copied());
        for &(_, adjacent) in room.door_gaps {
            self.blocked.extend(adjacent);
        }
    }

    /// Places a locked gate on one of the room's door gaps, chosen
    /// uniformly, and clears the two cells flanking it so the gate is the
    /// only thing standing in the way. Returns the gate's color, drawn from
    /// the shuffled pool.
    fn lock_room(&mut self, room: RoomId, color_pool: &mut Vec<KeyColor>) -> KeyColor {
        let color = color_pool
            .pop()
            .expect("four colors cover a chain of at most three gates");
        let room = TOPOLOGY.room(room);
        let &(gap, adjacent) = room
            .door_gaps
            .choose(&mut self.rng)
            .expect("every room has at least one door gap");
        self.map[gap] = Tile::GateClosed(color);
        for idx in adjacent {
            self.map[idx] = Tile::Empty;
        }
        color
    }

    /// Puts `tile` on a uniformly chosen interior cell of the room and
    /// blocks that cell. Returns the chosen index.
    fn place_in_room(&mut self, room: RoomId, tile: Tile) -> usize {
        let idx = *TOPOLOGY
            .room(room)
            .inner_idxs
            .choose(&mut self.rng)
            .expect("every room has interior cells");
        self.map[idx] = tile;
        self.blocked.insert(idx);
        idx
    }

    /// Opens a doorway into the room: one gap chosen uniformly, its
    /// flanking cells cleared and blocked. The gap itself becomes plain
    /// floor, or a cosmetic open gate of a still-unused color while the
    /// pool lasts.
    fn open_room(&mut self, room: RoomId, color_pool: &mut Vec<KeyColor>) {
        let room = TOPOLOGY.room(room);
        let &(gap, adjacent) = room
            .door_gaps
            .choose(&mut self.rng)
            .expect("every room has at least one door gap");
        for idx in adjacent {
            self.map[idx] = Tile::Empty;
            self.blocked.insert(idx);
        }
        self.map[gap] = if self.rng.random_bool(OPEN_GATE_PROBABILITY) {
            match color_pool.pop() {
                Some(color) => Tile::GateOpen(color),
                None => Tile::Empty,
            }
        } else {
            Tile::Empty
        };
    }

    /// Samples the agent and exit (and, for decoy-eligible strategies, a
    /// possible decoy key of a non-functional color) from the cells still
    /// outside the blocked set, without replacement.
    fn place_agent_and_exit(
        &mut self,
        strategy: Strategy,
        gate_color: KeyColor,
    ) -> Result<(), GenError> {
        let wanted = if strategy.places_decoy() { 3 } else { 2 };
        let picks = self.sample_free(wanted)?;
        self.map[picks[0]] = Tile::Agent;
        self.map[picks[1]] = Tile::ExitClosed;
        if strategy.places_decoy() && self.rng.random_bool(DECOY_KEY_PROBABILITY) {
            let others: Vec<KeyColor> = KeyColor::ALL
                .into_iter()
                .filter(|&color| color != gate_color)
                .collect();
            let decoy = *others
                .choose(&mut self.rng)
                .expect("three non-functional colors remain");
            self.map[picks[2]] = Tile::Key(decoy);
        }
        Ok(())
    }

    /// Draws `count` distinct cell indices from the complement of the
    /// blocked set. Fails rather than truncating when fewer cells remain.
    fn sample_free(&mut self, count: usize) -> Result<Vec<usize>, GenError> {
        let free: Vec<usize> = (0..self.map.len())
            .filter(|idx| !self.blocked.contains(idx))
            .collect();
        if free.len() < count {
            return Err(GenError::Exhausted {
                seed: self.seed,
                requested: count,
                available: free.len(),
            });
        }
        Ok(free.choose_multiple(&mut self.rng, count).copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GRID_CELLS;

    const STRATEGIES: [Strategy; 3] = [
        Strategy::SingleGate,
        Strategy::ThreeKeyChain,
        Strategy::MultiReward,
    ];

    fn closed_gates(record: &ScenarioRecord) -> Vec<(usize, KeyColor)> {
        record
            .map
            .iter()
            .enumerate()
            .filter_map(|(idx, tile)| match tile {
                Tile::GateClosed(color) => Some((idx, *color)),
                _ => None,
            })
            .collect()
    }

    fn keys(record: &ScenarioRecord) -> Vec<(usize, KeyColor)> {
        record
            .map
            .iter()
            .enumerate()
            .filter_map(|(idx, tile)| match tile {
                Tile::Key(color) => Some((idx, *color)),
                _ => None,
            })
            .collect()
    }

    /// The room whose perimeter carries the given gate cell.
    fn gated_room(gate_idx: usize) -> RoomId {
        RoomId::ALL
            .into_iter()
            .find(|&id| TOPOLOGY.room(id).gap_adjacent(gate_idx).is_some())
            .expect("closed gates only appear on room door gaps")
    }

    #[test]
    fn base_map_stamps_walls_and_blocks_corridors() {
        let builder = ScenarioBuilder::new(0);
        for id in RoomId::ALL {
            for &idx in TOPOLOGY.room(id).wall_idxs {
                assert_eq!(builder.map[idx], Tile::Wall);
                assert!(builder.blocked.contains(&idx));
            }
        }
        for idx in CORRIDOR_IDXS {
            assert!(builder.blocked.contains(&idx));
            assert_ne!(builder.map[idx], Tile::Wall, "corridor {idx} walled over");
        }
    }

    #[test]
    fn base_map_dirt_ratio_is_plausible() {
        // p = 0.1 over ~161 non-wall cells; a per-seed count far outside
        // [1, 60] would mean the weighting is wrong.
        for seed in 0..20 {
            let builder = ScenarioBuilder::new(seed);
            let dirt = builder.map.count(Tile::Dirt);
            assert!((1..=60).contains(&dirt), "seed {seed}: {dirt} dirt cells");
        }
    }

    #[test]
    fn grid_has_full_size_and_valid_codes() {
        for strategy in STRATEGIES {
            for seed in 0..40 {
                let record = generate(seed, strategy).unwrap();
                assert_eq!(record.map.len(), GRID_CELLS);
                for (idx, tile) in record.map.iter().enumerate() {
                    assert_eq!(
                        Tile::from_code(tile.code()),
                        Some(*tile),
                        "seed {seed} cell {idx} holds an invalid code"
                    );
                }
            }
        }
    }

    #[test]
    fn exactly_one_agent_and_one_closed_exit() {
        for strategy in STRATEGIES {
            for seed in 0..40 {
                let record = generate(seed, strategy).unwrap();
                assert_eq!(record.map.count(Tile::Agent), 1, "seed {seed}");
                assert_eq!(record.map.count(Tile::ExitClosed), 1, "seed {seed}");
                assert_eq!(record.map.count(Tile::ExitOpen), 0, "seed {seed}");
            }
        }
    }

    #[test]
    fn single_gate_key_is_never_locked_behind_its_own_gate() {
        for strategy in [Strategy::SingleGate, Strategy::MultiReward] {
            for seed in 0..60 {
                let record = generate(seed, strategy).unwrap();
                let gates = closed_gates(&record);
                assert_eq!(gates.len(), 1, "seed {seed}: expected one locked gate");
                let (gate_idx, gate_color) = gates[0];
                let reward_room = gated_room(gate_idx);

                let matching: Vec<usize> = keys(&record)
                    .into_iter()
                    .filter(|&(_, color)| color == gate_color)
                    .map(|(idx, _)| idx)
                    .collect();
                assert_eq!(matching.len(), 1, "seed {seed}: functional key count");
                assert!(
                    !TOPOLOGY.room(reward_room).contains_inner(matching[0]),
                    "seed {seed}: key sits inside the room its color gates"
                );
            }
        }
    }

    #[test]
    fn decoy_key_never_matches_the_functional_gate() {
        for seed in 0..60 {
            let record = generate(seed, Strategy::SingleGate).unwrap();
            let (_, gate_color) = closed_gates(&record)[0];
            let key_colors: Vec<KeyColor> =
                keys(&record).into_iter().map(|(_, color)| color).collect();
            assert!(key_colors.len() <= 2, "seed {seed}: too many keys");
            assert_eq!(
                key_colors
                    .iter()
                    .filter(|&&color| color == gate_color)
                    .count(),
                1,
                "seed {seed}"
            );
        }
    }

    #[test]
    fn three_key_chain_is_distinct_and_acyclic() {
        for seed in 0..60 {
            let record = generate(seed, Strategy::ThreeKeyChain).unwrap();
            let gates = closed_gates(&record);
            assert_eq!(gates.len(), 3, "seed {seed}: expected three locked gates");

            let colors: HashSet<KeyColor> = gates.iter().map(|&(_, color)| color).collect();
            assert_eq!(colors.len(), 3, "seed {seed}: gate colors not distinct");

            // Every gate's key exists exactly once and sits outside the room
            // that gate locks; exactly one key room is itself unlocked, so
            // the dependency graph is a path, not a cycle.
            let locked_rooms: HashSet<RoomId> =
                gates.iter().map(|&(idx, _)| gated_room(idx)).collect();
            assert_eq!(locked_rooms.len(), 3, "seed {seed}: a room locked twice");

            let mut unlocked_key_rooms = 0;
            for &(gate_idx, gate_color) in &gates {
                let matching: Vec<usize> = keys(&record)
                    .into_iter()
                    .filter(|&(_, color)| color == gate_color)
                    .map(|(idx, _)| idx)
                    .collect();
                assert_eq!(matching.len(), 1, "seed {seed}: key count for gate");
                let key_room = TOPOLOGY
                    .room_of_inner(matching[0])
                    .expect("chain keys are placed in room interiors");
                assert_ne!(
                    key_room,
                    gated_room(gate_idx),
                    "seed {seed}: key locked behind its own gate"
                );
                if !locked_rooms.contains(&key_room) {
                    unlocked_key_rooms += 1;
                }
            }
            assert_eq!(unlocked_key_rooms, 1, "seed {seed}: chain has no open end");
            assert_eq!(record.map.count(Tile::Diamond), 1, "seed {seed}");
        }
    }

    #[test]
    fn multi_reward_places_the_declared_diamond_count() {
        for seed in 0..60 {
            let record = generate(seed, Strategy::MultiReward).unwrap();
            assert_eq!(record.num_diamonds, 4);
            assert_eq!(
                record.map.count(Tile::Diamond),
                record.num_diamonds,
                "seed {seed}"
            );
        }
    }

    #[test]
    fn same_seed_yields_identical_output() {
        for strategy in STRATEGIES {
            let a = generate(42, strategy).unwrap();
            let b = generate(42, strategy).unwrap();
            assert_eq!(a, b);
            assert_eq!(a.to_line(), b.to_line());
        }
    }

    #[test]
    fn distinct_seeds_vary() {
        let lines: HashSet<String> = (0..20)
            .map(|seed| generate(seed, Strategy::SingleGate).unwrap().to_line())
            .collect();
        assert!(lines.len() >= 19, "only {} distinct lines", lines.len());
    }

    #[test]
    fn dataset_line_format_default_mode() {
        let line = generate(0, Strategy::SingleGate).unwrap().to_line();
        assert!(line.starts_with("14|14|1|"), "line: {line}");
        assert!(!line.ends_with('|'));

        let cells: Vec<&str> = line.split('|').skip(3).collect();
        assert_eq!(cells.len(), GRID_CELLS);
        assert!(cells.iter().all(|cell| cell.len() == 2));
        assert_eq!(cells.iter().filter(|&&cell| cell == "00").count(), 1);
        assert_eq!(cells.iter().filter(|&&cell| cell == "07").count(), 1);
        assert!(cells.iter().any(|&cell| cell == "05"));

        let gate_cells: Vec<&str> = cells
            .iter()
            .copied()
            .filter(|cell| matches!(*cell, "27" | "30" | "33" | "36"))
            .collect();
        assert_eq!(gate_cells.len(), 1);
        let key_code = format!("{}", gate_cells[0].parse::<u8>().unwrap() + 2);
        assert!(
            cells.iter().any(|&cell| cell == key_code),
            "no key {key_code} for gate {}",
            gate_cells[0]
        );
    }

    #[test]
    fn dataset_line_format_hard_mode() {
        let line = generate(0, Strategy::MultiReward).unwrap().to_line();
        assert!(line.starts_with("14|14|4|"), "line: {line}");
        let cells: Vec<&str> = line.split('|').skip(3).collect();
        assert_eq!(cells.iter().filter(|&&cell| cell == "05").count(), 4);
    }

    #[test]
    fn sampling_exhaustion_is_a_structured_error() {
        let mut builder = ScenarioBuilder::new(9);
        builder.blocked.extend(0..GRID_CELLS);
        let err = builder.sample_free(3).unwrap_err();
        assert_eq!(
            err,
            GenError::Exhausted {
                seed: 9,
                requested: 3,
                available: 0
            }
        );
        assert!(err.to_string().contains("seed 9"));
    }
}
