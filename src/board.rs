use std::collections::VecDeque;

use crate::constants::BOARD_SIDE;
use crate::types::Position;

/// The play field: `side * side` cells numbered from 1, row-major.
///
/// Moves from `p` are generated as `p+1`, `p-1`, `p+5`, `p-5` and the
/// down-left diagonal `p+4`, dropping anything off the board or wrapping
/// across a row edge. The adjacency lists hold the symmetric closure of those
/// moves, so the diagonal is walkable in both directions.
#[derive(Clone, Debug)]
pub struct Board {
    side: u8,
    adjacency: Vec<Vec<Position>>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self::with_side(BOARD_SIDE)
    }

    pub fn with_side(side: u8) -> Self {
        let side = side.clamp(2, 15);
        let size = side as usize * side as usize;
        let mut adjacency: Vec<Vec<Position>> = vec![Vec::new(); size + 1];

        for index in 0..size {
            let from = (index + 1) as Position;
            for to in generated_moves(side, from) {
                link(&mut adjacency, from, to);
                link(&mut adjacency, to, from);
            }
        }
        for neighbors in &mut adjacency {
            neighbors.sort_unstable();
            neighbors.dedup();
        }

        Self { side, adjacency }
    }

    pub fn size(&self) -> u8 {
        self.side * self.side
    }

    pub fn contains(&self, position: Position) -> bool {
        position >= 1 && position <= self.size()
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> {
        1..=self.size()
    }

    /// Legal moves from `position`, ascending. Empty off the board.
    pub fn neighbors(&self, position: Position) -> &[Position] {
        if !self.contains(position) {
            return &[];
        }
        &self.adjacency[position as usize]
    }

    pub fn is_adjacent(&self, from: Position, to: Position) -> bool {
        self.neighbors(from).contains(&to)
    }

    /// Hop count between `a` and `b`; `None` when unreachable.
    pub fn distance(&self, a: Position, b: Position) -> Option<u32> {
        if !self.contains(a) || !self.contains(b) {
            return None;
        }
        self.distances_from(b)[a as usize]
    }

    /// First hop of a shortest path from `from` toward `to`, preferring the
    /// lowest-numbered cell among equally short options. Stays on `from`
    /// when already there or when `to` cannot be reached.
    pub fn shortest_next_step(&self, from: Position, to: Position) -> Position {
        if from == to || !self.contains(from) || !self.contains(to) {
            return from;
        }
        let distances = self.distances_from(to);
        let Some(remaining) = distances[from as usize] else {
            return from;
        };
        self.neighbors(from)
            .iter()
            .copied()
            .find(|next| distances[*next as usize] == Some(remaining - 1))
            .unwrap_or(from)
    }

    /// BFS distances from `origin`, indexed by position (slot 0 unused).
    fn distances_from(&self, origin: Position) -> Vec<Option<u32>> {
        let mut out = vec![None; self.adjacency.len()];
        let mut queue = VecDeque::new();
        out[origin as usize] = Some(0);
        queue.push_back(origin);

        while let Some(current) = queue.pop_front() {
            let Some(depth) = out[current as usize] else {
                continue;
            };
            for &next in &self.adjacency[current as usize] {
                if out[next as usize].is_none() {
                    out[next as usize] = Some(depth + 1);
                    queue.push_back(next);
                }
            }
        }

        out
    }
}

fn generated_moves(side: u8, from: Position) -> Vec<Position> {
    let side = side as i32;
    let size = side * side;
    let p = from as i32;
    let col = (p - 1) % side;
    let mut out = Vec::with_capacity(5);

    if col < side - 1 {
        out.push(p + 1);
    }
    if col > 0 {
        out.push(p - 1);
    }
    out.push(p + side);
    out.push(p - side);
    if col > 0 {
        out.push(p + side - 1);
    }

    out.into_iter()
        .filter(|candidate| *candidate >= 1 && *candidate <= size)
        .map(|candidate| candidate as Position)
        .collect()
}

fn link(adjacency: &mut [Vec<Position>], from: Position, to: Position) {
    adjacency[from as usize].push(to);
}
