use super::*;

impl<R: RandomSource> RoundState<R> {
    /// Uniform start cell for the player, or the pinned one when valid.
    pub(super) fn pick_player_spawn(
        board: &Board,
        pinned: Option<Position>,
        rng: &mut R,
    ) -> Position {
        if let Some(position) = pinned.filter(|p| board.contains(*p)) {
            return position;
        }
        rng.int(1, board.size() as i32) as Position
    }

    /// Ghost start: uniform among cells at least `min_distance` hops from the
    /// player. Falls back to the farthest cells when the board is too small
    /// for the requested gap.
    pub(super) fn pick_ghost_spawn(
        board: &Board,
        player: Position,
        pinned: Option<Position>,
        min_distance: u32,
        rng: &mut R,
    ) -> Position {
        if let Some(position) = pinned.filter(|p| board.contains(*p) && *p != player) {
            return position;
        }

        let mut candidates: Vec<Position> = board
            .positions()
            .filter(|p| {
                *p != player
                    && board
                        .distance(*p, player)
                        .map(|d| d >= min_distance)
                        .unwrap_or(true)
            })
            .collect();
        if candidates.is_empty() {
            let farthest = board
                .positions()
                .filter_map(|p| board.distance(p, player))
                .max()
                .unwrap_or(0);
            candidates = board
                .positions()
                .filter(|p| *p != player && board.distance(*p, player) == Some(farthest))
                .collect();
        }
        if candidates.is_empty() {
            return player;
        }
        candidates[rng.pick_index(candidates.len())]
    }

    /// Relocates the ghost after a respawn: uniform over every cell except
    /// the player's.
    pub(super) fn respawn_ghost(&mut self) -> Position {
        let player = self.player_position;
        let candidates: Vec<Position> =
            self.board.positions().filter(|p| *p != player).collect();
        if candidates.is_empty() {
            return self.ghost_position;
        }
        self.ghost_position = candidates[self.rng.pick_index(candidates.len())];
        self.ghost_position
    }
}
