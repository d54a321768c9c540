//! Single search worker: iterative deepening over a principal variation
//! search with quiescence, transposition table cutoffs and simple pruning.

use chess::{Board, BoardStatus, ChessMove, MoveGen, Piece, EMPTY};

use super::{IterationInfo, SearchJob, SearchResult};
use crate::engine::time::TimeManager;
use crate::eval::{evaluate, piece_value};
use crate::score::{
    mate_in, mated_in, Value, MAX_PLY, VALUE_DRAW, VALUE_INFINITE, VALUE_MATE, VALUE_MATE_IN_MAX_PLY,
    VALUE_TB_LOSS_IN_MAX_PLY, VALUE_TB_WIN_IN_MAX_PLY, VALUE_ZERO,
};
use crate::sync::StopFlag;
use crate::tt::Bound;

/// Nodes counted locally before they are published and limits are checked.
const NODE_FLUSH_INTERVAL: u64 = 1024;

const MAX_DEPTH: i32 = MAX_PLY - 1;
const PLY_SLOTS: usize = MAX_PLY as usize + 2;

const TT_MOVE_SCORE: i32 = 1 << 30;
const CAPTURE_SCORE: i32 = 1 << 28;
const KILLER_SCORE: i32 = 1 << 26;
const HISTORY_MAX: i32 = 1 << 20;

#[derive(Debug, Clone)]
pub(super) struct RootMove {
    pub mv: ChessMove,
    pub value: Value,
    pub previous_value: Value,
    pub seldepth: i32,
    pub pv: Vec<ChessMove>,
}

impl RootMove {
    fn new(mv: ChessMove) -> Self {
        RootMove {
            mv,
            value: -VALUE_INFINITE,
            previous_value: -VALUE_INFINITE,
            seldepth: 0,
            pv: vec![mv],
        }
    }

    /// Value of the most recent iteration that finished this move.
    fn reported_value(&self) -> Value {
        if self.value == -VALUE_INFINITE {
            self.previous_value
        } else {
            self.value
        }
    }
}

fn value_to_tt(v: Value, ply: i32) -> Value {
    if v >= VALUE_TB_WIN_IN_MAX_PLY {
        v + ply
    } else if v <= VALUE_TB_LOSS_IN_MAX_PLY {
        v - ply
    } else {
        v
    }
}

fn value_from_tt(v: Value, ply: i32) -> Value {
    if v >= VALUE_TB_WIN_IN_MAX_PLY {
        v - ply
    } else if v <= VALUE_TB_LOSS_IN_MAX_PLY {
        v + ply
    } else {
        v
    }
}

fn is_capture(board: &Board, mv: ChessMove) -> bool {
    board.piece_on(mv.get_dest()).is_some()
        || (board.piece_on(mv.get_source()) == Some(Piece::Pawn)
            && mv.get_source().get_file() != mv.get_dest().get_file())
}

fn has_non_pawn_material(board: &Board) -> bool {
    let ours = *board.color_combined(board.side_to_move());
    let pawns_and_king = *board.pieces(Piece::Pawn) | *board.pieces(Piece::King);
    (ours & !pawns_and_king) != EMPTY
}

fn in_check(board: &Board) -> bool {
    *board.checkers() != EMPTY
}

pub(super) struct Worker<'a> {
    id: usize,
    job: &'a SearchJob,
    /// Stops this worker's thread group without touching the session's flag.
    abort: &'a StopFlag,
    time: TimeManager,
    root: Board,
    root_rule50: u32,
    pub(super) root_moves: Vec<RootMove>,
    /// Keys of the game history followed by the current search path.
    keys: Vec<u64>,
    pv: Vec<Vec<ChessMove>>,
    killers: Vec<[Option<ChessMove>; 2]>,
    history: Vec<[i32; 64]>,
    local_nodes: u64,
    pub(super) nodes: u64,
    seldepth: i32,
    pub(super) completed_depth: i32,
}

impl<'a> Worker<'a> {
    pub(super) fn new(id: usize, job: &'a SearchJob, abort: &'a StopFlag) -> Self {
        let state = job.history.current();
        let root = state.board;
        let mut root_moves: Vec<RootMove> = MoveGen::new_legal(&root)
            .filter(|mv| job.limits.searchmoves.is_empty() || job.limits.searchmoves.contains(mv))
            .map(RootMove::new)
            .collect();

        if let Some(tt_move) = job.tt.probe(root.get_hash()).and_then(|e| e.best_move) {
            if let Some(pos) = root_moves.iter().position(|rm| rm.mv == tt_move) {
                root_moves[..=pos].rotate_right(1);
            }
        }
        // Helpers start from a different move order.
        if id > 0 && root_moves.len() > 1 {
            let shift = id % root_moves.len();
            let rest = root_moves.len() - 1;
            root_moves[1..].rotate_left(shift % rest);
        }

        Worker {
            id,
            job,
            abort,
            time: TimeManager::new(&job.limits, root.side_to_move(), &job.config.time),
            root,
            root_rule50: state.rule50,
            root_moves,
            keys: job.history.repetition_keys(),
            pv: vec![Vec::new(); PLY_SLOTS],
            killers: vec![[None; 2]; PLY_SLOTS],
            history: vec![[0; 64]; 64],
            local_nodes: 0,
            nodes: 0,
            seldepth: 0,
            completed_depth: 0,
        }
    }

    fn is_main(&self) -> bool {
        self.id == 0
    }

    #[inline]
    fn stopped(&self) -> bool {
        self.job.signals.stop.is_stopped() || self.abort.is_stopped()
    }

    /// Counts a node; every `NODE_FLUSH_INTERVAL` nodes publishes the count
    /// and lets the main worker enforce node and time limits.
    #[inline]
    fn count_node(&mut self) {
        self.nodes += 1;
        self.local_nodes += 1;
        if self.local_nodes >= NODE_FLUSH_INTERVAL {
            self.flush_nodes();
            if self.is_main() {
                self.check_limits();
            }
        }
    }

    pub(super) fn flush_nodes(&mut self) {
        self.job.signals.add_nodes(self.local_nodes);
        self.local_nodes = 0;
    }

    fn check_limits(&self) {
        let limits = &self.job.limits;
        if limits.nodes > 0 && self.job.signals.nodes() >= limits.nodes {
            self.job.signals.stop.stop();
        }
        if !self.job.signals.is_pondering() && self.time.maximum_reached() {
            self.job.signals.stop.stop();
        }
    }

    /// Runs iterative deepening until a limit or a stop request.
    pub(super) fn run(&mut self) -> SearchResult {
        if self.root_moves.is_empty() {
            return SearchResult::default();
        }

        let limits = &self.job.limits;
        let max_depth = if limits.depth > 0 {
            limits.depth.min(MAX_DEPTH)
        } else {
            MAX_DEPTH
        };
        let multi_pv = self.job.config.multi_pv.clamp(1, self.root_moves.len());

        for depth in 1..=max_depth {
            for rm in &mut self.root_moves {
                rm.previous_value = rm.value;
            }

            let mut finished = true;
            for pv_idx in 0..multi_pv {
                self.seldepth = 0;
                self.search_root(depth, pv_idx);
                self.root_moves[pv_idx..].sort_by(|a, b| {
                    b.value
                        .cmp(&a.value)
                        .then(b.previous_value.cmp(&a.previous_value))
                });
                if self.stopped() {
                    finished = false;
                    break;
                }
            }

            if !finished {
                break;
            }
            self.completed_depth = depth;

            if self.is_main() {
                self.flush_nodes();
                self.report(depth, multi_pv);
                if self.iteration_limit_reached() {
                    self.job.signals.stop.stop();
                }
            }
            if self.stopped() {
                break;
            }
        }

        self.flush_nodes();
        self.result()
    }

    fn iteration_limit_reached(&self) -> bool {
        let limits = &self.job.limits;
        let best = self.root_moves[0].value;
        if limits.mate > 0
            && best >= VALUE_MATE_IN_MAX_PLY
            && VALUE_MATE - best <= limits.mate.saturating_mul(2)
        {
            return true;
        }
        if limits.nodes > 0 && self.job.signals.nodes() >= limits.nodes {
            return true;
        }
        !self.job.signals.is_pondering() && self.time.optimum_reached()
    }

    fn result(&self) -> SearchResult {
        let best = &self.root_moves[0];
        let after = self.root.make_move_new(best.mv);
        let ponder_move = best.pv.get(1).copied().or_else(|| {
            self.job
                .tt
                .probe(after.get_hash())
                .and_then(|e| e.best_move)
                .filter(|&mv| after.legal(mv))
        });
        // No iteration finished a single move: nothing better than a draw score.
        let value = match best.reported_value() {
            v if v == -VALUE_INFINITE => VALUE_ZERO,
            v => v,
        };
        SearchResult {
            best_move: Some(best.mv),
            ponder_move,
            value,
            depth: self.completed_depth,
        }
    }

    fn report(&self, depth: i32, multi_pv: usize) {
        if self.job.on_info.is_none() {
            return;
        }
        let time_ms = self.time.elapsed_ms();
        let nodes = self.job.signals.nodes();
        let hashfull = self.job.tt.hashfull();
        for (i, rm) in self.root_moves.iter().take(multi_pv).enumerate() {
            self.job.report(&IterationInfo {
                depth,
                seldepth: rm.seldepth.max(depth),
                multipv: i + 1,
                value: rm.reported_value(),
                nodes,
                nps: nodes.saturating_mul(1000) / time_ms.max(1),
                hashfull,
                time_ms,
                pv: rm.pv.clone(),
            });
        }
    }

    fn search_root(&mut self, depth: i32, pv_idx: usize) {
        let root = self.root;
        let mut alpha = -VALUE_INFINITE;
        let beta = VALUE_INFINITE;

        for i in pv_idx..self.root_moves.len() {
            self.root_moves[i].value = -VALUE_INFINITE;
        }

        for i in pv_idx..self.root_moves.len() {
            let mv = self.root_moves[i].mv;
            let child = root.make_move_new(mv);
            let rule50 = self.next_rule50(&root, mv, self.root_rule50);
            self.count_node();

            self.keys.push(child.get_hash());
            let value = if i == pv_idx {
                -self.search(&child, depth - 1, 1, -beta, -alpha, true, rule50)
            } else {
                let v = -self.search(&child, depth - 1, 1, -alpha - 1, -alpha, false, rule50);
                if v > alpha && !self.stopped() {
                    -self.search(&child, depth - 1, 1, -beta, -alpha, true, rule50)
                } else {
                    v
                }
            };
            self.keys.pop();

            if self.stopped() {
                return;
            }

            if i == pv_idx || value > alpha {
                let rm = &mut self.root_moves[i];
                rm.value = value;
                rm.seldepth = self.seldepth;
                rm.pv.clear();
                rm.pv.push(mv);
                rm.pv.extend_from_slice(&self.pv[1]);
                alpha = alpha.max(value);
            }
        }
    }

    fn next_rule50(&self, board: &Board, mv: ChessMove, rule50: u32) -> u32 {
        if board.piece_on(mv.get_source()) == Some(Piece::Pawn) || is_capture(board, mv) {
            0
        } else {
            rule50 + 1
        }
    }

    fn is_draw(&self, rule50: u32) -> bool {
        if rule50 >= 100 {
            return true;
        }
        let n = self.keys.len();
        let current = self.keys[n - 1];
        let window = (rule50 as usize).min(n - 1);
        (4..=window)
            .step_by(2)
            .any(|back| self.keys[n - 1 - back] == current)
    }

    fn update_pv(&mut self, ply: usize, mv: ChessMove) {
        let (head, tail) = self.pv.split_at_mut(ply + 1);
        let line = &mut head[ply];
        line.clear();
        line.push(mv);
        line.extend_from_slice(&tail[0]);
    }

    fn ordered_moves(&self, board: &Board, tt_move: Option<ChessMove>, ply: usize) -> Vec<ChessMove> {
        let killers = self.killers[ply];
        let mut scored: Vec<(i32, ChessMove)> = MoveGen::new_legal(board)
            .map(|mv| {
                let score = if Some(mv) == tt_move {
                    TT_MOVE_SCORE
                } else if is_capture(board, mv) {
                    let victim = board.piece_on(mv.get_dest()).map_or(0, piece_value);
                    let attacker = board.piece_on(mv.get_source()).map_or(0, piece_value);
                    CAPTURE_SCORE + victim * 8 - attacker / 8
                } else if mv.get_promotion() == Some(Piece::Queen) {
                    CAPTURE_SCORE
                } else if killers.contains(&Some(mv)) {
                    KILLER_SCORE
                } else {
                    self.history[mv.get_source().to_index()][mv.get_dest().to_index()]
                };
                (score, mv)
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, mv)| mv).collect()
    }

    fn record_quiet_cutoff(&mut self, mv: ChessMove, ply: usize, depth: i32) {
        let slot = &mut self.killers[ply];
        if slot[0] != Some(mv) {
            slot[1] = slot[0];
            slot[0] = Some(mv);
        }
        let entry = &mut self.history[mv.get_source().to_index()][mv.get_dest().to_index()];
        *entry = (*entry + depth * depth).min(HISTORY_MAX);
    }

    #[allow(clippy::too_many_arguments)]
    fn search(
        &mut self,
        board: &Board,
        depth: i32,
        ply: i32,
        mut alpha: Value,
        mut beta: Value,
        pv_node: bool,
        rule50: u32,
    ) -> Value {
        let ply_idx = ply as usize;
        self.pv[ply_idx].clear();

        if depth <= 0 {
            return self.qsearch(board, ply, alpha, beta);
        }
        if self.stopped() {
            return VALUE_ZERO;
        }
        self.seldepth = self.seldepth.max(ply);

        if self.is_draw(rule50) {
            return VALUE_DRAW;
        }
        if ply >= MAX_DEPTH {
            return if in_check(board) { VALUE_DRAW } else { evaluate(board) };
        }

        alpha = alpha.max(mated_in(ply));
        beta = beta.min(mate_in(ply + 1));
        if alpha >= beta {
            return alpha;
        }

        let key = board.get_hash();
        let tt_entry = self.job.tt.probe(key);
        let tt_move = tt_entry.and_then(|e| e.best_move).filter(|&mv| board.legal(mv));

        if let Some(entry) = tt_entry {
            if !pv_node && entry.depth >= depth {
                let v = value_from_tt(entry.value, ply);
                let cutoff = match entry.bound {
                    Bound::Exact => true,
                    Bound::Lower => v >= beta,
                    Bound::Upper => v <= alpha,
                };
                if cutoff {
                    return v;
                }
            }
        }

        let checked = in_check(board);

        if !pv_node
            && !checked
            && depth >= 3
            && beta.abs() < VALUE_TB_WIN_IN_MAX_PLY
            && has_non_pawn_material(board)
            && evaluate(board) >= beta
        {
            if let Some(null) = board.null_move() {
                self.count_node();
                self.keys.push(null.get_hash());
                let v = -self.search(&null, depth - 3, ply + 1, -beta, -beta + 1, false, 0);
                self.keys.pop();
                if self.stopped() {
                    return VALUE_ZERO;
                }
                if v >= beta {
                    return if v >= VALUE_TB_WIN_IN_MAX_PLY { beta } else { v };
                }
            }
        }

        let moves = self.ordered_moves(board, tt_move, ply_idx);
        if moves.is_empty() {
            return if checked { mated_in(ply) } else { VALUE_DRAW };
        }

        let extension = i32::from(checked);
        let original_alpha = alpha;
        let mut best_value = -VALUE_INFINITE;
        let mut best_move = None;

        for (i, &mv) in moves.iter().enumerate() {
            let quiet = !is_capture(board, mv) && mv.get_promotion().is_none();
            let child = board.make_move_new(mv);
            let child_rule50 = self.next_rule50(board, mv, rule50);
            let new_depth = depth - 1 + extension;
            self.count_node();
            self.keys.push(child.get_hash());

            let value = if i == 0 {
                -self.search(&child, new_depth, ply + 1, -beta, -alpha, pv_node, child_rule50)
            } else {
                let reduction =
                    i32::from(depth >= 3 && i >= 3 && quiet && !checked && !in_check(&child));
                let mut v = -self.search(
                    &child,
                    new_depth - reduction,
                    ply + 1,
                    -alpha - 1,
                    -alpha,
                    false,
                    child_rule50,
                );
                if v > alpha && (reduction > 0 || (pv_node && v < beta)) && !self.stopped() {
                    v = -self.search(&child, new_depth, ply + 1, -beta, -alpha, pv_node, child_rule50);
                }
                v
            };
            self.keys.pop();

            if self.stopped() {
                return VALUE_ZERO;
            }

            if value > best_value {
                best_value = value;
                if value > alpha {
                    best_move = Some(mv);
                    self.update_pv(ply_idx, mv);
                    if value >= beta {
                        if quiet {
                            self.record_quiet_cutoff(mv, ply_idx, depth);
                        }
                        break;
                    }
                    alpha = value;
                }
            }
        }

        let bound = if best_value >= beta {
            Bound::Lower
        } else if best_value > original_alpha {
            Bound::Exact
        } else {
            Bound::Upper
        };
        self.job
            .tt
            .store(key, depth, value_to_tt(best_value, ply), bound, best_move);

        best_value
    }

    fn qsearch(&mut self, board: &Board, ply: i32, mut alpha: Value, beta: Value) -> Value {
        let ply_idx = ply as usize;
        self.pv[ply_idx].clear();

        if self.stopped() {
            return VALUE_ZERO;
        }
        self.seldepth = self.seldepth.max(ply);

        let checked = in_check(board);
        if ply >= MAX_DEPTH {
            return if checked { VALUE_DRAW } else { evaluate(board) };
        }

        let mut best_value = if checked {
            -VALUE_INFINITE
        } else {
            let stand_pat = evaluate(board);
            if stand_pat >= beta {
                return stand_pat;
            }
            alpha = alpha.max(stand_pat);
            stand_pat
        };

        let mut moves = MoveGen::new_legal(board);
        if !checked {
            moves.set_iterator_mask(*board.color_combined(!board.side_to_move()));
        }
        let mut moves: Vec<ChessMove> = moves.collect();
        if checked && moves.is_empty() {
            return mated_in(ply);
        }
        moves.sort_by_key(|&mv| {
            let victim = board.piece_on(mv.get_dest()).map_or(0, piece_value);
            let attacker = board.piece_on(mv.get_source()).map_or(0, piece_value);
            -(victim * 8 - attacker / 8)
        });

        for mv in moves {
            let child = board.make_move_new(mv);
            self.count_node();
            let value = -self.qsearch(&child, ply + 1, -beta, -alpha);
            if self.stopped() {
                return VALUE_ZERO;
            }
            if value > best_value {
                best_value = value;
                if value > alpha {
                    self.update_pv(ply_idx, mv);
                    if value >= beta {
                        break;
                    }
                    alpha = value;
                }
            }
        }

        best_value
    }
}

/// Value of a position with no legal move: mated or stalemate.
pub(super) fn terminal_value(board: &Board) -> Value {
    match board.status() {
        BoardStatus::Checkmate => mated_in(0),
        _ => VALUE_DRAW,
    }
}
