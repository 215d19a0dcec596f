use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::{SecondsFormat, Utc};
use clap::{Parser, ValueEnum};
use phantom_pursuit::board::Board;
use phantom_pursuit::engine::RoundOptions;
use phantom_pursuit::rng::{RandomSource, Rng};
use phantom_pursuit::rules::RoundRules;
use phantom_pursuit::session::start_round;
use phantom_pursuit::shop::{purchase_hearts, ShopOutcome};
use phantom_pursuit::stats_store::{JsonStatsLedger, MemoryStatsLedger, StatsLedger};
use phantom_pursuit::types::{
    Difficulty, Position, RoundEndReason, RoundPhase, RoundView, SessionStats, TurnOutcome,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const STATS_PATH_ENV: &str = "PHANTOM_STATS_PATH";
const DEFAULT_STATS_PATH: &str = ".data/user_stats.json";

#[derive(Parser, Debug)]
#[command(author, version, about = "Plays Phantom Pursuit rounds with a scripted driver")]
struct Cli {
    #[arg(long, default_value_t = 3)]
    rounds: u32,
    /// easy|medium|hard, or 1|2|3
    #[arg(long)]
    difficulty: Option<String>,
    /// Base seed, 0..=4294967295; round `n` plays `seed + n`.
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long, default_value = "Simulator")]
    player: String,
    #[arg(long, value_enum, default_value_t = Policy::Flee)]
    policy: Policy,
    /// Hearts to buy with banked points before the first round.
    #[arg(long, default_value_t = 0)]
    buy_hearts: u64,
    /// Decline every respawn offer.
    #[arg(long)]
    no_respawn: bool,
    #[arg(long, default_value_t = 500)]
    max_turns: u32,
    /// JSON file overriding the default round rules.
    #[arg(long)]
    rules: Option<PathBuf>,
    /// Stats file; falls back to $PHANTOM_STATS_PATH.
    #[arg(long)]
    stats: Option<PathBuf>,
    /// Keep stats in memory only.
    #[arg(long)]
    dry_run: bool,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
enum Policy {
    /// Step to the neighbor farthest from the ghost.
    Flee,
    Random,
}

#[derive(Clone, Debug, Serialize)]
struct RoundResultLine {
    round: u32,
    seed: u32,
    difficulty: Difficulty,
    policy: Policy,
    reason: RoundEndReason,
    turns: u32,
    score: u32,
    hearts: u32,
    hunts: u32,
    boosters: u32,
    #[serde(rename = "heartsFound")]
    hearts_found: u32,
    respawns: u32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    turn: u32,
    message: String,
}

/// Every anomaly with its turn, plus the distinct messages for the result line.
#[derive(Debug, Default)]
struct AnomalyLog {
    records: Vec<AnomalyRecord>,
    distinct: Vec<String>,
    seen: HashSet<String>,
}

impl AnomalyLog {
    fn record(&mut self, turn: u32, message: String) {
        if self.seen.insert(message.clone()) {
            self.distinct.push(message.clone());
        }
        self.records.push(AnomalyRecord { turn, message });
    }
}

#[derive(Clone, Debug)]
struct RoundRun {
    result: RoundResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    player: String,
    #[serde(rename = "roundCount")]
    round_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageScore")]
    average_score: u64,
    #[serde(rename = "averageTurns")]
    average_turns: u64,
    #[serde(rename = "reasonCounts")]
    reason_counts: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    purchase: Option<ShopOutcome>,
    stats: SessionStats,
    rounds: Vec<RoundResultLine>,
}

struct RoundPlan<'a> {
    player: &'a str,
    difficulty: Difficulty,
    rules: &'a RoundRules,
    policy: Policy,
    respawn: bool,
    max_turns: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let rules = load_rules(cli.rules.as_deref())?;
    let difficulty = resolve_difficulty(cli.difficulty.as_deref())?;
    let seed = cli.seed.unwrap_or_else(rand::random::<u32>);
    let started_at = now_iso();
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed, Utc::now().timestamp_millis()));

    let mut ledger: Box<dyn StatsLedger> = if cli.dry_run {
        Box::new(MemoryStatsLedger::new())
    } else {
        let path = resolve_stats_path(cli.stats.clone(), std::env::var_os(STATS_PATH_ENV));
        tracing::info!(path = %path.display(), "using stats file");
        Box::new(JsonStatsLedger::new(path))
    };

    let purchase = if cli.buy_hearts > 0 {
        let outcome = purchase_hearts(ledger.as_mut(), &cli.player, cli.buy_hearts, &rules)
            .context("failed to save heart purchase")?;
        Some(outcome)
    } else {
        None
    };

    let plan = RoundPlan {
        player: &cli.player,
        difficulty,
        rules: &rules,
        policy: cli.policy,
        respawn: !cli.no_respawn,
        max_turns: cli.max_turns.max(1),
    };
    tracing::info!(
        run_id = %run_id,
        rounds = cli.rounds,
        difficulty = difficulty.label(),
        seed,
        "run started"
    );

    let mut results = Vec::new();
    let mut reason_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_anomalies = 0usize;
    for round in 0..cli.rounds {
        let round_seed = seed.wrapping_add(round);
        let run = run_round(ledger.as_mut(), &plan, round, round_seed)?;
        for anomaly in &run.anomaly_records {
            tracing::warn!(
                round,
                turn = anomaly.turn,
                message = %anomaly.message,
                "anomaly detected"
            );
        }
        total_anomalies += run.anomaly_records.len();
        *reason_counts
            .entry(run.result.reason.key().to_string())
            .or_insert(0) += 1;

        println!("{}", serde_json::to_string(&run.result)?);
        results.push(run.result);
    }

    let summary = build_run_summary(
        run_id,
        started_at,
        now_iso(),
        cli.player.clone(),
        results,
        reason_counts,
        total_anomalies,
        purchase,
        ledger.load(&cli.player),
    );

    if let Some(path) = cli.summary_out.as_ref() {
        write_summary(path, &summary)
            .with_context(|| format!("failed to write summary to {}", path.display()))?;
    }

    tracing::info!(
        rounds = summary.round_count,
        anomalies = summary.anomaly_count,
        average_score = summary.average_score,
        average_turns = summary.average_turns,
        "run finished"
    );

    if summary.anomaly_count > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn run_round<L: StatsLedger + ?Sized>(
    ledger: &mut L,
    plan: &RoundPlan<'_>,
    round: u32,
    seed: u32,
) -> anyhow::Result<RoundRun> {
    let mut handle = start_round(
        &*ledger,
        plan.player,
        plan.difficulty,
        plan.rules.clone(),
        RoundOptions::default(),
        Rng::new(seed),
    );
    let mut policy_rng = Rng::new(seed ^ 0x9e37_79b9);
    let profile = *plan.rules.profile(plan.difficulty);
    let mut anomalies = AnomalyLog::default();

    while !handle.is_ended() && handle.round().turn() < plan.max_turns {
        let view = handle.current_view();
        if view.phase == RoundPhase::AwaitingRespawn {
            handle.resolve_encounter(plan.respawn)?;
            continue;
        }

        let target = choose_move(plan.policy, handle.round().board(), &view, &mut policy_rng);
        let outcome = handle.apply_move(target)?;
        for message in collect_turn_anomalies(&view, &outcome, plan.rules, profile.base_loss) {
            anomalies.record(outcome.turn, message);
        }
    }
    if !handle.is_ended() {
        anomalies.record(
            handle.round().turn(),
            format!("turn limit {} reached", plan.max_turns),
        );
    }

    handle.drain_events();
    let summary = handle.summary();
    handle.end_round(ledger);

    Ok(RoundRun {
        result: RoundResultLine {
            round,
            seed,
            difficulty: plan.difficulty,
            policy: plan.policy,
            reason: summary.reason.unwrap_or(RoundEndReason::Abandoned),
            turns: summary.turns,
            score: summary.score,
            hearts: summary.hearts,
            hunts: summary.hunts,
            boosters: summary.boosters,
            hearts_found: summary.hearts_found,
            respawns: summary.respawns,
            anomalies: anomalies.distinct,
        },
        anomaly_records: anomalies.records,
    })
}

fn choose_move<R: RandomSource>(
    policy: Policy,
    board: &Board,
    view: &RoundView,
    rng: &mut R,
) -> Position {
    let moves = &view.available_moves;
    if moves.is_empty() {
        return view.position;
    }
    match policy {
        Policy::Random => moves[rng.pick_index(moves.len())],
        Policy::Flee => {
            let mut best = moves[0];
            let mut best_distance = 0;
            for &candidate in moves {
                let distance = board
                    .distance(candidate, view.ghost_position)
                    .unwrap_or(u32::MAX);
                if distance > best_distance {
                    best = candidate;
                    best_distance = distance;
                }
            }
            best
        }
    }
}

fn collect_turn_anomalies(
    before: &RoundView,
    outcome: &TurnOutcome,
    rules: &RoundRules,
    base_loss: i32,
) -> Vec<String> {
    let mut anomalies = Vec::new();
    if !before.available_moves.contains(&outcome.player_position) {
        anomalies.push(format!(
            "player jumped from {} to {}",
            before.position, outcome.player_position
        ));
    }
    if outcome.score != before.score + rules.score_per_turn {
        anomalies.push(format!(
            "score moved from {} to {}",
            before.score, outcome.score
        ));
    }
    if outcome.sanity_lost < base_loss {
        anomalies.push(format!(
            "sanity loss {} below base loss {base_loss}",
            outcome.sanity_lost
        ));
    }
    if outcome.sanity < 0 {
        anomalies.push(format!("negative sanity reported: {}", outcome.sanity));
    }
    anomalies
}

fn load_rules(path: Option<&Path>) -> anyhow::Result<RoundRules> {
    let Some(path) = path else {
        return Ok(RoundRules::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read rules from {}", path.display()))?;
    RoundRules::from_json(&text)
        .with_context(|| format!("failed to parse rules from {}", path.display()))
}

fn resolve_difficulty(raw: Option<&str>) -> anyhow::Result<Difficulty> {
    match raw {
        None => Ok(Difficulty::Easy),
        Some(value) => match Difficulty::parse(value) {
            Some(difficulty) => Ok(difficulty),
            None => bail!("unknown difficulty '{value}', expected easy|medium|hard or 1|2|3"),
        },
    }
}

fn resolve_stats_path(flag: Option<PathBuf>, env: Option<std::ffi::OsString>) -> PathBuf {
    flag.or_else(|| env.filter(|value| !value.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATS_PATH))
}

fn default_run_id(seed: u32, timestamp_ms: i64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

#[allow(clippy::too_many_arguments)]
fn build_run_summary(
    run_id: String,
    started_at: String,
    finished_at: String,
    player: String,
    rounds: Vec<RoundResultLine>,
    reason_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    purchase: Option<ShopOutcome>,
    stats: SessionStats,
) -> RunSummary {
    let round_count = rounds.len();
    let (average_score, average_turns) = if round_count == 0 {
        (0, 0)
    } else {
        let total_score: u64 = rounds.iter().map(|round| round.score as u64).sum();
        let total_turns: u64 = rounds.iter().map(|round| round.turns as u64).sum();
        (
            total_score / round_count as u64,
            total_turns / round_count as u64,
        )
    };
    RunSummary {
        run_id,
        started_at,
        finished_at,
        player,
        round_count,
        anomaly_count,
        average_score,
        average_turns,
        reason_counts,
        purchase,
        stats,
        rounds,
    }
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn write_summary(path: &Path, summary: &RunSummary) -> anyhow::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary)?;
    fs::write(path, summary_text)?;
    Ok(())
}
