use beyondworm_server::constants::TICK_MS;
use beyondworm_server::engine::GameEngine;
use beyondworm_server::types::{GameConfig, OutboundEvent, Snapshot};
use clap::Parser;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    single: bool,
    #[arg(long)]
    players: Option<usize>,
    #[arg(long)]
    seconds: Option<u64>,
    #[arg(long)]
    bots: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    match_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    players: usize,
    bots: usize,
    seconds: u64,
    seed: u32,
}

#[derive(Clone, Debug, Default, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    players: usize,
    bots: usize,
    seconds: u64,
    ticks: u64,
    #[serde(rename = "foodEaten")]
    food_eaten: usize,
    deaths: usize,
    #[serde(rename = "playerDeaths")]
    player_deaths: usize,
    rejoins: usize,
    #[serde(rename = "rejectedReports")]
    rejected_reports: usize,
    #[serde(rename = "maxScore")]
    max_score: u32,
    #[serde(rename = "finalFoodCount")]
    final_food_count: usize,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "totalDeaths")]
    total_deaths: usize,
    #[serde(rename = "deathsPerScenario")]
    deaths_per_scenario: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "matchId")]
    match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

fn main() {
    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let match_id = cli
        .match_id
        .clone()
        .unwrap_or_else(|| default_match_id(seed_hint, run_started_at_ms));
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &match_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "players": scenario.players,
                "bots": scenario.bots,
                "seconds": scenario.seconds,
            }),
        );
        let scenario_run = run_scenario(&scenario);

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &match_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.tick),
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();

        emit_log(
            "info",
            "scenario_finished",
            &match_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(scenario_run.result.ticks),
            json!({
                "deaths": scenario_run.result.deaths,
                "foodEaten": scenario_run.result.food_eaten,
                "maxScore": scenario_run.result.max_score,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        match serde_json::to_string(&scenario_run.result) {
            Ok(line) => println!("{line}"),
            Err(error) => emit_log(
                "error",
                "result_encode_failed",
                &match_id,
                Some(&scenario.name),
                Some(scenario.seed),
                None,
                json!({ "error": error.to_string() }),
            ),
        }
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        match_id.clone(),
        run_started_at_ms,
        now_ms(),
        scenario_results,
        total_anomalies,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &match_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &match_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "totalDeaths": summary.total_deaths,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(scenario: &Scenario) -> ScenarioRunResult {
    let config = GameConfig {
        bot_count: scenario.bots,
        ..GameConfig::default()
    };
    let dt = Duration::from_millis(TICK_MS);
    let total_ticks = scenario.seconds * 1000 / TICK_MS;
    let mut engine = GameEngine::new(config, scenario.seed);
    let player_ids: Vec<String> = (1..=scenario.players)
        .map(|idx| format!("sim_{idx}"))
        .collect();

    let mut result = ScenarioResultLine {
        scenario: scenario.name.clone(),
        seed: scenario.seed,
        players: scenario.players,
        bots: scenario.bots,
        seconds: scenario.seconds,
        ..ScenarioResultLine::default()
    };
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();

    for (idx, id) in player_ids.iter().enumerate() {
        engine.join(id, &format!("Sim-{:02}", idx + 1));
    }

    for _ in 0..total_ticks {
        for id in &player_ids {
            if engine.worm(id).is_none() {
                if engine.join(id, id).is_some() {
                    result.rejoins += 1;
                }
                continue;
            }
            result.rejected_reports += drive_player(&mut engine, id);
        }

        engine.step(dt);
        let snapshot = engine.build_snapshot();
        let events = engine.drain_events();
        result.ticks = snapshot.tick;

        for message in collect_tick_anomalies(&engine, &snapshot, &events) {
            push_anomaly(
                &mut result.anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }

        for event in &events {
            match event {
                OutboundEvent::FoodEaten { entries } => result.food_eaten += entries.len(),
                OutboundEvent::WormDied { killed_id, .. } => {
                    result.deaths += 1;
                    if player_ids.contains(killed_id) {
                        result.player_deaths += 1;
                    }
                }
                _ => {}
            }
        }
        let top_score = snapshot.worms.iter().map(|worm| worm.score).max();
        result.max_score = result.max_score.max(top_score.unwrap_or(0));
        result.final_food_count = snapshot.foods.len();
    }

    ScenarioRunResult {
        result,
        anomaly_records,
    }
}

fn drive_player(engine: &mut GameEngine, id: &str) -> usize {
    let Some(worm) = engine.worm(id) else {
        return 0;
    };
    if worm.is_dead {
        return 0;
    }
    let head = worm.head();
    let reach = worm.radius;
    let sprint = worm.score >= 12;
    let nearest = engine
        .foods()
        .min_by(|a, b| {
            head.distance(a.position())
                .total_cmp(&head.distance(b.position()))
        })
        .map(|food| (food.id.clone(), food.position(), food.radius));

    engine.set_sprinting(id, sprint);
    let Some((food_id, position, food_radius)) = nearest else {
        return 0;
    };
    let offset = position - head;
    engine.set_target_direction(id, offset.x, offset.y);
    if head.distance(position) <= reach + food_radius {
        return usize::from(engine.report_food_eaten(id, &food_id).is_err());
    }
    0
}

fn collect_tick_anomalies(
    engine: &GameEngine,
    snapshot: &Snapshot,
    events: &[OutboundEvent],
) -> Vec<String> {
    let config = &engine.config;
    let mut anomalies = Vec::new();

    let eaten: usize = events
        .iter()
        .map(|event| match event {
            OutboundEvent::FoodEaten { entries } => entries.len(),
            _ => 0,
        })
        .sum();
    if snapshot.foods.len() + eaten < config.minimum_food_count {
        anomalies.push(format!(
            "food below minimum after top-up: {} < {}",
            snapshot.foods.len(),
            config.minimum_food_count
        ));
    }

    for worm in &snapshot.worms {
        if worm.segments.is_empty() {
            anomalies.push(format!("worm without segments: {}", worm.id));
            continue;
        }
        let expected =
            config.segment_default_radius + worm.score as f32 * config.segment_growth_radius;
        if (worm.radius - expected).abs() > 1e-3 {
            anomalies.push(format!(
                "radius mismatch on {}: {} != {}",
                worm.id, worm.radius, expected
            ));
        }
        if worm
            .segments
            .iter()
            .any(|segment| !segment.x.is_finite() || !segment.y.is_finite())
        {
            anomalies.push(format!("non-finite segment on {}", worm.id));
        }
        if worm
            .segments
            .windows(2)
            .any(|pair| pair[0].distance(pair[1]) > config.segment_spacing + 0.01)
        {
            anomalies.push(format!("stretched chain on {}", worm.id));
        }
    }

    let mut killed = HashSet::new();
    for event in events {
        if let OutboundEvent::WormDied { killed_id, .. } = event {
            if !killed.insert(killed_id.as_str()) {
                anomalies.push(format!("worm died twice in one tick: {killed_id}"));
            }
        }
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = normalize_seed(cli.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }));

    if cli.single || cli.players.is_some() || cli.seconds.is_some() || cli.bots.is_some() {
        let players = cli.players.unwrap_or(2).clamp(1, 64);
        return vec![Scenario {
            name: format!("custom-p{players}"),
            players,
            bots: cli.bots.unwrap_or(6).min(64),
            seconds: cli.seconds.unwrap_or(60).clamp(1, 3_600),
            seed,
        }];
    }

    vec![
        Scenario {
            name: "quick-check-p1".to_string(),
            players: 1,
            bots: 6,
            seconds: 30,
            seed,
        },
        Scenario {
            name: "crowded-p8".to_string(),
            players: 8,
            bots: 12,
            seconds: 120,
            seed: normalize_seed(seed as u64 + 1),
        },
    ]
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_match_id(seed: u32, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    match_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    anomaly_count: usize,
) -> RunSummary {
    let deaths_per_scenario: BTreeMap<String, usize> = scenarios
        .iter()
        .map(|line| (line.scenario.clone(), line.deaths))
        .collect();
    RunSummary {
        match_id,
        started_at_ms,
        finished_at_ms,
        scenario_count: scenarios.len(),
        anomaly_count,
        total_deaths: deaths_per_scenario.values().sum(),
        deaths_per_scenario,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    match_id: &str,
    scenario: Option<&str>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        match_id: match_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    if let Ok(line) = serde_json::to_string(&log_line) {
        eprintln!("{line}");
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
