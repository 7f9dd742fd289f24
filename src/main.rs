use astro_match::adapters::ranking_to_csv;
use astro_match::utils::error::{ErrorSeverity, MatchError};
use astro_match::utils::{logger, validation::Validate};
use astro_match::{
    CliConfig, Command, CompatibilityEngine, EngineConfig, LocalStorage, Participant,
    ParticipantRecord,
};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    let engine_config = match &cli.config {
        Some(path) => match EngineConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => exit_with(&e),
        },
        None => EngineConfig::default(),
    };

    // 初始化日誌
    logger::init_logger(&engine_config.logging, cli.verbose);

    tracing::info!("Starting astro-match CLI");
    tracing::debug!("CLI config: {:?}", cli);

    // 驗證配置
    if let Err(e) = cli.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        exit_with(&e);
    }

    let engine = match CompatibilityEngine::from_config(&engine_config) {
        Ok(engine) => engine,
        Err(e) => exit_with(&e),
    };

    let storage = LocalStorage::new(".");
    let outcome = match &cli.command {
        Command::Score { pair } => score_pair(&engine, &storage, pair).await,
        Command::Rank {
            subject,
            candidates,
            output,
        } => rank_candidates(&engine, &storage, subject, candidates, output).await,
    };

    if let Err(e) = outcome {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        exit_with(&e);
    }

    Ok(())
}

async fn score_pair(
    engine: &CompatibilityEngine,
    storage: &LocalStorage,
    pair: &str,
) -> astro_match::Result<()> {
    let (first, second) = storage.load_pair(pair).await?;
    let a = Participant::try_from(first)?;
    let b = Participant::try_from(second)?;

    let report = engine.evaluate_cached(&a, &b).await?;
    tracing::info!("✅ {} x {} scored {}", a.id, b.id, report.score.total);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn rank_candidates(
    engine: &CompatibilityEngine,
    storage: &LocalStorage,
    subject: &str,
    candidates: &str,
    output: &str,
) -> astro_match::Result<()> {
    let subject_record = storage
        .load_participants(subject)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| MatchError::InvalidProfile {
            field: subject.to_string(),
            reason: "no subject participant found".to_string(),
        })?;
    let subject = Participant::try_from(subject_record)?;

    let records = storage.load_participants(candidates).await?;
    let total = records.len();
    let pool = valid_candidates(records);
    if pool.len() < total {
        tracing::warn!("⚠️ Skipped {} invalid candidate(s)", total - pool.len());
    }

    let ranking = engine.rank(&subject, &pool).await?;
    storage.write_file(output, &ranking_to_csv(&ranking)?).await?;

    tracing::info!("✅ Ranked {} candidates for {}", ranking.len(), subject.id);
    tracing::info!("📁 Output saved to: {}", output);
    println!("✅ Ranked {} candidates for {}", ranking.len(), subject.id);
    println!("📁 Output saved to: {}", output);
    Ok(())
}

fn valid_candidates(records: Vec<ParticipantRecord>) -> Vec<Participant> {
    records
        .into_iter()
        .filter_map(|record| {
            let id = record.id.clone();
            match Participant::try_from(record) {
                Ok(participant) => Some(participant),
                Err(e) => {
                    tracing::warn!("⚠️ Candidate '{}' rejected: {}", id, e);
                    None
                }
            }
        })
        .collect()
}

fn exit_with(e: &MatchError) -> ! {
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}
