//! THPT Ingest - exam score import and query tool

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use thpt_common::logging::{init_logging, LogConfig, LogLevel};
use thpt_common::subjects::{ExamGroup, SubjectCode};
use thpt_ingest::report::{ConsoleReporter, NoopReporter, ProgressSink};
use thpt_ingest::{ImportRun, Profile};
use thpt_store::{create_pool, queries, schema, DbConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "thpt-ingest")]
#[command(author, version, about = "THPT exam score ingestion and query tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ProfileArg {
    /// Tiny batches, no precount; for 128-512 MB hosts
    Micro,
    /// Larger batches with row precount; for production hosts
    Fast,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bulk import scores from a CSV file (whole-dataset replace)
    Import {
        /// Path to the CSV source
        #[arg(short, long)]
        source: PathBuf,

        /// Memory ceiling used for profile selection (e.g. "256M", "1G")
        #[arg(long, default_value = "1G")]
        memory_limit: String,

        /// Force a profile instead of selecting by memory limit
        #[arg(long, value_enum)]
        profile: Option<ProfileArg>,

        /// Override the batch size
        #[arg(long)]
        batch: Option<usize>,

        /// Override the sub-chunk size
        #[arg(long)]
        sub_chunk: Option<usize>,

        /// Override the telemetry chunk size (in processed rows)
        #[arg(long)]
        chunk: Option<u64>,

        /// Disable the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Look up one student's scores by registration number
    Lookup {
        /// Registration number (8-10 digits)
        #[arg(long)]
        sbd: String,
    },

    /// Per-subject grade-band statistics
    Stats,

    /// Top students ranked by exam-group total
    Top {
        /// Exam group (A, B, C or D)
        #[arg(long, default_value = "A")]
        group: String,

        /// Number of students to list
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },

    /// Create tables and seed the subject catalog
    InitDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let log_config = LogConfig::with_level(log_level).merge_env()?;
    init_logging(&log_config)?;

    let pool = create_pool(&DbConfig::from_env()?).await?;

    match cli.command {
        Command::Import {
            source,
            memory_limit,
            profile,
            batch,
            sub_chunk,
            chunk,
            no_progress,
        } => {
            let profile = match profile {
                Some(ProfileArg::Micro) => Profile::micro(),
                Some(ProfileArg::Fast) => Profile::fast(),
                None => Profile::from_memory_limit(&memory_limit)?,
            }
            .with_overrides(batch, sub_chunk, chunk);

            schema::init_schema(&pool).await?;

            let mut sink: Box<dyn ProgressSink> = if no_progress {
                Box::new(NoopReporter)
            } else {
                Box::new(ConsoleReporter::new())
            };

            let mut run = ImportRun::new(pool, source, profile);
            let summary = run.run(sink.as_mut()).await?;

            println!("Import completed successfully");
            println!("  Total processed:  {}", summary.processed);
            println!("  Imported:         {}", summary.succeeded);
            println!("  Errors/skipped:   {}", summary.errors);
            println!("  Store count:      {}", summary.final_store_count);
            println!("  Peak memory:      {:.2} MB", summary.peak_memory_mb);
            println!("  Elapsed:          {:.2}s", summary.elapsed.as_secs_f64());
        },

        Command::Lookup { sbd } => {
            if let Err(message) = thpt_ingest::validation::validate_search_sbd(&sbd) {
                bail!("{message}");
            }

            match queries::find_by_sbd(&pool, &sbd).await? {
                Some(record) => {
                    println!("Scores for {}:", record.sbd);
                    for code in SubjectCode::ALL {
                        match record.score(code) {
                            Some(score) => {
                                println!("  {:<12} {:.2}", code.display_name(), score)
                            },
                            None => println!("  {:<12} -", code.display_name()),
                        }
                    }
                    if let Some(lang) = &record.ma_ngoai_ngu {
                        println!("  Foreign language code: {lang}");
                    }
                },
                None => bail!("No score record found for SBD {sbd}"),
            }
        },

        Command::Stats => {
            let catalog = schema::load_catalog(&pool).await?;
            let report = queries::subject_statistics(&pool, &catalog).await?;

            println!(
                "{:<12} {:>8} {:>10} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
                "Subject", "Total", "Avg", "Min", "Max", "Gioi", "Kha", "TB", "Yeu"
            );
            for stats in &report.statistics {
                println!(
                    "{:<12} {:>8} {:>10.2} {:>8.2} {:>8.2} {:>8} {:>8} {:>8} {:>8}",
                    stats.subject_name,
                    stats.total,
                    stats.average_score,
                    stats.min_score,
                    stats.max_score,
                    stats.excellent,
                    stats.good,
                    stats.average,
                    stats.weak,
                );
            }
            println!(
                "Students: {} | Active subjects: {}",
                report.summary.total_students, report.summary.total_subjects
            );
        },

        Command::Top { group, limit } => {
            let group: ExamGroup = group
                .parse()
                .map_err(|e| anyhow::anyhow!("Mã khối không hợp lệ (phải là A, B, C hoặc D): {e}"))?;
            let ranking = queries::top_group(&pool, group, limit).await?;

            println!(
                "Top {} - {} ({})",
                limit,
                ranking.group_name,
                ranking.subject_names.join(", ")
            );
            for student in &ranking.students {
                println!(
                    "  #{:<3} {}  {:.2} + {:.2} + {:.2} = {:.2}",
                    student.rank,
                    student.sbd,
                    student.scores[0],
                    student.scores[1],
                    student.scores[2],
                    student.total_score,
                );
            }
        },

        Command::InitDb => {
            schema::init_schema(&pool).await?;
            info!("Store schema initialized and subjects seeded");
        },
    }

    Ok(())
}
