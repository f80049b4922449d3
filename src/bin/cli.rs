use anyhow::{anyhow, Context};
use cbr::{
    leave_one_out, load_csv, sweep, AttributeKind, CaseBase, Config, Evaluation, LoadOptions,
    Record, Value, Weights,
};
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "cbr")]
#[command(about = "Case-based income classification", long_about = None)]
struct Cli {
    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Data {
    /// CSV file with a header row
    path: PathBuf,
    /// Label column
    #[arg(long, default_value = "income")]
    label: String,
    /// Rows to sample from the file, 0 keeps every row
    #[arg(long, default_value_t = 5000)]
    rows: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Keep fnlwgt, education_num, capital_gain and capital_loss
    #[arg(long)]
    all_columns: bool,
    /// Force an attribute kind, as name=numeric or name=categorical
    #[arg(long = "kind")]
    kinds: Vec<String>,
}

#[derive(Args)]
struct Weighting {
    /// Use the income weight preset instead of uniform weights
    #[arg(long)]
    weighted: bool,
    /// Override one weight, as name=value
    #[arg(long = "weight")]
    weights: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Leave-one-out accuracy of the classifier
    Evaluate {
        #[command(flatten)]
        data: Data,
        #[command(flatten)]
        weighting: Weighting,
        #[arg(short, default_value_t = 10)]
        k: usize,
        #[arg(long)]
        workers: Option<usize>,
        /// Only evaluate the first n cases
        #[arg(long)]
        sample: Option<usize>,
        /// Print every per-case outcome
        #[arg(long)]
        details: bool,
    },
    /// Classify one record given as name=value pairs
    Classify {
        #[command(flatten)]
        data: Data,
        #[command(flatten)]
        weighting: Weighting,
        #[arg(short, default_value_t = 1)]
        k: usize,
        query: String,
    },
    /// Leave-one-out accuracy for every k, with and without the weight preset
    Sweep {
        #[command(flatten)]
        data: Data,
        #[arg(short, value_delimiter = ',', default_value = "1,5,10")]
        k: Vec<usize>,
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long)]
        sample: Option<usize>,
    },
}

fn parse_pairs(s: &str) -> anyhow::Result<Vec<(String, String)>> {
    s.split(',')
        .filter(|p| !p.trim().is_empty())
        .map(|p| {
            let (name, value) = p
                .split_once('=')
                .ok_or_else(|| anyhow!("expected name=value, got '{p}'"))?;
            Ok((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

fn load(data: &Data) -> anyhow::Result<CaseBase> {
    let mut options = if data.all_columns {
        LoadOptions::default()
    } else {
        LoadOptions::adult()
    };
    options.sample = (data.rows > 0).then_some(data.rows);
    options.seed = data.seed;
    let records = load_csv(&data.path, &options)?;

    let mut declared = BTreeMap::new();
    for (name, kind) in parse_pairs(&data.kinds.join(","))? {
        declared.insert(name, kind.parse::<AttributeKind>()?);
    }
    let case_base = CaseBase::with_kinds(&records, &data.label, &declared)?;
    info!(
        cases = case_base.len(),
        attributes = case_base.schema().len(),
        "case base loaded"
    );
    Ok(case_base)
}

fn weights(weighting: &Weighting) -> anyhow::Result<Weights> {
    let mut weights = if weighting.weighted {
        Weights::income()
    } else {
        Weights::uniform()
    };
    for (name, value) in parse_pairs(&weighting.weights.join(","))? {
        let w: f64 = value
            .parse()
            .with_context(|| format!("invalid weight for {name}"))?;
        weights = weights.with(&name, w);
    }
    Ok(weights)
}

fn config(k: usize, weights: Weights, workers: Option<usize>, sample: Option<usize>) -> Config {
    let mut config = Config {
        k,
        weights,
        sample,
        ..Config::default()
    };
    if let Some(workers) = workers {
        config.workers = workers;
    }
    config
}

fn report(evaluation: &Evaluation) {
    println!(
        "k={} weighted={} correct={} total={} accuracy={:.2}%",
        evaluation.k,
        evaluation.weighted,
        evaluation.correct_count,
        evaluation.total_count,
        evaluation.accuracy() * 100.0
    );
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Evaluate {
            data,
            weighting,
            k,
            workers,
            sample,
            details,
        } => {
            let case_base = load(&data)?;
            let config = config(k, weights(&weighting)?, workers, sample);
            let evaluation = leave_one_out(&case_base, &config)?;
            if details {
                for o in &evaluation.outcomes {
                    println!("{} {} {} {}", o.index, o.predicted, o.actual, o.correct());
                }
            }
            report(&evaluation);
        }
        Commands::Classify {
            data,
            weighting,
            k,
            query,
        } => {
            let case_base = load(&data)?;
            let config = config(k, weights(&weighting)?, None, None);
            let record: Record = parse_pairs(&query)?
                .into_iter()
                .map(|(name, value)| {
                    let value = match value.parse::<f64>() {
                        Ok(n) => Value::Number(n),
                        Err(_) => Value::Text(value),
                    };
                    (name, value)
                })
                .collect();
            let classification = case_base.classify(&record, &config)?;
            for n in classification.neighbors.iter() {
                println!("{} {:.4}", n.index, n.similarity);
            }
            if let Some(nearest) = classification.neighbors.iter().next() {
                let breakdown = case_base.explain(&record, nearest.index, &config)?;
                for a in &breakdown.attributes {
                    match a.similarity {
                        Some(s) => println!("  {} {:.4} (weight {})", a.attribute, s, a.weight),
                        None => println!("  {} - (weight {})", a.attribute, a.weight),
                    }
                }
            }
            println!("{}", classification.label);
        }
        Commands::Sweep {
            data,
            k,
            workers,
            sample,
        } => {
            let case_base = load(&data)?;
            let configs: Vec<Config> = k
                .iter()
                .flat_map(|&k| {
                    [Weights::uniform(), Weights::income()]
                        .into_iter()
                        .map(move |w| config(k, w, workers, sample))
                })
                .collect();
            for evaluation in sweep(&case_base, &configs)? {
                report(&evaluation);
            }
        }
    }
    Ok(())
}
