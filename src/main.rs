use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use reviewdex::{
    Collection, FilterCriteria, JsonFileStore, PipelineBuilder, PipelineConfig, PipelineKind,
    ProductKind, Rater, RatingAggregator, Record, RecordId, RecordStore, SchemaCatalog,
    SortOrder,
};

/// Structured product reviews: ratings, search and processing pipelines
#[derive(Parser, Debug)]
#[command(name = "reviewdex")]
#[command(about = "Inspect structured product reviews", long_about = None)]
struct Args {
    /// JSON file holding the review records
    #[arg(short, long, default_value = "./reviews.json")]
    records: PathBuf,

    /// Schema catalog JSON (built-in catalog when omitted)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recompute the category ratings of a record
    Rate {
        id: String,
        /// Score under this kind instead of the record's own
        #[arg(long)]
        kind: Option<String>,
        /// Show which fields fed each category
        #[arg(long)]
        explain: bool,
    },
    /// Substring search over indexed terms
    Search { term: String },
    /// Autocomplete indexed terms
    Suggest {
        partial: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Filter and sort records
    List {
        #[arg(long)]
        kind: Option<String>,
        #[arg(long)]
        min_rating: Option<f64>,
        #[arg(long)]
        query: Option<String>,
        /// date-desc, date-asc, rating-desc, rating-asc or name
        #[arg(long)]
        sort: Option<SortOrder>,
        /// Listing criteria as JSON, overridden by the flags above
        #[arg(long)]
        criteria: Option<PathBuf>,
    },
    /// Show a pipeline field with classified roles and the solvent flag
    Steps {
        id: String,
        /// Field holding the steps, e.g. pipelineExtraction
        field: String,
        /// fertilization, extraction, separation, purification or preparation
        #[arg(long, default_value = "extraction")]
        pipeline: String,
    },
}

fn parse_id(raw: &str) -> RecordId {
    raw.parse::<i64>()
        .map(RecordId::Integer)
        .unwrap_or_else(|_| RecordId::from(raw))
}

fn find<'a>(collection: &'a Collection, raw: &str) -> anyhow::Result<&'a Record> {
    Ok(collection.require(&parse_id(raw))?)
}

fn load_catalog(path: Option<&PathBuf>) -> anyhow::Result<SchemaCatalog> {
    match path {
        Some(path) => {
            let catalog = SchemaCatalog::from_path(path)?;
            info!("Catalog loaded from {:?}", path);
            Ok(catalog)
        }
        None => Ok(SchemaCatalog::builtin()),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("reviewdex v{}", env!("CARGO_PKG_VERSION"));

    let store = JsonFileStore::new(&args.records);
    let collection = Collection::new(store.load_all()?);
    info!("{} records, {} indexed terms", collection.count(), collection.index().len());

    let aggregator = RatingAggregator::new(load_catalog(args.catalog.as_ref())?);

    match args.command {
        Command::Rate { id, kind, explain } => {
            let record = find(&collection, &id)?;
            let kind = match kind {
                Some(label) => ProductKind::parse(&label)
                    .ok_or_else(|| anyhow!("unknown product kind {}", label))?,
                None => aggregator.catalog().kind_of(record.kind()),
            };
            let output = if explain {
                serde_json::to_value(aggregator.explain(record, kind))?
            } else {
                serde_json::to_value(aggregator.aggregate(record, kind))?
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Search { term } => {
            for id in collection.search(&term) {
                println!("{}", id);
            }
        }
        Command::Suggest { partial, limit } => {
            for term in collection.suggest(&partial, limit) {
                println!("{}", term);
            }
        }
        Command::List {
            kind,
            min_rating,
            query,
            sort,
            criteria,
        } => {
            let mut filters: FilterCriteria = match criteria {
                Some(path) => serde_json::from_str(
                    &fs::read_to_string(&path)
                        .with_context(|| format!("reading criteria {}", path.display()))?,
                )?,
                None => FilterCriteria::default(),
            };
            filters.kind = kind.or(filters.kind);
            filters.min_rating = min_rating.or(filters.min_rating);
            filters.query = query.or(filters.query);
            if let Some(sort) = sort {
                filters.sort = sort;
            }

            for record in collection.list(filters, &aggregator) {
                let line = json!({
                    "id": record.id().map(|id| id.to_value()),
                    "type": record.kind(),
                    "holderName": record.get_str("holderName"),
                    "rating": aggregator.rate(record),
                });
                println!("{}", line);
            }
        }
        Command::Steps {
            id,
            field,
            pipeline,
        } => {
            let record = find(&collection, &id)?;
            let kind = PipelineKind::parse(&pipeline)
                .ok_or_else(|| anyhow!("unknown pipeline {}", pipeline))?;
            let builder = PipelineBuilder::from_value(PipelineConfig::for_kind(kind), record.get(&field));

            let steps: Vec<_> = builder
                .steps()
                .iter()
                .enumerate()
                .map(|(position, step)| {
                    let params = builder.visible_params(step.id).unwrap_or_default();
                    json!({
                        "position": position,
                        "step": step,
                        "roles": step.roles(),
                        "shows": {
                            "mesh": params.mesh,
                            "temperature": params.temperature,
                            "pressure": params.pressure,
                            "details": params.details,
                        },
                    })
                })
                .collect();
            let output = json!({
                "steps": steps,
                "containsSolvent": builder.contains_solvent_step(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
