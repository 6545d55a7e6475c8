use crate::{OutputFormat, csv_field};
use anyhow::{Context, Result};
use jsbloat_core::analysis::{
    AuditInputs, AuditOptions, Collaborators, UnusedJsAudit, UnusedJsReport,
};
use jsbloat_core::coverage::{
    Bundle, CachedSummaryProvider, CoverageDump, CoverageSummaryProvider,
};
use jsbloat_core::har::HarReader;
use jsbloat_core::network::{NetworkRecords, ResourceType, ResourceTypeEstimator};
use jsbloat_entities::{CatalogClassifier, EntityCatalog};
use std::path::PathBuf;

/// Inputs of one `jsbloat unused` run
#[derive(Debug, Clone)]
pub struct UnusedArgs {
    pub har: PathBuf,
    pub coverage: PathBuf,
    pub bundles: Option<PathBuf>,
    pub entities: Option<PathBuf>,
    /// Page under audit; defaults to the first document in the HAR
    pub page_url: Option<String>,
    pub options: AuditOptions,
}

impl UnusedArgs {
    pub fn new(har: PathBuf, coverage: PathBuf) -> Self {
        Self {
            har,
            coverage,
            bundles: None,
            entities: None,
            page_url: None,
            options: AuditOptions::default(),
        }
    }
}

/// First non-redirect document fetched during the page load
fn detect_page_url(network: &NetworkRecords) -> Option<String> {
    network
        .iter()
        .find(|r| r.resource_type == ResourceType::Document && r.redirect_url.is_none())
        .map(|r| r.url.clone())
}

/// Load every input and build the unused JavaScript report
pub fn run_audit(args: &UnusedArgs) -> Result<UnusedJsReport> {
    tracing::debug!("Reading HAR file: {}", args.har.display());
    let har = HarReader::from_file(&args.har)
        .with_context(|| format!("reading HAR file {}", args.har.display()))?;
    HarReader::validate(&har)?;
    let network = NetworkRecords::from_har(&har);

    let dump = CoverageDump::from_file(&args.coverage)
        .with_context(|| format!("reading coverage {}", args.coverage.display()))?;
    let scripts = dump.registry();

    let bundles = match &args.bundles {
        Some(path) => Bundle::from_file(path)
            .with_context(|| format!("reading bundles {}", path.display()))?,
        None => Vec::new(),
    };

    let mut catalog = EntityCatalog::builtin();
    if let Some(path) = &args.entities {
        let overrides = EntityCatalog::from_file(path)
            .with_context(|| format!("reading entity catalog {}", path.display()))?;
        catalog = catalog.with_overrides(overrides);
    }

    let mut classifier = CatalogClassifier::new(catalog);
    match args.page_url.clone().or_else(|| detect_page_url(&network)) {
        Some(page_url) => classifier = classifier.with_page_url(&page_url),
        None => tracing::debug!("No page URL given or found, no first party"),
    }

    let summaries =
        CachedSummaryProvider::new(CoverageSummaryProvider::new().with_registry(scripts.clone()));

    let inputs = AuditInputs {
        coverage: &dump.coverage,
        scripts: &scripts,
        network: &network,
        bundles: &bundles,
    };
    let collaborators = Collaborators {
        summaries: &summaries,
        classifier: &classifier,
        estimator: &ResourceTypeEstimator,
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let report = runtime.block_on(UnusedJsAudit::new(args.options).run(inputs, collaborators))?;

    Ok(report)
}

pub fn execute(args: &UnusedArgs, format: OutputFormat) -> Result<()> {
    tracing::info!(
        "Auditing unused JavaScript: {} with {}",
        args.har.display(),
        args.coverage.display()
    );

    let report = run_audit(args)?;

    match format {
        OutputFormat::Json => output_json(&report)?,
        OutputFormat::Table => output_table(&report),
        OutputFormat::Pretty => output_pretty(&report, &args.options),
    }

    Ok(())
}

/// Format bytes as a human-readable size
pub fn format_bytes(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;

    if bytes >= MIB {
        format!("{:.1} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn output_pretty(report: &UnusedJsReport, options: &AuditOptions) {
    use console::style;

    println!("\n{}", style("Unused JavaScript").bold().cyan());
    println!("{}", style("=================").cyan());

    if report.items.is_empty() {
        println!(
            "\n  No script wastes more than {} of transfer.",
            format_bytes(options.unused_threshold.max(0) as u64)
        );
        println!();
        return;
    }

    println!(
        "\n  Potential savings: {}",
        style(format_bytes(report.overall_savings_bytes)).bold()
    );

    println!("\n{}", style("Scripts:").bold());
    for (i, item) in report.items.iter().enumerate() {
        println!(
            "  {}. {} of {} unused ({:.1}%) - {}",
            i + 1,
            style(format_bytes(item.wasted_bytes)).yellow(),
            format_bytes(item.total_bytes),
            item.wasted_percent,
            item.url
        );
        if let Some(entity) = &item.entity {
            println!("     Entity: {}", entity);
        }
        for sub in &item.sub_items {
            let total = sub
                .source_bytes
                .map(format_bytes)
                .unwrap_or_else(|| "?".to_string());
            println!(
                "     - {} of {} {}",
                format_bytes(sub.source_wasted_bytes),
                total,
                style(&sub.source).dim()
            );
        }
    }

    println!("\n{}", style("By entity:").bold());
    for group in &report.groups {
        let marker = if group.is_first_party {
            " (1st party)"
        } else {
            ""
        };
        println!(
            "  {}{}: {} of {} unused ({:.1}%)",
            group.link.text,
            marker,
            format_bytes(group.wasted_bytes),
            format_bytes(group.total_bytes),
            group.wasted_percent
        );
    }

    println!(); // trailing newline
}

fn output_json(report: &UnusedJsReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{}", json);
    Ok(())
}

fn output_table(report: &UnusedJsReport) {
    let header: Vec<_> = report.headings.iter().map(|h| h.key.as_str()).collect();
    println!("{},wastedPercent,entity", header.join(","));
    for item in &report.items {
        println!(
            "{},{},{},{:.2},{}",
            csv_field(&item.url),
            item.total_bytes,
            item.wasted_bytes,
            item.wasted_percent,
            csv_field(item.entity.as_deref().unwrap_or(""))
        );
    }
}
