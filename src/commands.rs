use crate::{OutputMode, emit_success};
use linkprice::config::{self, LinkpriceConfig};
use linkprice::stats::{self, GroupKey, Summary};
use linkprice::ui::{self, Icons, format_money, groups_table, metrics_table, records_table};
use linkprice::{DeleteFilter, Error, Field, IngestReport, Ingestor, RecordFilter, RecordStore};
use std::path::Path;

/// Config and store shared by every command
pub struct AppContext {
    pub config: LinkpriceConfig,
    pub store: RecordStore,
}

impl AppContext {
    pub fn load(config_path: &Path, database: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = config::load_config(Some(config_path))?.unwrap_or_default();
        if let Some(database) = database {
            config.database = database.to_path_buf();
        }
        let store = RecordStore::new(&config.database, config.key_scheme);
        Ok(Self { config, store })
    }

    fn ingestor(&self) -> anyhow::Result<Ingestor<'_>> {
        Ok(Ingestor::new(&self.store, self.config.ingest_config()?))
    }
}

pub fn run_init(path: &Path, force: bool, output_mode: OutputMode) -> anyhow::Result<()> {
    config::write_config(path, &LinkpriceConfig::default(), force)?;
    if output_mode.is_human() {
        ui::status(Icons::GEAR, "Config written", &path.display().to_string());
    } else {
        emit_success(output_mode, "init", serde_json::json!({ "path": path }))?;
    }
    Ok(())
}

pub fn run_setup(ctx: &AppContext, output_mode: OutputMode) -> anyhow::Result<()> {
    ctx.store.ensure_schema()?;
    if output_mode.is_human() {
        ui::status(Icons::DATABASE, "Database ready", &ctx.store.path().display().to_string());
    }

    let seed = &ctx.config.seed_file;
    if !seed.is_file() {
        if output_mode.is_human() {
            ui::info("No seed file", &seed.display().to_string());
        } else {
            emit_success(output_mode, "setup", serde_json::json!({ "seeded": false }))?;
        }
        return Ok(());
    }

    let report = ctx.ingestor()?.ingest_path(seed)?;
    if output_mode.is_human() {
        print_report(&report);
    } else {
        emit_success(output_mode, "setup", serde_json::json!({ "seeded": true, "report": report }))?;
    }
    Ok(())
}

pub fn run_import(ctx: &AppContext, file: &Path, output_mode: OutputMode) -> anyhow::Result<()> {
    if output_mode.is_human() {
        ui::header(&format!("{} Importing {}", Icons::FILE, file.display()));
    }

    let report = match ctx.ingestor()?.ingest_path(file) {
        Ok(report) => report,
        Err(Error::InputNotFound(path)) => {
            ui::warn(&format!("Input file not found: {} (nothing imported)", path.display()));
            if !output_mode.is_human() {
                emit_success(output_mode, "import", serde_json::json!({ "found": false }))?;
            }
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if output_mode.is_human() {
        print_report(&report);
    } else {
        emit_success(output_mode, "import", serde_json::to_value(&report)?)?;
    }
    Ok(())
}

fn print_report(report: &IngestReport) {
    let mut rows = vec![
        ("Rows read", report.rows_read.to_string()),
        ("Accepted", report.accepted.to_string()),
        ("Rejected", report.rejected_total().to_string()),
    ];
    for (reason, count) in &report.rejected {
        rows.push((reason.as_str(), count.to_string()));
    }
    rows.push(("Nulled values", report.nulled_values.to_string()));
    rows.push(("Written", report.written.to_string()));

    ui::section("Import");
    println!("{}", metrics_table(&rows));
    ui::success(&format!("{} records imported/updated", report.written));
}

pub fn run_list(
    ctx: &AppContext,
    filter: &RecordFilter,
    limit: Option<usize>,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let mut records = filter.apply(&ctx.store.load_all()?);
    let total = records.len();
    if let Some(limit) = limit {
        records.truncate(limit);
    }

    if !output_mode.is_human() {
        return emit_success(
            output_mode,
            "list",
            serde_json::json!({ "total": total, "records": records }),
        );
    }

    if records.is_empty() {
        ui::empty("No records to show.");
        return Ok(());
    }
    println!("{}", records_table(&records));
    if records.len() < total {
        ui::info("Showing", &format!("{} of {}", records.len(), total));
    }
    Ok(())
}

pub fn run_summary(
    ctx: &AppContext,
    filter: &RecordFilter,
    key: GroupKey,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let records = filter.apply(&ctx.store.load_all()?);
    let summary = Summary::of(&records);
    let groups = stats::group_by(&records, key);

    if !output_mode.is_human() {
        return emit_success(
            output_mode,
            "summary",
            serde_json::json!({ "summary": summary, "group_by": key, "groups": groups }),
        );
    }

    let scope = if filter.is_empty() { "all records" } else { "filtered" };
    ui::section(&format!("{} Results ({})", Icons::MONEY, scope));
    println!(
        "{}",
        metrics_table(&[
            ("Records", summary.count.to_string()),
            ("Mean monthly", format_money(summary.mean_monthly)),
            ("Mean activation", format_money(summary.mean_activation)),
            ("Combined mean", format_money(summary.combined_mean)),
        ])
    );

    ui::section(&format!("By {}", key));
    if groups.is_empty() {
        ui::empty("No data to show.");
    } else {
        println!("{}", groups_table(&groups, key));
    }
    Ok(())
}

pub fn run_options(ctx: &AppContext, field: &str, output_mode: OutputMode) -> anyhow::Result<()> {
    let field: Field = field.parse()?;
    let values: Vec<String> = if field == Field::Speed {
        ctx.store.distinct_speeds()?.into_iter().map(|s| s.to_string()).collect()
    } else {
        ctx.store.distinct_values(field)?
    };

    if !output_mode.is_human() {
        return emit_success(
            output_mode,
            "options",
            serde_json::json!({ "field": field, "values": values }),
        );
    }

    ui::section(&format!("{} {}", Icons::FILTER, field));
    if values.is_empty() {
        ui::empty("No values stored.");
    }
    for value in values {
        println!("  {}", value);
    }
    Ok(())
}

pub fn run_delete(ctx: &AppContext, filter: &DeleteFilter, output_mode: OutputMode) -> anyhow::Result<()> {
    if !filter.is_scoped() && !filter.confirm_all {
        anyhow::bail!("Give at least one of --state, --city, --service-type, --link (or --all to delete everything)");
    }
    let removed = ctx.store.delete_where(filter)?;

    if !output_mode.is_human() {
        return emit_success(
            output_mode,
            "delete",
            serde_json::json!({ "filter": filter.to_string(), "deleted": removed }),
        );
    }

    if removed == 0 {
        ui::info("No records matched", &filter.to_string());
    } else {
        ui::status(Icons::DEL, "Deleted", &format!("{} rows ({})", removed, filter));
    }
    Ok(())
}

pub fn run_stats(ctx: &AppContext, output_mode: OutputMode) -> anyhow::Result<()> {
    let stats = ctx.store.stats()?;

    if !output_mode.is_human() {
        return emit_success(
            output_mode,
            "stats",
            serde_json::json!({
                "database": ctx.store.path(),
                "key_scheme": ctx.store.scheme(),
                "stats": stats,
            }),
        );
    }

    ui::header(&format!("{} linkprice Statistics ({})", Icons::STATS, ctx.store.path().display()));
    println!(
        "{}",
        metrics_table(&[
            ("Key scheme", ctx.store.scheme().to_string()),
            ("Rows", stats.rows.to_string()),
            ("States", stats.states.to_string()),
            ("Cities", stats.cities.to_string()),
            ("Service types", stats.service_types.to_string()),
        ])
    );
    Ok(())
}
