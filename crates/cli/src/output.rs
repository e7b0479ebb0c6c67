use crate::error::CliError;
use engine_core::metrics::MetricsSnapshot;
use engine_processing::SyncOutcome;
use model::progress::meta::Meta;

/// How one table group ended in a `syncer run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupStatus {
    Finished(SyncOutcome),
    /// Already completed by an earlier run.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct GroupReport {
    pub group_id: String,
    pub meta_id: String,
    pub status: GroupStatus,
}

pub fn render_run_report(reports: &[GroupReport], metrics: &MetricsSnapshot) -> String {
    let mut out = format!(
        "{:<24} {:<32} {:<10} {:>8} {:>10} {:>10}\n",
        "Table group", "Meta", "Status", "Pages", "Success", "Failure"
    );
    for report in reports {
        let (status, pages, success, failure) = match &report.status {
            GroupStatus::Finished(SyncOutcome::Completed {
                pages,
                success,
                failure,
            }) => ("completed", pages.to_string(), success.to_string(), failure.to_string()),
            GroupStatus::Finished(SyncOutcome::Aborted { page_index }) => (
                "stopped",
                format!("@{page_index}"),
                "-".to_string(),
                "-".to_string(),
            ),
            GroupStatus::Skipped => ("skipped", "-".into(), "-".into(), "-".into()),
        };
        out.push_str(&format!(
            "{:<24} {:<32} {:<10} {:>8} {:>10} {:>10}\n",
            report.group_id, report.meta_id, status, pages, success, failure
        ));
    }
    out.push_str(&format!(
        "\n{} pages, {} written, {} failed in {} write waves\n",
        metrics.pages, metrics.records_written, metrics.records_failed, metrics.waves
    ));
    out
}

pub fn print_progress(meta: &Meta, as_json: bool) -> Result<(), CliError> {
    if as_json {
        let json = serde_json::to_string_pretty(meta).map_err(CliError::JsonSerialize)?;
        println!("{json}");
    } else {
        print!("{}", render_progress(meta));
    }
    Ok(())
}

fn render_progress(meta: &Meta) -> String {
    let started = meta
        .begin_time
        .map_or_else(|| "n/a".to_string(), |t| t.to_rfc3339());
    let finished = meta
        .end_time
        .map_or_else(|| "n/a".to_string(), |t| t.to_rfc3339());

    let mut out = format!("Progress for meta '{}':\n", meta.id);
    out.push_str("-----------------------------\n");
    out.push_str(&format!("{:<16} {:?}\n", "State", meta.state));
    out.push_str(&format!("{:<16} {}\n", "Success", meta.success));
    out.push_str(&format!("{:<16} {}\n", "Failure", meta.failure));
    out.push_str(&format!("{:<16} {}\n", "Next page", meta.page_index()));
    out.push_str(&format!("{:<16} {}\n", "Started", started));
    out.push_str(&format!("{:<16} {}\n", "Finished", finished));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::progress::meta::MetaState;

    #[test]
    fn run_report_lists_each_group() {
        let reports = vec![
            GroupReport {
                group_id: "users".into(),
                meta_id: "m.users".into(),
                status: GroupStatus::Finished(SyncOutcome::Completed {
                    pages: 3,
                    success: 250,
                    failure: 2,
                }),
            },
            GroupReport {
                group_id: "orders".into(),
                meta_id: "m.orders".into(),
                status: GroupStatus::Finished(SyncOutcome::Aborted { page_index: 7 }),
            },
            GroupReport {
                group_id: "items".into(),
                meta_id: "m.items".into(),
                status: GroupStatus::Skipped,
            },
        ];
        let metrics = MetricsSnapshot {
            pages: 9,
            records_written: 850,
            records_failed: 2,
            events: 0,
            waves: 12,
        };

        let rendered = render_run_report(&reports, &metrics);
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[1].starts_with("users") && lines[1].contains("completed"));
        assert!(lines[1].trim_end().ends_with('2'));
        assert!(lines[2].contains("stopped") && lines[2].contains("@7"));
        assert!(lines[3].contains("skipped"));
        assert!(rendered.contains("850 written, 2 failed in 12 write waves"));
    }

    #[test]
    fn progress_shows_cursor_and_counters() {
        let mut meta = Meta::new("m");
        meta.state = MetaState::Running;
        meta.set_page_index(5);
        meta.record(40, 1);

        let rendered = render_progress(&meta);
        assert!(rendered.contains("Running"));
        assert!(rendered.contains("Next page        5"));
        assert!(rendered.contains("Finished         n/a"));
    }
}
