//! Terminal rendering of query results, datasets and pane views.

use std::io::{self, Write};

use tabwriter::TabWriter;
use trellis_ui_common::{Dataset, QueryResult, View};

/// Tab-aligned table with a header row.
pub fn write_table<W: Write>(out: &mut W, columns: &[String], rows: &[Vec<String>]) -> io::Result<()> {
    let mut tw = TabWriter::new(&mut *out);
    writeln!(tw, "{}", columns.join("\t"))?;
    for row in rows {
        writeln!(tw, "{}", row.join("\t"))?;
    }
    tw.flush()
}

pub fn write_result<W: Write>(out: &mut W, result: &QueryResult, json: bool) -> io::Result<()> {
    if json {
        return writeln!(out, "{}", result.to_json());
    }

    match result.rows() {
        Some(rows) => {
            let columns = result.columns();
            let cells: Vec<Vec<String>> = rows
                .iter()
                .map(|row| {
                    columns
                        .iter()
                        .map(|c| row.get(c).unwrap_or_default().to_string())
                        .collect()
                })
                .collect();
            if !columns.is_empty() {
                write_table(out, &columns, &cells)?;
            }
            writeln!(
                out,
                "{} rows in {:.1} ms",
                rows.len(),
                result.elapsed_ms()
            )
        }
        None => writeln!(out, "update applied in {:.1} ms", result.elapsed_ms()),
    }
}

pub fn write_datasets<W: Write>(out: &mut W, datasets: &[Dataset]) -> io::Result<()> {
    let rows: Vec<Vec<String>> = datasets
        .iter()
        .map(|d| vec![d.path.clone(), d.base.clone()])
        .collect();
    write_table(out, &["path".to_string(), "base".to_string()], &rows)
}

/// Plain-text rendering of a pane view, under a heading.
pub fn write_view<W: Write>(out: &mut W, heading: &str, view: &View) -> io::Result<()> {
    writeln!(out, "== {heading} ==")?;
    match view {
        View::Blank => writeln!(out, "(blank)"),
        View::Loading { label } => writeln!(out, "loading {label}"),
        View::Message { text } => writeln!(out, "{text}"),
        View::Error { subject, message } => writeln!(out, "error: {subject}: {message}"),
        View::List { title, items } => {
            writeln!(out, "{title}")?;
            for item in items {
                writeln!(out, "  {item}")?;
            }
            Ok(())
        }
        View::Table {
            caption,
            columns,
            rows,
        } => {
            writeln!(out, "{caption}")?;
            write_table(out, columns, rows)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use trellis_ui_common::{QueryOutcome, Row};

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn tables_are_aligned() {
        let text = render(|out| {
            write_table(
                out,
                &["s".into(), "label".into()],
                &[vec!["urn:a#long-subject".into(), "x".into()]],
            )
        });
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].find("label"), lines[1].find('x'));
    }

    #[test]
    fn update_results_report_timing_only() {
        let result = QueryResult {
            source: "inline".into(),
            query_text: "INSERT DATA {}".into(),
            elapsed: Duration::from_millis(3),
            outcome: QueryOutcome::Update,
        };
        let text = render(|out| write_result(out, &result, false));
        assert_eq!(text, "update applied in 3.0 ms\n");

        let json = render(|out| write_result(out, &result, true));
        assert!(json.contains("\"kind\":\"update\""));
        assert!(!json.contains("rows"));
    }

    #[test]
    fn empty_read_prints_summary() {
        let result = QueryResult {
            source: "q.rq".into(),
            query_text: "SELECT * {}".into(),
            elapsed: Duration::ZERO,
            outcome: QueryOutcome::Rows(Vec::<Row>::new()),
        };
        let text = render(|out| write_result(out, &result, false));
        assert_eq!(text, "0 rows in 0.0 ms\n");
    }

    #[test]
    fn views_render_under_heading() {
        let text = render(|out| {
            write_view(
                out,
                "Datasets",
                &View::List {
                    title: "Datasets (store not loaded)".into(),
                    items: vec!["a.ttl <urn:a#>".into()],
                },
            )
        });
        assert_eq!(
            text,
            "== Datasets ==\nDatasets (store not loaded)\n  a.ttl <urn:a#>\n"
        );
        let error = render(|out| write_view(out, "Nodes", &View::error("q.rq", "boom")));
        assert!(error.contains("error: q.rq: boom"));
    }
}
