//! The export pipeline: paginator → flattener → CSV sink.

use crate::config::Config;
use crate::error::Result;
use crate::fetcher::Paginator;
use crate::flatten::RowWriter;
use crate::types::ExportSummary;
use futures::TryStreamExt;
use std::io::Write;
use tracing::info;

/// Run a full export with a fresh paginator built from `config`
///
/// Rows are written to `sink` as each item arrives. On a fatal error the rows
/// already written stay in the sink.
pub async fn export<W: Write>(config: &Config, sink: W) -> Result<ExportSummary> {
    let paginator = Paginator::new(config)?;
    export_with(paginator, sink).await
}

/// Run a full export driven by an existing paginator
pub async fn export_with<W: Write>(mut paginator: Paginator, sink: W) -> Result<ExportSummary> {
    let mut writer = RowWriter::new(sink)?;
    let mut items_seen: u64 = 0;

    {
        let items = paginator.items();
        futures::pin_mut!(items);

        while let Some(item) = items.try_next().await? {
            writer.write_item(&item)?;
            items_seen += 1;
        }
    }

    let summary = ExportSummary {
        pages: paginator.pages_fetched(),
        items: items_seen,
        rows: writer.rows_written(),
    };
    writer.finish()?;

    info!(
        pages = summary.pages,
        items = summary.items,
        rows = summary.rows,
        "Export complete"
    );

    Ok(summary)
}
