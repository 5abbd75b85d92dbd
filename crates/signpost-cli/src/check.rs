//! `signpost check`: report broken links across a workspace.

use std::io::Write;
use std::sync::Arc;

use futures::StreamExt;
use signpost_kernel::{
    LocalLoader, NavigatorConfig, ResourceCache, Resolver, is_dangling, lint_file, lint_links,
};

/// Files linted concurrently.
const PARALLEL_FILES: usize = 8;

/// Lint every resource file under the workspace root.
///
/// With `syntax_only`, links are parsed but not resolved. Writes one line per
/// problem and returns the number of problems found.
pub async fn run(
    config: &NavigatorConfig,
    syntax_only: bool,
    out: &mut impl Write,
) -> anyhow::Result<usize> {
    let loader = LocalLoader::new(&config.workspace_root);
    let files = loader.list_files().await?;
    let cache = Arc::new(ResourceCache::new(Arc::new(loader)));
    let resolver = Resolver::new(Arc::clone(&cache), config.home_id()?);

    tracing::info!(files = files.len(), "checking workspace");

    let mut problems = 0;
    if let Err(e) = cache.load(resolver.home()).await {
        writeln!(out, "home {}: {e}", resolver.home())?;
        problems += 1;
    }

    let resolver = &resolver;
    let reports: Vec<_> = futures::stream::iter(files)
        .map(|id| {
            let cache = Arc::clone(&cache);
            async move {
                match cache.load(&id).await {
                    Ok(file) if syntax_only => Ok(lint_file(&file)),
                    Ok(file) => Ok(lint_links(resolver, &file).await),
                    Err(e) => Err((id, e)),
                }
            }
        })
        .buffered(PARALLEL_FILES)
        .collect()
        .await;

    let checked = reports.len();
    let mut dangling = 0;
    for report in reports {
        match report {
            Ok(issues) => {
                for issue in issues {
                    writeln!(out, "{issue}")?;
                    dangling += usize::from(is_dangling(&issue));
                    problems += 1;
                }
            }
            Err((id, e)) => {
                writeln!(out, "{id}: {e}")?;
                problems += 1;
            }
        }
    }

    writeln!(
        out,
        "{checked} file(s) checked, {problems} problem(s), {dangling} dangling link(s)"
    )?;
    Ok(problems)
}
