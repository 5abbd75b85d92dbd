//! Link lint: find outbound links that cannot be followed.
//!
//! [`lint_file`] checks syntax only. [`lint_links`] additionally resolves
//! each link from its own block, the way a navigation from that block would,
//! and reports links pointing at files or blocks that do not exist.
//! Permissions are not evaluated.

use signpost_types::{BlockId, FileId, LinkExpression, NavigationContext, ResourceFile};

use crate::error::{NavError, ResolutionError};
use crate::resolver::Resolver;

/// One broken link.
#[derive(Debug)]
pub struct LinkIssue {
    pub file: FileId,
    pub block: BlockId,
    /// Position in the block's `links` list.
    pub index: usize,
    pub link: String,
    pub error: NavError,
}

impl std::fmt::Display for LinkIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} link #{} '{}': {}",
            self.file, self.block, self.index, self.link, self.error
        )
    }
}

/// Report every link in `file` that does not parse.
pub fn lint_file(file: &ResourceFile) -> Vec<LinkIssue> {
    let mut issues = Vec::new();
    for block in file.blocks() {
        for (index, link) in block.links.iter().enumerate() {
            if let Err(e) = LinkExpression::parse(link) {
                issues.push(LinkIssue {
                    file: file.id().clone(),
                    block: block.id.clone(),
                    index,
                    link: link.clone(),
                    error: e.into(),
                });
            }
        }
    }
    issues
}

/// Report every link in `file` that does not parse or does not resolve.
///
/// Opaque loader failures are reported too, since the link cannot be
/// followed either way.
pub async fn lint_links(resolver: &Resolver, file: &ResourceFile) -> Vec<LinkIssue> {
    let mut issues = Vec::new();
    for block in file.blocks() {
        let ctx = NavigationContext::new(file.id().clone(), block.id.clone());
        for (index, link) in block.links.iter().enumerate() {
            let result = match LinkExpression::parse(link) {
                Ok(expr) => resolver.resolve(&expr, &ctx).await.map(|_| ()),
                Err(e) => Err(e.into()),
            };
            if let Err(error) = result {
                tracing::debug!(file = %file.id(), block = %block.id, link, %error, "broken link");
                issues.push(LinkIssue {
                    file: file.id().clone(),
                    block: block.id.clone(),
                    index,
                    link: link.clone(),
                    error,
                });
            }
        }
    }
    issues
}

/// Whether the issue is a missing target rather than bad syntax.
pub fn is_dangling(issue: &LinkIssue) -> bool {
    matches!(
        issue.error,
        NavError::Resolution(ResolutionError::MissingFile(_) | ResolutionError::MissingBlock { .. })
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResourceCache;
    use crate::loader::MemoryLoader;
    use signpost_types::Block;

    fn fid(s: &str) -> FileId {
        FileId::parse(s).unwrap()
    }

    fn bid(s: &str) -> BlockId {
        BlockId::new(s).unwrap()
    }

    fn menu() -> ResourceFile {
        ResourceFile::new(
            fid("main/menu"),
            [
                Block::new(bid("main"))
                    .with_link("./Block2")
                    .with_link("@.nowhere")
                    .with_link("settings"),
                Block::new(bid("Block2"))
                    .with_link("./settings:missing")
                    .with_link("../../up"),
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_lint_file_reports_syntax_only() {
        let issues = lint_file(&menu());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].link, "settings");
        assert_eq!(issues[0].index, 2);
        assert!(matches!(issues[0].error, NavError::Syntax(_)));
    }

    #[tokio::test]
    async fn test_lint_links_resolves() {
        let loader = MemoryLoader::with_files([
            menu(),
            ResourceFile::new(fid("main/settings"), [Block::new(bid("main"))], None).unwrap(),
        ]);
        let resolver = Resolver::new(ResourceCache::shared(loader), fid("main/menu"));

        let issues = lint_links(&resolver, &menu()).await;
        let links: Vec<&str> = issues.iter().map(|i| i.link.as_str()).collect();
        assert_eq!(links, vec!["@.nowhere", "settings", "./settings:missing", "../../up"]);

        let dangling = issues.iter().filter(|i| is_dangling(i)).count();
        assert_eq!(dangling, 2);
        assert!(matches!(
            issues[3].error,
            NavError::Resolution(ResolutionError::AboveRoot { .. })
        ));
    }
}
