//! End-to-end navigation through the public API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use signpost_kernel::{
    LoaderError, LoaderResult, MemoryLoader, NavError, Navigator, PermissionError, ResolutionError,
    ResourceCache, ResourceLoader, SessionState, StateError, BACK_MARKER,
};
use signpost_types::{Block, BlockId, FileId, NavigationTarget, Principal, ResourceFile};

fn fid(s: &str) -> FileId {
    FileId::parse(s).unwrap()
}

fn bid(s: &str) -> BlockId {
    BlockId::new(s).unwrap()
}

fn target(file: &str, block: &str) -> NavigationTarget {
    NavigationTarget::new(fid(file), bid(block))
}

fn workspace() -> MemoryLoader {
    MemoryLoader::with_files([
        ResourceFile::new(
            fid("main/menu"),
            [
                Block::new(bid("main")).with_link("./Block2"),
                Block::new(bid("Block2")).with_link("@.folder.target:AdminBlock"),
            ],
            None,
        )
        .unwrap(),
        ResourceFile::new(
            fid("main/settings"),
            [Block::new(bid("display")), Block::new(bid("sound"))],
            None,
        )
        .unwrap(),
        ResourceFile::new(
            fid("folder/target"),
            [
                Block::new(bid("intro")),
                Block::new(bid("AdminBlock")).with_permission("admin"),
            ],
            None,
        )
        .unwrap(),
    ])
}

/// Delegates to an inner loader, except that some files never finish
/// loading and some fail with a storage error.
struct FlakyLoader {
    inner: MemoryLoader,
    hang: FileId,
    broken: FileId,
}

#[async_trait]
impl ResourceLoader for FlakyLoader {
    async fn load_file(&self, id: &FileId) -> LoaderResult<ResourceFile> {
        if *id == self.hang {
            std::future::pending::<()>().await;
        }
        if *id == self.broken {
            return Err(LoaderError::other("storage unavailable"));
        }
        self.inner.load_file(id).await
    }
}

async fn landed(nav: &Navigator, who: &Principal) -> SessionState {
    let mut session = SessionState::new();
    nav.land(who, &mut session).await.unwrap();
    session
}

#[tokio::test]
async fn intra_file_navigation_reuses_resident_file() {
    let loader = Arc::new(workspace());
    let cache = Arc::new(ResourceCache::new(loader.clone()));
    let nav = Navigator::new(cache, fid("main/menu"));
    let who = Principal::anonymous();
    let mut session = landed(&nav, &who).await;

    let outcome = nav
        .navigate_in_session("./Block2", &who, &mut session)
        .await
        .unwrap();
    assert_eq!(outcome.target, target("main/menu", "Block2"));
    assert_eq!(loader.load_count(&fid("main/menu")), 1);
}

#[tokio::test]
async fn permission_denial_leaves_session_unchanged() {
    let nav = Navigator::new(ResourceCache::shared(workspace()), fid("main/menu"));
    let guest = Principal::new("guest");
    let mut session = landed(&nav, &guest).await;
    nav.navigate_in_session("./Block2", &guest, &mut session)
        .await
        .unwrap();
    let vars_before = session.vars().clone();
    let trail_before = session.breadcrumbs().clone();

    let err = nav
        .navigate_in_session("@.folder.target:AdminBlock", &guest, &mut session)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        NavError::Permission(PermissionError { ref required, .. }) if required == "admin"
    ));
    assert_eq!(session.vars(), &vars_before);
    assert_eq!(session.breadcrumbs(), &trail_before);
    assert_eq!(session.current_block(), Some("Block2"));
}

#[tokio::test]
async fn admin_enters_gated_block() {
    let nav = Navigator::new(ResourceCache::shared(workspace()), fid("main/menu"));
    let admin = Principal::new("amy").with_role("admin");
    let mut session = landed(&nav, &admin).await;

    let outcome = nav
        .navigate_in_session("@.folder.target:AdminBlock", &admin, &mut session)
        .await
        .unwrap();
    assert_eq!(outcome.target, target("folder/target", "AdminBlock"));
    assert_eq!(session.current_file(), Some("folder/target"));
}

#[tokio::test]
async fn missing_file_leaves_session_unchanged() {
    let nav = Navigator::new(ResourceCache::shared(workspace()), fid("main/menu"));
    let who = Principal::anonymous();
    let mut session = landed(&nav, &who).await;
    let vars_before = session.vars().clone();

    let err = nav
        .navigate_in_session("@.nonexistent.file", &who, &mut session)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        NavError::Resolution(ResolutionError::MissingFile(ref f)) if *f == fid("nonexistent/file")
    ));
    assert_eq!(session.vars(), &vars_before);
    assert_eq!(session.breadcrumbs().depth(), 1);
}

#[tokio::test]
async fn forward_then_back_twice_then_underflow() {
    let nav = Navigator::new(ResourceCache::shared(workspace()), fid("main/menu"));
    let who = Principal::anonymous();
    let mut session = landed(&nav, &who).await;

    nav.navigate_in_session("./settings:sound", &who, &mut session)
        .await
        .unwrap();
    nav.navigate_in_session("@.folder.target", &who, &mut session)
        .await
        .unwrap();
    assert_eq!(session.breadcrumbs().depth(), 3);

    let first = nav.back(&mut session).unwrap();
    assert_eq!(first.target, target("main/settings", "sound"));
    assert_eq!(session.current_expression(), Some(BACK_MARKER));

    let second = nav.back(&mut session).unwrap();
    assert_eq!(second.target, target("main/menu", "main"));
    assert_eq!(session.current_file(), Some("main/menu"));
    assert_eq!(session.current_block(), Some("main"));

    let vars_before = session.vars().clone();
    let err = nav.back(&mut session).unwrap_err();
    assert!(matches!(err, NavError::State(StateError::Underflow { depth: 1 })));
    assert_eq!(session.vars(), &vars_before);
}

#[tokio::test]
async fn repeat_visits_are_not_deduplicated() {
    let nav = Navigator::new(ResourceCache::shared(workspace()), fid("main/menu"));
    let who = Principal::anonymous();
    let mut session = landed(&nav, &who).await;

    for _ in 0..3 {
        nav.navigate_in_session("~.menu", &who, &mut session)
            .await
            .unwrap();
    }
    assert_eq!(session.breadcrumbs().depth(), 4);
    assert!(
        session
            .breadcrumbs()
            .trail()
            .all(|e| e.target() == target("main/menu", "main"))
    );
}

#[tokio::test]
async fn cancelled_navigation_commits_nothing() {
    let loader = FlakyLoader {
        inner: workspace(),
        hang: fid("main/settings"),
        broken: fid("folder/target"),
    };
    let nav = Navigator::new(ResourceCache::shared(loader), fid("main/menu"));
    let who = Principal::anonymous();
    let mut session = landed(&nav, &who).await;
    let vars_before = session.vars().clone();

    let attempt = tokio::time::timeout(
        Duration::from_millis(50),
        nav.navigate_in_session("./settings", &who, &mut session),
    )
    .await;
    assert!(attempt.is_err(), "navigation should still be pending");

    assert_eq!(session.vars(), &vars_before);
    assert_eq!(session.breadcrumbs().depth(), 1);
}

#[tokio::test]
async fn storage_failure_is_opaque() {
    let loader = FlakyLoader {
        inner: workspace(),
        hang: fid("main/settings"),
        broken: fid("folder/target"),
    };
    let nav = Navigator::new(ResourceCache::shared(loader), fid("main/menu"));
    let who = Principal::anonymous();
    let mut session = landed(&nav, &who).await;

    let err = nav
        .navigate_in_session("@.folder.target", &who, &mut session)
        .await
        .unwrap_err();
    assert!(matches!(err, NavError::Loader(LoaderError::Other(_))));
    assert!(!err.is_recoverable());
    assert_eq!(session.breadcrumbs().depth(), 1);
}

#[tokio::test]
async fn sessions_share_one_cache() {
    let loader = Arc::new(workspace());
    let cache = Arc::new(ResourceCache::new(loader.clone()));
    let nav = Arc::new(Navigator::new(cache, fid("main/menu")));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let nav = Arc::clone(&nav);
            tokio::spawn(async move {
                let who = Principal::new(format!("user{i}"));
                let mut session = SessionState::new();
                nav.land(&who, &mut session).await.unwrap();
                nav.navigate_in_session("./settings:display", &who, &mut session)
                    .await
                    .unwrap();
                session.breadcrumbs().depth()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), 2);
    }
    assert_eq!(nav.cache().stats().resident, 2);
}
