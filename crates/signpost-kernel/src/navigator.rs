//! The Navigator: orchestrates parse → resolve → authorize → commit.
//!
//! Every public operation is a single transaction against one
//! [`SessionState`]. All fallible and suspending work (parsing, cache loads,
//! the permission gate) happens before the commit point; the commit itself is
//! synchronous. A failed call, or a future dropped before it completes,
//! leaves the session and its breadcrumb trail exactly as they were.

use std::sync::Arc;

use signpost_types::{
    Block, FileId, LinkExpression, NavigationContext, NavigationTarget, Principal,
};
use tracing::Instrument;

use crate::cache::ResourceCache;
use crate::error::{NavError, NavResult, PermissionError, ResolutionError};
use crate::gate::{PermissionGate, RoleMapping};
use crate::resolver::{Locality, Resolution, Resolver};
use crate::session::{BACK_MARKER, SessionState};

/// What to do when the gate denies entry to a resolved block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DenialPolicy {
    /// Surface the `PermissionError`; the session is untouched.
    #[default]
    Fail,
    /// Navigate to `fallback` instead, resolved against the same context.
    ///
    /// If the fallback cannot be reached, the original `PermissionError` is
    /// returned and nothing is committed.
    Redirect { fallback: LinkExpression },
}

/// A committed navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationOutcome {
    /// Where the session now is.
    pub target: NavigationTarget,
    pub locality: Locality,
    /// Set when a denial was redirected; carries the missing capability.
    pub denied: Option<String>,
    /// The expression written to the session (or the back marker).
    pub expression: String,
}

impl NavigationOutcome {
    pub fn was_redirected(&self) -> bool {
        self.denied.is_some()
    }
}

/// Receives the result of every navigator call, successful or not.
pub trait Renderer: Send + Sync {
    fn render(&self, session: &SessionState, result: &NavResult<NavigationOutcome>);
}

/// Navigation façade shared by all sessions.
#[derive(Clone)]
pub struct Navigator {
    resolver: Resolver,
    gate: PermissionGate,
    denial: DenialPolicy,
    renderer: Option<Arc<dyn Renderer>>,
}

impl std::fmt::Debug for Navigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator")
            .field("resolver", &self.resolver)
            .field("gate", &self.gate)
            .field("denial", &self.denial)
            .field("renderer", &self.renderer.is_some())
            .finish()
    }
}

impl Navigator {
    /// Create a navigator over a shared cache with the given home file.
    pub fn new(cache: Arc<ResourceCache>, home: FileId) -> Self {
        Self {
            resolver: Resolver::new(cache, home),
            gate: PermissionGate::new(),
            denial: DenialPolicy::default(),
            renderer: None,
        }
    }

    pub fn with_role_mapping(mut self, roles: Arc<dyn RoleMapping>) -> Self {
        self.gate = PermissionGate::with_role_mapping(roles);
        self
    }

    pub fn with_denial_policy(mut self, policy: DenialPolicy) -> Self {
        self.denial = policy;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn cache(&self) -> &Arc<ResourceCache> {
        self.resolver.cache()
    }

    pub fn home(&self) -> &FileId {
        self.resolver.home()
    }

    pub fn denial_policy(&self) -> &DenialPolicy {
        &self.denial
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Navigate from `ctx` along `raw`.
    pub async fn navigate(
        &self,
        raw: &str,
        ctx: &NavigationContext,
        principal: &Principal,
        session: &mut SessionState,
    ) -> NavResult<NavigationOutcome> {
        let span = tracing::info_span!(
            "nav.navigate",
            expression = raw,
            session = %session.id,
            from = %ctx.location(),
        );

        let result = async {
            let outcome = self.plan(raw, ctx, principal).await?;
            // Commit point. Nothing below may await.
            session.commit_forward(&outcome.expression, &outcome.target);
            tracing::info!(to = %outcome.target, locality = %outcome.locality, "navigated");
            Ok::<_, NavError>(outcome)
        }
        .instrument(span)
        .await;

        self.finish(session, result)
    }

    /// Navigate from wherever the session currently is.
    ///
    /// A session that has not landed resolves relative to the home entry.
    pub async fn navigate_in_session(
        &self,
        raw: &str,
        principal: &Principal,
        session: &mut SessionState,
    ) -> NavResult<NavigationOutcome> {
        let ctx = match session.context() {
            Some(ctx) => ctx,
            None => match self.home_context().await {
                Ok(ctx) => ctx,
                Err(e) => return self.finish(session, Err(e)),
            },
        };
        self.navigate(raw, &ctx, principal, session).await
    }

    /// Pop the breadcrumb trail and return to the previous location.
    pub fn back(&self, session: &mut SessionState) -> NavResult<NavigationOutcome> {
        let span = tracing::info_span!(
            "nav.back",
            session = %session.id,
            depth = session.breadcrumbs().depth(),
        );
        let _entered = span.enter();

        let from = session.location();
        let result = session
            .commit_back()
            .map(|target| {
                let locality = match &from {
                    Some(from) if from.file == target.file => Locality::IntraFile,
                    _ => Locality::InterFile,
                };
                tracing::info!(to = %target, "navigated back");
                NavigationOutcome {
                    target,
                    locality,
                    denied: None,
                    expression: BACK_MARKER.to_string(),
                }
            })
            .map_err(NavError::from);

        self.finish(session, result)
    }

    /// Land at the home entry block, discarding any existing trail.
    pub async fn land(
        &self,
        principal: &Principal,
        session: &mut SessionState,
    ) -> NavResult<NavigationOutcome> {
        let span = tracing::info_span!("nav.land", session = %session.id, home = %self.home());

        let result = async {
            let ctx = self.home_context().await?;
            let outcome = self.plan(&self.home_expression(), &ctx, principal).await?;
            session.commit_landing(&outcome.expression, &outcome.target);
            tracing::info!(to = %outcome.target, "landed");
            Ok::<_, NavError>(outcome)
        }
        .instrument(span)
        .await;

        self.finish(session, result)
    }

    /// Forward navigation to the home entry block. Lands if not yet landed.
    pub async fn go_home(
        &self,
        principal: &Principal,
        session: &mut SessionState,
    ) -> NavResult<NavigationOutcome> {
        match session.context() {
            Some(ctx) => {
                self.navigate(&self.home_expression(), &ctx, principal, session)
                    .await
            }
            None => self.land(principal, session).await,
        }
    }

    /// Fetch the block a target points at, for rendering.
    pub async fn block(&self, target: &NavigationTarget) -> NavResult<Block> {
        let file = self.cache().load(&target.file).await?;
        file.block(&target.block)
            .cloned()
            .ok_or_else(|| missing_block(target).into())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// `~.<name>` resolves to the home file from anywhere.
    fn home_expression(&self) -> String {
        format!("~.{}", self.home().name())
    }

    async fn home_context(&self) -> NavResult<NavigationContext> {
        let file = self.cache().load(self.home()).await?;
        Ok(NavigationContext::new(file.id().clone(), file.entry().clone()))
    }

    /// Everything up to (not including) the commit.
    async fn plan(
        &self,
        raw: &str,
        ctx: &NavigationContext,
        principal: &Principal,
    ) -> NavResult<NavigationOutcome> {
        let expr = LinkExpression::parse(raw)?;
        let resolution = self.resolver.resolve_detailed(&expr, ctx).await?;

        match self.admit(&resolution, principal) {
            Ok(()) => Ok(NavigationOutcome {
                target: resolution.target,
                locality: resolution.locality,
                denied: None,
                expression: raw.to_string(),
            }),
            Err(NavError::Permission(denied)) => self.redirect(denied, ctx, principal).await,
            Err(e) => Err(e),
        }
    }

    fn admit(&self, resolution: &Resolution, principal: &Principal) -> NavResult<()> {
        let block = resolution
            .file
            .block(&resolution.target.block)
            .ok_or_else(|| missing_block(&resolution.target))?;
        self.gate.check(&resolution.target, block, principal)?;
        Ok(())
    }

    async fn redirect(
        &self,
        denied: PermissionError,
        ctx: &NavigationContext,
        principal: &Principal,
    ) -> NavResult<NavigationOutcome> {
        let DenialPolicy::Redirect { fallback } = &self.denial else {
            return Err(denied.into());
        };

        let fallback_result = match self.resolver.resolve_detailed(fallback, ctx).await {
            Ok(resolution) => self.admit(&resolution, principal).map(|()| resolution),
            Err(e) => Err(e),
        };

        match fallback_result {
            Ok(resolution) => {
                tracing::warn!(
                    required = denied.required.as_str(),
                    denied = %denied.target,
                    fallback = %resolution.target,
                    "entry denied, redirecting"
                );
                Ok(NavigationOutcome {
                    target: resolution.target,
                    locality: resolution.locality,
                    denied: Some(denied.required),
                    expression: fallback.to_string(),
                })
            }
            Err(e) => {
                tracing::warn!(%fallback, error = %e, "denial fallback unreachable");
                Err(denied.into())
            }
        }
    }

    fn finish(
        &self,
        session: &SessionState,
        result: NavResult<NavigationOutcome>,
    ) -> NavResult<NavigationOutcome> {
        if let Err(e) = &result {
            match e {
                NavError::Permission(_) | NavError::Loader(_) => {
                    tracing::warn!(category = e.category(), error = %e, "navigation failed")
                }
                _ => tracing::debug!(category = e.category(), error = %e, "navigation failed"),
            }
        }
        if let Some(renderer) = &self.renderer {
            renderer.render(session, &result);
        }
        result
    }
}

fn missing_block(target: &NavigationTarget) -> ResolutionError {
    ResolutionError::MissingBlock {
        file: target.file.clone(),
        block: target.block.clone(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StateError;
    use crate::gate::StaticRoleMap;
    use crate::loader::MemoryLoader;
    use parking_lot::Mutex;
    use signpost_types::{BlockId, ResourceFile};

    fn fid(s: &str) -> FileId {
        FileId::parse(s).unwrap()
    }

    fn bid(s: &str) -> BlockId {
        BlockId::new(s).unwrap()
    }

    fn navigator() -> Navigator {
        let files = [
            ResourceFile::new(
                fid("main/menu"),
                [Block::new(bid("main")), Block::new(bid("Block2"))],
                None,
            )
            .unwrap(),
            ResourceFile::new(
                fid("admin/panel"),
                [
                    Block::new(bid("intro")),
                    Block::new(bid("users")).with_permission("users.manage"),
                ],
                None,
            )
            .unwrap(),
            ResourceFile::new(fid("system/errors"), [Block::new(bid("denied"))], None).unwrap(),
        ];
        let cache = ResourceCache::shared(MemoryLoader::with_files(files));
        Navigator::new(cache, fid("main/menu"))
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Result<NavigationTarget, String>>>);

    impl Renderer for Recorder {
        fn render(&self, _session: &SessionState, result: &NavResult<NavigationOutcome>) {
            self.0.lock().push(match result {
                Ok(outcome) => Ok(outcome.target.clone()),
                Err(e) => Err(e.category().to_string()),
            });
        }
    }

    #[tokio::test]
    async fn test_land_then_intra_file() {
        let nav = navigator();
        let mut session = SessionState::new();
        let who = Principal::anonymous();

        let landed = nav.land(&who, &mut session).await.unwrap();
        assert_eq!(landed.target, NavigationTarget::new(fid("main/menu"), bid("main")));

        let outcome = nav.navigate_in_session("./Block2", &who, &mut session).await.unwrap();
        assert_eq!(outcome.locality, Locality::IntraFile);
        assert_eq!(session.current_block(), Some("Block2"));
        assert_eq!(session.current_expression(), Some("./Block2"));
        assert_eq!(session.breadcrumbs().depth(), 2);
    }

    #[tokio::test]
    async fn test_unlanded_session_resolves_from_home() {
        let nav = navigator();
        let mut session = SessionState::new();
        nav.navigate_in_session("@.admin.panel", &Principal::anonymous(), &mut session)
            .await
            .unwrap();
        assert_eq!(session.current_file(), Some("admin/panel"));
        assert_eq!(session.breadcrumbs().depth(), 1);
    }

    #[tokio::test]
    async fn test_syntax_error_is_not_committed() {
        let nav = navigator();
        let mut session = SessionState::new();
        let who = Principal::anonymous();
        nav.land(&who, &mut session).await.unwrap();

        let err = nav
            .navigate_in_session("#bogus", &who, &mut session)
            .await
            .unwrap_err();
        assert!(matches!(err, NavError::Syntax(_)));
        assert_eq!(session.breadcrumbs().depth(), 1);
    }

    #[tokio::test]
    async fn test_role_mapping_admits() {
        let roles = StaticRoleMap::new().grant("admin", ["users.manage"]);
        let nav = navigator().with_role_mapping(Arc::new(roles));
        let mut session = SessionState::new();
        let admin = Principal::new("amy").with_role("admin");
        nav.land(&admin, &mut session).await.unwrap();

        let outcome = nav
            .navigate_in_session("@.admin.panel:users", &admin, &mut session)
            .await
            .unwrap();
        assert!(!outcome.was_redirected());
        assert_eq!(session.current_block(), Some("users"));
    }

    #[tokio::test]
    async fn test_redirect_on_denial() {
        let nav = navigator().with_denial_policy(DenialPolicy::Redirect {
            fallback: LinkExpression::parse("@.system.errors:denied").unwrap(),
        });
        let mut session = SessionState::new();
        let who = Principal::anonymous();
        nav.land(&who, &mut session).await.unwrap();

        let outcome = nav
            .navigate_in_session("@.admin.panel:users", &who, &mut session)
            .await
            .unwrap();
        assert_eq!(outcome.denied.as_deref(), Some("users.manage"));
        assert_eq!(outcome.target, NavigationTarget::new(fid("system/errors"), bid("denied")));
        assert_eq!(session.current_file(), Some("system/errors"));
        assert_eq!(session.current_expression(), Some("@.system.errors:denied"));
    }

    #[tokio::test]
    async fn test_unreachable_fallback_returns_original_denial() {
        let nav = navigator().with_denial_policy(DenialPolicy::Redirect {
            fallback: LinkExpression::parse("@.system.missing").unwrap(),
        });
        let mut session = SessionState::new();
        let who = Principal::anonymous();
        nav.land(&who, &mut session).await.unwrap();

        let err = nav
            .navigate_in_session("@.admin.panel:users", &who, &mut session)
            .await
            .unwrap_err();
        assert!(matches!(err, NavError::Permission(ref p) if p.required == "users.manage"));
        assert_eq!(session.current_file(), Some("main/menu"));
        assert_eq!(session.breadcrumbs().depth(), 1);
    }

    #[tokio::test]
    async fn test_go_home_pushes() {
        let nav = navigator();
        let mut session = SessionState::new();
        let who = Principal::anonymous();
        nav.land(&who, &mut session).await.unwrap();
        nav.navigate_in_session("@.admin.panel", &who, &mut session)
            .await
            .unwrap();

        let outcome = nav.go_home(&who, &mut session).await.unwrap();
        assert_eq!(outcome.target, NavigationTarget::new(fid("main/menu"), bid("main")));
        assert_eq!(session.breadcrumbs().depth(), 3);
    }

    #[tokio::test]
    async fn test_renderer_sees_every_call() {
        let recorder = Arc::new(Recorder::default());
        let nav = navigator().with_renderer(recorder.clone());
        let mut session = SessionState::new();
        let who = Principal::anonymous();

        nav.land(&who, &mut session).await.unwrap();
        let _ = nav.back(&mut session);
        let _ = nav.navigate_in_session("@.nope", &who, &mut session).await;

        let seen = recorder.0.lock().clone();
        assert_eq!(
            seen,
            vec![
                Ok(NavigationTarget::new(fid("main/menu"), bid("main"))),
                Err("state".to_string()),
                Err("resolution".to_string()),
            ]
        );
    }

    #[test]
    fn test_back_underflow_error() {
        let nav = navigator();
        let mut session = SessionState::new();
        let err = nav.back(&mut session).unwrap_err();
        assert!(matches!(err, NavError::State(StateError::Underflow { depth: 0 })));
    }

    #[tokio::test]
    async fn test_block_lookup() {
        let nav = navigator();
        let block = nav
            .block(&NavigationTarget::new(fid("admin/panel"), bid("users")))
            .await
            .unwrap();
        assert!(block.is_gated());

        let err = nav
            .block(&NavigationTarget::new(fid("admin/panel"), bid("ghost")))
            .await
            .unwrap_err();
        assert!(matches!(err, NavError::Resolution(ResolutionError::MissingBlock { .. })));
    }
}
