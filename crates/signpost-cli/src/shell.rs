//! Interactive navigation shell.
//!
//! Reads one command per line and drives a [`Navigator`] for a single
//! session. Every navigation result is printed by [`TerminalRenderer`], the
//! shell's renderer collaborator.

use std::fmt::Display;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context as _, bail};
use parking_lot::Mutex;
use signpost_kernel::{
    NavResult, NavigationOutcome, Navigator, Renderer, ResourceCache, SessionState,
};
use signpost_types::{Block, Principal};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub const HELP: &str = "\
commands:
  go <expr>   follow a link expression (e.g. go ./settings, go @.admin.panel:users)
  go <n>      follow link number n of the current block
  back        return to the previous location
  home        go to the home entry block
  where       show the current location
  trail       show the breadcrumb trail
  links       list links of the current block
  reload      drop all cached files
  help        show this help
  quit        leave the shell";

/// One line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Go(String),
    Follow(usize),
    Back,
    Home,
    Where,
    Trail,
    Links,
    Reload,
    Help,
    Quit,
}

impl FromStr for ShellCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(w, r)| (w, r.trim()))
            .unwrap_or((line, ""));

        let cmd = match (word, rest) {
            ("go" | "g", "") => bail!("usage: go <expr> | go <n>"),
            ("go" | "g", arg) => match arg.parse::<usize>() {
                Ok(0) => bail!("links are numbered from 1"),
                Ok(n) => ShellCommand::Follow(n),
                Err(_) => ShellCommand::Go(arg.to_string()),
            },
            ("back" | "b", "") => ShellCommand::Back,
            ("home", "") => ShellCommand::Home,
            ("where" | "pwd", "") => ShellCommand::Where,
            ("trail", "") => ShellCommand::Trail,
            ("links" | "ls", "") => ShellCommand::Links,
            ("reload", "") => ShellCommand::Reload,
            ("help" | "?", "") => ShellCommand::Help,
            ("quit" | "exit" | "q", "") => ShellCommand::Quit,
            (word, "") => bail!("unknown command '{word}' (try 'help')"),
            (word, _) => bail!("'{word}' takes no arguments"),
        };
        Ok(cmd)
    }
}

/// Render a block payload as text.
pub fn format_content(content: &serde_json::Value) -> String {
    match content {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

fn write_block(out: &mut impl Write, block: &Block) -> std::io::Result<()> {
    let content = format_content(&block.content);
    if !content.is_empty() {
        writeln!(out, "{content}")?;
    }
    for (i, link) in block.links.iter().enumerate() {
        writeln!(out, "  [{}] {link}", i + 1)?;
    }
    Ok(())
}

/// Prints each navigation result and the block it landed on.
///
/// Reads blocks from the cache without I/O: after a successful navigation
/// the target's file is always resident.
pub struct TerminalRenderer<W> {
    cache: Arc<ResourceCache>,
    out: Arc<Mutex<W>>,
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(cache: Arc<ResourceCache>, out: Arc<Mutex<W>>) -> Self {
        Self { cache, out }
    }

    fn render_outcome(&self, out: &mut W, outcome: &NavigationOutcome) -> std::io::Result<()> {
        if let Some(label) = &outcome.denied {
            writeln!(out, "access denied (requires '{label}'), redirected")?;
        }
        writeln!(out, "== {} ==", outcome.target)?;
        let block = self
            .cache
            .get(&outcome.target.file)
            .and_then(|file| file.block(&outcome.target.block).cloned());
        match block {
            Some(block) => write_block(out, &block),
            None => writeln!(out, "(block no longer cached)"),
        }
    }
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn render(&self, _session: &SessionState, result: &NavResult<NavigationOutcome>) {
        let mut out = self.out.lock();
        let written = match result {
            Ok(outcome) => self.render_outcome(&mut out, outcome),
            Err(e) => writeln!(out, "error: {e}"),
        };
        if let Err(e) = written {
            tracing::warn!(error = %e, "failed to write navigation result");
        }
    }
}

/// One interactive session.
pub struct Shell<W> {
    navigator: Navigator,
    principal: Principal,
    session: SessionState,
    out: Arc<Mutex<W>>,
}

impl<W: Write + Send + 'static> Shell<W> {
    /// Attach a [`TerminalRenderer`] writing to `out` and start a fresh session.
    pub fn new(navigator: Navigator, principal: Principal, out: Arc<Mutex<W>>) -> Self {
        let renderer = TerminalRenderer::new(Arc::clone(navigator.cache()), Arc::clone(&out));
        Self {
            navigator: navigator.with_renderer(Arc::new(renderer)),
            principal,
            session: SessionState::new(),
            out,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    fn say(&self, text: impl Display) -> std::io::Result<()> {
        writeln!(self.out.lock(), "{text}")
    }

    /// Log the failures the renderer cannot make sense of for the user.
    fn note(&self, result: NavResult<NavigationOutcome>) {
        match result {
            Err(e) if !e.is_recoverable() => {
                tracing::error!(error = %e, "resource storage failure");
            }
            _ => {}
        }
    }

    /// Land at home, then process lines until EOF or `quit`.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> anyhow::Result<()> {
        self.navigator
            .land(&self.principal, &mut self.session)
            .await
            .context("failed to land at the home file")?;

        let mut lines = input.lines();
        loop {
            {
                let mut out = self.out.lock();
                write!(out, "> ")?;
                out.flush()?;
            }
            let Some(line) = lines.next_line().await? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<ShellCommand>() {
                Ok(cmd) => {
                    if !self.execute(cmd).await? {
                        break;
                    }
                }
                Err(e) => self.say(e)?,
            }
        }
        Ok(())
    }

    /// Run one command. Returns `false` when the shell should exit.
    pub async fn execute(&mut self, cmd: ShellCommand) -> anyhow::Result<bool> {
        tracing::debug!(?cmd, session = %self.session.id, "shell command");
        match cmd {
            ShellCommand::Go(raw) => {
                let result = self
                    .navigator
                    .navigate_in_session(&raw, &self.principal, &mut self.session)
                    .await;
                self.note(result);
            }
            ShellCommand::Follow(n) => match self.current_block().await {
                Some(block) => match n.checked_sub(1).and_then(|i| block.links.get(i)) {
                    Some(link) => {
                        let result = self
                            .navigator
                            .navigate_in_session(link, &self.principal, &mut self.session)
                            .await;
                        self.note(result);
                    }
                    None => self.say(format!("no link [{n}] here"))?,
                },
                None => self.say("not landed")?,
            },
            ShellCommand::Back => {
                let result = self.navigator.back(&mut self.session);
                self.note(result);
            }
            ShellCommand::Home => {
                let result = self
                    .navigator
                    .go_home(&self.principal, &mut self.session)
                    .await;
                self.note(result);
            }
            ShellCommand::Where => match self.session.location() {
                Some(location) => self.say(format!(
                    "{location} (via {})",
                    self.session.current_expression().unwrap_or("?")
                ))?,
                None => self.say("not landed")?,
            },
            ShellCommand::Trail => {
                let trail: Vec<String> = self
                    .session
                    .breadcrumbs()
                    .trail()
                    .map(ToString::to_string)
                    .collect();
                self.say(trail.join(" > "))?;
            }
            ShellCommand::Links => match self.current_block().await {
                Some(block) if block.links.is_empty() => self.say("(no links)")?,
                Some(block) => {
                    let mut out = self.out.lock();
                    for (i, link) in block.links.iter().enumerate() {
                        writeln!(out, "  [{}] {link}", i + 1)?;
                    }
                }
                None => self.say("not landed")?,
            },
            ShellCommand::Reload => {
                let before = self.navigator.cache().stats().resident;
                self.navigator.cache().clear();
                self.say(format!("dropped {before} cached file(s)"))?;
            }
            ShellCommand::Help => self.say(HELP)?,
            ShellCommand::Quit => return Ok(false),
        }
        Ok(true)
    }

    async fn current_block(&self) -> Option<Block> {
        let location = self.session.location()?;
        match self.navigator.block(&location).await {
            Ok(block) => Some(block),
            Err(e) => {
                tracing::warn!(%location, error = %e, "current block unavailable");
                None
            }
        }
    }
}
