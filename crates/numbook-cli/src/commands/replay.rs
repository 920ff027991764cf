use crate::commands::Context;
use crate::error::{invalid_input, not_found};
use anyhow::{Context as _, Result};
use clap::Args;
use numbook_core::UserId;
use numbook_session::{Engine, Reply};
use numbook_store::paths::resolve_sessions_root;
use numbook_store::SessionLayout;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;
use tracing::debug;

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// JSON-lines file with one event object per line
    pub script: PathBuf,
    /// Write delivered .vcf files to `<dir>/<user>/`
    #[arg(long)]
    pub deliver: Option<PathBuf>,
}

/// One transport event. Upload paths are relative to the script's directory.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Event {
    Start {
        user: UserId,
    },
    Upload {
        user: UserId,
        path: PathBuf,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        mime: Option<String>,
    },
    Text {
        user: UserId,
        text: String,
    },
    Confirm {
        user: UserId,
    },
    Reset {
        user: UserId,
    },
    Purge {
        user: UserId,
    },
}

impl Event {
    fn user(&self) -> UserId {
        match self {
            Event::Start { user }
            | Event::Upload { user, .. }
            | Event::Text { user, .. }
            | Event::Confirm { user }
            | Event::Reset { user }
            | Event::Purge { user } => *user,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Event::Start { .. } => "start",
            Event::Upload { .. } => "upload",
            Event::Text { .. } => "text",
            Event::Confirm { .. } => "confirm",
            Event::Reset { .. } => "reset",
            Event::Purge { .. } => "purge",
        }
    }
}

#[derive(Debug, Serialize)]
struct ReplayRecord {
    line: usize,
    user: UserId,
    event: &'static str,
    status: &'static str,
    message: String,
    files: Vec<String>,
}

pub fn replay(ctx: &Context<'_>, args: ReplayArgs) -> Result<()> {
    if !args.script.is_file() {
        return Err(not_found(format!("script {}", args.script.display())));
    }
    let script = fs::read_to_string(&args.script)
        .with_context(|| format!("read script {}", args.script.display()))?;
    let events = parse_script(&script)?;
    let base_dir = match args.script.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let root = resolve_sessions_root(ctx.sessions_dir.clone())
        .with_context(|| "resolve sessions directory")?;
    debug!(path = %root.display(), "sessions root resolved");
    let engine = Engine::new(
        SessionLayout::new(root),
        ctx.rules.clone(),
        ctx.config.admin_ids.clone(),
    );
    let runtime = Runtime::new().with_context(|| "start async runtime")?;

    let mut stdout = io::stdout().lock();
    for (line, event) in events {
        let reply = runtime.block_on(dispatch(&engine, &base_dir, &event))?;
        let user = event.user();
        if let Some(dir) = &args.deliver {
            deliver(dir, user, &reply)?;
        }

        let record = ReplayRecord {
            line,
            user,
            event: event.name(),
            status: reply.status(),
            message: reply.to_string(),
            files: reply.files().iter().map(|file| file.name.clone()).collect(),
        };
        if ctx.json {
            serde_json::to_writer(&mut stdout, &record)?;
            writeln!(stdout)?;
        } else {
            writeln!(stdout, "[{}] {}: {}", record.user, record.event, record.message)?;
            for name in &record.files {
                writeln!(stdout, "  -> {name}")?;
            }
        }
    }
    Ok(())
}

fn parse_script(script: &str) -> Result<Vec<(usize, Event)>> {
    let mut events = Vec::new();
    for (index, raw) in script.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event = serde_json::from_str(trimmed)
            .map_err(|err| invalid_input(format!("script line {line}: {err}")))?;
        events.push((line, event));
    }
    Ok(events)
}

async fn dispatch(engine: &Engine, base_dir: &Path, event: &Event) -> Result<Reply> {
    let reply = match event {
        Event::Start { user } => engine.start(*user).await,
        Event::Upload {
            user,
            path,
            name,
            mime,
        } => {
            let path = base_dir.join(path);
            if !path.is_file() {
                return Err(not_found(format!("upload {}", path.display())));
            }
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("open upload {}", path.display()))?;
            let name = match name {
                Some(name) => name.clone(),
                None => path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            };
            engine.upload(*user, &name, mime.as_deref(), file).await
        }
        Event::Text { user, text } => engine.text(*user, text).await,
        Event::Confirm { user } => engine.confirm(*user).await,
        Event::Reset { user } => engine.reset(*user).await,
        Event::Purge { user } => engine.purge(*user).await,
    };
    Ok(reply)
}

fn deliver(dir: &Path, user: UserId, reply: &Reply) -> Result<()> {
    let files = reply.files();
    if files.is_empty() {
        return Ok(());
    }
    let target = dir.join(user.to_string());
    fs::create_dir_all(&target)
        .with_context(|| format!("create delivery directory {}", target.display()))?;
    for file in files {
        let path = target.join(&file.name);
        fs::write(&path, &file.data).with_context(|| format!("deliver {}", path.display()))?;
    }
    Ok(())
}
