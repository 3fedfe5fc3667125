use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context as _, Result};
use clap::{Parser, ValueEnum};
use mention_core::{
    config::{MentionSettings, SurfaceMetrics},
    key_event::{Action, DismissReason, InputEvent, Key, KeyPress},
    layer::MemoryLayer,
    model::{CandidateItem, UiState},
    session::Session,
    surface::{FlatSurface, TextSurface},
};
use mention_dom::TreeSurface;
use mention_roster::Roster;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SurfaceChoice {
    /// 单行/多行纯文本缓冲
    Flat,
    /// 富文本节点树
    Tree,
}

/// 交互式提及演示：逐字键入，`@` 唤出候选菜单。
#[derive(Debug, Parser)]
#[command(name = "mention", version)]
struct Args {
    /// 候选名单（TSV：keyword<TAB>payload<TAB>weight）
    #[arg(long)]
    roster: Option<PathBuf>,
    /// TOML 配置文件
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = SurfaceChoice::Flat)]
    surface: SurfaceChoice,
}

/// 配置文件结构。
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CliSettings {
    mention: MentionSettings,
    /// 插入模板，支持 `{keyword}` 与 `{payload}`
    template: String,
    metrics: SurfaceMetrics,
}

impl Default for CliSettings {
    fn default() -> Self {
        Self {
            mention: MentionSettings::default(),
            template: "@{keyword} ".to_string(),
            metrics: SurfaceMetrics::default(),
        }
    }
}

impl CliSettings {
    fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let s = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&s).with_context(|| format!("invalid config {}", path.display()))
    }
}

fn render(template: &str, item: &CandidateItem) -> String {
    template
        .replace("{keyword}", &item.keyword)
        .replace("{payload}", &item.payload)
}

fn default_roster_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("asset").join("roster.tsv")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let settings = CliSettings::load(args.config.as_deref())?;
    let roster_path = args.roster.unwrap_or_else(default_roster_path);
    let roster = Roster::from_path(&roster_path)?;

    let template = settings.template.clone();
    let config = settings
        .mention
        .clone()
        .into_builder()
        .selection_callback(move |item| render(&template, item))
        .build()?;

    let surface: Box<dyn TextSurface> = match args.surface {
        SurfaceChoice::Flat => Box::new(FlatSurface::new(settings.metrics)),
        SurfaceChoice::Tree => Box::new(TreeSurface::new(settings.metrics)),
    };
    let mut session = Session::new(config, MemoryLayer::new());
    session.bind_surface(surface)?;
    session.replace_candidates(roster.into_candidates());
    tracing::debug!(surface = ?args.surface, roster = %roster_path.display(), "session ready");

    repl(&mut session, &roster_path)
}

enum Command {
    Quit,
    Show,
    Mention,
    Click(usize),
    Dismiss,
    Key(KeyPress),
    Type(String),
}

fn parse_command(input: &str) -> Option<Command> {
    let cmd = match input {
        ":q" | ":quit" | ":exit" => Command::Quit,
        ":show" => Command::Show,
        ":mention" => Command::Mention,
        ":up" => Command::Key(Key::Up.into()),
        ":down" => Command::Key(Key::Down.into()),
        ":enter" => Command::Key(Key::Enter.into()),
        ":esc" => Command::Key(Key::Escape.into()),
        ":altup" => Command::Key(KeyPress::new(Key::Up).with_alt()),
        ":bs" => Command::Key(Key::Backspace.into()),
        ":away" => Command::Dismiss,
        other => match other.strip_prefix(":click ") {
            Some(n) => Command::Click(n.trim().parse().ok()?),
            None if other.starts_with(':') => return None,
            None => Command::Type(other.to_string()),
        },
    };
    Some(cmd)
}

fn repl(session: &mut Session<MemoryLayer>, roster_path: &Path) -> Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "mention demo | roster: {}", roster_path.display())?;
    writeln!(
        out,
        "键入文本（逐字送入）；:up :down :enter :esc :altup :bs :away :click N :mention :show :q"
    )?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        write!(out, "mention> ")?;
        out.flush()?;
        let Some(line) = lines.next().transpose()? else {
            break;
        };
        let input = line.trim_end_matches(['\r', '\n']);
        if input.is_empty() {
            continue;
        }
        let Some(cmd) = parse_command(input) else {
            writeln!(out, "未知命令：{input}")?;
            continue;
        };

        let actions = match cmd {
            Command::Quit => break,
            Command::Show => Vec::new(),
            Command::Mention => session.trigger_mention()?.1,
            Command::Click(n) => click(session, n),
            Command::Dismiss => session.handle(InputEvent::Dismissed(DismissReason::Backdrop)).1,
            Command::Key(press) => press_key(session, press),
            Command::Type(text) => type_text(session, &text),
        };
        print_actions(&mut out, &actions)?;
        print_state(&mut out, session)?;
    }
    Ok(())
}

/// `:click N` 按可见列表的序号（从 1 开始）选中。
fn click(session: &mut Session<MemoryLayer>, n: usize) -> Vec<Action> {
    let ui = session.ui_state();
    let Some(item) = n.checked_sub(1).and_then(|i| ui.items.get(i)) else {
        tracing::warn!(n, shown = ui.items.len(), "no such visible item");
        return Vec::new();
    };
    let Some(index) = session.candidates().iter().position(|c| c == item) else {
        return Vec::new();
    };
    session.handle(InputEvent::ItemSelected(index)).1
}

/// 按键先交给菜单；未被消费时由“宿主”执行默认行为并通知文本变更。
fn press_key(session: &mut Session<MemoryLayer>, press: KeyPress) -> Vec<Action> {
    let (_, mut actions) = session.handle(InputEvent::Key(press));
    if actions.contains(&Action::PreventDefault) {
        return actions;
    }
    let Some(surface) = session.surface_mut() else {
        return actions;
    };
    match press.key {
        Key::Backspace => surface.delete_backward(),
        Key::Enter => surface.insert_text("\n"),
        Key::Space => surface.insert_text(" "),
        Key::Char(ch) => surface.insert_text(ch.encode_utf8(&mut [0u8; 4])),
        Key::Escape | Key::Up | Key::Down => return actions,
    }
    actions.append(&mut session.handle(InputEvent::TextChanged).1);
    actions
}

fn type_text(session: &mut Session<MemoryLayer>, text: &str) -> Vec<Action> {
    let mut actions = Vec::new();
    for ch in text.chars() {
        let key = if ch == ' ' { Key::Space } else { Key::Char(ch) };
        actions.append(&mut press_key(session, KeyPress::new(key)));
    }
    actions
}

fn print_actions(out: &mut impl Write, actions: &[Action]) -> io::Result<()> {
    for a in actions {
        match a {
            Action::OpenMenu { anchor } => {
                writeln!(out, "  [open] at ({:.0}, {:.0})", anchor.x, anchor.bottom())?
            }
            Action::CloseMenu => writeln!(out, "  [close]")?,
            Action::Commit { text, .. } => writeln!(out, "  [commit] {text}")?,
            Action::PreventDefault => {}
        }
    }
    Ok(())
}

fn print_state(out: &mut impl Write, session: &Session<MemoryLayer>) -> io::Result<()> {
    let Some(surface) = session.surface() else {
        return Ok(());
    };
    writeln!(out, "> {}", surface.snapshot())?;
    let ui: UiState = session.ui_state();
    if !ui.menu_open {
        return Ok(());
    }
    if let Some(anchor) = session.layer().anchor() {
        writeln!(out, "  menu at ({:.0}, {:.0})", anchor.x, anchor.bottom())?;
    }
    writeln!(out, "  keyword: {:?}", ui.keyword)?;
    for (i, item) in ui.items.iter().enumerate() {
        let mark = if ui.focused == Some(i) { '>' } else { ' ' };
        writeln!(out, " {mark}{}. {}\t({})", i + 1, item.keyword, item.payload)?;
    }
    Ok(())
}
