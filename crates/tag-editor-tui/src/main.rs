//! TUI 标签编辑器演示
//!
//! 使用 crossterm 和 ratatui 构建的终端宿主：输入 `$` 触发变量补全，确认后的变量以原子标签的
//! 形式内联显示。
//!
//! # 用法
//!
//! ```bash
//! cargo run -p tag-editor-tui -- [config.json]
//! ```
//!
//! 配置文件（可选，JSON）：
//!
//! ```json
//! {
//!   "text": "Dear ",
//!   "variables": { "user": ["name", "email"], "order": ["total"] },
//!   "editor": { "trigger": "$", "sub_path_policy": "overwrite" }
//! }
//! ```
//!
//! 设置 `TAG_EDITOR_LOG=<path>` 时，`tracing` 日志写入该文件（不会破坏终端画面）。
//!
//! # 快捷键
//!
//! - 字符输入: 插入文本，`$` 打开补全
//! - Up/Down: 在候选列表中移动
//! - Enter/Tab: 确认候选
//! - Esc: 关闭候选列表
//! - Left/Right/Home/End: 移动光标（标签整体跳过）
//! - Backspace: 删除字符或整个标签
//! - Ctrl+Q: 退出

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    env, fs,
    io::{self, stdout},
    path::Path,
    sync::Mutex,
    time::Duration,
};
use tag_editor_core::{
    ANCHOR, CandidateRow, CellMetrics, EditableSurface, EditorKey, InsertOutcome, OverlayConfig,
    Rect as SurfaceRect, Size, TagEditor, TagEditorConfig, TriggerQuery,
};
use tracing::{debug, info, warn};

/// 演示配置文件
#[derive(Debug, Deserialize)]
#[serde(default)]
struct DemoConfig {
    /// 初始文本
    text: String,
    /// 变量树：根变量 -> 字段
    variables: BTreeMap<String, Vec<String>>,
    /// 编辑器配置（缺省时使用终端单元格度量）
    #[serde(default = "terminal_editor_config")]
    editor: TagEditorConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        let variables = [
            ("user", &["name", "email", "id", "address"][..]),
            ("order", &["id", "total", "items", "created_at"][..]),
            ("company", &["name", "website"][..]),
            ("today", &[][..]),
        ]
        .into_iter()
        .map(|(root, fields)| {
            (
                root.to_string(),
                fields.iter().map(|f| f.to_string()).collect(),
            )
        })
        .collect();

        Self {
            text: "Dear ".to_string(),
            variables,
            editor: terminal_editor_config(),
        }
    }
}

/// Editor config measured in terminal cells.
fn terminal_editor_config() -> TagEditorConfig {
    TagEditorConfig {
        metrics: CellMetrics {
            cell_width: 1.0,
            line_height: 1.0,
            ..CellMetrics::default()
        },
        overlay: OverlayConfig {
            offset_x: 0.0,
            offset_y: 0.0,
            viewport_inset: 1.0,
            width: 24.0,
            max_height: 6.0,
            row_height: 1.0,
        },
        ..TagEditorConfig::default()
    }
}

fn load_config(path: &Path) -> io::Result<DemoConfig> {
    let content = fs::read_to_string(path)?;
    let mut config: DemoConfig = serde_json::from_str(&content)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

    // 终端以单元格为单位，像素度量没有意义。
    config.editor.metrics.cell_width = 1.0;
    config.editor.metrics.line_height = 1.0;
    Ok(config)
}

fn init_logging() -> io::Result<()> {
    let Some(path) = env::var_os("TAG_EDITOR_LOG") else {
        return Ok(());
    };
    let file = fs::File::create(path)?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .init();
    Ok(())
}

/// 应用状态
struct App {
    /// 标签编辑器
    editor: TagEditor,
    /// 变量树
    variables: BTreeMap<String, Vec<String>>,
    /// 是否需要退出
    should_quit: bool,
    /// 状态消息
    status_message: String,
}

impl App {
    fn new(config: DemoConfig) -> Self {
        let mut editor = TagEditor::with_text(&config.text, config.editor);
        editor.surface_mut().focus();
        editor.surface_mut().collapse_caret_to_end();

        Self {
            editor,
            variables: config.variables,
            should_quit: false,
            status_message: String::new(),
        }
    }

    /// 处理键盘事件
    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('q')) => {
                self.should_quit = true;
            }
            (_, KeyCode::Down) => {
                self.editor.handle_key(EditorKey::Down);
            }
            (_, KeyCode::Up) => {
                self.editor.handle_key(EditorKey::Up);
            }
            (_, KeyCode::Esc) => {
                self.editor.handle_key(EditorKey::Escape);
            }
            (_, KeyCode::Tab) => {
                self.editor.handle_key(EditorKey::Tab);
            }
            (_, KeyCode::Enter) => {
                if !self.editor.handle_key(EditorKey::Enter).is_handled() {
                    self.insert_text("\n");
                }
            }
            (_, KeyCode::Right) => {
                if !self.editor.handle_key(EditorKey::Right).is_handled() {
                    let caret = self.editor.caret_offset();
                    self.move_caret_to(caret + 1, true);
                }
            }
            (_, KeyCode::Left) => {
                let caret = self.editor.caret_offset();
                self.move_caret_to(caret.saturating_sub(1), false);
            }
            (_, KeyCode::Home) => self.move_caret_to(0, false),
            (_, KeyCode::End) => {
                let end = self.editor.surface().char_count();
                self.move_caret_to(end, true);
            }
            (_, KeyCode::Backspace) => self.backspace(),
            (modifiers, KeyCode::Char(c))
                if !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.insert_text(c.encode_utf8(&mut [0; 4]));
            }
            _ => {}
        }
    }

    fn handle_paste(&mut self, text: String) {
        self.insert_text(&text);
    }

    fn insert_text(&mut self, text: &str) {
        match self.editor.surface_mut().insert_plain_at_caret(text) {
            Ok(Some(_)) => self.refresh_candidates(),
            Ok(None) => warn!("no caret; input dropped"),
            Err(err) => self.status_message = format!("insert failed: {err}"),
        }
    }

    fn backspace(&mut self) {
        match self.editor.surface_mut().backspace() {
            Ok(true) => self.refresh_candidates(),
            Ok(false) => {}
            Err(err) => self.status_message = format!("delete failed: {err}"),
        }
    }

    /// Collapse the caret at `offset`, stepping over a tag the offset would land in.
    fn move_caret_to(&mut self, offset: usize, forward: bool) {
        let surface = self.editor.surface_mut();
        let offset = offset.min(surface.char_count());
        let offset = match surface.tag_at(offset) {
            Some(span) if forward => span.end(),
            Some(span) => span.start,
            None => offset,
        };
        surface.collapse_caret_to(offset);
        self.refresh_candidates();
    }

    /// 重新计算触发表达式，并为其生成候选行
    fn refresh_candidates(&mut self) {
        let rows = match self.editor.on_input() {
            Some(query) => {
                self.status_message = format!("completing {}", query.partial);
                self.candidates_for(&query)
            }
            None => {
                self.status_message.clear();
                Vec::new()
            }
        };
        self.editor.set_candidates(rows);
    }

    fn candidates_for(&self, query: &TriggerQuery) -> Vec<CandidateRow> {
        match &query.sub_path {
            None => self
                .variables
                .keys()
                .filter(|root| root.starts_with(query.root.as_str()))
                .map(|root| {
                    let trigger = self.editor.config().trigger;
                    CandidateRow::new(format!("{trigger}{root}"), root.as_str())
                })
                .collect(),
            Some(_) => self
                .variables
                .get(&query.root)
                .into_iter()
                .flatten()
                .filter(|field| field.starts_with(query.tail()))
                .map(|field| CandidateRow::new(format!(".{field}"), field.as_str()))
                .collect(),
        }
    }

    /// 在下一个 tick 应用已确认的补全
    fn run_pending(&mut self) {
        for outcome in self.editor.run_pending() {
            debug!(?outcome, "completion applied");
            self.status_message = match outcome {
                InsertOutcome::Tag { .. } => "tag inserted".to_string(),
                InsertOutcome::SubPath { inserted, .. } => format!("completed .{inserted}"),
                InsertOutcome::Mismatch => "completion does not match typed path".to_string(),
                InsertOutcome::NoSelection | InsertOutcome::Rejected => {
                    "completion rejected".to_string()
                }
            };
        }
    }

    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // 创建布局
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),    // 编辑器区域
                Constraint::Length(1), // 状态行
                Constraint::Length(1), // 快捷键提示
            ])
            .split(size);

        let editor_area = chunks[0];
        let inner = Rect::new(
            editor_area.x + 1,
            editor_area.y + 1,
            editor_area.width.saturating_sub(2),
            editor_area.height.saturating_sub(2),
        );
        self.editor.set_layout(
            SurfaceRect::new(
                inner.x as f32,
                inner.y as f32,
                inner.width as f32,
                inner.height as f32,
            ),
            Size::new(size.width as f32, size.height as f32),
        );

        self.render_surface(frame, editor_area, inner);
        self.render_overlay(frame, inner, size);
        self.render_status_line(frame, chunks[1]);
        self.render_shortcuts(frame, chunks[2]);
    }

    fn render_surface(&mut self, frame: &mut Frame, area: Rect, inner: Rect) {
        let surface = self.editor.surface();
        let text = surface.text();
        let spans = surface.tag_spans();

        let plain = Style::default().fg(Color::White);
        let tag = Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let selected_tag = tag.bg(Color::LightYellow);

        let mut lines = vec![Line::from("")];
        let mut run = String::new();
        let mut run_style = plain;

        for (offset, ch) in text.chars().enumerate() {
            let style = match spans.iter().find(|s| s.start <= offset && offset < s.end()) {
                Some(span) if span.is_selected => selected_tag,
                Some(_) => tag,
                None => plain,
            };
            if style != run_style || ch == '\n' {
                if !run.is_empty()
                    && let Some(line) = lines.last_mut()
                {
                    line.push_span(Span::styled(std::mem::take(&mut run), run_style));
                }
                run_style = style;
            }
            match ch {
                '\n' => lines.push(Line::from("")),
                ANCHOR => {}
                _ => run.push(ch),
            }
        }
        if !run.is_empty()
            && let Some(line) = lines.last_mut()
        {
            line.push_span(Span::styled(run, run_style));
        }

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", surface.plain_value().replace('\n', "⏎"))),
        );
        frame.render_widget(paragraph, area);

        if inner.width == 0 || inner.height == 0 {
            return;
        }
        let caret = self.editor.caret_pixel_position();
        let x = (inner.x as f32 + caret.x) as u16;
        let y = (inner.y as f32 + caret.y) as u16;
        frame.set_cursor_position((
            x.min(inner.x + inner.width - 1),
            y.min(inner.y + inner.height - 1),
        ));
    }

    fn render_overlay(&self, frame: &mut Frame, inner: Rect, size: Rect) {
        let overlay = self.editor.overlay();
        if !overlay.is_open() || overlay.item_count() == 0 {
            return;
        }

        let placement = overlay.placement();
        let x = (inner.x as f32 + placement.left).max(0.0) as u16;
        let y = (inner.y as f32 + placement.top).max(0.0) as u16;
        if x >= size.width || y >= size.height {
            return;
        }
        let area = Rect::new(
            x,
            y,
            (placement.size.width as u16).min(size.width - x),
            (placement.size.height as u16).min(size.height - y),
        );

        let active = Style::default().fg(Color::Black).bg(Color::LightBlue);
        let normal = Style::default().fg(Color::White).bg(Color::DarkGray);
        let rows: Vec<Line> = overlay
            .rows()
            .iter()
            .map(|row| {
                let style = if row.is_emphasized() { active } else { normal };
                Line::styled(format!("{:<width$}", row.key, width = area.width as usize), style)
            })
            .collect();

        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(rows)
                .style(normal)
                .scroll((overlay.scroll_top() as u16, 0)),
            area,
        );
    }

    /// 渲染状态行
    fn render_status_line(&mut self, frame: &mut Frame, area: Rect) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            format!(
                "offset:{} | tags:{} | chars:{}",
                self.editor.caret_offset(),
                self.editor.surface().tag_spans().len(),
                self.editor.surface().char_count(),
            )
        };

        let status_line = Paragraph::new(status_text).style(
            Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(status_line, area);
    }

    /// 渲染快捷键提示
    fn render_shortcuts(&self, frame: &mut Frame, area: Rect) {
        let trigger = self.editor.config().trigger;
        let shortcuts = format!(
            "{trigger}:补全  Up/Down:选择  Enter/Tab:确认  Esc:关闭  Backspace:删除  Ctrl-Q:退出"
        );
        let shortcuts_line =
            Paragraph::new(shortcuts).style(Style::default().bg(Color::Blue).fg(Color::White));
        frame.render_widget(shortcuts_line, area);
    }
}

fn main() -> io::Result<()> {
    init_logging()?;

    // 读取配置（可选）
    let config = match env::args_os().nth(1) {
        Some(path) => load_config(Path::new(&path))?,
        None => DemoConfig::default(),
    };
    info!(
        trigger = %config.editor.trigger,
        variables = config.variables.len(),
        "starting tag editor"
    );

    // 设置终端
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config);

    // 主循环
    let result = run_app(&mut terminal, &mut app);

    // 恢复终端
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("错误: {}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        if app.should_quit {
            break;
        }

        // 处理事件
        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) => app.handle_key_event(key),
                Event::Paste(text) => app.handle_paste(text),
                _ => {}
            }
        }

        // 确认的补全在事件处理之后的下一个 tick 生效
        app.run_pending();
    }

    Ok(())
}
