use std::time::{Duration, Instant};

use anstyle::{AnsiColor, Effects, Style};
use indicatif::{HumanCount, ProgressBar, ProgressStyle};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct TerminalRenderer {
    style: OutputStyle,
}

pub(crate) struct TerminalProgress {
    style: OutputStyle,
    label: String,
    total: u64,
    current: u64,
    progress_bar: Option<ProgressBar>,
    started_at: Instant,
}

impl TerminalRenderer {
    pub(crate) fn from_style(style: OutputStyle) -> Self {
        Self { style }
    }

    pub(crate) fn print_status(self, status: &str, message: &str) {
        println!("{}", render_status_line(self.style, status, message));
    }

    pub(crate) fn print_lines(self, lines: &[String]) {
        for line in lines {
            println!("{line}");
        }
    }

    /// Progress is drawn on stderr so stdout stays machine readable.
    pub(crate) fn start_progress(self, label: &str, total: u64) -> TerminalProgress {
        let progress_bar = if self.style == OutputStyle::Rich {
            let progress_bar = ProgressBar::new(total.max(1));
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.cyan.bold} {msg:<12} [{bar:20.cyan/blue}] {pos:>3}/{len:3} {elapsed_precise}",
            ) {
                progress_bar.set_style(style.tick_chars("<^>v ").progress_chars("=>-"));
            }
            progress_bar.set_message(label.to_string());
            progress_bar.enable_steady_tick(Duration::from_millis(80));
            Some(progress_bar)
        } else {
            None
        };

        TerminalProgress {
            style: self.style,
            label: label.to_string(),
            total,
            current: 0,
            progress_bar,
            started_at: Instant::now(),
        }
    }
}

impl TerminalProgress {
    pub(crate) fn inc(&mut self) {
        self.current = (self.current + 1).min(self.total);
        if let Some(progress_bar) = &self.progress_bar {
            progress_bar.set_position(self.current);
        }
    }

    pub(crate) fn finish_success(mut self) {
        let Some(progress_bar) = self.progress_bar.take() else {
            return;
        };

        progress_bar.finish_and_clear();
        if let Some(line) = render_progress_line(
            self.style,
            &self.label,
            self.current,
            self.total,
            Some(self.started_at.elapsed()),
        ) {
            eprintln!("{line}");
        }
    }

    pub(crate) fn finish_abandon(mut self) {
        if let Some(progress_bar) = self.progress_bar.take() {
            progress_bar.finish_and_clear();
        }
    }
}

pub(crate) fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => {
            let (badge, badge_style) = status_badge(status);
            format!("{} {message}", colorize(badge_style, badge))
        }
    }
}

fn status_badge(status: &str) -> (&'static str, Style) {
    match status {
        "ok" => ("[OK]", color_style(AnsiColor::BrightGreen)),
        "fail" => ("[FAIL]", color_style(AnsiColor::BrightYellow)),
        "err" => ("[ERR]", color_style(AnsiColor::BrightRed)),
        _ => ("[..]", color_style(AnsiColor::BrightBlue)),
    }
}

fn color_style(color: AnsiColor) -> Style {
    Style::new()
        .fg_color(Some(color.into()))
        .effects(Effects::BOLD)
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{text}{}", style.render(), style.render_reset())
}

/// Summary left on stderr once a normalize run finishes, e.g.
/// `normalize [=========---------]  50% 1/2 repositories resolved in 1.5s`.
pub(crate) fn render_progress_line(
    style: OutputStyle,
    label: &str,
    resolved: u64,
    total: u64,
    elapsed: Option<Duration>,
) -> Option<String> {
    const BAR_WIDTH: u64 = 18;

    if style == OutputStyle::Plain {
        return None;
    }

    let safe_total = total.max(1);
    let resolved = resolved.min(safe_total);
    let filled = (resolved * BAR_WIDTH / safe_total) as usize;
    let bar = format!(
        "{}{}",
        "=".repeat(filled),
        "-".repeat(BAR_WIDTH as usize - filled)
    );
    let noun = if total == 1 { "repository" } else { "repositories" };
    let mut line = format!(
        "{} [{}] {:>3}% {}/{} {noun}",
        colorize(color_style(AnsiColor::BrightCyan), label),
        colorize(Style::new().fg_color(Some(AnsiColor::BrightBlue.into())), &bar),
        resolved * 100 / safe_total,
        HumanCount(resolved),
        HumanCount(total),
    );
    if let Some(elapsed) = elapsed {
        line.push_str(&format!(" resolved in {:.1}s", elapsed.as_secs_f64()));
    }
    Some(line)
}
