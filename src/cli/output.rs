//! Terminal output for the kassist-server commands.
//!
//! Every line is rendered to a `String` first so the plain-text forms can be
//! tested; the printing methods are thin wrappers.

use owo_colors::OwoColorize;

/// Width of the key column in `config` summaries.
const KEY_WIDTH: usize = 13;

/// Kind of status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Ok,
    Info,
    Warn,
    Error,
    Tip,
    Done,
}

impl Tone {
    fn tag(self) -> &'static str {
        match self {
            Tone::Ok => "[OK]",
            Tone::Info => "[INFO]",
            Tone::Warn => "[WARN]",
            Tone::Error => "[ERROR]",
            Tone::Tip => "[TIP]",
            Tone::Done => "[DONE]",
        }
    }

    fn symbol(self) -> String {
        match self {
            Tone::Ok => "✓".green().bold().to_string(),
            Tone::Info => "•".blue().to_string(),
            Tone::Warn => "⚠".yellow().bold().to_string(),
            Tone::Error => "✗".red().bold().to_string(),
            Tone::Tip => "→".dimmed().to_string(),
            Tone::Done => "✓".bright_green().bold().to_string(),
        }
    }
}

/// CLI printer, colored unless `--no-color` was given.
pub struct Output {
    /// Emit ANSI colors
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Colored output
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Plain output
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    fn status_line(&self, tone: Tone, message: &str) -> String {
        if !self.colored {
            return format!("  {} {}", tone.tag(), message);
        }
        let message = match tone {
            Tone::Ok => message.green().to_string(),
            Tone::Warn => message.yellow().to_string(),
            Tone::Error => message.red().to_string(),
            Tone::Tip => message.dimmed().to_string(),
            Tone::Done => message.bright_green().bold().to_string(),
            Tone::Info => message.to_string(),
        };
        format!("  {} {}", tone.symbol(), message)
    }

    fn created_line(&self, kind: &str, path: &str) -> String {
        if self.colored {
            format!("  {} {:<9} {}", Tone::Ok.symbol(), kind.dimmed(), path.bright_white())
        } else {
            format!("  [CREATED] {:<9} {}", kind, path)
        }
    }

    fn skipped_line(&self, path: &str, reason: &str) -> String {
        if self.colored {
            format!("  {} {} ({})", "○".yellow(), path.dimmed(), reason.yellow())
        } else {
            format!("  [SKIPPED] {} ({})", path, reason)
        }
    }

    fn kv_line(&self, key: &str, value: &str) -> String {
        let key = format!("{:<width$}", key, width = KEY_WIDTH);
        if self.colored {
            format!("    {} {}", key.dimmed(), value.bright_white())
        } else {
            format!("    {} {}", key, value)
        }
    }

    /// Name and version, shown by `init`
    pub fn banner(&self) {
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        if self.colored {
            println!(
                "\n   {} {}\n   {}\n",
                "kassist".bright_cyan().bold(),
                version.dimmed(),
                "Knowledge Assistant: document search and chat".bright_white()
            );
        } else {
            println!(
                "\n   kassist {}\n   Knowledge Assistant: document search and chat\n",
                version
            );
        }
    }

    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    pub fn subheader(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.cyan().bold());
        } else {
            println!("\n  --- {} ---", title);
        }
    }

    pub fn success(&self, message: &str) {
        println!("{}", self.status_line(Tone::Ok, message));
    }

    pub fn info(&self, message: &str) {
        println!("{}", self.status_line(Tone::Info, message));
    }

    pub fn warning(&self, message: &str) {
        println!("{}", self.status_line(Tone::Warn, message));
    }

    /// Goes to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.status_line(Tone::Error, message));
    }

    pub fn hint(&self, message: &str) {
        println!("\n{}", self.status_line(Tone::Tip, message));
    }

    pub fn complete(&self, message: &str) {
        println!("\n{}", self.status_line(Tone::Done, message));
    }

    /// A scaffolded file or directory; `kind` is e.g. `config` or `directory`
    pub fn created(&self, kind: &str, path: &str) {
        println!("{}", self.created_line(kind, path));
    }

    pub fn skipped(&self, path: &str, reason: &str) {
        println!("{}", self.skipped_line(path, reason));
    }

    /// One row of the `config` summary, keys aligned in a column
    pub fn kv(&self, key: &str, value: &str) {
        println!("{}", self.kv_line(key, value));
    }

    /// Shell command the user should run next
    pub fn command(&self, cmd: &str) {
        if self.colored {
            println!("     {}", format!("$ {}", cmd).bright_cyan());
        } else {
            println!("     $ {}", cmd);
        }
    }

    /// `KEY=value` line. Never colored, so the output can be appended to `.env`.
    pub fn env_var(&self, key: &str, value: &str) {
        println!("{}={}", key, value);
    }

    pub fn newline(&self) {
        println!();
    }
}
