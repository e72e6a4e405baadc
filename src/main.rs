use std::io::{self, BufRead};
use std::path::Path;

use anyhow::{anyhow, Result};
use clap::Parser;

use cpsr_label_rust::{
    export, history, render, render_lang, ApiClient, Field, HistoryRecord, LabelCatalog,
    LabelSession, Lang,
};

#[derive(Parser, Debug)]
#[command(
    name = "cpsr-label-rust",
    version,
    about = "Build EU cosmetic label documents from CPSR scans"
)]
struct Cli {
    /// Backend base URL (overrides settings [api].base)
    #[arg(short = 'a', long = "api-base")]
    api_base: Option<String>,

    /// File to analyze (product scan image or PDF)
    #[arg(short = 'f', long = "file")]
    file: Option<String>,

    /// Comma-separated target languages (en, de, fr, it, es)
    #[arg(short = 'l', long = "langs")]
    langs: Option<String>,

    /// Translate the label into the selected languages
    #[arg(short = 't', long = "translate")]
    translate: bool,

    /// Write the label PDF to this path
    #[arg(long = "pdf")]
    pdf: Option<String>,

    /// Write the multi-language label PDF to this path
    #[arg(long = "sections-pdf")]
    sections_pdf: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Show the configured target languages and exit
    #[arg(long = "show-enabled-languages")]
    show_enabled_languages: bool,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,

    /// Interactive mode
    #[arg(short = 'i', long = "interactive")]
    interactive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cpsr_label_rust::logging::init(cli.verbose)?;
    if cli.interactive {
        return run_interactive(cli).await;
    }

    let output = cpsr_label_rust::run(cpsr_label_rust::Config {
        api_base: cli.api_base,
        file: cli.file,
        langs: cli.langs,
        translate: cli.translate,
        pdf_out: cli.pdf,
        sections_out: cli.sections_pdf,
        settings_path: cli.read_settings,
        show_enabled_languages: cli.show_enabled_languages,
    })
    .await?;

    println!("{}", output);
    Ok(())
}

struct InteractiveState {
    session: LabelSession,
    catalog: LabelCatalog,
    api_base: String,
    history_limit: usize,
}

impl InteractiveState {
    fn new(cli: &Cli) -> Result<Self> {
        let settings_path = cli.read_settings.as_deref().map(Path::new);
        let settings = cpsr_label_rust::settings::load_settings(settings_path)?;
        let catalog = LabelCatalog::load()?;

        let selection = match cli.langs.as_deref() {
            Some(codes) => cpsr_label_rust::parse_selection_codes(codes)?,
            None => cpsr_label_rust::parse_selection(&settings.system_languages)?,
        };
        let mut session = LabelSession::new();
        session.select_languages(&selection);

        Ok(Self {
            session,
            catalog,
            api_base: cli
                .api_base
                .clone()
                .unwrap_or_else(|| settings.api_base.clone()),
            history_limit: settings.history_limit,
        })
    }

    fn client(&self) -> Result<ApiClient> {
        Ok(ApiClient::new(&self.api_base)?)
    }
}

async fn run_interactive(cli: Cli) -> Result<()> {
    use std::io::Write;

    let mut state = InteractiveState::new(&cli)?;
    println!("Interactive mode. Use /quit or /exit to finish.");
    println!("Type /help to see available commands.");

    let mut line = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();
    loop {
        line.clear();
        print!("> ");
        io::stdout().flush()?;
        if stdin_lock.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.starts_with('/') {
            match handle_interactive_command(input, &mut state).await {
                Ok(true) => break,
                Ok(false) => {}
                Err(err) => eprintln!("error: {:#}", err),
            }
            continue;
        }
        eprintln!("not a command: {} (try /help)", input);
    }
    Ok(())
}

async fn handle_interactive_command(input: &str, state: &mut InteractiveState) -> Result<bool> {
    let trimmed = input.trim();
    if matches!(trimmed, "/quit" | "/exit") {
        return Ok(true);
    }
    if trimmed == "/help" {
        print_interactive_help();
        return Ok(false);
    }
    if trimmed == "/show" {
        println!(
            "{}",
            cpsr_label_rust::preview(&state.session, &state.catalog)
        );
        return Ok(false);
    }
    if trimmed == "/fields" {
        for field in Field::ALL {
            let value = state.session.fields().get(field);
            if value.is_empty() {
                println!("{}:", field.as_str());
            } else {
                println!("{}: {}", field.as_str(), value.replace('\n', " "));
            }
        }
        return Ok(false);
    }
    if trimmed == "/raw" {
        let raw = state.session.raw_text();
        if raw.is_empty() {
            println!("(no recognized text yet; run /ocr <path>)");
        } else {
            println!("{}", raw);
        }
        return Ok(false);
    }
    if trimmed == "/translate" {
        let (order, subset) = state.session.translation_request()?;
        let client = state.client()?;
        let token = state.session.begin_request();
        let translations = client.translate(&order, &subset).await?;
        if state.session.apply_translations(token, &order, translations) {
            let cached = order
                .iter()
                .filter(|lang| state.session.has_translation(**lang))
                .map(|lang| lang.code())
                .collect::<Vec<_>>();
            println!("translated: {}", cached.join(", "));
        }
        return Ok(false);
    }
    if trimmed == "/histories" {
        let client = state.client()?;
        let items = history::clamp_to_limit(client.history().await?, state.history_limit);
        print_histories(&items);
        return Ok(false);
    }
    if trimmed == "/clear-histories" {
        let client = state.client()?;
        client.history_clear().await?;
        println!("histories cleared");
        return Ok(false);
    }

    if let Some(arg) = command_arg(trimmed, "/set") {
        if arg.is_empty() {
            return Err(anyhow!("usage: /set <field> <value>"));
        }
        let (name, value) = arg
            .split_once(char::is_whitespace)
            .unwrap_or((arg, ""));
        let field = Field::parse(name)
            .ok_or_else(|| anyhow!("unknown field '{}' (try /fields for names)", name))?;
        state.session.set_field(field, value.trim());
        println!("{} set", field.as_str());
        return Ok(false);
    }
    if let Some(path) = command_arg(trimmed, "/ocr") {
        if path.is_empty() {
            return Err(cpsr_label_rust::ValidationError::MissingFile.into());
        }
        let client = state.client()?;
        cpsr_label_rust::analyze_file(&mut state.session, &client, path).await?;
        println!(
            "{}",
            cpsr_label_rust::preview(&state.session, &state.catalog)
        );
        return Ok(false);
    }
    if let Some(value) = command_arg(trimmed, "/langs") {
        if value.is_empty() {
            let codes = state
                .session
                .selection()
                .iter()
                .map(Lang::code)
                .collect::<Vec<_>>();
            println!("langs: {}", codes.join(", "));
        } else {
            let selection = cpsr_label_rust::parse_selection_codes(value)?;
            state.session.select_languages(&selection);
            println!("langs set");
        }
        return Ok(false);
    }
    if let Some(value) = command_arg(trimmed, "/active") {
        if value.is_empty() {
            match state.session.active() {
                Some(lang) => println!("active: {}", lang.code()),
                None => println!("active: (none)"),
            }
        } else {
            let lang = Lang::parse(value)
                .ok_or_else(|| anyhow!("unknown language code '{}'", value))?;
            state.session.set_active(lang);
            match state.session.active() {
                Some(active) if active == lang => println!("active set to {}", lang.code()),
                _ => println!("{} is not selected (set it with /langs first)", lang.code()),
            }
        }
        return Ok(false);
    }
    if let Some(value) = command_arg(trimmed, "/preview") {
        let rendered = if value.is_empty() {
            render(state.session.fields(), &state.catalog)
        } else {
            let lang = Lang::parse(value)
                .ok_or_else(|| anyhow!("unknown language code '{}'", value))?;
            render_lang(
                state.session.fields(),
                lang,
                state.session.translation(lang),
                &state.catalog,
            )
        };
        println!("{}", rendered.to_text());
        return Ok(false);
    }
    if let Some(path) = command_arg(trimmed, "/export-multi") {
        if path.is_empty() {
            return Err(anyhow!("usage: /export-multi <path>"));
        }
        let sections = export::sections(&state.session, &state.catalog)?;
        let client = state.client()?;
        let bytes = client.pdf_sections(&sections).await?;
        std::fs::write(path, bytes)?;
        println!("wrote {}", path);
        return Ok(false);
    }
    if let Some(path) = command_arg(trimmed, "/export") {
        if path.is_empty() {
            return Err(anyhow!("usage: /export <path>"));
        }
        let client = state.client()?;
        let bytes = client.pdf(state.session.fields()).await?;
        std::fs::write(path, bytes)?;
        println!("wrote {}", path);
        return Ok(false);
    }
    if let Some(title) = command_arg(trimmed, "/save-history") {
        let title = if title.is_empty() {
            cpsr_label_rust::history_title(state.session.fields())
        } else {
            title.to_string()
        };
        let record = HistoryRecord::capture(
            state.session.fields(),
            state.session.raw_text(),
            title,
            history::timestamp_meta(),
        );
        let client = state.client()?;
        let items = history::clamp_to_limit(client.history_add(&record).await?, state.history_limit);
        print_histories(&items);
        return Ok(false);
    }
    if let Some(id) = command_arg(trimmed, "/restore-history") {
        if id.is_empty() {
            return Err(anyhow!("usage: /restore-history <id>"));
        }
        let client = state.client()?;
        let items = client.history().await?;
        let record = items
            .iter()
            .find(|record| record.id.as_deref() == Some(id))
            .ok_or_else(|| anyhow!("no history entry with id {}", id))?;
        state.session.restore_history(record);
        println!(
            "{}",
            cpsr_label_rust::preview(&state.session, &state.catalog)
        );
        return Ok(false);
    }
    if let Some(id) = command_arg(trimmed, "/delete-history") {
        if id.is_empty() {
            return Err(anyhow!("usage: /delete-history <id>"));
        }
        let client = state.client()?;
        let items = history::clamp_to_limit(client.history_delete(id).await?, state.history_limit);
        print_histories(&items);
        return Ok(false);
    }
    if let Some(value) = command_arg(trimmed, "/api-base") {
        if value.is_empty() {
            if state.api_base.is_empty() {
                println!("api-base: (unset)");
            } else {
                println!("api-base: {}", state.api_base);
            }
        } else {
            state.api_base = value.to_string();
            println!("api-base set to {}", value);
        }
        return Ok(false);
    }

    eprintln!("unknown command: {}", trimmed);
    Ok(false)
}

/// Splits `/name arg` into its argument. `/name` alone yields an empty
/// argument; anything glued to the name (`/nameX`) is a different command.
fn command_arg<'a>(input: &'a str, command: &str) -> Option<&'a str> {
    if input == command {
        return Some("");
    }
    input
        .strip_prefix(command)
        .and_then(|rest| rest.strip_prefix(' '))
        .map(str::trim)
}

fn print_histories(items: &[HistoryRecord]) {
    if items.is_empty() {
        println!("(no histories)");
        return;
    }
    for record in items {
        println!(
            "{}\t{}\t{}",
            record.id.as_deref().unwrap_or("-"),
            record.meta,
            record.title
        );
    }
}

fn print_interactive_help() {
    println!("Commands:");
    println!("  /quit, /exit              Exit interactive mode");
    println!("  /show                     Print the current label preview");
    println!("  /preview [code]           Preview in a language (source when omitted)");
    println!("  /fields                   List field values");
    println!("  /set <field> <value>      Set a field (wire names, e.g. product_name)");
    println!("  /raw                      Print the recognized OCR text");
    println!("  /ocr <path>               Analyze a scan file");
    println!("  /langs [codes]            Show or set the target languages");
    println!("  /active [code]            Show or set the active preview language");
    println!("  /translate                Translate into the selected languages");
    println!("  /export <path>            Write the label PDF");
    println!("  /export-multi <path>      Write the multi-language label PDF");
    println!("  /histories                List saved analyses");
    println!("  /save-history [title]     Save the current analysis");
    println!("  /restore-history <id>     Restore a saved analysis");
    println!("  /delete-history <id>      Delete a saved analysis");
    println!("  /clear-histories          Delete all saved analyses");
    println!("  /api-base [url]           Show or set the backend base URL");
}

#[cfg(test)]
mod tests {
    use super::command_arg;

    #[test]
    fn command_arg_requires_a_space_before_the_argument() {
        assert_eq!(command_arg("/ocr scan.png", "/ocr"), Some("scan.png"));
        assert_eq!(command_arg("/ocr", "/ocr"), Some(""));
        assert_eq!(command_arg("/ocr   scan.png  ", "/ocr"), Some("scan.png"));
        assert_eq!(command_arg("/ocrfoo", "/ocr"), None);
        assert_eq!(command_arg("/export-multi out.pdf", "/export"), None);
        assert_eq!(command_arg("/langs", "/active"), None);
    }
}
