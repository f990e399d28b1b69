use clap::Parser;
use peppol_lookup::core::ConfigProvider;
use peppol_lookup::utils::error::ErrorSeverity;
use peppol_lookup::utils::{logger, validation::Validate};
use peppol_lookup::{
    CliConfig, DirectoryClient, Language, LookupEngine, LookupError, Renderer,
};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Empty,
    Quit,
    Language(String),
    Lookup(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    match line.split_once(char::is_whitespace) {
        Some((":lang", code)) => Command::Language(code.trim().to_string()),
        _ if line == ":lang" => Command::Language(String::new()),
        _ if line == ":quit" || line == ":q" => Command::Quit,
        _ => Command::Lookup(line.to_string()),
    }
}

/// 根據錯誤嚴重程度決定退出碼
fn exit_code(error: &LookupError) -> i32 {
    match error.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn report_failure(renderer: &Renderer, error: &LookupError) {
    tracing::error!(
        "Lookup failed: {} (Category: {:?}, Severity: {:?})",
        error,
        error.category(),
        error.severity()
    );
    tracing::debug!("Recovery suggestion: {}", error.recovery_suggestion());
    eprintln!("{}", renderer.render_error(error));
}

async fn run_once(
    engine: &LookupEngine<DirectoryClient>,
    renderer: &mut Renderer,
    number: &str,
) -> i32 {
    let outcome = match engine.lookup(number).await {
        Ok(report) => renderer.render(report),
        Err(e) => Err(e),
    };

    match outcome {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err(e) => {
            report_failure(renderer, &e);
            exit_code(&e)
        }
    }
}

async fn run_interactive(
    engine: &LookupEngine<DirectoryClient>,
    renderer: &mut Renderer,
) -> anyhow::Result<()> {
    println!("{}", renderer.i18n().t("title"));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{} > ", renderer.i18n().t("prompt"));
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_command(&line) {
            Command::Empty => continue,
            Command::Quit => break,
            Command::Language(code) => match code.parse::<Language>() {
                Ok(language) => {
                    let rerendered = renderer.set_language(language);
                    println!(
                        "{}",
                        renderer
                            .i18n()
                            .translate("language_changed", &[("lang", language.code())])
                    );
                    match rerendered {
                        Some(Ok(output)) => println!("{}", output),
                        Some(Err(e)) => report_failure(renderer, &e),
                        None => {}
                    }
                }
                Err(_) => {
                    let supported = Language::supported_codes().join(", ");
                    println!(
                        "{}",
                        renderer.i18n().translate(
                            "language_unsupported",
                            &[("lang", code.as_str()), ("supported", supported.as_str())]
                        )
                    );
                }
            },
            Command::Lookup(number) => {
                println!(
                    "{}",
                    renderer.i18n().translate("looking_up", &[("number", number.as_str())])
                );
                run_once(engine, renderer, &number).await;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose);
    tracing::info!("Starting peppol-lookup v{}", env!("CARGO_PKG_VERSION"));
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.resolve().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration validation failed: {}", e);
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(exit_code(&e));
        }
    };

    let engine = LookupEngine::from_config(&config)?;
    let mut renderer = Renderer::new(config.language(), config.format());

    match cli.number.as_deref() {
        Some(number) => {
            let code = run_once(&engine, &mut renderer, number).await;
            if code > 0 {
                std::process::exit(code);
            }
        }
        None => run_interactive(&engine, &mut renderer).await?,
    }

    Ok(())
}
