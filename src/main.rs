use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Arg, ArgAction, ArgMatches};
use stencil::config::{parse_define, RenderSettings};
use stencil::Template;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn cli() -> clap::Command {
    clap::Command::new("stencil")
        .about("Render a text template against YAML or JSON context data")
        .arg(
            Arg::new("template")
                .value_name("TEMPLATE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Path to the template file (reads stdin when omitted)"),
        )
        .arg(
            Arg::new("context")
                .short('c')
                .long("context")
                .value_name("CONTEXT")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Path to a YAML or JSON file with the template context"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("OUTPUT")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Write the rendered output to this file instead of stdout"),
        )
        .arg(
            Arg::new("settings")
                .short('s')
                .long("settings")
                .value_name("SETTINGS")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Path to a YAML settings file; command-line flags take precedence"),
        )
        .arg(
            Arg::new("define")
                .short('D')
                .long("define")
                .value_name("KEY=VALUE")
                .action(ArgAction::Append)
                .help("Set a context variable (repeatable)"),
        )
        .arg(
            Arg::new("no_builtins")
                .long("no-builtins")
                .action(ArgAction::SetTrue)
                .help("Render without the builtin tags and filters"),
        )
}

fn settings_from_matches(matches: &ArgMatches) -> Result<RenderSettings> {
    let file_settings = match matches.get_one::<PathBuf>("settings") {
        Some(path) => RenderSettings::load(path)?,
        None => RenderSettings::default(),
    };

    let variables = matches
        .get_many::<String>("define")
        .unwrap_or_default()
        .map(|define| parse_define(define))
        .collect::<Result<_>>()?;

    let cli_settings = RenderSettings {
        template: matches.get_one::<PathBuf>("template").cloned(),
        context: matches.get_one::<PathBuf>("context").cloned(),
        output: matches.get_one::<PathBuf>("output").cloned(),
        builtins: matches.get_flag("no_builtins").then_some(false),
        variables,
    };

    Ok(file_settings.merge(cli_settings))
}

fn read_template(settings: &RenderSettings) -> Result<String> {
    match &settings.template {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read template {}", path.display())),
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("Failed to read template from stdin")?;
            Ok(source)
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stencil=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let matches = cli().get_matches();
    let settings = settings_from_matches(&matches)?;
    debug!(?settings, "resolved render settings");

    let source = read_template(&settings)?;
    let mut context = settings.build_context()?;
    let namespace = settings.namespace();

    let rendered = Template::new(&source)
        .render(Some(&mut context), Some(&namespace))
        .context("Failed to render template")?;

    match &settings.output {
        Some(path) => {
            fs::write(path, &rendered)
                .with_context(|| format!("Failed to write output {}", path.display()))?;
            info!(path = %path.display(), bytes = rendered.len(), "wrote rendered template");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}
