use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use docvar_core::{
    Capabilities, Descriptor, Document, EngineState, FileStorage, MemoryStorage, Page,
    PageSummary, StartupTrigger, StorageBackend,
};
use docvar_registry::PlaceholderKind;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn descriptor_arg() -> Arg {
    Arg::new("descriptor")
        .long("descriptor")
        .short('d')
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Placeholder descriptor (YAML or JSON)")
}

fn state_arg(required: bool) -> Arg {
    Arg::new("state")
        .long("state")
        .short('s')
        .required(required)
        .value_parser(value_parser!(PathBuf))
        .help("JSON file holding persisted values")
}

fn page_arg() -> Arg {
    Arg::new("page")
        .long("page")
        .short('p')
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("HTML page to expand")
}

fn cli() -> Command {
    Command::new("docvar")
        .version(docvar_core::VERSION)
        .about("Expand user-configurable placeholders in documentation pages")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Write logs as JSON lines"),
        )
        .subcommand(
            Command::new("render")
                .about("Expand a page and print the resulting HTML")
                .arg(descriptor_arg())
                .arg(page_arg())
                .arg(state_arg(false))
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the HTML here instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("summary")
                .about("Print the editable placeholders used on a page as JSON")
                .arg(descriptor_arg())
                .arg(page_arg())
                .arg(state_arg(false)),
        )
        .subcommand(
            Command::new("set")
                .about("Validate and persist a placeholder value")
                .arg(descriptor_arg())
                .arg(state_arg(true))
                .arg(Arg::new("name").required(true).help("Placeholder name"))
                .arg(
                    Arg::new("value")
                        .required(true)
                        .allow_hyphen_values(true)
                        .help("Text, checkbox state or dropdown option"),
                ),
        )
        .subcommand(
            Command::new("reset")
                .about("Forget every persisted placeholder value")
                .arg(descriptor_arg())
                .arg(state_arg(true)),
        )
        .subcommand(
            Command::new("graph")
                .about("Print the dependency graph")
                .arg(descriptor_arg())
                .arg(state_arg(false)),
        )
        .subcommand(
            Command::new("validate")
                .about("Evaluate a value against the rule-sets of a placeholder")
                .arg(descriptor_arg())
                .arg(Arg::new("name").required(true).help("Placeholder name"))
                .arg(
                    Arg::new("value")
                        .required(true)
                        .allow_hyphen_values(true)
                        .help("Candidate value"),
                ),
        )
}

fn init_tracing(debug: bool, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug { "debug" } else { "info" }));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn path<'a>(args: &'a ArgMatches, id: &str) -> anyhow::Result<&'a PathBuf> {
    args.get_one::<PathBuf>(id)
        .with_context(|| format!("missing --{id}"))
}

fn text<'a>(args: &'a ArgMatches, id: &str) -> anyhow::Result<&'a str> {
    args.get_one::<String>(id)
        .map(String::as_str)
        .with_context(|| format!("missing <{id}>"))
}

fn open_engine(descriptor: &Descriptor, args: &ArgMatches) -> anyhow::Result<EngineState> {
    let storage: Box<dyn StorageBackend> = match args.get_one::<PathBuf>("state") {
        Some(state) => Box::new(
            FileStorage::open(state)
                .with_context(|| format!("opening state file {}", state.display()))?,
        ),
        None => Box::new(MemoryStorage::new()),
    };
    Ok(EngineState::new(descriptor, storage, &Capabilities::new()))
}

async fn expand_page(engine: &mut EngineState, args: &ArgMatches) -> anyhow::Result<()> {
    let page_path = path(args, "page")?;
    let html = fs::read_to_string(page_path)
        .with_context(|| format!("reading page {}", page_path.display()))?;
    let trigger = StartupTrigger::from_settings(engine.settings());
    let used = trigger
        .run_when_ready(async {}, || {
            engine.attach_page(Page::new(Document::parse(&html)))
        })
        .await?;
    info!("Placeholders on {}: {}", page_path.display(), used.join(", "));
    Ok(())
}

fn parse_checked(value: &str, checked: &str, unchecked: &str) -> anyhow::Result<bool> {
    match value {
        v if v == checked => Ok(true),
        v if v == unchecked => Ok(false),
        "1" | "true" | "on" | "yes" | "checked" => Ok(true),
        "0" | "false" | "off" | "no" | "unchecked" => Ok(false),
        other => bail!("'{other}' is neither '{checked}' nor '{unchecked}'"),
    }
}

fn set_value(engine: &mut EngineState, name: &str, value: &str) -> anyhow::Result<()> {
    let result = match engine.registry().get(name).map(|p| &p.kind) {
        Some(PlaceholderKind::Textbox(_)) => engine.set_text(name, value),
        Some(PlaceholderKind::Checkbox(data)) => {
            let checked = parse_checked(value, &data.value_checked, &data.value_unchecked)?;
            engine.set_checked(name, checked)
        }
        Some(PlaceholderKind::Dropdown(data)) => {
            let index = match value.parse::<usize>() {
                Ok(index) => index,
                Err(_) => data
                    .options
                    .iter()
                    .position(|o| o.value == value || o.display_name == value)
                    .with_context(|| format!("'{value}' is not an option of {name}"))?,
            };
            engine.select_index(name, index)
        }
        None => bail!("unknown placeholder: {name}"),
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) if e.is_recoverable() => {
            warn!("{e}");
            if e.suggests_reset() {
                warn!("Run `docvar reset` to return to the default values");
            }
            match e.outcome() {
                Some(outcome) => outcome.clone(),
                None => return Ok(()),
            }
        }
        Err(e) => return Err(e.into()),
    };
    println!("{name} = {}", engine.expanded_value(name)?);
    for dependent in outcome.affected.iter().skip(1) {
        println!("  {dependent} = {}", engine.expanded_value(dependent)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let Some((command, args)) = matches.subcommand() else {
        bail!("no command given");
    };

    let descriptor_path = path(args, "descriptor")?;
    let descriptor = Descriptor::from_path(descriptor_path)
        .with_context(|| format!("reading descriptor {}", descriptor_path.display()))?;
    init_tracing(descriptor.settings.debug, matches.get_flag("log-json"));

    let mut engine = open_engine(&descriptor, args)?;

    match command {
        "render" => {
            expand_page(&mut engine, args).await?;
            let page = engine.page().context("page was not attached")?;
            match args.get_one::<PathBuf>("output") {
                Some(output) => fs::write(output, page.to_html())
                    .with_context(|| format!("writing {}", output.display()))?,
                None => println!("{}", page.to_html()),
            }
        }
        "summary" => {
            expand_page(&mut engine, args).await?;
            let summary = PageSummary::collect(&engine);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        "set" => set_value(&mut engine, text(args, "name")?, text(args, "value")?)?,
        "reset" => {
            let outcome = engine.reset_all_state()?;
            println!("Reset {} placeholder(s) to their defaults", outcome.affected.len());
        }
        "graph" => println!("{}", engine.graph().debug_representation(engine.registry())),
        "validate" => {
            let name = text(args, "name")?;
            let value = text(args, "value")?;
            let verdict = engine.evaluate(name, value)?;
            println!("{}: {}", verdict.status, verdict.message);
            let accepted = engine
                .registry()
                .get(name)
                .is_some_and(|p| p.is_valid_value(value));
            if !accepted {
                bail!("value rejected for {name}");
            }
        }
        other => bail!("unknown command: {other}"),
    }
    Ok(())
}
