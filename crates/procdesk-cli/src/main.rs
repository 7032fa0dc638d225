// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use procdesk_app::{EntitySchema, RecordId, SearchField};
use procdesk_remote::HttpSource;
use runtime::{Mutation, ViewRequest, ViewRuntime};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use time::{OffsetDateTime, UtcOffset};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "PROCDESK_LOG";
const SYNC_GRACE: Duration = Duration::from_secs(1);

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    if options.list_views {
        for schema in EntitySchema::ALL {
            println!("{:<24}{}", schema.name, schema.title);
        }
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `procdesk --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;
    init_logging(config.log_level())?;

    let view = options.view.as_deref().unwrap_or(config.default_view());
    let schema = EntitySchema::builtin(view)
        .ok_or_else(|| anyhow!("unknown view {view:?}; run `procdesk --list-views`"))?;

    let timeout = config.timeout()?;
    let source = HttpSource::new(config.base_url(), schema, timeout).with_context(|| {
        format!(
            "invalid [remote] config in {}; fix base_url/timeout values",
            options.config_path.display()
        )
    })?;
    if options.check_only {
        return Ok(());
    }

    debug!(view = schema.name, base_url = source.base_url(), "opening view");
    let mut runtime = ViewRuntime::open(
        schema,
        Arc::new(source),
        config.session(),
        config.page_size(),
        timeout + SYNC_GRACE,
    )?;
    if !runtime.controller().has_loaded() {
        print_notices(&mut runtime);
        bail!("could not load {}", schema.name);
    }

    let applied = runtime.apply(&options.request);
    print_notices(&mut runtime);
    applied?;

    print!("{}", runtime.render());

    if let Some(target) = &options.export {
        let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
        let today = OffsetDateTime::now_utc().to_offset(offset).date();
        let path = runtime.export(target, today, offset)?;
        eprintln!("exported {}", path.display());
    }
    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid [log].level {level:?}"))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|error| anyhow!("initialize logging: {error}"))
}

fn print_notices(runtime: &mut ViewRuntime) {
    for notice in runtime.take_notices() {
        eprintln!("{notice}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    view: Option<String>,
    request: ViewRequest,
    export: Option<PathBuf>,
    list_views: bool,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        view: None,
        request: ViewRequest::default(),
        export: None,
        list_views: false,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let mut value_for = |flag: &str, what: &str| next_value(&mut iter, flag, what);
        match arg.as_ref() {
            "--config" => {
                options.config_path = PathBuf::from(value_for("--config", "a file path")?);
            }
            "--view" => {
                options.view = Some(value_for("--view", "a view name")?);
            }
            "--tab" => {
                options.request.tab = Some(value_for("--tab", "a tab key")?);
            }
            "--search" => {
                options.request.search = Some(value_for("--search", "a search term")?);
            }
            "--field" => {
                options.request.field = SearchField::parse(&value_for("--field", "a field name")?);
            }
            "--filter" => {
                let raw = value_for("--filter", "FIELD=VALUE")?;
                options.request.filters.push(split_assignment("--filter", &raw)?);
            }
            "--set" => {
                let raw = value_for("--set", "FIELD=VALUE")?;
                options.request.sets.push(split_assignment("--set", &raw)?);
            }
            "--page" => {
                let raw = value_for("--page", "a page number")?;
                let page = raw
                    .parse::<usize>()
                    .with_context(|| format!("--page expects a positive number, got {raw:?}"))?;
                options.request.page = Some(page);
            }
            "--export" => {
                let path = value_for("--export", "a file or directory path")?;
                options.export = Some(PathBuf::from(path));
            }
            "--add" => {
                set_mutation(&mut options.request, Mutation::Add)?;
            }
            "--update" => {
                let id = parse_id("--update", &value_for("--update", "a row id")?)?;
                set_mutation(&mut options.request, Mutation::Update(id))?;
            }
            "--delete" => {
                let id = parse_id("--delete", &value_for("--delete", "a row id")?)?;
                set_mutation(&mut options.request, Mutation::Delete(id))?;
            }
            "--list-views" => {
                options.list_views = true;
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn next_value<I, S>(iter: &mut I, flag: &str, what: &str) -> Result<String>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    iter.next()
        .map(|value| value.as_ref().to_owned())
        .ok_or_else(|| anyhow!("{flag} requires {what}"))
}

fn split_assignment(flag: &str, raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_owned(), value.to_owned()))
        }
        _ => bail!("{flag} expects FIELD=VALUE, got {raw:?}"),
    }
}

fn parse_id(flag: &str, raw: &str) -> Result<RecordId> {
    RecordId::parse(raw).ok_or_else(|| anyhow!("{flag} requires a non-empty row id"))
}

fn set_mutation(request: &mut ViewRequest, mutation: Mutation) -> Result<()> {
    if request.mutation.is_some() {
        bail!("use only one of --add, --update, --delete per run");
    }
    request.mutation = Some(mutation);
    Ok(())
}

fn print_help() {
    println!("procdesk");
    println!("  --config <path>          Use a specific config path");
    println!("  --view <name>            View to open (see --list-views)");
    println!("  --tab <key>              Switch to a tab of the view");
    println!("  --search <term>          Case-insensitive text search");
    println!("  --field <name>           Limit --search to one field (default: all)");
    println!("  --filter <field=value>   Exact column filter; repeatable");
    println!("  --page <n>               Page to print");
    println!("  --export <path>          Write displayed rows as CSV (file or directory)");
    println!("  --add                    Create a row from --set values");
    println!("  --update <id>            Change a row using --set values");
    println!("  --delete <id>            Delete a row");
    println!("  --set <field=value>      Field value for --add/--update; repeatable");
    println!("  --list-views             Print the available views");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config and exit");
    println!("  --help                   Show this help");
}
