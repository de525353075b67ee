//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use crate::cli::output::{
    OutputFormat, format_affected, format_count, format_document, format_documents,
    format_paginated, format_text,
};
use crate::cli::parser::{Cli, Commands, I18nArgs, PageArgs, QueryArgs};
use crate::config::I18nConfig;
use crate::core::{Document, PageRequest, QueryOptions, Sort, Value, parse_document};
use crate::error::{CommandError, Result};
use crate::i18n::{I18n, LocaleRequest, TranslateOptions};
use crate::storage::{DocumentStore, Provider, SqliteStore, StoreBuilder};
use tracing::debug;

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub async fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Run { sql, params } => cmd_run(cli, sql, params, format).await,
        Commands::Translate {
            key,
            locale,
            vars,
            i18n,
        } => cmd_translate(key, locale.as_deref(), vars, i18n, format),
        Commands::Locale {
            accept_language,
            url,
            lang,
            i18n,
        } => Ok(cmd_locale(
            LocaleRequest {
                accept_language: accept_language.clone(),
                url: url.clone(),
                lang: lang.clone(),
            },
            i18n,
            format,
        )),
        command => {
            let provider: Provider = cli.provider.parse()?;
            let store = StoreBuilder::from_config(cli.store_config())
                .provider(provider)
                .build()?;
            debug!(%provider, "store opened");

            let result = run_store_command(store.as_ref(), command, format).await;
            let closed = store.close().await;
            let output = result?;
            closed?;
            Ok(output)
        }
    }
}

/// Runs one document command against an open store.
async fn run_store_command(
    store: &dyn DocumentStore,
    command: &Commands,
    format: OutputFormat,
) -> Result<String> {
    match command {
        Commands::Insert { table, document } => {
            let inserted = store.insert(table, parse_document(document)?).await?;
            Ok(format_document(Some(&inserted), format))
        }
        Commands::Update {
            table,
            query,
            patch,
        } => {
            store
                .update(table, &parse_document(query)?, parse_document(patch)?)
                .await?;
            Ok(format_affected("update", None, format))
        }
        Commands::Remove { table, query } => {
            let (filter, options) = parse_query_args(query)?;
            store.remove(table, &filter, options).await?;
            Ok(format_affected("remove", None, format))
        }
        Commands::FindOne { table, query } => {
            let found = store.find_one(table, &parse_document(query)?).await?;
            Ok(format_document(found.as_ref(), format))
        }
        Commands::Find { table, query, page } => {
            let (filter, options) = parse_query_args(query)?;
            let (request, sort) = parse_page_args(page, PageRequest::DEFAULT_FIND_LIMIT)?;
            let documents = store.find(table, &filter, request, &sort, options).await?;
            Ok(format_documents(&documents, format))
        }
        Commands::Count { table, query } => {
            let (filter, options) = parse_query_args(query)?;
            let count = store.count(table, &filter, options).await?;
            Ok(format_count(count, format))
        }
        Commands::Paginate { table, query, page } => {
            let (filter, options) = parse_query_args(query)?;
            let (request, sort) = parse_page_args(page, PageRequest::DEFAULT_PAGINATED_LIMIT)?;
            let result = store
                .paginated(table, &filter, request, &sort, options)
                .await?;
            Ok(format_paginated(&result, format))
        }
        Commands::Run { .. } | Commands::Translate { .. } | Commands::Locale { .. } => Err(
            CommandError::ExecutionFailed("not a document store command".to_string()).into(),
        ),
    }
}

async fn cmd_run(cli: &Cli, sql: &str, params: &[String], format: OutputFormat) -> Result<String> {
    let provider: Provider = cli.provider.parse()?;
    if provider != Provider::Sqlite {
        return Err(CommandError::InvalidArgument(format!(
            "run requires the sqlite provider, got {provider}"
        ))
        .into());
    }

    let params: Vec<Value> = params.iter().map(|p| parse_param(p)).collect();
    let store = SqliteStore::open(&cli.store_config())?;
    let result = store.run(sql, &params).await;
    let closed = store.close().await;
    let rows = result?;
    closed?;

    Ok(format_affected("run", Some(rows), format))
}

fn cmd_translate(
    key: &str,
    locale: Option<&str>,
    vars: &[String],
    i18n: &I18nArgs,
    format: OutputFormat,
) -> Result<String> {
    let mut options = TranslateOptions {
        locale: locale.map(str::to_string),
        ..TranslateOptions::default()
    };
    for var in vars {
        let (name, value) = var.split_once('=').ok_or_else(|| {
            CommandError::InvalidArgument(format!("expected NAME=VALUE, got: {var}"))
        })?;
        options = options.var(name.trim(), value);
    }

    let text = load_i18n(i18n).translate(key, &options);
    Ok(format_text("text", &text, format))
}

fn cmd_locale(request: LocaleRequest, i18n: &I18nArgs, format: OutputFormat) -> String {
    let locale = load_i18n(i18n).resolve(&request);
    format_text("locale", &locale, format)
}

fn load_i18n(args: &I18nArgs) -> I18n {
    I18n::new(&I18nConfig {
        folder: args.translations.clone(),
        fallback: args.fallback.clone(),
    })
}

/// Parses a positional parameter as JSON, or takes it verbatim as a string.
fn parse_param(raw: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(raw)
        .map_or_else(|_| Value::String(raw.to_string()), Value::from)
}

fn parse_query_args(args: &QueryArgs) -> Result<(Document, QueryOptions)> {
    let filter = parse_document(&args.query)?;
    let options = QueryOptions::new(args.operator.parse()?, args.logic.parse()?);
    Ok((filter, options))
}

fn parse_page_args(args: &PageArgs, default_limit: u32) -> Result<(PageRequest, Sort)> {
    let request = PageRequest::new(args.page, args.limit.unwrap_or(default_limit));
    let sort = args
        .sort
        .as_deref()
        .map(str::parse::<Sort>)
        .transpose()?
        .unwrap_or_default();
    Ok((request, sort))
}
