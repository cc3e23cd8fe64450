use std::path::Path;

use anyhow::{anyhow, Context};
use bytes::Bytes;
use colored::Colorize;
use fragments_convert::negotiate;
use fragments_server::{FragmentsServer, ServerConfig, StorageConfig};
use fragments_types::{MediaType, SupportedType};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Convert(args) => cmd_convert(args).await,
        Command::Formats(args) => cmd_formats(args),
    }
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = ServerConfig::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(root) = args.storage_root {
        config.storage = StorageConfig::Filesystem { root };
    }
    println!("{} fragments server on {}", "✓".green().bold(), config.bind_addr.to_string().bold());
    FragmentsServer::new(config).serve().await?;
    Ok(())
}

async fn cmd_convert(args: ConvertArgs) -> anyhow::Result<()> {
    let media = input_type(&args.input, args.content_type.as_deref())?;
    let payload = tokio::fs::read(&args.input)
        .await
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let input = args.input.display().to_string();
    let to = args.to.clone();

    let converted =
        tokio::task::spawn_blocking(move || negotiate(&media, &to, Bytes::from(payload))).await??;

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, &converted.body)
                .await
                .with_context(|| format!("cannot write {}", path.display()))?;
            eprintln!(
                "{} {} -> {} ({}, {} bytes)",
                "✓".green().bold(),
                input,
                path.display().to_string().bold(),
                converted.content_type.cyan(),
                converted.body.len()
            );
        }
        None => {
            use tokio::io::AsyncWriteExt;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&converted.body).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

fn cmd_formats(args: FormatsArgs) -> anyhow::Result<()> {
    let media = MediaType::parse(&args.content_type)?;
    println!("{} can be served as:", media.essence().bold());
    for format in media.base().formats() {
        println!("  {} {}", format!(".{}", format.extension()).yellow(), format);
    }
    if media.base().is_image() {
        let others: Vec<String> = SupportedType::ALL
            .into_iter()
            .filter(|t| t.is_image() && *t != media.base())
            .map(|t| format!(".{}", t.extension()))
            .collect();
        println!("  {} {}", "transcodes to".dimmed(), others.join(" ").yellow());
    }
    Ok(())
}

/// The declared type, or one guessed from the file extension.
fn input_type(path: &Path, declared: Option<&str>) -> anyhow::Result<MediaType> {
    if let Some(declared) = declared {
        return Ok(MediaType::parse(declared)?);
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(SupportedType::from_extension)
        .map(MediaType::from)
        .ok_or_else(|| anyhow!("cannot guess the type of {}; pass --type", path.display()))
}
