// CLI command implementations
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use m4a_info::field_mapping::FieldMappings;
use m4a_info::metadata::extension_for_mime;
use m4a_info::mp4::list_top_level;
use m4a_info::{AudioFormat, AudioMetadata, M4aParser, StandardField};

use crate::cli::output::OutputFormatter;

/// Keep only the requested fields of a metadata object
fn select_fields(value: serde_json::Value, fields: &[StandardField]) -> serde_json::Value {
    match value {
        serde_json::Value::Object(obj) if !fields.is_empty() => obj
            .into_iter()
            .filter(|(key, _)| fields.iter().any(|f| f.as_str() == key.as_str()))
            .collect(),
        other => other,
    }
}

fn parse_one(parser: &M4aParser<'_>, path: &Path) -> Result<AudioMetadata> {
    match AudioFormat::detect(path).with_context(|| format!("cannot open {}", path.display()))? {
        AudioFormat::Mp4 => parser
            .parse_file(path)
            .with_context(|| format!("{}", path.display())),
        other => bail!("{}: {} files are not supported", path.display(), other.as_str()),
    }
}

/// Read metadata from files
pub fn command_read(
    parser: &M4aParser<'_>,
    files: &[PathBuf],
    fields: Option<&str>,
    output: Option<&Path>,
    with_cover: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let fields = match fields {
        Some(list) => FieldMappings::parse_field_list(list).map_err(anyhow::Error::msg)?,
        None => Vec::new(),
    };

    let mut writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout()),
    };

    let mut failures = 0;
    for path in files {
        match parse_one(parser, path) {
            Ok(metadata) => {
                let value = select_fields(metadata.to_json(with_cover), &fields);
                if files.len() > 1 && !formatter.is_quiet() {
                    writeln!(writer, "{}", path.display())?;
                }
                formatter.output_metadata(&value, &mut *writer)?;
            }
            Err(e) => {
                formatter.print_error(&format!("{:#}", e));
                failures += 1;
            }
        }
    }
    writer.flush()?;

    if failures > 0 {
        bail!("{} of {} files could not be read", failures, files.len());
    }
    Ok(())
}

/// Batch process directory
pub fn command_batch(
    parser: &M4aParser<'_>,
    directory: &Path,
    pattern: &str,
    formatter: &OutputFormatter,
) -> Result<()> {
    use glob::glob;

    // Build glob pattern
    let glob_pattern = if pattern.contains('*') || pattern.contains('?') {
        format!("{}/{}", directory.display(), pattern)
    } else {
        format!("{}/**/{}", directory.display(), pattern)
    };

    let mut files = Vec::new();
    for entry in glob(&glob_pattern).context("invalid glob pattern")? {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => formatter.print_error(&format!("error reading path: {}", e)),
        }
    }

    if files.is_empty() {
        formatter.print_info("No files found matching pattern");
        return Ok(());
    }
    formatter.print_info(&format!("Processing {} files...", files.len()));

    let mut success_count = 0;
    let mut error_count = 0;
    for path in &files {
        match parse_one(parser, path) {
            Ok(metadata) => {
                formatter.print_success(&format!(
                    "{}: {}",
                    path.display(),
                    metadata.title.as_deref().unwrap_or("(untitled)")
                ));
                success_count += 1;
            }
            Err(e) => {
                formatter.print_error(&format!("{:#}", e));
                error_count += 1;
            }
        }
    }

    formatter.print_info(&format!(
        "Completed: {} successful, {} errors",
        success_count, error_count
    ));
    Ok(())
}

/// Detect file format
pub fn command_detect(parser: &M4aParser<'_>, files: &[PathBuf], formatter: &OutputFormatter) -> Result<()> {
    for path in files {
        let format = match AudioFormat::detect(path) {
            Ok(format) => format,
            Err(e) => {
                formatter.print_error(&format!("{}: {}", path.display(), e));
                continue;
            }
        };

        let brand = match format {
            AudioFormat::Mp4 => parser.parse_file(path).ok().and_then(|m| m.brand),
            _ => None,
        };
        println!(
            "{}: {} (brand: {})",
            path.display(),
            format.as_str(),
            brand.as_deref().unwrap_or("N/A")
        );
    }
    Ok(())
}

/// Export cover art
pub fn command_export_cover(
    parser: &M4aParser<'_>,
    file: &Path,
    output_dir: &Path,
    formatter: &OutputFormatter,
) -> Result<()> {
    let metadata = parse_one(parser, file)?;
    let data = match metadata.cover_data {
        Some(data) => data,
        None => bail!("{} has no cover art", file.display()),
    };

    let extension = metadata.cover_mime.map(extension_for_mime).unwrap_or("bin");
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "cover".to_string());

    fs::create_dir_all(output_dir)
        .with_context(|| format!("cannot create {}", output_dir.display()))?;
    let target = output_dir.join(format!("{}.{}", stem, extension));
    fs::write(&target, &data).with_context(|| format!("cannot write {}", target.display()))?;

    formatter.print_success(&format!("Exported {} bytes to {}", data.len(), target.display()));
    Ok(())
}

/// Show detailed file information
pub fn command_info(parser: &M4aParser<'_>, files: &[PathBuf], detailed: bool) -> Result<()> {
    for path in files {
        let stat = fs::metadata(path).with_context(|| format!("cannot stat {}", path.display()))?;
        let format = AudioFormat::detect(path)?;

        println!("\n📁 {}", path.display());
        println!("{}", "─".repeat(60));
        println!("Size: {} bytes", stat.len());
        if let Ok(modified) = stat.modified() {
            let date: chrono::DateTime<chrono::Utc> = modified.into();
            println!("Modified: {}", date.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        println!("Format: {}", format.as_str());

        if format != AudioFormat::Mp4 {
            continue;
        }

        match parser.parse_file(path) {
            Ok(metadata) => {
                if let Some(brand) = &metadata.brand {
                    println!("Brand: {} (version {})", brand, metadata.version.unwrap_or(0));
                }
                if let Some(duration) = metadata.duration {
                    println!("Duration: {}:{:02}.{:03}", duration / 60000, duration / 1000 % 60, duration % 1000);
                }
            }
            Err(e) => println!("Error: {}", e),
        }

        if detailed {
            println!("\nTop-level atoms:");
            let file = File::open(path)?;
            for (kind, offset, length) in list_top_level(BufReader::new(file)) {
                println!("  {:<6} offset={:<10} length={}", kind, offset, length);
            }
        }
    }
    Ok(())
}
