use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use image_meta::config::Config;
use image_meta::{Families, Family, ImageMetadata, Tag, files};

#[derive(Parser, Debug)]
#[command(
    name = "image-meta",
    version,
    about = "Show and edit EXIF, IPTC and XMP metadata of images"
)]
struct Cli {
    /// Image files or directories to process
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Path to config file (default: config.json next to binary)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Initialize a default config.json and exit
    #[arg(long)]
    init: bool,

    /// Show what would change without writing to files
    #[arg(long)]
    dry_run: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Print a single tag (repeatable)
    #[arg(long, value_name = "KEY")]
    get: Vec<String>,

    /// Set a tag; repeat the key to give it several values
    #[arg(long, value_name = "KEY=VALUE", value_parser = parse_assignment)]
    set: Vec<(String, String)>,

    /// Delete every occurrence of a tag (repeatable)
    #[arg(long, value_name = "KEY")]
    delete: Vec<String>,

    /// Set the JPEG comment; an empty string removes it
    #[arg(long, value_name = "TEXT")]
    comment: Option<String>,

    /// Write embedded previews into this directory
    #[arg(long = "extract-previews", value_name = "DIR")]
    extract_previews: Option<PathBuf>,

    /// Copy metadata into another image
    #[arg(long = "copy-to", value_name = "FILE")]
    copy_to: Option<PathBuf>,

    /// Leave EXIF out of --copy-to
    #[arg(long = "no-exif", requires = "copy_to")]
    no_exif: bool,

    /// Leave IPTC out of --copy-to
    #[arg(long = "no-iptc", requires = "copy_to")]
    no_iptc: bool,

    /// Leave XMP out of --copy-to
    #[arg(long = "no-xmp", requires = "copy_to")]
    no_xmp: bool,
}

impl Cli {
    fn edits(&self) -> bool {
        !self.set.is_empty() || !self.delete.is_empty() || self.comment.is_some()
    }

    /// Plain listing when no other action is requested.
    fn listing(&self) -> bool {
        !self.edits()
            && self.get.is_empty()
            && self.extract_previews.is_none()
            && self.copy_to.is_none()
    }

    fn families(&self) -> Families {
        Families {
            exif: !self.no_exif,
            iptc: !self.no_iptc,
            xmp: !self.no_xmp,
        }
    }
}

fn parse_assignment(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{s}`"))?;
    if key.trim().is_empty() {
        return Err(format!("missing key in `{s}`"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

/// Group `--set` pairs by key, keeping first-seen key order and value order.
fn group_assignments(pairs: &[(String, String)]) -> Vec<(String, Vec<String>)> {
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for (key, value) in pairs {
        match groups.iter_mut().find(|(k, _)| k == key) {
            Some((_, values)) => values.push(value.clone()),
            None => groups.push((key.clone(), vec![value.clone()])),
        }
    }
    groups
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Handle --init
    if cli.init {
        let config = Config::default();
        let path = cli.config.as_deref();
        config.save(path)?;
        let save_path = match path {
            Some(p) => p.to_path_buf(),
            None => Config::config_path()?,
        };
        println!("Default config written to {}", save_path.display());
        return Ok(());
    }

    if cli.paths.is_empty() {
        anyhow::bail!("No input files or directories specified. Use --help for usage.");
    }

    let mut config = Config::load(cli.config.as_deref())?;
    if cli.dry_run {
        config.output.dry_run = true;
    }

    let images = files::collect_images(&cli.paths);
    if images.is_empty() {
        anyhow::bail!("No supported image files found in the specified paths.");
    }

    if cli.copy_to.is_some() && images.len() > 1 {
        anyhow::bail!("--copy-to needs exactly one source image, found {}", images.len());
    }

    log::info!("Found {} image(s)", images.len());
    if config.output.dry_run && cli.edits() {
        log::info!("DRY RUN: no files will be modified");
    }

    let assignments = group_assignments(&cli.set);
    let mut reports = Vec::new();
    let mut failed = 0;

    for image_path in &images {
        match process_image(image_path, &cli, &config, &assignments) {
            Ok(report) => reports.push(report),
            Err(e) => {
                failed += 1;
                log::error!("{}: {e:#}", image_path.display());
                reports.push(serde_json::json!({
                    "path": image_path.display().to_string(),
                    "error": format!("{e:#}"),
                }));
            }
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    if cli.edits() || cli.copy_to.is_some() {
        let total = images.len();
        log::info!(
            "Done: {} succeeded, {failed} failed out of {total} images",
            total - failed
        );
    }

    outcome(failed, images.len())
}

/// Fail the run when any image failed, so scripts see a non-zero exit.
fn outcome(failed: usize, total: usize) -> Result<()> {
    if failed > 0 {
        anyhow::bail!("{failed} of {total} image(s) failed");
    }
    Ok(())
}

/// Run every requested action on one image; returns its JSON report.
fn process_image(
    path: &Path,
    cli: &Cli,
    config: &Config,
    assignments: &[(String, Vec<String>)],
) -> Result<serde_json::Value> {
    let mut meta =
        ImageMetadata::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    meta.read_metadata()
        .with_context(|| format!("Failed to read metadata of {}", path.display()))?;

    let mut report = serde_json::Map::new();
    report.insert("path".into(), path.display().to_string().into());
    report.insert("mime_type".into(), meta.mime_type().into());

    if cli.listing() {
        if cli.json {
            let mut tags = Vec::new();
            for family in config.enabled_families() {
                for tag in meta.tags(family)? {
                    tags.push(serde_json::to_value(&tag)?);
                }
            }
            report.insert("tags".into(), tags.into());
            report.insert("comment".into(), meta.comment()?.into());
            if let Ok((w, h)) = meta.dimensions() {
                report.insert("dimensions".into(), serde_json::json!([w, h]));
            }
        } else {
            print_full_metadata(path, &meta, config)?;
        }
        return Ok(report.into());
    }

    if !cli.get.is_empty() {
        let mut found = Vec::new();
        for key in &cli.get {
            match meta.get_tag(key) {
                Ok(tag) => {
                    if cli.json {
                        found.push(serde_json::to_value(&tag)?);
                    } else {
                        print_tag(&tag, config);
                    }
                }
                Err(e) if e.is_not_found() => {
                    if !cli.json {
                        print_skipped(key, "(not set)");
                    }
                }
                Err(e) => return Err(e).with_context(|| format!("Cannot get {key}")),
            }
        }
        report.insert("tags".into(), found.into());
    }

    if cli.edits() {
        apply_edits(&mut meta, cli, assignments)?;
        if config.output.dry_run {
            if !cli.json {
                print_edit_preview(path, &meta, cli, assignments, config);
            }
        } else {
            write_image(&mut meta, path, config)?;
            log::info!("Updated: {}", path.display());
        }
        report.insert("updated".into(), (!config.output.dry_run).into());
    }

    if let Some(ref dir) = cli.extract_previews {
        let written = extract_previews(&meta, path, dir)?;
        report.insert(
            "previews".into(),
            written
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .into(),
        );
    }

    if let Some(ref target_path) = cli.copy_to {
        copy_metadata(&meta, target_path, cli.families(), config)?;
        report.insert("copied_to".into(), target_path.display().to_string().into());
    }

    Ok(report.into())
}

fn apply_edits(meta: &mut ImageMetadata, cli: &Cli, assignments: &[(String, Vec<String>)]) -> Result<()> {
    for (key, values) in assignments {
        meta.set_tag_values(key, values.as_slice())
            .with_context(|| format!("Cannot set {key}"))?;
        log::debug!("Set {key} ({} value(s))", values.len());
    }

    for key in &cli.delete {
        match meta.delete_tag(key) {
            Ok(()) => log::debug!("Deleted {key}"),
            Err(e) if e.is_not_found() => log::warn!("{key} is not set, nothing to delete"),
            Err(e) => return Err(e).with_context(|| format!("Cannot delete {key}")),
        }
    }

    match cli.comment.as_deref() {
        Some("") => meta.clear_comment()?,
        Some(text) => meta.set_comment(text)?,
        None => {}
    }
    Ok(())
}

fn write_image(meta: &mut ImageMetadata, path: &Path, config: &Config) -> Result<()> {
    if config.output.backup_originals {
        let backup = files::backup_file(path)?;
        log::debug!("Backup: {}", backup.display());
    }
    meta.write_metadata_with(&config.write_options())
        .with_context(|| format!("Failed to write metadata to {}", path.display()))
}

fn extract_previews(meta: &ImageMetadata, path: &Path, dir: &Path) -> Result<Vec<PathBuf>> {
    let previews = meta.previews()?;
    if previews.is_empty() {
        log::info!("No previews in {}", path.display());
        return Ok(Vec::new());
    }

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    let mut written = Vec::new();
    for (i, preview) in previews.iter().enumerate() {
        let target = preview.write_to_file(dir.join(format!("{stem}-preview{}", i + 1)))?;
        log::info!(
            "Preview {}x{} ({} bytes): {}",
            preview.dimensions.0,
            preview.dimensions.1,
            preview.size,
            target.display()
        );
        written.push(target);
    }
    Ok(written)
}

fn copy_metadata(
    source: &ImageMetadata,
    target_path: &Path,
    families: Families,
    config: &Config,
) -> Result<()> {
    let mut target = ImageMetadata::open(target_path)
        .with_context(|| format!("Failed to open {}", target_path.display()))?;
    target.read_metadata()?;
    source.copy_to(&mut target, families)?;

    if config.output.dry_run {
        log::info!("Would copy metadata into {}", target_path.display());
        return Ok(());
    }
    write_image(&mut target, target_path, config)?;
    log::info!("Copied metadata into {}", target_path.display());
    Ok(())
}

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Width of the key column.
const KEY_WIDTH: usize = 36;

fn indent() -> String {
    " ".repeat(KEY_WIDTH + 5)
}

fn display_values<'t>(tag: &'t Tag<'_>, config: &Config) -> Vec<&'t str> {
    if config.display.human_readable {
        tag.human_values.iter().map(String::as_str).collect()
    } else {
        tag.values.iter().map(|v| &**v).collect()
    }
}

/// Print every enabled family of one image, one section per family.
fn print_full_metadata(path: &Path, meta: &ImageMetadata, config: &Config) -> Result<()> {
    println!();
    println!("{BOLD}File:{RESET} {}", path.display());
    println!("{DIM}{}{RESET}", "═".repeat(72));

    let mut has_any = false;

    if let Ok((w, h)) = meta.dimensions() {
        print_row("Image size", &format!("{w} x {h}"), config.display.wrap_width);
        print_row("MIME type", meta.mime_type(), config.display.wrap_width);
        println!();
    }

    for family in config.enabled_families() {
        let tags = meta.tags(family)?;
        if tags.is_empty() {
            continue;
        }
        has_any = true;
        println!("  {BOLD}{}{RESET}", section_title(family));
        println!("  {DIM}{}{RESET}", "─".repeat(70));
        for tag in &tags {
            print_tag(tag, config);
        }
        println!();
    }

    if let Some(comment) = meta.comment()? {
        has_any = true;
        println!("  {BOLD}Comment{RESET}");
        println!("  {DIM}{}{RESET}", "─".repeat(70));
        print_row("Comment", comment, config.display.wrap_width);
        println!();
    }

    if !has_any {
        println!("  {DIM}(no metadata found){RESET}");
        println!();
    }

    Ok(())
}

fn section_title(family: Family) -> &'static str {
    match family {
        Family::Exif => "EXIF",
        Family::Iptc => "IPTC",
        Family::Xmp => "XMP",
    }
}

/// Print a tag; repeated values go on their own rows under the key.
fn print_tag(tag: &Tag<'_>, config: &Config) {
    let key = tag.key.to_string();
    for (i, value) in display_values(tag, config).into_iter().enumerate() {
        let label = if i == 0 { key.as_str() } else { "" };
        print_row(label, value, config.display.wrap_width);
    }
}

/// Dry-run summary: the values each edited key would end up with.
fn print_edit_preview(
    path: &Path,
    meta: &ImageMetadata,
    cli: &Cli,
    assignments: &[(String, Vec<String>)],
    config: &Config,
) {
    println!();
    println!("{BOLD}File:{RESET} {}", path.display());
    println!("  {DIM}{}{RESET}", "─".repeat(72));

    for (key, _) in assignments {
        if let Ok(tag) = meta.get_tag(key) {
            let key = tag.key.to_string();
            for (i, value) in display_values(&tag, config).into_iter().enumerate() {
                print_new(if i == 0 { key.as_str() } else { "" }, value, config.display.wrap_width);
            }
        }
    }
    for key in &cli.delete {
        print_skipped(key, "(deleted)");
    }
    match cli.comment.as_deref() {
        Some("") => print_skipped("Comment", "(removed)"),
        Some(text) => print_new("Comment", text, config.display.wrap_width),
        None => {}
    }

    println!("  {DIM}{}{RESET}", "─".repeat(72));
    println!("  {GREEN}*{RESET} = new value to be written");
    println!();
}

/// Print a single row in the metadata table.
fn print_row(tag: &str, val: &str, width: usize) {
    let tag_col = format!("{:<width$}", tag, width = KEY_WIDTH);
    let lines = wrap_text(val, width);
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            println!("  {tag_col} : {line}");
        } else {
            println!("  {}{line}", indent());
        }
    }
}

/// Print a value about to be written (green with *).
fn print_new(tag: &str, val: &str, width: usize) {
    let tag_col = format!("{:<width$}", tag, width = KEY_WIDTH);
    let lines = wrap_text(val, width);
    for (i, line) in lines.iter().enumerate() {
        if i == 0 {
            if lines.len() == 1 {
                println!("  {GREEN}{tag_col} : {line} *{RESET}");
            } else {
                println!("  {GREEN}{tag_col} : {line}{RESET}");
            }
        } else if i == lines.len() - 1 {
            println!("  {GREEN}{}{line} *{RESET}", indent());
        } else {
            println!("  {GREEN}{}{line}{RESET}", indent());
        }
    }
}

/// Print a dimmed row for a missing or removed value.
fn print_skipped(tag: &str, reason: &str) {
    let tag_col = format!("{:<width$}", tag, width = KEY_WIDTH);
    println!("  {DIM}{tag_col} : {reason}{RESET}");
}

/// Wrap text at word boundaries to fit within max_width.
fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in s.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(s.to_string());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_failed_image_fails_the_run() {
        assert!(outcome(0, 3).is_ok());
        let err = outcome(1, 3).unwrap_err();
        assert_eq!(err.to_string(), "1 of 3 image(s) failed");
    }

    #[test]
    fn assignment_splits_on_first_equals() {
        assert_eq!(
            parse_assignment("Exif.Photo.UserComment=a=b").unwrap(),
            ("Exif.Photo.UserComment".to_string(), "a=b".to_string())
        );
        assert!(parse_assignment("Xmp.dc.title").is_err());
        assert!(parse_assignment("=value").is_err());
    }

    #[test]
    fn repeated_keys_are_grouped_in_order() {
        let pairs = vec![
            ("Iptc.Application2.Keywords".to_string(), "a".to_string()),
            ("Xmp.dc.title".to_string(), "t".to_string()),
            ("Iptc.Application2.Keywords".to_string(), "b".to_string()),
        ];
        let groups = group_assignments(&pairs);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "Iptc.Application2.Keywords");
        assert_eq!(groups[0].1, ["a", "b"]);
        assert_eq!(groups[1].1, ["t"]);
    }

    #[test]
    fn wrap_respects_width() {
        assert_eq!(wrap_text("one two three", 7), ["one two", "three"]);
        assert_eq!(wrap_text("", 10), [""]);
    }

    #[test]
    fn listing_only_without_actions() {
        let cli = Cli::parse_from(["image-meta", "a.jpg"]);
        assert!(cli.listing());
        let cli = Cli::parse_from(["image-meta", "--set", "Xmp.dc.title=x", "a.jpg"]);
        assert!(!cli.listing());
        assert!(cli.edits());
    }

    #[test]
    fn copy_flags_pick_families() {
        let cli = Cli::parse_from(["image-meta", "--copy-to", "b.jpg", "--no-iptc", "a.jpg"]);
        assert_eq!(
            cli.families(),
            Families { exif: true, iptc: false, xmp: true }
        );
    }
}
