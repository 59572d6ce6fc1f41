use anyhow::{Result, bail};
use colored::Colorize;
use github_bottles::{FormulaRef, GithubBottles, cache, cellar};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn require_bottle(bottles: &mut GithubBottles, formula: &FormulaRef) -> Result<()> {
    let pb = spinner(format!("Looking up {}", formula.name));
    let found = bottles.bottled(formula).await;
    pb.finish_and_clear();

    if !found {
        bail!(
            "No bottle named {} on {}",
            formula.bottle_filename(bottles.platform_tag()),
            bottles.endpoint()
        );
    }
    Ok(())
}

pub async fn check(bottles: &mut GithubBottles, formula: &FormulaRef) -> Result<()> {
    let filename = formula.bottle_filename(bottles.platform_tag());

    if bottles.bottled(formula).await {
        let id = bottles
            .asset()
            .map(|asset| asset.id().to_string())
            .unwrap_or_default();
        println!(
            "{} {} {}",
            "✓".green(),
            filename.bold(),
            format!("(asset {})", id).dimmed()
        );
        Ok(())
    } else {
        println!("{} No bottle for {}", "⚠".yellow(), filename.bold());
        bail!("{} is not bottled", formula.name)
    }
}

pub async fn fetch(
    bottles: &mut GithubBottles,
    cache_root: &Path,
    formula: &FormulaRef,
) -> Result<PathBuf> {
    require_bottle(bottles, formula).await?;
    let asset = match bottles.asset() {
        Some(asset) => asset.clone(),
        None => bail!("{} is not bottled", formula.name),
    };

    let pb = spinner(format!("Downloading {}", asset.name()));
    let result = bottles.fetch(cache_root, formula, &asset).await;
    pb.finish_and_clear();
    let path = result?;

    let sha256 = cache::file_sha256(&path)?;
    println!(
        "{} Downloaded {}",
        "✓".green(),
        path.display().to_string().bold()
    );
    println!("  {} {}", "SHA256:".dimmed(), sha256);

    Ok(path)
}

pub async fn install(
    bottles: &mut GithubBottles,
    cache_root: &Path,
    formula: &FormulaRef,
    prefix: &Path,
    into: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let install_dir = into.unwrap_or_else(|| cellar::keg_path(prefix, formula));

    require_bottle(bottles, formula).await?;

    let pb = spinner(format!(
        "Pouring {} to {}",
        formula.name,
        install_dir.display()
    ));
    let result = bottles.pour(cache_root, formula, &install_dir).await;
    pb.finish_and_clear();
    let cache_file = result?;

    let installed = WalkDir::new(&install_dir)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| !e.file_type().is_dir())
        .count();
    println!(
        "{} Poured {} into {} {}",
        "✓".green(),
        formula.name.bold(),
        install_dir.display().to_string().bold(),
        format!("({} files)", installed).dimmed()
    );
    println!("  {} {}", "Bottle:".dimmed(), cache_file.display());

    if verbose {
        for entry in WalkDir::new(&install_dir)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if let Ok(relative) = entry.path().strip_prefix(&install_dir) {
                println!("  {}", relative.display());
            }
        }
    }

    Ok(())
}
