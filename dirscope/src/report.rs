//! src/report.rs
//! ============================================================================
//! # Report: One-Shot Ranked Size Listing
//!
//! Non-interactive consumer of the same measurement capability and worker
//! pool the interactive scan uses: list the target's immediate children,
//! size them concurrently, filter, and print a ranked table.

use std::path::PathBuf;
use std::sync::Arc;

use bytesize::ByteSize;

use crate::cache::dir_cache::SizedChild;
use crate::config::config::Config;
use crate::error::AppError;
use crate::fs::measure::Measure;
use crate::scan::coordinator::size_children;

pub struct ReportOptions {
    pub target: PathBuf,
    pub top: usize,
    pub min_size_kb: u64,
    pub exclude: Vec<String>,
}

/// Measure, filter and rank the target's children.
pub async fn collect(
    measure: &Arc<dyn Measure>,
    config: &Config,
    options: &ReportOptions,
) -> Result<Vec<SizedChild>, AppError> {
    let children: Vec<PathBuf> = measure.list_child_dirs(&options.target).await;
    let mut sized: Vec<SizedChild> = size_children(measure, children, config.concurrency, None)
        .await
        .map_err(|message| AppError::Scan {
            path: options.target.clone(),
            message,
        })?;

    sized.retain(|child| {
        child.size_kb >= options.min_size_kb
            && !options
                .exclude
                .iter()
                .any(|needle| child.path.to_string_lossy().contains(needle.as_str()))
    });
    sized.sort_by(|a, b| b.size_kb.cmp(&a.size_kb));
    sized.truncate(options.top);
    Ok(sized)
}

/// Run the report and print it to stdout.
pub async fn run(
    measure: Arc<dyn Measure>,
    config: &Config,
    options: ReportOptions,
) -> Result<(), AppError> {
    let total_kb: u64 = measure.measure_kb(&options.target).await;
    let ranked: Vec<SizedChild> = collect(&measure, config, &options).await?;

    println!(
        "{}  [{}]",
        options.target.display(),
        ByteSize::kib(total_kb)
    );
    if ranked.is_empty() {
        println!("  (no child directories matched)");
        return Ok(());
    }
    for child in &ranked {
        println!(
            "  {:>10}  {}",
            ByteSize::kib(child.size_kb).to_string(),
            child.path.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::Path;

    struct FakeMeasure {
        sizes: HashMap<PathBuf, u64>,
        listings: HashMap<PathBuf, Vec<PathBuf>>,
    }

    #[async_trait]
    impl Measure for FakeMeasure {
        async fn measure_kb(&self, path: &Path) -> u64 {
            self.sizes.get(path).copied().unwrap_or(0)
        }

        async fn list_child_dirs(&self, path: &Path) -> Vec<PathBuf> {
            self.listings.get(path).cloned().unwrap_or_default()
        }
    }

    fn fixture() -> Arc<dyn Measure> {
        let mut sizes: HashMap<PathBuf, u64> = HashMap::new();
        sizes.insert(PathBuf::from("/r/node_modules"), 900);
        sizes.insert(PathBuf::from("/r/src"), 300);
        sizes.insert(PathBuf::from("/r/docs"), 40);
        sizes.insert(PathBuf::from("/r/tmp"), 2);
        let mut listings: HashMap<PathBuf, Vec<PathBuf>> = HashMap::new();
        listings.insert(
            PathBuf::from("/r"),
            sizes.keys().cloned().collect::<Vec<_>>(),
        );
        Arc::new(FakeMeasure { sizes, listings })
    }

    #[tokio::test]
    async fn ranks_descending_with_filters() {
        let measure = fixture();
        let options: ReportOptions = ReportOptions {
            target: PathBuf::from("/r"),
            top: 10,
            min_size_kb: 10,
            exclude: vec!["node_modules".into()],
        };
        let ranked = collect(&measure, &Config::default(), &options)
            .await
            .expect("report collects");

        let paths: Vec<&Path> = ranked.iter().map(|c| c.path.as_path()).collect();
        assert_eq!(
            paths,
            vec![Path::new("/r/src"), Path::new("/r/docs")]
        );
    }

    #[tokio::test]
    async fn top_limit_truncates() {
        let measure = fixture();
        let options: ReportOptions = ReportOptions {
            target: PathBuf::from("/r"),
            top: 1,
            min_size_kb: 0,
            exclude: Vec::new(),
        };
        let ranked = collect(&measure, &Config::default(), &options)
            .await
            .expect("report collects");
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].path, PathBuf::from("/r/node_modules"));
    }
}
