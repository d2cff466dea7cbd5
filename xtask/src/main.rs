use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask", about = "Repository maintenance tasks")]
struct Xtask {
    #[command(subcommand)]
    task: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Render man pages for kekverify and its subcommands
    Man {
        /// Output directory
        #[arg(long, default_value = "target/man")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    match Xtask::parse().task {
        Task::Man { out } => {
            let written = render_man_pages(&out)?;
            for path in written {
                println!("{}", path.display());
            }
            Ok(())
        }
    }
}

/// Write `kekverify.1` plus one page per subcommand into `out`.
fn render_man_pages(out: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out)
        .with_context(|| format!("Failed to create {}", out.display()))?;

    let cmd = kekverify_cli::command();
    let mut written = Vec::new();

    let root = out.join("kekverify.1");
    write_page(&cmd, &root)?;
    written.push(root);

    for sub in cmd.get_subcommands() {
        let name = format!("kekverify-{}", sub.get_name());
        let page = sub.clone().name(name.clone());
        let path = out.join(format!("{}.1", name));
        write_page(&page, &path)?;
        written.push(path);
    }
    Ok(written)
}

fn write_page(cmd: &clap::Command, path: &Path) -> Result<()> {
    let mut buf = Vec::new();
    clap_mangen::Man::new(cmd.clone())
        .render(&mut buf)
        .with_context(|| format!("Failed to render {}", path.display()))?;
    std::fs::write(path, buf).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_root_and_subcommand_pages() {
        let dir = tempfile::tempdir().unwrap();
        let written = render_man_pages(dir.path()).unwrap();
        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert!(names.contains(&"kekverify.1".to_string()));
        assert!(names.contains(&"kekverify-verify.1".to_string()));
        assert!(names.contains(&"kekverify-sign.1".to_string()));

        let root = std::fs::read_to_string(dir.path().join("kekverify.1")).unwrap();
        assert!(root.contains("kekverify"));
    }
}
