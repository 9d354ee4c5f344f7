//! Project materializer - copy a fixed manifest of source paths into place

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::runner::CommandRunner;

/// Everything copied from the source tree; nothing else is ever picked up
pub const MANIFEST: &[&str] = &[
    "client",
    "server",
    "shared",
    "script",
    "package.json",
    "package-lock.json",
    "tsconfig.json",
    "tailwind.config.ts",
    "postcss.config.js",
    "vite.config.ts",
    "drizzle.config.ts",
    "components.json",
    "UBUNTU_DEPLOYMENT_GUIDE.md",
];

/// Create `target` and copy every manifest entry present under `source`
///
/// Returns the resolved target directory. Entries missing from `source`
/// are skipped; a failure copying one entry is reported and the rest are
/// still copied.
pub fn materialize(
    source: &Path,
    target: &Path,
    dry_run: bool,
    runner: &CommandRunner<'_>,
) -> Result<PathBuf> {
    let reporter = runner.reporter();

    if dry_run {
        for item in MANIFEST.iter().filter(|item| source.join(item).exists()) {
            reporter.info(&format!("Would copy: {item}"));
        }
        return Ok(target.to_path_buf());
    }

    if !target.exists() {
        fs::create_dir_all(target)
            .with_context(|| format!("Failed to create directory: {}", target.display()))?;
        reporter.success(&format!("Created directory: {}", target.display()));
    }
    let target = target
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", target.display()))?;

    if source.canonicalize().is_ok_and(|s| s == target) {
        reporter.warn(&format!(
            "Source is the install directory, files already in place: {}",
            target.display()
        ));
        return Ok(target);
    }

    for item in MANIFEST {
        let src = source.join(item);
        if !src.exists() {
            log::debug!("skipping {item}: not in {}", source.display());
            continue;
        }

        let dst = target.join(item);
        let src_real = src
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", src.display()));
        let src_real = match src_real {
            Ok(path) => path,
            Err(e) => {
                runner.report_failure(&format!("Copy {item}"), &e);
                continue;
            }
        };
        if dst.canonicalize().is_ok_and(|d| d == src_real) {
            reporter.warn(&format!("Already in place: {item}"));
            continue;
        }
        if target.starts_with(&src_real) {
            let e = anyhow::anyhow!("{} contains the install directory", src_real.display());
            runner.report_failure(&format!("Copy {item}"), &e);
            continue;
        }
        let copied = if src.is_dir() {
            copy_tree(&src, &dst)
        } else {
            copy_file(&src, &dst)
        };

        match copied {
            Ok(()) => reporter.success(&format!("Copied: {item}")),
            Err(e) => runner.report_failure(&format!("Copy {item}"), &e),
        }
    }

    Ok(target)
}

/// Replace `dst` with a recursive copy of `src`
fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    if dst.is_dir() && !dst.is_symlink() {
        fs::remove_dir_all(dst)
            .with_context(|| format!("Failed to remove {}", dst.display()))?;
    } else if dst.exists() || dst.is_symlink() {
        fs::remove_file(dst).with_context(|| format!("Failed to remove {}", dst.display()))?;
    }

    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).display().to_string();
            anyhow::Error::new(std::io::Error::from(e)).context(format!("Failed to read {path}"))
        })?;
        let relative = entry.path().strip_prefix(src)?;
        let dest = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&dest)
                .with_context(|| format!("Failed to create directory: {}", dest.display()))?;
        } else if file_type.is_symlink() {
            let link = fs::read_link(entry.path())
                .with_context(|| format!("Failed to read link {}", entry.path().display()))?;
            std::os::unix::fs::symlink(&link, &dest).with_context(|| {
                format!("Failed to create symlink: {} -> {}", dest.display(), link.display())
            })?;
        } else {
            copy_file(entry.path(), &dest)?;
        }
    }

    Ok(())
}

/// Copy a file keeping its permissions and modification time
fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::copy(src, dst)
        .with_context(|| format!("Failed to copy {} → {}", src.display(), dst.display()))?;

    let modified = fs::metadata(src).and_then(|m| m.modified());
    let stamped = modified.and_then(|mtime| {
        fs::File::options()
            .write(true)
            .open(dst)
            .and_then(|f| f.set_modified(mtime))
    });
    if let Err(e) = stamped {
        log::debug!("kept new mtime on {}: {e}", dst.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::{Level, Transcript};
    use shellrun::Recorder;
    use std::collections::BTreeMap;

    fn source_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("server/routes")).unwrap();
        fs::create_dir_all(root.join("client/src")).unwrap();
        fs::write(root.join("server/index.ts"), "export {}").unwrap();
        fs::write(root.join("server/routes/mail.ts"), "// mail").unwrap();
        fs::write(root.join("client/src/main.tsx"), "render()").unwrap();
        fs::write(root.join("package.json"), r#"{"name":"temp-email"}"#).unwrap();
        // Not in the manifest: must never be copied
        fs::write(root.join(".env"), "SESSION_SECRET=old").unwrap();
        fs::create_dir_all(root.join("node_modules/left-pad")).unwrap();
        fs::create_dir_all(root.join("dist")).unwrap();
        dir
    }

    fn snapshot(root: &Path) -> BTreeMap<PathBuf, Option<Vec<u8>>> {
        WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .map(|e| e.unwrap())
            .map(|e| {
                let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
                let content = e.file_type().is_file().then(|| fs::read(e.path()).unwrap());
                (rel, content)
            })
            .collect()
    }

    #[test]
    fn test_copies_only_manifest_entries() {
        let src = source_tree();
        let out = tempfile::tempdir().unwrap();
        let target = out.path().join("var/www/app");
        let rec = Recorder::new();
        let t = Transcript::new();
        let runner = CommandRunner::new(&rec, &t);

        let dir = materialize(src.path(), &target, false, &runner).unwrap();

        assert_eq!(dir, target.canonicalize().unwrap());
        assert!(dir.join("server/routes/mail.ts").is_file());
        assert!(dir.join("client/src/main.tsx").is_file());
        assert!(dir.join("package.json").is_file());
        assert!(!dir.join(".env").exists());
        assert!(!dir.join("node_modules").exists());
        assert!(!dir.join("dist").exists());
        assert!(!dir.join("shared").exists());
        assert_eq!(t.count(Level::Error), 0);
        assert!(rec.scripts().is_empty());
    }

    #[test]
    fn test_materialize_is_idempotent() {
        let src = source_tree();
        let out = tempfile::tempdir().unwrap();
        let target = out.path().join("app");
        let rec = Recorder::new();
        let t = Transcript::new();
        let runner = CommandRunner::new(&rec, &t);

        materialize(src.path(), &target, false, &runner).unwrap();
        let first = snapshot(&target);
        materialize(src.path(), &target, false, &runner).unwrap();
        let second = snapshot(&target);

        assert_eq!(first, second);
    }

    #[test]
    fn test_directories_are_replaced_not_merged() {
        let src = source_tree();
        let out = tempfile::tempdir().unwrap();
        let target = out.path().join("app");
        fs::create_dir_all(target.join("server")).unwrap();
        fs::write(target.join("server/stale.ts"), "old").unwrap();
        let rec = Recorder::new();
        let t = Transcript::new();
        let runner = CommandRunner::new(&rec, &t);

        materialize(src.path(), &target, false, &runner).unwrap();

        assert!(!target.join("server/stale.ts").exists());
        assert!(target.join("server/index.ts").exists());
    }

    #[test]
    fn test_file_copy_preserves_mtime() {
        let src = source_tree();
        let out = tempfile::tempdir().unwrap();
        let target = out.path().join("app");
        let rec = Recorder::new();
        let t = Transcript::new();
        let runner = CommandRunner::new(&rec, &t);

        materialize(src.path(), &target, false, &runner).unwrap();

        let before = fs::metadata(src.path().join("package.json"))
            .unwrap()
            .modified()
            .unwrap();
        let after = fs::metadata(target.join("package.json"))
            .unwrap()
            .modified()
            .unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_materialize_into_itself_keeps_sources() {
        let src = source_tree();
        let rec = Recorder::new();
        let t = Transcript::new();
        let runner = CommandRunner::new(&rec, &t);
        let before = snapshot(src.path());

        let dir = materialize(src.path(), src.path(), false, &runner).unwrap();

        assert_eq!(dir, src.path().canonicalize().unwrap());
        assert_eq!(snapshot(src.path()), before);
        assert_eq!(
            fs::read_to_string(src.path().join("package.json")).unwrap(),
            r#"{"name":"temp-email"}"#
        );
        assert_eq!(t.count(Level::Error), 0);
        assert_eq!(t.count(Level::Warn), 1);
        assert!(!t.contains(Level::Success, "Copied"));
    }

    #[test]
    fn test_linked_entry_is_not_copied_onto_itself() {
        let src = source_tree();
        let out = tempfile::tempdir().unwrap();
        let target = out.path().join("app");
        fs::create_dir_all(&target).unwrap();
        std::os::unix::fs::symlink(src.path().join("server"), target.join("server")).unwrap();
        let rec = Recorder::new();
        let t = Transcript::new();
        let runner = CommandRunner::new(&rec, &t);

        materialize(src.path(), &target, false, &runner).unwrap();

        assert!(src.path().join("server/index.ts").is_file());
        assert!(t.contains(Level::Warn, "Already in place: server"));
        assert!(t.contains(Level::Success, "Copied: package.json"));
    }

    #[test]
    fn test_install_dir_inside_source_entry_is_refused() {
        let src = source_tree();
        let target = src.path().join("server/deploy");
        let rec = Recorder::new();
        let t = Transcript::new();
        let runner = CommandRunner::new(&rec, &t);

        materialize(src.path(), &target, false, &runner).unwrap();

        assert!(src.path().join("server/index.ts").is_file());
        assert!(t.contains(Level::Error, "Copy server"));
        assert!(t.contains(Level::Success, "Copied: package.json"));
    }

    #[test]
    fn test_walk_error_names_the_path_once() {
        let out = tempfile::tempdir().unwrap();
        let missing = out.path().join("missing");

        let err = copy_tree(&missing, &out.path().join("dst")).unwrap_err();
        let msg = format!("{err:#}");

        assert!(msg.starts_with(&format!("Failed to read {}", missing.display())));
        assert_eq!(msg.matches("os error 2").count(), 1);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let src = source_tree();
        let out = tempfile::tempdir().unwrap();
        let target = out.path().join("app");
        let rec = Recorder::new();
        let t = Transcript::new();
        let runner = CommandRunner::new(&rec, &t);

        let dir = materialize(src.path(), &target, true, &runner).unwrap();

        assert_eq!(dir, target);
        assert!(!target.exists());
        assert!(t.contains(Level::Info, "Would copy: server"));
    }
}
