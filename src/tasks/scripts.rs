//! JavaScript bundling.

use super::{BuildContext, Task, TaskId, TaskReport};
use crate::discovery::discover;
use crate::events::Reload;
use crate::paths::AssetClass;
use crate::transform::browsers::BrowserPolicy;
use crate::transform::bundle::{run_bundler, BundleRequest};
use anyhow::{Context as _, Result};
use std::fs;

pub struct ScriptsTask;

impl Task for ScriptsTask {
    fn id(&self) -> TaskId {
        TaskId::Scripts
    }

    /// The page reloads even when bundling failed, so the browser shows the
    /// current state.
    fn reload(&self) -> Reload {
        Reload::Always
    }

    fn run(&self, ctx: &BuildContext) -> Result<TaskReport> {
        let mut report = TaskReport::new(TaskId::Scripts);
        let assets = ctx.paths.get(AssetClass::Scripts);
        let entries = discover(&ctx.project_root, assets)?;
        if entries.is_empty() {
            return Ok(report);
        }

        let scripts = &ctx.config.scripts;
        let target = BrowserPolicy::from_queries(&ctx.config.styles.browsers)?.script_target();
        let output = ctx.output_dir(AssetClass::Scripts);
        fs::create_dir_all(&output)
            .with_context(|| format!("Failed to create directory {}", output.display()))?;

        for source in entries {
            let outfile = assets.output.join(&source.relative).with_extension("min.js");
            let entry = source.path.strip_prefix(&ctx.project_root).unwrap_or(source.path.as_path());

            let request = BundleRequest {
                entry,
                outfile: &outfile,
                target: &target,
                extra_args: &scripts.extra_args,
            };
            run_bundler(&scripts.bundler, &request, &ctx.project_root)
                .with_context(|| format!("Failed to bundle {}", source.path.display()))?;
            report.written.push(ctx.resolve(&outfile));
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::transform::bundle::BundleError;
    use tempfile::TempDir;

    #[test]
    fn test_no_entry_skips_bundler() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.scripts.bundler = "definitely-not-a-bundler".into();

        let report = ScriptsTask.run(&BuildContext::new(temp.path(), config)).unwrap();
        assert!(report.written.is_empty());
    }

    #[test]
    fn test_missing_bundler_is_fatal() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/js")).unwrap();
        fs::write(temp.path().join("src/js/script.js"), "console.log(1);\n").unwrap();

        let mut config = Config::default();
        config.scripts.bundler = "definitely-not-a-bundler".into();
        let err = ScriptsTask.run(&BuildContext::new(temp.path(), config)).unwrap_err();

        assert!(matches!(err.downcast_ref::<BundleError>(), Some(BundleError::NotFound(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_bundler_invocation() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/js")).unwrap();
        fs::write(temp.path().join("src/js/script.js"), "console.log(1);\n").unwrap();

        // Stand-in bundler: records its arguments and writes the outfile.
        let fake = temp.path().join("fake-bundler.sh");
        fs::write(
            &fake,
            "#!/bin/sh\necho \"$@\" > args.txt\nfor a in \"$@\"; do case $a in --outfile=*) echo bundled > \"${a#--outfile=}\";; esac; done\n",
        )
        .unwrap();
        fs::set_permissions(&fake, fs::Permissions::from_mode(0o755)).unwrap();

        let mut config = Config::default();
        config.paths.output = Some("site".into());
        config.scripts.bundler = fake.display().to_string();
        let report = ScriptsTask.run(&BuildContext::new(temp.path(), config)).unwrap();

        assert_eq!(report.written, vec![temp.path().join("site/js/script.min.js")]);
        assert_eq!(fs::read_to_string(temp.path().join("site/js/script.min.js")).unwrap(), "bundled\n");
        let args = fs::read_to_string(temp.path().join("args.txt")).unwrap();
        assert!(args.starts_with("src/js/script.js --bundle --minify --sourcemap=inline --target="));
    }
}
