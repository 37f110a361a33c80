//! The configuration entry point a documentation site generator calls at startup.
//!
//! The generator hands [`configure`] a [`SiteContext`]: the site descriptor to fill and the
//! registry fenced code blocks are highlighted with. Everything else (page pipeline, routing,
//! Markdown) stays on the generator side.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CohlResult, Error};
use crate::languages::co::{self, CO_TAG, CoVersion};
use crate::registry::Registry;

/// Where the site is written when nothing says otherwise, relative to the sources
pub const DEFAULT_OUTDIR: &str = "../docs";

/// Work returned by a build hook. The build doesn't move on until it has run.
pub struct Deferred(Box<dyn FnOnce() -> Result<(), String> + Send>);

impl Deferred {
    pub fn new(work: impl FnOnce() -> Result<(), String> + Send + 'static) -> Self {
        Self(Box::new(work))
    }

    /// Runs the work to completion
    pub fn wait(self) -> CohlResult<()> {
        (self.0)().map_err(Error::Hook)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Deferred")
    }
}

/// What a build hook tells the build pipeline
#[derive(Debug)]
pub enum HookOutcome {
    /// Carry on right away
    Proceed,
    /// Carry on once the deferred work is done
    Wait(Deferred),
}

/// Called with the source files of the build
pub type BuildHook = Box<dyn FnMut(&[PathBuf]) -> HookOutcome + Send>;

/// The parts of the site descriptor cohl knows about
pub struct Site {
    pub outdir: PathBuf,
    pub on_before_build: Option<BuildHook>,
    pub on_after_build: Option<BuildHook>,
}

impl Default for Site {
    fn default() -> Self {
        Self {
            outdir: PathBuf::from("."),
            on_before_build: None,
            on_after_build: None,
        }
    }
}

impl fmt::Debug for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Site")
            .field("outdir", &self.outdir)
            .field("on_before_build", &self.on_before_build.is_some())
            .field("on_after_build", &self.on_after_build.is_some())
            .finish()
    }
}

fn run_hook(name: &str, hook: Option<&mut BuildHook>, files: &[PathBuf]) -> CohlResult<()> {
    let Some(hook) = hook else {
        return Ok(());
    };
    log::debug!("Running {name} hook on {} files", files.len());
    match hook(files) {
        HookOutcome::Proceed => Ok(()),
        HookOutcome::Wait(deferred) => {
            log::debug!("Waiting for the {name} hook to finish");
            deferred.wait()
        }
    }
}

impl Site {
    /// Runs the before-build hook, if any, and waits for whatever it deferred
    pub fn run_before_build(&mut self, files: &[PathBuf]) -> CohlResult<()> {
        run_hook("before-build", self.on_before_build.as_mut(), files)
    }

    /// Runs the after-build hook, if any, and waits for whatever it deferred
    pub fn run_after_build(&mut self, files: &[PathBuf]) -> CohlResult<()> {
        run_hook("after-build", self.on_after_build.as_mut(), files)
    }
}

/// What the site generator hands to [`configure`]
#[derive(Debug)]
pub struct SiteContext<'a> {
    pub site: &'a mut Site,
    /// Registry used to highlight fenced code blocks
    pub hljs: &'a mut Registry,
}

/// The site configuration as a JSON file:
/// ```json
/// {
///   "outdir": "../docs",
///   "languages": { "co": "current", "co-legacy": "hash" },
///   "grammars": { "asm": "grammars/asm.json" }
/// }
/// ```
/// Missing fields take the values of [`SiteConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub outdir: PathBuf,
    /// Tag -> version of the Co grammar to register under it
    pub languages: BTreeMap<String, CoVersion>,
    /// Tag -> path of a JSON grammar to register under it
    pub grammars: BTreeMap<String, PathBuf>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            outdir: PathBuf::from(DEFAULT_OUTDIR),
            languages: BTreeMap::from([(CO_TAG.to_owned(), CoVersion::Current)]),
            grammars: BTreeMap::new(),
        }
    }
}

impl SiteConfig {
    /// Loads a config file. Relative grammar paths are relative to the config file.
    pub fn load_from_file(path: impl AsRef<Path>) -> CohlResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let mut config: SiteConfig = serde_json::from_reader(reader)?;
        if let Some(dir) = path.parent() {
            for grammar_path in config.grammars.values_mut() {
                if grammar_path.is_relative() {
                    *grammar_path = dir.join(&*grammar_path);
                }
            }
        }
        Ok(config)
    }

    pub fn load_from_str(content: &str) -> CohlResult<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

/// The default site configuration: output in `../docs`, Co highlighted under `co`.
pub fn configure(ctx: SiteContext<'_>) -> CohlResult<()> {
    configure_with(ctx, &SiteConfig::default())
}

/// Applies the given configuration to the site and its highlighting registry.
pub fn configure_with(ctx: SiteContext<'_>, config: &SiteConfig) -> CohlResult<()> {
    ctx.site.outdir = config.outdir.clone();

    for (tag, version) in &config.languages {
        if version.is_deprecated() {
            log::debug!("Registering deprecated Co grammar {version:?} as `{tag}`");
        }
        ctx.hljs.register_language(tag, co::grammar(*version))?;
    }
    for (tag, path) in &config.grammars {
        log::debug!("Loading grammar `{tag}` from {}", path.display());
        ctx.hljs.add_grammar_from_path(tag, path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::category::Category;
    use crate::registry::HighlightOptions;

    #[test]
    fn default_configuration() {
        let mut site = Site::default();
        let mut registry = Registry::default();
        configure(SiteContext {
            site: &mut site,
            hljs: &mut registry,
        })
        .unwrap();

        assert_eq!(site.outdir, PathBuf::from("../docs"));
        assert!(site.on_before_build.is_none());
        assert!(site.on_after_build.is_none());
        let code = registry
            .highlight("// x", HighlightOptions::new("co"))
            .unwrap();
        assert_eq!(code.lines[0][0].category(), Some(Category::Comment));
    }

    #[test]
    fn empty_config_is_the_default() {
        assert_eq!(SiteConfig::load_from_str("{}").unwrap(), SiteConfig::default());
    }

    #[test]
    fn registers_configured_versions() {
        let config = SiteConfig::load_from_str(
            r#"{"outdir": "out", "languages": {"co": "current", "co-legacy": "hash"}}"#,
        )
        .unwrap();
        let mut site = Site::default();
        let mut registry = Registry::default();
        configure_with(
            SiteContext {
                site: &mut site,
                hljs: &mut registry,
            },
            &config,
        )
        .unwrap();

        assert_eq!(site.outdir, PathBuf::from("out"));
        let comment_of = |tag: &str, text: &str| {
            registry
                .highlight(text, HighlightOptions::new(tag))
                .unwrap()
                .lines[0][0]
                .category()
        };
        assert_eq!(comment_of("co-legacy", "# x"), Some(Category::Comment));
        assert_eq!(comment_of("co", "// x"), Some(Category::Comment));
    }

    #[test]
    fn unknown_version_is_rejected() {
        assert!(SiteConfig::load_from_str(r#"{"languages": {"co": "v0"}}"#).is_err());
    }

    #[test]
    fn loads_grammars_relative_to_config() {
        let dir = std::env::temp_dir().join(format!("cohl-site-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("grammars")).unwrap();
        std::fs::write(
            dir.join("grammars/tiny.json"),
            r#"{"name": "Tiny", "keywords": "let"}"#,
        )
        .unwrap();
        let config_path = dir.join("site.json");
        std::fs::write(
            &config_path,
            r#"{"languages": {}, "grammars": {"tiny": "grammars/tiny.json"}}"#,
        )
        .unwrap();

        let config = SiteConfig::load_from_file(&config_path).unwrap();
        assert_eq!(config.grammars["tiny"], dir.join("grammars/tiny.json"));
        let mut site = Site::default();
        let mut registry = Registry::default();
        configure_with(
            SiteContext {
                site: &mut site,
                hljs: &mut registry,
            },
            &config,
        )
        .unwrap();
        assert!(registry.contains_grammar("tiny"));
        assert!(!registry.contains_grammar("co"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_hooks_proceed() {
        let mut site = Site::default();
        site.run_before_build(&[]).unwrap();
        site.run_after_build(&[]).unwrap();
    }

    #[test]
    fn hooks_see_the_files() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_hook = seen.clone();
        let mut site = Site {
            on_before_build: Some(Box::new(move |files: &[PathBuf]| {
                seen_by_hook.lock().unwrap().extend(files.iter().cloned());
                HookOutcome::Proceed
            })),
            ..Default::default()
        };
        let files = vec![PathBuf::from("index.md"), PathBuf::from("co.md")];
        site.run_before_build(&files).unwrap();
        assert_eq!(*seen.lock().unwrap(), files);
    }

    #[test]
    fn deferred_work_runs_before_returning() {
        let done = Arc::new(AtomicBool::new(false));
        let done_by_hook = done.clone();
        let mut site = Site {
            on_after_build: Some(Box::new(move |_: &[PathBuf]| {
                let done = done_by_hook.clone();
                HookOutcome::Wait(Deferred::new(move || {
                    done.store(true, Ordering::SeqCst);
                    Ok(())
                }))
            })),
            ..Default::default()
        };
        site.run_after_build(&[]).unwrap();
        assert!(done.load(Ordering::SeqCst));
    }

    #[test]
    fn failed_deferred_work_is_an_error() {
        let mut site = Site {
            on_before_build: Some(Box::new(|_: &[PathBuf]| {
                HookOutcome::Wait(Deferred::new(|| Err("no network".to_owned())))
            })),
            ..Default::default()
        };
        assert!(matches!(
            site.run_before_build(&[]),
            Err(Error::Hook(msg)) if msg == "no network"
        ));
    }
}
