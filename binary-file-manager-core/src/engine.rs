//! Optional external template engine.
//!
//! The engine is looked up by name on every ingestion, because the host may
//! still be loading it when the first files arrive. [`ExternalEngineLocator`]
//! polls an [`EngineProvider`]; [`PluginDirectory`] is the provider used by
//! the CLI, exposing executables dropped into a plugins folder as
//! [`ExecutableEngine`]s.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::contract::{EngineProvider, InvocationDescriptor, TemplateEngine};
use crate::error::EngineError;
use crate::retry::{retry_until_some, RetryPolicy};

/// Registry name of the external template engine.
pub const TEMPLATER_PLUGIN_NAME: &str = "templater-obsidian";

pub struct ExternalEngineLocator {
    provider: Arc<dyn EngineProvider>,
    retry: RetryPolicy,
}

impl ExternalEngineLocator {
    pub fn new(provider: Arc<dyn EngineProvider>, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    /// Poll for the engine; `None` once the attempts run out.
    pub async fn get_templater_plugin(&self) -> Option<Arc<dyn TemplateEngine>> {
        let provider = &self.provider;
        let engine = retry_until_some(
            move || provider.try_acquire(TEMPLATER_PLUGIN_NAME),
            self.retry,
        )
        .await;
        if engine.is_none() {
            info!(
                name = TEMPLATER_PLUGIN_NAME,
                attempts = self.retry.attempts,
                "Template engine not available"
            );
        }
        engine
    }
}

/// Provider backed by a folder of engine executables, one per name.
#[derive(Debug, Clone)]
pub struct PluginDirectory {
    dir: PathBuf,
    vault_root: PathBuf,
}

impl PluginDirectory {
    pub fn new(dir: impl Into<PathBuf>, vault_root: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            vault_root: vault_root.into(),
        }
    }
}

#[async_trait]
impl EngineProvider for PluginDirectory {
    async fn try_acquire(&self, name: &str) -> Option<Arc<dyn TemplateEngine>> {
        let program = self.dir.join(name);
        match tokio::fs::metadata(&program).await {
            Ok(meta) if meta.is_file() => {
                debug!(program = %program.display(), "Template engine found");
                Some(Arc::new(ExecutableEngine::new(program, self.vault_root.clone())))
            }
            _ => None,
        }
    }
}

/// Engine run as a child process.
///
/// Invoked as `<program> --target <absolute target> --run-mode <code>`, with
/// the template on stdin; the rendered text is read from stdout.
#[derive(Debug, Clone)]
pub struct ExecutableEngine {
    program: PathBuf,
    vault_root: PathBuf,
}

impl ExecutableEngine {
    pub fn new(program: impl Into<PathBuf>, vault_root: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            vault_root: vault_root.into(),
        }
    }
}

#[async_trait]
impl TemplateEngine for ExecutableEngine {
    async fn parse_template(
        &self,
        invocation: InvocationDescriptor,
        template: &str,
    ) -> Result<String, EngineError> {
        let target = self.vault_root.join(&invocation.target_file);
        info!(
            program = %self.program.display(),
            target = %target.display(),
            run_mode = invocation.run_mode.code(),
            "Invoking template engine"
        );

        let mut child = Command::new(&self.program)
            .arg("--target")
            .arg(&target)
            .arg("--run-mode")
            .arg(invocation.run_mode.code().to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        // Feed stdin while stdout is drained; the engine may echo as it reads.
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(template.as_bytes()).await?;
                stdin.shutdown().await?;
            }
            Ok::<_, std::io::Error>(())
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(status = %output.status, stderr = %stderr, "Template engine failed");
            return Err(EngineError::Exit {
                status: output.status.to_string(),
                stderr,
            });
        }
        // An engine may finish without consuming its whole input.
        if let Err(e) = fed {
            if e.kind() != ErrorKind::BrokenPipe {
                return Err(e.into());
            }
        }
        Ok(String::from_utf8(output.stdout)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{MockEngineProvider, MockTemplateEngine};
    use crate::retry::{DEFAULT_ATTEMPTS, DEFAULT_INTERVAL};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn absent_engine_gives_up_after_full_budget() {
        let mut provider = MockEngineProvider::new();
        provider
            .expect_try_acquire()
            .withf(|name| name == TEMPLATER_PLUGIN_NAME)
            .times(DEFAULT_ATTEMPTS as usize)
            .returning(|_| None);

        let locator = ExternalEngineLocator::new(Arc::new(provider), RetryPolicy::default());
        let started = tokio::time::Instant::now();
        assert!(locator.get_templater_plugin().await.is_none());
        assert_eq!(started.elapsed(), DEFAULT_INTERVAL * (DEFAULT_ATTEMPTS - 1));
    }

    #[tokio::test(start_paused = true)]
    async fn engine_is_returned_as_soon_as_it_appears() {
        let mut provider = MockEngineProvider::new();
        let mut seq = mockall::Sequence::new();
        provider
            .expect_try_acquire()
            .times(4)
            .in_sequence(&mut seq)
            .returning(|_| None);
        provider
            .expect_try_acquire()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Some(Arc::new(MockTemplateEngine::new()) as Arc<dyn TemplateEngine>));

        let locator = ExternalEngineLocator::new(Arc::new(provider), RetryPolicy::default());
        let started = tokio::time::Instant::now();
        assert!(locator.get_templater_plugin().await.is_some());
        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn plugin_directory_only_offers_regular_files() {
        let plugins = tempfile::tempdir().unwrap();
        std::fs::create_dir(plugins.path().join("folder-engine")).unwrap();
        std::fs::write(plugins.path().join(TEMPLATER_PLUGIN_NAME), "#!/bin/sh\ncat\n").unwrap();

        let provider = PluginDirectory::new(plugins.path(), "/vault");
        assert!(provider.try_acquire(TEMPLATER_PLUGIN_NAME).await.is_some());
        assert!(provider.try_acquire("folder-engine").await.is_none());
        assert!(provider.try_acquire("missing").await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn executable_engine_pipes_template_through_program() {
        use std::os::unix::fs::PermissionsExt;

        let plugins = tempfile::tempdir().unwrap();
        let program = plugins.path().join("upper");
        std::fs::write(&program, "#!/bin/sh\necho \"target=$2 mode=$4\"\ntr a-z A-Z\n").unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();

        let engine = ExecutableEngine::new(&program, "/vault");
        let rendered = engine
            .parse_template(
                InvocationDescriptor {
                    target_file: "Meta/a.md".to_string(),
                    run_mode: crate::contract::RunMode::DynamicProcessor,
                },
                "link to x\n",
            )
            .await
            .unwrap();
        assert_eq!(rendered, "target=/vault/Meta/a.md mode=4\nLINK TO X\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn executable_engine_streams_templates_larger_than_a_pipe() {
        use std::os::unix::fs::PermissionsExt;

        let plugins = tempfile::tempdir().unwrap();
        let program = plugins.path().join("echo-engine");
        std::fs::write(&program, "#!/bin/sh\ncat\n").unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();

        let template = "![[Attachments/photo.png]]\n".repeat(20_000);
        assert!(template.len() > 256 * 1024);

        let engine = ExecutableEngine::new(&program, "/vault");
        let rendered = tokio::time::timeout(
            Duration::from_secs(30),
            engine.parse_template(
                InvocationDescriptor {
                    target_file: "Meta/a.md".to_string(),
                    run_mode: crate::contract::RunMode::DynamicProcessor,
                },
                &template,
            ),
        )
        .await
        .expect("engine round trip finishes")
        .unwrap();
        assert_eq!(rendered, template);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn executable_engine_reports_failing_program() {
        use std::os::unix::fs::PermissionsExt;

        let plugins = tempfile::tempdir().unwrap();
        let program = plugins.path().join("broken");
        std::fs::write(&program, "#!/bin/sh\necho unsupported >&2\nexit 3\n").unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();

        let engine = ExecutableEngine::new(&program, "/vault");
        let err = engine
            .parse_template(
                InvocationDescriptor {
                    target_file: "a.md".to_string(),
                    run_mode: crate::contract::RunMode::DynamicProcessor,
                },
                "",
            )
            .await
            .unwrap_err();
        match err {
            EngineError::Exit { stderr, .. } => assert_eq!(stderr, "unsupported"),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
