//! Sidecar Provider
//!
//! `InferenceProvider` backed by a local llama.cpp-based sidecar binary.
//! The binary ships as platform-specific npm packages; model weights are
//! downloaded once into a per-user cache and reused across runs. Analysis
//! calls shell the binary, feed the prompt on stdin, and read the response
//! from stdout under a hard timeout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, warn};

use rigour_core::{
    ensure_dir, home_dir, model_cache_dir, report_stage, sidecar_install_dir, CoreResult,
    ProgressEvent, ProgressFn,
};

use crate::provider::{AnalyzeOptions, InferenceProvider, ProviderError, ProviderResult};
use crate::tiers::ModelTier;

const BINARY_NAME: &str = "rigour-sidecar";

/// Emit a download progress event at most once per this many bytes.
const DOWNLOAD_REPORT_STEP: u64 = 8 * 1024 * 1024;

/// Directories the sidecar provider searches and writes. Injectable so
/// tests never touch the real home directory.
#[derive(Debug, Clone)]
pub struct SidecarPaths {
    /// Managed install prefix for the npm-distributed binary
    pub install_dir: PathBuf,
    /// Cache directory for downloaded model weights
    pub model_cache_dir: PathBuf,
    /// Additional directories searched for a user-installed binary,
    /// before falling back to PATH
    pub search_dirs: Vec<PathBuf>,
}

impl SidecarPaths {
    /// Home-derived defaults: managed install under `~/.rigour/sidecar`,
    /// models under `~/.rigour/models`, plus the conventional local-bin
    /// locations.
    pub fn default_paths() -> CoreResult<Self> {
        let home = home_dir()?;
        Ok(Self {
            install_dir: sidecar_install_dir()?,
            model_cache_dir: model_cache_dir()?,
            search_dirs: vec![
                PathBuf::from("node_modules").join(".bin"),
                home.join("node_modules").join(".bin"),
                home.join(".local").join("bin"),
            ],
        })
    }
}

/// npm package name for the current platform, if one is published.
fn platform_package() -> Option<String> {
    let os = match std::env::consts::OS {
        "linux" => "linux",
        "macos" => "darwin",
        "windows" => "win32",
        _ => return None,
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        _ => return None,
    };
    Some(format!("@rigour/sidecar-{os}-{arch}"))
}

fn binary_file_name() -> String {
    if cfg!(windows) {
        format!("{BINARY_NAME}.exe")
    } else {
        BINARY_NAME.to_string()
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}

/// npm strips the execute bit in some tar extraction paths; put it back.
#[cfg(unix)]
fn repair_permissions(path: &Path) -> ProviderResult<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(|err| {
        ProviderError::Setup(format!(
            "could not mark {} executable: {err}",
            path.display()
        ))
    })
}

#[cfg(not(unix))]
fn repair_permissions(_path: &Path) -> ProviderResult<()> {
    Ok(())
}

fn is_permission_error(err: &ProviderError) -> bool {
    matches!(err, ProviderError::Io(io) if io.kind() == std::io::ErrorKind::PermissionDenied)
}

/// Local inference through a managed llama.cpp sidecar.
pub struct SidecarProvider {
    tier: ModelTier,
    paths: SidecarPaths,
    binary_path: Option<PathBuf>,
    model_path: Option<PathBuf>,
    client: reqwest::Client,
}

impl SidecarProvider {
    pub fn new(tier: ModelTier, paths: SidecarPaths) -> Self {
        Self {
            tier,
            paths,
            binary_path: None,
            model_path: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_default_paths(tier: ModelTier) -> CoreResult<Self> {
        Ok(Self::new(tier, SidecarPaths::default_paths()?))
    }

    fn model_file(&self) -> PathBuf {
        self.paths.model_cache_dir.join(self.tier.file_name())
    }

    /// Locate the sidecar binary: managed install first, then the
    /// conventional user directories, then PATH.
    fn resolve_binary(&self) -> Option<PathBuf> {
        let name = binary_file_name();
        let mut candidates: Vec<PathBuf> = vec![
            self.paths.install_dir.join("node_modules").join(".bin").join(&name),
            self.paths.install_dir.join("bin").join(&name),
        ];
        candidates.extend(self.paths.search_dirs.iter().map(|dir| dir.join(&name)));
        if let Some(path_var) = std::env::var_os("PATH") {
            candidates.extend(std::env::split_paths(&path_var).map(|dir| dir.join(&name)));
        }
        candidates.into_iter().find(|p| p.is_file())
    }

    async fn install_managed(&self, package: &str, on_progress: &ProgressFn) -> ProviderResult<()> {
        ensure_dir(&self.paths.install_dir)
            .map_err(|err| ProviderError::Setup(err.to_string()))?;
        report_stage(on_progress, format!("Installing sidecar ({package})"));

        let output = Command::new("npm")
            .arg("install")
            .arg("--prefix")
            .arg(&self.paths.install_dir)
            .arg("--no-save")
            .arg(package)
            .output()
            .await
            .map_err(|err| {
                ProviderError::Setup(format!("could not run npm (is Node.js installed?): {err}"))
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::Setup(format!(
                "npm install of {package} failed: {}",
                stderr.trim()
            )));
        }
        Ok(())
    }

    /// Return the cached model path, downloading the weights on a miss.
    /// The download writes to a `.part` file and renames on completion so
    /// an interrupted run never leaves a truncated model in the cache.
    async fn ensure_model(&self, on_progress: &ProgressFn) -> ProviderResult<PathBuf> {
        let target = self.model_file();
        if target.is_file() {
            debug!(model = %target.display(), "model cache hit");
            return Ok(target);
        }
        ensure_dir(&self.paths.model_cache_dir)
            .map_err(|err| ProviderError::Setup(err.to_string()))?;

        let message = format!(
            "Downloading {} model (~{:.1} GB)",
            self.tier.name(),
            self.tier.approx_size_bytes() as f64 / 1e9
        );
        report_stage(on_progress, message.clone());

        let response = self
            .client
            .get(self.tier.url())
            .send()
            .await
            .map_err(|err| ProviderError::Network(format!("model download: {err}")))?;
        if !response.status().is_success() {
            return Err(ProviderError::Network(format!(
                "model download failed with HTTP {}",
                response.status().as_u16()
            )));
        }
        let total_bytes = response.content_length();

        let part = target.with_extension("gguf.part");
        let mut file = tokio::fs::File::create(&part).await?;
        let mut stream = response.bytes_stream();
        let mut received: u64 = 0;
        let mut last_reported: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|err| ProviderError::Network(format!("model download: {err}")))?;
            file.write_all(&chunk).await?;
            received += chunk.len() as u64;
            if received - last_reported >= DOWNLOAD_REPORT_STEP {
                last_reported = received;
                on_progress(ProgressEvent::Download {
                    message: message.clone(),
                    received_bytes: received,
                    total_bytes,
                });
            }
        }
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&part, &target).await?;
        on_progress(ProgressEvent::Download {
            message: message.clone(),
            received_bytes: received,
            total_bytes,
        });
        Ok(target)
    }

    /// Whether a broken binary is ours to reinstall: it lives under the
    /// managed install prefix and a platform package exists.
    fn owns_binary(&self, binary: &Path) -> bool {
        binary.starts_with(&self.paths.install_dir) && platform_package().is_some()
    }

    /// One recovery attempt for a binary that failed mid-run: reinstall
    /// the managed package when the binary is ours, then make sure the
    /// resolved path is executable again. A user-installed binary is
    /// never reinstalled, only repaired.
    async fn recover_binary(&self, binary: &Path) -> ProviderResult<()> {
        if self.owns_binary(binary) {
            let package = platform_package().ok_or_else(|| {
                ProviderError::Setup("no sidecar package for this platform".to_string())
            })?;
            self.install_managed(&package, &rigour_core::noop_progress())
                .await?;
        }
        if binary.is_file() && !is_executable(binary) {
            repair_permissions(binary)?;
        }
        Ok(())
    }

    async fn run_once(
        &self,
        binary: &Path,
        model: &Path,
        prompt: &str,
        options: &AnalyzeOptions,
    ) -> ProviderResult<String> {
        let threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        let mut cmd = Command::new(binary);
        cmd.arg("--model")
            .arg(model)
            .arg("--max-tokens")
            .arg(options.max_tokens.to_string())
            .arg("--temperature")
            .arg(options.temperature.to_string())
            .arg("--threads")
            .arg(threads.to_string());
        if options.json_mode {
            cmd.arg("--json");
        }
        cmd.stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            // A timed-out call drops the future below, which reaps the child.
            .kill_on_drop(true);

        let mut child = cmd.spawn()?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ProviderError::Process("stdin not captured".to_string()))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProviderError::Process("stdout not captured".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ProviderError::Process("stderr not captured".to_string()))?;

        let prompt = prompt.to_string();
        let interaction = async move {
            stdin.write_all(prompt.as_bytes()).await?;
            stdin.shutdown().await?;
            drop(stdin);

            let mut out = String::new();
            stdout.read_to_string(&mut out).await?;
            let mut err_text = String::new();
            stderr.read_to_string(&mut err_text).await?;
            let status = child.wait().await?;
            Ok::<_, ProviderError>((status, out, err_text))
        };

        let (status, out, err_text) = match tokio::time::timeout(options.timeout, interaction).await
        {
            Ok(result) => result?,
            Err(_) => return Err(ProviderError::Timeout(options.timeout)),
        };

        if !status.success() {
            return Err(ProviderError::Process(format!(
                "sidecar exited with {status}: {}",
                err_text.trim()
            )));
        }
        let text = out.trim().to_string();
        if text.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl InferenceProvider for SidecarProvider {
    fn name(&self) -> &str {
        "sidecar"
    }

    async fn is_available(&self) -> bool {
        self.resolve_binary().is_some() && self.model_file().is_file()
    }

    async fn setup(&mut self, on_progress: ProgressFn) -> ProviderResult<()> {
        if self.binary_path.is_some() && self.model_path.is_some() {
            return Ok(());
        }

        let binary = match self.resolve_binary() {
            Some(binary) => binary,
            None => {
                let package = platform_package().ok_or_else(|| {
                    ProviderError::Setup(format!(
                        "no prebuilt sidecar for {}/{}; install `{BINARY_NAME}` on PATH or \
                         switch to a cloud vendor",
                        std::env::consts::OS,
                        std::env::consts::ARCH
                    ))
                })?;
                self.install_managed(&package, &on_progress).await?;
                self.resolve_binary().ok_or_else(|| {
                    ProviderError::Setup(format!(
                        "sidecar binary missing after installing {package}"
                    ))
                })?
            }
        };
        if !is_executable(&binary) {
            repair_permissions(&binary)?;
        }

        let model = self.ensure_model(&on_progress).await?;
        report_stage(&on_progress, format!("Sidecar ready ({})", self.tier.name()));
        self.binary_path = Some(binary);
        self.model_path = Some(model);
        Ok(())
    }

    async fn analyze(&self, prompt: &str, options: &AnalyzeOptions) -> ProviderResult<String> {
        let binary = self
            .binary_path
            .as_deref()
            .ok_or_else(|| ProviderError::Setup("sidecar setup has not run".to_string()))?;
        let model = self
            .model_path
            .as_deref()
            .ok_or_else(|| ProviderError::Setup("sidecar setup has not run".to_string()))?;

        match self.run_once(binary, model, prompt, options).await {
            Err(err) if is_permission_error(&err) => {
                // Seen when a package manager refreshes the install between
                // setup and the call. Recover once and retry.
                warn!(binary = %binary.display(), "sidecar binary unusable mid-run, recovering");
                self.recover_binary(binary).await?;
                self.run_once(binary, model, prompt, options).await
            }
            other => other,
        }
    }

    async fn dispose(&mut self) {
        debug!("disposing sidecar provider");
        self.binary_path = None;
        self.model_path = None;
    }
}
