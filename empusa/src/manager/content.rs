//! Batch orchestration.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::backup::zip_directory;
use super::catalog::load_catalog;
use super::config::ManagerConfig;
use super::error::{ManagerError, ManagerResult};
use super::extractor::ZipExtractor;
use super::fetcher::{AssetFetcher, DownloadedAsset};
use super::install_log::InstallLog;
use super::installer::InstallStepExecutor;
use super::progress::{ProgressAggregator, ProgressSnapshot, Stage};
use super::release::ReleaseResolver;
use super::traits::{ArchiveExtractor, HttpClient};
use super::updates::{ResourceStatus, UpdateChecker};
use crate::resource::{Catalog, ReleaseDescriptor, ResourceDefinition};
use crate::volume::Volume;

const BACKUP_TITLE: &str = "Zipping volume contents...";
const RESTORE_TITLE: &str = "Restoring backup...";
const FINISHED_TITLE: &str = "Finished";

/// Outcome of a batch.
#[derive(Debug, Default)]
pub struct ProcessResult {
    /// Resources installed successfully.
    pub succeeded: BTreeSet<String>,

    /// Resources that failed, in processing order.
    pub failed: Vec<(String, ManagerError)>,

    /// Set when the install log could not be written.
    pub log_error: Option<ManagerError>,
}

impl ProcessResult {
    /// Whether every resource succeeded and the log was saved.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.log_error.is_none()
    }

    /// Whether any failure was caused by API rate limiting.
    pub fn rate_limited(&self) -> bool {
        self.failed.iter().any(|(_, e)| e.is_rate_limited())
    }
}

/// Downloads and installs resources onto a volume.
///
/// Resources are processed strictly one after another. One resource failing
/// never stops the batch.
pub struct ContentManager<C: HttpClient> {
    client: C,
    config: ManagerConfig,
    extractor: ZipExtractor,
    installer: InstallStepExecutor,
}

impl<C: HttpClient> ContentManager<C> {
    /// Create a manager.
    pub fn new(client: C, config: ManagerConfig) -> Self {
        Self {
            client,
            config,
            extractor: ZipExtractor::new(),
            installer: InstallStepExecutor::new(),
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Catalog at `url`, or the built-in one.
    pub fn load_catalog(&self, url: Option<&str>) -> Catalog {
        load_catalog(&self.client, url)
    }

    /// Install `resources` onto `volume`.
    ///
    /// Progress is reported on a weighted scale of 3 per resource; the last
    /// snapshot always equals the total.
    pub fn download<F>(
        &self,
        resources: &[ResourceDefinition],
        volume: &Volume,
        on_progress: F,
    ) -> ProcessResult
    where
        F: Fn(ProgressSnapshot) + Send + Sync,
    {
        let aggregator = ProgressAggregator::new(resources.len(), &on_progress);
        let mut result = ProcessResult::default();

        if volume.is_none() {
            for (index, resource) in resources.iter().enumerate() {
                aggregator.begin_resource(index, resource.formatted_name());
                aggregator.complete_resource();
                result
                    .failed
                    .push((resource.name.clone(), ManagerError::NoVolumeSelected));
            }
            aggregator.finish(FINISHED_TITLE);
            return result;
        }

        let root = volume.root();
        let mut log = InstallLog::load(root);
        info!(
            volume = %volume.name,
            resources = resources.len(),
            prerelease = self.config.prefer_prerelease,
            "Starting batch"
        );

        for (index, resource) in resources.iter().enumerate() {
            let descriptor = resource.release(self.config.prefer_prerelease);
            aggregator.begin_resource(
                index,
                format!("Downloading {}...", descriptor.asset_filename),
            );

            match self.install_resource(descriptor, root, &aggregator) {
                Ok(version) => {
                    info!(
                        resource = %resource.name,
                        version = version.as_deref().unwrap_or("unknown"),
                        "Installed resource"
                    );
                    log.add(resource.name.clone(), version);
                    result.succeeded.insert(resource.name.clone());
                }
                Err(e) => {
                    error!(resource = %resource.name, error = %e, "Failed to install resource");
                    result.failed.push((resource.name.clone(), e));
                }
            }
            aggregator.complete_resource();
        }

        if let Err(e) = log.save(root) {
            error!(error = %e, "Failed to save install log");
            result.log_error = Some(e);
        }

        aggregator.finish(FINISHED_TITLE);
        info!(
            succeeded = result.succeeded.len(),
            failed = result.failed.len(),
            "Batch finished"
        );
        result
    }

    /// Resolve, download, extract and install one release.
    ///
    /// Returns the installed version.
    fn install_resource(
        &self,
        descriptor: &ReleaseDescriptor,
        volume_root: &Path,
        aggregator: &ProgressAggregator<'_>,
    ) -> ManagerResult<Option<String>> {
        let resolved =
            ReleaseResolver::new(&self.client, self.config.prefer_prerelease).resolve(descriptor)?;

        let staging = &self.config.staging_dir;
        fs::create_dir_all(staging).map_err(|e| ManagerError::create_dir(staging, e))?;

        let download_path = staging.join(format!("{}.part", descriptor.asset_filename));
        AssetFetcher::new(&self.client).fetch(&resolved.asset_url, &download_path, &|f| {
            aggregator.update(Stage::Download, f)
        })?;
        let mut asset = DownloadedAsset::new(resolved.version, download_path);

        let filename = &descriptor.asset_filename;
        aggregator.set_title(format!("Saving {}...", filename));
        let asset_path = staging.join(filename);
        remove_file_if_exists(&asset_path)?;
        fs::rename(&asset.path, &asset_path).map_err(|e| ManagerError::MoveFailed {
            from: asset.path.clone(),
            to: asset_path.clone(),
            source: e,
        })?;
        asset.path = asset_path;

        if descriptor.is_archive() {
            aggregator.set_title(format!("Unzipping {}...", filename));
            let extract_dir = staging.join(descriptor.asset_stem());
            if extract_dir.exists() {
                fs::remove_dir_all(&extract_dir)
                    .map_err(|e| ManagerError::write(&extract_dir, e))?;
            }
            asset.set_extracted_dir(extract_dir.clone());
            self.extractor.extract(&asset.path, &extract_dir, &|f| {
                aggregator.update(Stage::Decompress, f)
            })?;
        } else {
            aggregator.skip(Stage::Decompress);
        }

        aggregator.set_title(format!("Copying contents of {} into destination...", filename));
        self.installer.execute(
            &descriptor.install_steps,
            asset.content_root(),
            volume_root,
            &|f| aggregator.update(Stage::Install, f),
        )?;

        aggregator.set_title("Removing temporary files...");
        Ok(asset.version.take())
    }

    /// Installed and available versions of `resources` on `volume`.
    pub fn check_updates(
        &self,
        resources: &[ResourceDefinition],
        volume: &Volume,
    ) -> ManagerResult<Vec<ResourceStatus>> {
        if volume.is_none() {
            return Err(ManagerError::NoVolumeSelected);
        }
        let log = InstallLog::load(volume.root());
        Ok(UpdateChecker::new(&self.client, self.config.prefer_prerelease).check(resources, &log))
    }

    /// Zip the contents of `volume_root` into `archive`.
    pub fn backup_volume(
        &self,
        volume_root: &Path,
        archive: &Path,
        on_progress: &dyn Fn(ProgressSnapshot),
    ) -> ManagerResult<usize> {
        on_progress(ProgressSnapshot::new(BACKUP_TITLE, 0.0, 1.0));
        zip_directory(volume_root, archive, &|f| {
            on_progress(ProgressSnapshot::new(BACKUP_TITLE, f, 1.0))
        })
    }

    /// Extract a backup over `volume_root`, overwriting existing files.
    pub fn restore_backup(
        &self,
        archive: &Path,
        volume_root: &Path,
        on_progress: &dyn Fn(ProgressSnapshot),
    ) -> ManagerResult<usize> {
        on_progress(ProgressSnapshot::new(RESTORE_TITLE, 0.0, 1.0));
        let files = self.extractor.extract(archive, volume_root, &|f| {
            on_progress(ProgressSnapshot::new(RESTORE_TITLE, f, 1.0))
        })?;
        info!(archive = %archive.display(), files, "Restored backup");
        Ok(files)
    }
}

impl<C: HttpClient + 'static> ContentManager<C> {
    /// Run [`ContentManager::download`] on a blocking worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn_download(
        self: Arc<Self>,
        resources: Vec<ResourceDefinition>,
        volume: Volume,
    ) -> BatchHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::task::spawn_blocking(move || {
            self.download(&resources, &volume, move |snapshot| {
                // The receiver may be gone; the batch still runs to completion.
                let _ = tx.send(snapshot);
            })
        });

        BatchHandle { progress: rx, task }
    }
}

/// A batch running in the background.
pub struct BatchHandle {
    progress: mpsc::UnboundedReceiver<ProgressSnapshot>,
    task: JoinHandle<ProcessResult>,
}

impl BatchHandle {
    /// Next snapshot, or `None` once the batch has finished.
    pub async fn next_progress(&mut self) -> Option<ProgressSnapshot> {
        self.progress.recv().await
    }

    /// Wait for the batch result.
    pub async fn wait(self) -> ManagerResult<ProcessResult> {
        self.task
            .await
            .map_err(|e| ManagerError::TaskFailed(e.to_string()))
    }
}

fn remove_file_if_exists(path: &Path) -> ManagerResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to remove stale asset");
            Err(ManagerError::write(path, e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::testing::FakeHttpClient;
    use crate::resource::{InstallStep, ReleaseSource};
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(io::Cursor::new(Vec::new()));
        for (name, contents) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn direct(name: &str, filename: &str, version: &str, steps: Vec<InstallStep>) -> ResourceDefinition {
        ResourceDefinition::new(
            name,
            name,
            ReleaseDescriptor::new(
                ReleaseSource::direct(format!("https://example.com/{}", filename), Some(version)),
                filename,
                steps,
            ),
        )
    }

    struct Fixture {
        _temp: TempDir,
        volume: Volume,
        staging: std::path::PathBuf,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("volume");
        let staging = temp.path().join("staging");
        fs::create_dir_all(&root).unwrap();
        Fixture {
            volume: Volume::new("test-volume", "SD", root, 0),
            staging,
            _temp: temp,
        }
    }

    fn manager(client: FakeHttpClient, staging: &Path) -> ContentManager<FakeHttpClient> {
        ContentManager::new(client, ManagerConfig::new(staging.to_path_buf()))
    }

    #[test]
    fn test_zip_and_plain_resources() {
        let fx = fixture();
        let client = FakeHttpClient::new()
            .with_asset(
                "https://example.com/atmosphere.zip",
                zip_bytes(&[("atmosphere/package3", "p3"), ("hbmenu.nro", "menu")]),
            )
            .with_asset("https://example.com/Lockpick_RCM.bin", b"payload".to_vec());
        let resources = vec![
            direct("atmosphere", "atmosphere.zip", "1.7.0", vec![InstallStep::merge_all()]),
            direct(
                "lockpickRCM",
                "Lockpick_RCM.bin",
                "1.9.12",
                vec![InstallStep::move_file("Lockpick_RCM.bin", "bootloader/payloads/")],
            ),
        ];

        let result = manager(client, &fx.staging).download(&resources, &fx.volume, |_| {});

        assert!(result.is_success(), "{:?}", result);
        let root = fx.volume.root();
        assert_eq!(fs::read_to_string(root.join("atmosphere/package3")).unwrap(), "p3");
        assert_eq!(
            fs::read(root.join("bootloader/payloads/Lockpick_RCM.bin")).unwrap(),
            b"payload"
        );

        let log = InstallLog::load(root);
        assert_eq!(log.installed_version("atmosphere"), Some("1.7.0"));
        assert_eq!(log.installed_version("lockpickRCM"), Some("1.9.12"));

        let leftovers: Vec<_> = fs::read_dir(&fx.staging).unwrap().collect();
        assert!(leftovers.is_empty(), "staging not cleaned: {:?}", leftovers);
    }

    #[test]
    fn test_failure_does_not_abort_batch() {
        let fx = fixture();
        let client = FakeHttpClient::new()
            .with_asset("https://example.com/a.bin", b"a".to_vec())
            .with_asset("https://example.com/c.bin", b"c".to_vec());
        let resources = vec![
            direct("a", "a.bin", "1", vec![InstallStep::merge_all()]),
            direct("b", "b.bin", "1", vec![InstallStep::merge_all()]),
            direct("c", "c.bin", "1", vec![InstallStep::merge_all()]),
        ];

        let result = manager(client, &fx.staging).download(&resources, &fx.volume, |_| {});

        assert_eq!(
            result.succeeded.iter().cloned().collect::<Vec<_>>(),
            vec!["a".to_string(), "c".to_string()]
        );
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].0, "b");
        assert!(result.log_error.is_none());

        let log = InstallLog::load(fx.volume.root());
        assert!(log.contains("a") && log.contains("c") && !log.contains("b"));
    }

    #[test]
    fn test_progress_is_monotonic_and_reaches_total() {
        let fx = fixture();
        let client = FakeHttpClient::new()
            .with_asset("https://example.com/a.zip", zip_bytes(&[("a/1", "1"), ("a/2", "2")]))
            .with_asset("https://example.com/c.bin", b"c".to_vec());
        let resources = vec![
            direct("a", "a.zip", "1", vec![InstallStep::merge_all()]),
            direct("b", "b.zip", "1", vec![InstallStep::merge_all()]),
            direct("c", "c.bin", "1", vec![InstallStep::merge_all()]),
        ];

        let snapshots = Mutex::new(Vec::new());
        manager(client, &fx.staging).download(&resources, &fx.volume, |s| {
            snapshots.lock().unwrap().push(s)
        });

        let snapshots = snapshots.into_inner().unwrap();
        assert!(snapshots
            .windows(2)
            .all(|w| w[0].progress <= w[1].progress));
        let last = snapshots.last().unwrap();
        assert_eq!(last.progress, 9.0);
        assert_eq!(last.total, 9.0);
        assert!(snapshots.iter().any(|s| s.title == "Unzipping a.zip..."));
    }

    #[test]
    fn test_no_volume_fails_every_resource_offline() {
        let fx = fixture();
        let resources = vec![
            direct("a", "a.bin", "1", vec![InstallStep::merge_all()]),
            direct("b", "b.bin", "1", vec![InstallStep::merge_all()]),
        ];
        let mgr = manager(FakeHttpClient::new(), &fx.staging);

        let last = Mutex::new(None);
        let result = mgr.download(&resources, &Volume::none(), |s| {
            *last.lock().unwrap() = Some(s)
        });

        assert!(result.succeeded.is_empty());
        assert_eq!(result.failed.len(), 2);
        assert!(result
            .failed
            .iter()
            .all(|(_, e)| matches!(e, ManagerError::NoVolumeSelected)));
        assert!(mgr.client().requests().is_empty());
        assert_eq!(last.into_inner().unwrap().unwrap().progress, 6.0);
    }

    #[test]
    fn test_log_failure_is_reported() {
        let temp = TempDir::new().unwrap();
        let volume = Volume::new("gone", "SD", temp.path().join("unmounted"), 0);
        let client = FakeHttpClient::new();

        let result = manager(client, &temp.path().join("staging")).download(&[], &volume, |_| {});

        assert!(result.failed.is_empty());
        assert!(result.log_error.is_some());
        assert!(!result.is_success());
    }

    #[test]
    fn test_stale_staging_files_are_replaced() {
        let fx = fixture();
        fs::create_dir_all(fx.staging.join("a/old")).unwrap();
        fs::write(fx.staging.join("a/old/stale.txt"), "stale").unwrap();
        fs::write(fx.staging.join("a.zip"), "stale zip").unwrap();
        let client = FakeHttpClient::new()
            .with_asset("https://example.com/a.zip", zip_bytes(&[("fresh.txt", "fresh")]));
        let resources = vec![direct("a", "a.zip", "1", vec![InstallStep::merge_all()])];

        let result = manager(client, &fx.staging).download(&resources, &fx.volume, |_| {});

        assert!(result.is_success(), "{:?}", result);
        assert!(fx.volume.root().join("fresh.txt").exists());
        assert!(!fx.volume.root().join("old").exists());
    }

    #[test]
    fn test_prerelease_descriptor_is_used() {
        let fx = fixture();
        let client = FakeHttpClient::new()
            .with_asset("https://example.com/pre.bin", b"pre".to_vec());
        let resource = direct("x", "stable.bin", "1.0", vec![InstallStep::merge_all()])
            .with_pre_release(ReleaseDescriptor::new(
                ReleaseSource::direct("https://example.com/pre.bin", Some("1.1-rc1")),
                "pre.bin",
                vec![InstallStep::merge_all()],
            ));
        let mgr = ContentManager::new(
            client,
            ManagerConfig::new(fx.staging.clone()).with_prefer_prerelease(true),
        );

        let result = mgr.download(&[resource], &fx.volume, |_| {});

        assert!(result.is_success(), "{:?}", result);
        assert_eq!(
            InstallLog::load(fx.volume.root()).installed_version("x"),
            Some("1.1-rc1")
        );
    }

    #[test]
    fn test_backup_and_restore() {
        let fx = fixture();
        let root = fx.volume.root();
        fs::create_dir_all(root.join("switch")).unwrap();
        fs::write(root.join("switch/app.nro"), "v1").unwrap();
        let mgr = manager(FakeHttpClient::new(), &fx.staging);

        let archive = fx.staging.join("backup.zip");
        let titles = Mutex::new(Vec::new());
        mgr.backup_volume(root, &archive, &|s| titles.lock().unwrap().push(s))
            .unwrap();

        fs::write(root.join("switch/app.nro"), "v2").unwrap();
        mgr.restore_backup(&archive, root, &|s| titles.lock().unwrap().push(s))
            .unwrap();

        assert_eq!(fs::read_to_string(root.join("switch/app.nro")).unwrap(), "v1");
        let titles = titles.into_inner().unwrap();
        assert_eq!(titles.first().unwrap().title, "Zipping volume contents...");
        assert_eq!(titles.last().unwrap().title, "Restoring backup...");
        assert!(titles.iter().all(|s| s.total == 1.0));
        assert_eq!(titles.last().unwrap().progress, 1.0);
    }

    #[test]
    fn test_check_updates_requires_volume() {
        let fx = fixture();
        let mgr = manager(FakeHttpClient::new(), &fx.staging);
        assert!(matches!(
            mgr.check_updates(&[], &Volume::none()),
            Err(ManagerError::NoVolumeSelected)
        ));
    }

    #[tokio::test]
    async fn test_spawn_download_streams_progress() {
        let fx = fixture();
        let client = FakeHttpClient::new().with_asset("https://example.com/a.bin", b"a".to_vec());
        let resources = vec![direct("a", "a.bin", "1", vec![InstallStep::merge_all()])];
        let mgr = Arc::new(manager(client, &fx.staging));

        let mut handle = mgr.spawn_download(resources, fx.volume.clone());
        let mut last = None;
        while let Some(snapshot) = handle.next_progress().await {
            last = Some(snapshot);
        }
        let result = handle.wait().await.unwrap();

        assert!(result.is_success());
        assert_eq!(last.unwrap().progress, 3.0);
    }
}
