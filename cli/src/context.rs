//! Everything a command needs: the table registry, the notification feed,
//! the clipboard and the terminal.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context as _, Result};
use tracing::{debug, instrument};

use netdeck_business::{
    BusinessConfig, HttpBackend,
    table::{EntityCatalog, QueryOutcome, TableEffect, TableEnv, TableRegistry},
};
use netdeck_clipboard::{ClipboardProvider, copy_text};
use netdeck_states::{ClientStorage, NotificationCenter};

use crate::output::Output;

pub struct AppContext {
    pub registry: TableRegistry,
    pub notifications: NotificationCenter,
    pub clipboard: Box<dyn ClipboardProvider>,
    pub out: Output,
}

impl AppContext {
    pub fn new(
        config: BusinessConfig,
        catalog: EntityCatalog,
        storage: Arc<dyn ClientStorage>,
        clipboard: Box<dyn ClipboardProvider>,
    ) -> Self {
        let notifications = NotificationCenter::new();
        let env = TableEnv::new(
            Arc::new(HttpBackend::new(&config)),
            storage,
            notifications.notifier(),
            config,
        );

        Self {
            registry: TableRegistry::new(catalog, env),
            notifications,
            clipboard,
            out: Output::new(),
        }
    }

    /// Prints every queued notification, oldest first.
    pub fn flush_notifications(&self) {
        for notification in self.notifications.drain() {
            self.out.notification(&notification);
        }
    }

    /// Carries out downloads and clipboard writes the server asked for.
    /// Returns the paths of written files.
    #[instrument(skip_all, name = "apply_effects")]
    pub fn apply_effects(
        &self,
        outcome: &QueryOutcome,
        download_dir: Option<&Path>,
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for effect in outcome.effects() {
            match effect {
                TableEffect::Download(download) => {
                    let dir = download_dir.unwrap_or_else(|| Path::new("."));
                    fs::create_dir_all(dir)
                        .with_context(|| format!("Failed to create {}", dir.display()))?;
                    let path = dir.join(&download.file_name);
                    fs::write(&path, &download.contents)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    debug!("Wrote {}", path.display());
                    self.out.success(format!("Exported {}", path.display()));
                    written.push(path);
                }
                TableEffect::CopyToClipboard(text) => self.copy(text)?,
            }
        }
        Ok(written)
    }

    pub fn copy(&self, text: &str) -> Result<()> {
        copy_text(self.clipboard.as_ref(), text).context("Failed to copy to the clipboard")?;
        self.out.success("Copied to clipboard");
        Ok(())
    }
}
