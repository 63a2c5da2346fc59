use std::collections::BTreeMap;
use std::path::Path;

use walkdir::WalkDir;

use crate::launch_config::{Application, LaunchConfig, ListEntry};
use crate::lookup::{ListLookup, LookupError, LookupRequest};
use crate::model::{starts_with_folded, OptionItem};

/// Snapshot source for the launchable application directory.
pub trait ApplicationDirectory: Send + Sync {
    fn provider_name(&self) -> &'static str;
    fn applications(&self) -> Result<Vec<Application>, LookupError>;
}

/// Prefix lookup over named lists, either answered inline or later.
pub trait ListProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;
    fn lookup(&self, request: &LookupRequest) -> Result<ListLookup, LookupError>;
}

pub struct StaticDirectory {
    apps: Vec<Application>,
}

impl StaticDirectory {
    pub fn from_apps(apps: Vec<Application>) -> Self {
        Self { apps }
    }

    pub fn from_config(cfg: &LaunchConfig) -> Self {
        Self::from_apps(cfg.applications.clone())
    }
}

impl ApplicationDirectory for StaticDirectory {
    fn provider_name(&self) -> &'static str {
        "static"
    }

    fn applications(&self) -> Result<Vec<Application>, LookupError> {
        Ok(self.apps.clone())
    }
}

#[derive(Debug, Default, Clone)]
pub struct StaticLists {
    lists: BTreeMap<String, Vec<OptionItem>>,
    pub load_warnings: Vec<String>,
}

impl StaticLists {
    pub fn from_config(cfg: &LaunchConfig) -> Self {
        let mut out = Self::default();
        for (key, entries) in &cfg.lists {
            out.insert(key, entries.iter().cloned().map(OptionItem::from).collect());
        }
        out
    }

    pub fn insert(&mut self, key: &str, items: Vec<OptionItem>) {
        self.lists.insert(key.to_string(), items);
    }

    pub fn get(&self, key: &str) -> Option<&[OptionItem]> {
        self.lists.get(key).map(Vec::as_slice)
    }

    /// Adds every `*.json`/`*.json5` file directly under `dir` as a list named
    /// after the file stem. Unreadable files are recorded in `load_warnings`.
    pub fn load_dir(&mut self, dir: &Path) {
        if !dir.is_dir() {
            return;
        }

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
        {
            let path = entry.path();
            let is_list = entry.file_type().is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| {
                        ext.eq_ignore_ascii_case("json") || ext.eq_ignore_ascii_case("json5")
                    });
            if !is_list {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            match load_list_file(path) {
                Ok(items) => self.insert(key, items),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "skipping list file");
                    self.load_warnings
                        .push(format!("list '{}' failed: {error}", path.display()));
                }
            }
        }
    }

    pub fn filter(&self, list: &str, token: &str, ignore_case: bool) -> Option<Vec<OptionItem>> {
        let items = self.lists.get(list)?;
        Some(
            items
                .iter()
                .filter(|item| starts_with_folded(item.match_text(), token, ignore_case))
                .cloned()
                .collect(),
        )
    }
}

impl ListProvider for StaticLists {
    fn provider_name(&self) -> &'static str {
        "static"
    }

    fn lookup(&self, request: &LookupRequest) -> Result<ListLookup, LookupError> {
        self.filter(&request.list, request.token(), request.ignore_case)
            .map(ListLookup::Ready)
            .ok_or_else(|| LookupError::UnknownList(request.list.clone()))
    }
}

fn load_list_file(path: &Path) -> Result<Vec<OptionItem>, String> {
    let raw = std::fs::read_to_string(path).map_err(|e| format!("read failed: {e}"))?;
    let entries: Vec<ListEntry> = json5::from_str(&raw).map_err(|e| format!("invalid list: {e}"))?;
    Ok(entries.into_iter().map(OptionItem::from).collect())
}
