use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::foundation::error::TapestryResult;
use crate::foundation::lock;
use crate::page::assembler::PageAssembler;
use crate::page::tree::Page;
use crate::transform::registry::ClassRegistry;

/// Loads pages on first use and keeps them for the life of the application.
pub struct PageSource {
    registry: Arc<ClassRegistry>,
    pages: Mutex<HashMap<String, Arc<Page>>>,
}

impl PageSource {
    pub fn new(registry: Arc<ClassRegistry>) -> Self {
        Self {
            registry,
            pages: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Arc<ClassRegistry> {
        &self.registry
    }

    /// Returns the page, assembling it if this is the first request for it. Page names are
    /// case-insensitive.
    #[tracing::instrument(skip(self))]
    pub fn get(&self, name: &str) -> TapestryResult<Arc<Page>> {
        let key = name.to_ascii_lowercase();
        if let Some(page) = lock(&self.pages).get(&key) {
            return Ok(page.clone());
        }
        let class_name = self.registry.page_class(name)?.to_string();
        let page = Arc::new(PageAssembler::new(&self.registry).assemble(&class_name)?);
        tracing::info!(page = %page.name, class = %class_name, "page loaded");
        // Two threads may race to load the same page; the first one stored wins.
        Ok(lock(&self.pages).entry(key).or_insert(page).clone())
    }

    /// Names of the pages loaded so far, sorted.
    pub fn loaded(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.pages).values().map(|p| p.name.clone()).collect();
        names.sort();
        names
    }

    /// Forgets every loaded page; the next request reassembles it.
    pub fn clear(&self) {
        lock(&self.pages).clear();
    }
}
