use crate::cache::DatasetCache;
use crate::filter::{FilterSpec, apply_filters, brand_options};
use crate::paging::{page_count, paginate};
use crate::{DashboardConfig, Result, Summary, Table, Value, normalize, summarize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    pub brand: Option<String>,
    pub fuels: HashSet<Value>,
    pub transmissions: HashSet<Value>,
}

impl Selection {
    pub fn all(table: &Table, config: &DashboardConfig) -> Result<Self> {
        Ok(Selection {
            brand: None,
            fuels: table.distinct_values(&config.fuel_column)?.into_iter().collect(),
            transmissions: table
                .distinct_values(&config.transmission_column)?
                .into_iter()
                .collect(),
        })
    }

    pub fn to_specs(&self, config: &DashboardConfig) -> Vec<FilterSpec> {
        let mut specs = Vec::with_capacity(3);
        if let Some(brand) = &self.brand {
            specs.push(FilterSpec::PrefixMatch {
                column: config.name_column.clone(),
                prefix: brand.clone(),
            });
        }
        specs.push(FilterSpec::CategoricalInclusion {
            column: config.fuel_column.clone(),
            allowed: self.fuels.clone(),
        });
        specs.push(FilterSpec::CategoricalInclusion {
            column: config.transmission_column.clone(),
            allowed: self.transmissions.clone(),
        });
        specs
    }

    pub fn toggle_fuel(&mut self, fuel: &Value) {
        toggle(&mut self.fuels, fuel);
    }

    pub fn toggle_transmission(&mut self, transmission: &Value) {
        toggle(&mut self.transmissions, transmission);
    }

    pub fn cycle_brand(&mut self, brands: &[String], forward: bool) {
        let current = self
            .brand
            .as_ref()
            .and_then(|b| brands.iter().position(|x| x == b));
        let next = match (current, forward) {
            (None, true) => brands.first().map(|_| 0),
            (None, false) => brands.len().checked_sub(1),
            (Some(i), true) => (i + 1 < brands.len()).then_some(i + 1),
            (Some(i), false) => i.checked_sub(1),
        };
        self.brand = next.map(|i| brands[i].clone());
    }
}

fn toggle(set: &mut HashSet<Value>, value: &Value) {
    if !set.remove(value) {
        set.insert(value.clone());
    }
}

#[derive(Debug)]
pub struct Session {
    source: Option<PathBuf>,
    config: DashboardConfig,
    cache: DatasetCache,
    table: Arc<Table>,
    brands: Vec<String>,
    fuels: Vec<Value>,
    transmissions: Vec<Value>,
    pub selection: Selection,
}

impl Session {
    pub fn open(path: impl AsRef<Path>, config: DashboardConfig) -> Result<Self> {
        config.validate()?;
        let source = path.as_ref().to_path_buf();
        let mut cache = DatasetCache::new(config.cache_ttl());
        let table = load_normalized(&mut cache, &source, &config)?;
        Self::build(Some(source), cache, table, config)
    }

    pub fn from_table(raw: &Table, config: DashboardConfig) -> Result<Self> {
        config.validate()?;
        let table = Arc::new(normalize(raw, &config.normalize_rules())?);
        Self::build(None, DatasetCache::new(None), table, config)
    }

    fn build(
        source: Option<PathBuf>,
        cache: DatasetCache,
        table: Arc<Table>,
        config: DashboardConfig,
    ) -> Result<Self> {
        let options = Options::of(&table, &config)?;
        Ok(Session {
            source,
            cache,
            table,
            brands: options.brands,
            fuels: options.fuels,
            transmissions: options.transmissions,
            selection: options.selection,
            config,
        })
    }

    fn install(&mut self, table: Arc<Table>) -> Result<()> {
        let options = Options::of(&table, &self.config)?;
        self.brands = options.brands;
        self.fuels = options.fuels;
        self.transmissions = options.transmissions;
        self.selection = options.selection;
        self.table = table;
        info!("Dataset reloaded, selection reset");
        Ok(())
    }

    /// Picks up a reload when the cache entry has expired. Returns whether
    /// the table changed; the selection is reset when it did.
    pub fn refresh(&mut self) -> Result<bool> {
        let Some(source) = self.source.clone() else {
            return Ok(false);
        };
        let table = load_normalized(&mut self.cache, &source, &self.config)?;
        if Arc::ptr_eq(&table, &self.table) {
            return Ok(false);
        }
        self.install(table)?;
        Ok(true)
    }

    pub fn reload(&mut self) -> Result<bool> {
        if let Some(source) = &self.source {
            self.cache.invalidate(&cache_key(source));
        }
        self.refresh()
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn normalized(&self) -> &Table {
        &self.table
    }

    pub fn brand_options(&self) -> &[String] {
        &self.brands
    }

    pub fn fuel_options(&self) -> &[Value] {
        &self.fuels
    }

    pub fn transmission_options(&self) -> &[Value] {
        &self.transmissions
    }

    pub fn filtered(&self) -> Result<Table> {
        apply_filters(&self.table, &self.selection.to_specs(&self.config))
    }

    pub fn summary(&self) -> Result<Summary> {
        summarize(&self.filtered()?, &self.config)
    }

    pub fn page(&self, page_number: usize) -> Result<Table> {
        Ok(paginate(&self.filtered()?, self.config.page_size()?, page_number))
    }

    pub fn page_count(&self) -> Result<usize> {
        Ok(page_count(self.filtered()?.row_count(), self.config.page_size()?))
    }

    pub fn export_csv(&self, path: impl AsRef<Path>) -> Result<usize> {
        let filtered = self.filtered()?;
        filtered.to_csv_path(path)?;
        Ok(filtered.row_count())
    }
}

struct Options {
    brands: Vec<String>,
    fuels: Vec<Value>,
    transmissions: Vec<Value>,
    selection: Selection,
}

impl Options {
    fn of(table: &Table, config: &DashboardConfig) -> Result<Self> {
        Ok(Options {
            brands: brand_options(table, &config.name_column)?,
            fuels: table.distinct_values(&config.fuel_column)?,
            transmissions: table.distinct_values(&config.transmission_column)?,
            selection: Selection::all(table, config)?,
        })
    }
}

fn cache_key(source: &Path) -> String {
    source.display().to_string()
}

fn load_normalized(
    cache: &mut DatasetCache,
    source: &Path,
    config: &DashboardConfig,
) -> Result<Arc<Table>> {
    cache.get_or_load(&cache_key(source), || {
        let raw = Table::from_csv(source)?;
        let table = normalize(&raw, &config.normalize_rules())?;
        info!("Normalized dataset has {} rows", table.row_count());
        Ok(table)
    })
}
