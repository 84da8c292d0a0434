use std::any::{Any, TypeId, type_name};
use std::collections::{BTreeMap, HashMap};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::UrnError;
use crate::urn::{Urn, UrnGenerator};

/// Maps URN class names to the full type names that registered them.
pub type ClassMap = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// TypeMetadata
// ---------------------------------------------------------------------------

/// Registration record for one resource type managed by an object manager.
///
/// Built with [`TypeMetadata::of`], which derives the URN class name from
/// the type's [`UrnGenerator`] implementation. Types mapped as children in a
/// single-table-inheritance hierarchy are flagged with [`as_sti_child`] and
/// excluded from class registration (only the root participates).
///
/// [`as_sti_child`]: TypeMetadata::as_sti_child
#[derive(Debug, Clone)]
pub struct TypeMetadata {
    /// Full Rust path of the registered type.
    pub type_name: &'static str,
    /// Runtime identity of the registered type.
    pub type_id: TypeId,
    /// The URN class name this type registers under.
    pub urn_class: String,
    /// Whether this type is a non-root member of a single-table hierarchy.
    pub sti_child: bool,
}

impl TypeMetadata {
    /// Metadata for `T`, with the URN class name taken from its
    /// [`UrnGenerator`] implementation (derived or overridden there).
    pub fn of<T: UrnGenerator + Any>() -> Self {
        Self {
            type_name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
            urn_class: T::urn_class(),
            sti_child: false,
        }
    }

    /// Override the URN class name for this registration.
    pub fn with_urn_class(mut self, class: impl Into<String>) -> Self {
        self.urn_class = class.into();
        self
    }

    /// Mark this type as a single-table-inheritance child.
    pub fn as_sti_child(mut self) -> Self {
        self.sti_child = true;
        self
    }

    /// A stable hash over the registration-relevant fields, used to detect
    /// when the cached class map is stale.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.type_name.hash(&mut hasher);
        self.urn_class.hash(&mut hasher);
        self.sti_child.hash(&mut hasher);
        hasher.finish()
    }
}

// ---------------------------------------------------------------------------
// ObjectManager / ManagerRegistry
// ---------------------------------------------------------------------------

/// An object-lookup provider: knows a set of types and can fetch instances.
pub trait ObjectManager {
    /// Metadata for every type this manager handles.
    fn all_metadata(&self) -> Vec<TypeMetadata>;

    /// Fetch the instance of `type_name` with the given identifier.
    fn find(&self, type_name: &str, id: &str) -> Option<Box<dyn Any>>;
}

/// An ordered collection of object managers.
#[derive(Default)]
pub struct ManagerRegistry {
    managers: Vec<Box<dyn ObjectManager>>,
}

impl ManagerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, manager: impl ObjectManager + 'static) -> Self {
        self.managers.push(Box::new(manager));
        self
    }

    pub fn managers(&self) -> &[Box<dyn ObjectManager>] {
        &self.managers
    }
}

// ---------------------------------------------------------------------------
// UrnConverter
// ---------------------------------------------------------------------------

/// Resolves [`Urn`] values to object instances through a manager registry.
///
/// The class-to-type map is derived once per cache directory and persisted
/// to `urn/class_map.json` alongside a fingerprint file; the cached map is
/// reused until any registered type's fingerprint changes. Regeneration is
/// idempotent, so concurrent writers racing on the same directory converge
/// on the same content.
pub struct UrnConverter {
    registry: ManagerRegistry,
    cache_dir: PathBuf,
    domains: Vec<String>,
    resolved: Mutex<HashMap<PathBuf, ClassMap>>,
}

impl UrnConverter {
    pub fn new(registry: ManagerRegistry, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            cache_dir: cache_dir.into(),
            domains: Vec::new(),
            resolved: Mutex::new(HashMap::new()),
        }
    }

    /// Restrict resolution to the given domains. An empty list (the
    /// default) accepts any domain.
    pub fn set_domains(&mut self, domains: Vec<String>) {
        self.domains = domains;
    }

    /// The URN class map, read through the per-directory cache.
    ///
    /// # Errors
    ///
    /// [`UrnError::InvalidConfiguration`] when two types register the same
    /// class name; [`UrnError::Cache`] on cache I/O failures.
    pub fn urn_class_map(&self, cache_dir: Option<&Path>) -> Result<ClassMap, UrnError> {
        let dir = cache_dir.unwrap_or(&self.cache_dir).to_path_buf();

        if let Ok(resolved) = self.resolved.lock() {
            if let Some(map) = resolved.get(&dir) {
                return Ok(map.clone());
            }
        }

        let map = self.load_or_build(&dir)?;

        if let Ok(mut resolved) = self.resolved.lock() {
            resolved.insert(dir, map.clone());
        }

        Ok(map)
    }

    /// Resolve a URN to the object it names.
    ///
    /// When `acceptable` is given, the resolved object must be exactly that
    /// type.
    ///
    /// # Errors
    ///
    /// [`UrnError::ResourceNotFound`] for a domain outside the accepted
    /// set, an unregistered class, a missing object, or a type mismatch.
    pub fn item_from_urn(
        &self,
        urn: &Urn,
        acceptable: Option<TypeId>,
    ) -> Result<Box<dyn Any>, UrnError> {
        if !self.domains.is_empty() && !self.domains.iter().any(|d| d == &urn.domain) {
            return Err(UrnError::ResourceNotFound(format!(
                "invalid domain \"{}\"",
                urn.domain
            )));
        }

        let map = self.urn_class_map(None)?;
        let type_name = map.get(&urn.class).ok_or_else(|| {
            UrnError::ResourceNotFound(format!("invalid class \"{}\"", urn.class))
        })?;

        let not_found = || UrnError::ResourceNotFound(format!("cannot find item with urn \"{urn}\""));

        let manager = self.find_manager(type_name).ok_or_else(not_found)?;
        let item = manager.find(type_name, &urn.id).ok_or_else(not_found)?;

        if let Some(type_id) = acceptable {
            if (*item).type_id() != type_id {
                return Err(not_found());
            }
        }

        Ok(item)
    }

    /// Typed convenience around [`item_from_urn`].
    ///
    /// [`item_from_urn`]: UrnConverter::item_from_urn
    pub fn typed_item_from_urn<T: Any>(&self, urn: &Urn) -> Result<Box<T>, UrnError> {
        let item = self.item_from_urn(urn, Some(TypeId::of::<T>()))?;
        item.downcast::<T>().map_err(|_| {
            UrnError::ResourceNotFound(format!("cannot find item with urn \"{urn}\""))
        })
    }

    // ----- class map construction and caching ------------------------------

    fn find_manager(&self, type_name: &str) -> Option<&dyn ObjectManager> {
        self.registry
            .managers()
            .iter()
            .find(|m| m.all_metadata().iter().any(|meta| meta.type_name == type_name))
            .map(Box::as_ref)
    }

    /// The sorted fingerprint set of every registered type.
    fn fingerprints(&self) -> Vec<u64> {
        let mut prints: Vec<u64> = self
            .registry
            .managers()
            .iter()
            .flat_map(|m| m.all_metadata())
            .map(|meta| meta.fingerprint())
            .collect();
        prints.sort_unstable();
        prints
    }

    fn load_or_build(&self, dir: &Path) -> Result<ClassMap, UrnError> {
        let map_path = dir.join("urn").join("class_map.json");
        let meta_path = dir.join("urn").join("class_map.json.meta");
        let prints = self.fingerprints();

        if let Some(map) = load_fresh(&map_path, &meta_path, &prints) {
            return Ok(map);
        }

        let map = self.build_class_map()?;

        let parent = map_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| dir.to_path_buf());
        std::fs::create_dir_all(&parent).map_err(|e| UrnError::Cache(e.to_string()))?;

        let map_json =
            serde_json::to_string_pretty(&map).map_err(|e| UrnError::Cache(e.to_string()))?;
        let meta_json =
            serde_json::to_string(&prints).map_err(|e| UrnError::Cache(e.to_string()))?;
        std::fs::write(&map_path, map_json).map_err(|e| UrnError::Cache(e.to_string()))?;
        std::fs::write(&meta_path, meta_json).map_err(|e| UrnError::Cache(e.to_string()))?;

        Ok(map)
    }

    fn build_class_map(&self) -> Result<ClassMap, UrnError> {
        let mut map = ClassMap::new();

        for manager in self.registry.managers() {
            for meta in manager.all_metadata() {
                // Only the hierarchy root registers a class name.
                if meta.sti_child {
                    continue;
                }

                if map.contains_key(&meta.urn_class) {
                    return Err(UrnError::InvalidConfiguration(format!(
                        "urn class \"{}\" is used more than once",
                        meta.urn_class
                    )));
                }

                map.insert(meta.urn_class, meta.type_name.to_string());
            }
        }

        Ok(map)
    }
}

/// Load the cached map when both files exist and the fingerprints match.
fn load_fresh(map_path: &Path, meta_path: &Path, prints: &[u64]) -> Option<ClassMap> {
    let meta_json = std::fs::read_to_string(meta_path).ok()?;
    let cached_prints: Vec<u64> = serde_json::from_str(&meta_json).ok()?;
    if cached_prints != prints {
        return None;
    }

    let map_json = std::fs::read_to_string(map_path).ok()?;
    serde_json::from_str(&map_json).ok()
}

impl std::fmt::Debug for UrnConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrnConverter")
            .field("cache_dir", &self.cache_dir)
            .field("domains", &self.domains)
            .field("managers", &self.registry.managers().len())
            .finish()
    }
}
