use std::any::Any;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use bridgework::{
    ManagerRegistry, ObjectManager, TypeMetadata, Urn, UrnConverter, UrnError, UrnGenerator,
    derive_urn_class,
};

// =========================================================================
// Fixtures
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
struct Book {
    id: String,
    title: String,
}

impl UrnGenerator for Book {
    fn urn_id(&self) -> String {
        self.id.clone()
    }

    fn urn_owner(&self) -> Option<String> {
        Some("librarian".to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Author {
    id: String,
}

impl UrnGenerator for Author {
    fn urn_id(&self) -> String {
        self.id.clone()
    }
}

/// A "book" under a different registered class name.
#[derive(Debug, Clone)]
struct ArchivedBook {
    id: String,
}

impl UrnGenerator for ArchivedBook {
    fn urn_id(&self) -> String {
        self.id.clone()
    }

    fn urn_class() -> String {
        "archive_entry".to_string()
    }
}

struct BookManager {
    books: Vec<Book>,
}

impl ObjectManager for BookManager {
    fn all_metadata(&self) -> Vec<TypeMetadata> {
        vec![TypeMetadata::of::<Book>()]
    }

    fn find(&self, type_name: &str, id: &str) -> Option<Box<dyn Any>> {
        if type_name != std::any::type_name::<Book>() {
            return None;
        }
        self.books
            .iter()
            .find(|b| b.id == id)
            .map(|b| Box::new(b.clone()) as Box<dyn Any>)
    }
}

/// A manager that only advertises metadata; lookups always miss.
struct MetaOnlyManager {
    metadata: Vec<TypeMetadata>,
}

impl ObjectManager for MetaOnlyManager {
    fn all_metadata(&self) -> Vec<TypeMetadata> {
        self.metadata.clone()
    }

    fn find(&self, _type_name: &str, _id: &str) -> Option<Box<dyn Any>> {
        None
    }
}

/// A manager that counts how often `find` is called.
struct RecordingManager {
    finds: Rc<RefCell<u32>>,
}

impl ObjectManager for RecordingManager {
    fn all_metadata(&self) -> Vec<TypeMetadata> {
        vec![TypeMetadata::of::<Book>()]
    }

    fn find(&self, _type_name: &str, _id: &str) -> Option<Box<dyn Any>> {
        *self.finds.borrow_mut() += 1;
        None
    }
}

fn cache_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("bridgework-urn-{}-{}", tag, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn library() -> BookManager {
    BookManager {
        books: vec![
            Book { id: "42".into(), title: "Dune".into() },
            Book { id: "7".into(), title: "Solaris".into() },
        ],
    }
}

// =========================================================================
// Urn parsing and formatting
// =========================================================================

#[test]
fn canonical_string_round_trips() {
    let text = "urn:library:eu:acme:admin:book:42";
    let urn: Urn = text.parse().expect("valid urn");

    assert_eq!(urn.domain, "library");
    assert_eq!(urn.partition.as_deref(), Some("eu"));
    assert_eq!(urn.tenant.as_deref(), Some("acme"));
    assert_eq!(urn.owner.as_deref(), Some("admin"));
    assert_eq!(urn.class, "book");
    assert_eq!(urn.id, "42");
    assert_eq!(urn.to_string(), text);
}

#[test]
fn empty_segments_parse_to_none() {
    let urn = Urn::parse("urn:::::book:42").expect("valid urn");
    assert_eq!(urn.domain, "");
    assert_eq!(urn.partition, None);
    assert_eq!(urn.tenant, None);
    assert_eq!(urn.owner, None);
    assert_eq!(urn.to_string(), "urn:::::book:42");
}

#[test]
fn empty_domain_takes_the_default() {
    let urn = Urn::parse_with_default_domain("urn:::::book:42", "library").expect("valid urn");
    assert_eq!(urn.domain, "library");

    let urn = Urn::parse_with_default_domain("urn:archive::::book:42", "library").expect("valid");
    assert_eq!(urn.domain, "archive", "explicit domain is kept");
}

#[test]
fn grammar_check_rejects_malformed_strings() {
    assert!(Urn::is_urn("urn:library:eu:acme:admin:book:42"));
    assert!(Urn::is_urn("urn::::::42"), "empty class passes the shape check");

    assert!(!Urn::is_urn("library:eu:acme:admin:book:42"), "missing prefix");
    assert!(!Urn::is_urn("urn:library:book:42"), "too few segments");
    assert!(!Urn::is_urn("urn:::::book:"), "empty id");
    assert!(!Urn::is_urn("urn:::::book: 42"), "whitespace-led id");
}

#[test]
fn parse_rejects_an_empty_class() {
    assert!(matches!(Urn::parse("urn::::::42"), Err(UrnError::MissingClass)));
}

#[test]
fn parse_rejects_non_urn_strings() {
    match Urn::parse("not a urn") {
        Err(UrnError::InvalidUrn(value)) => assert_eq!(value, "not a urn"),
        other => panic!("expected InvalidUrn, got {other:?}"),
    }
}

#[test]
fn construction_requires_class_and_id() {
    assert!(matches!(Urn::new("42", ""), Err(UrnError::MissingClass)));
    assert!(matches!(Urn::new("", "book"), Err(UrnError::MissingId)));

    let urn = Urn::new("42", "book")
        .expect("valid")
        .with_domain("library")
        .with_partition("eu")
        .with_tenant("acme")
        .with_owner("admin");
    assert_eq!(urn.to_string(), "urn:library:eu:acme:admin:book:42");
}

#[test]
fn owner_can_be_taken_from_another_resource() {
    let owner = Author { id: "a-9".into() };
    let urn = Urn::new("42", "book").expect("valid").with_owner_of(&owner);
    assert_eq!(urn.owner.as_deref(), Some("a-9"));
}

// =========================================================================
// UrnGenerator
// =========================================================================

#[test]
fn generator_assembles_the_urn() {
    let book = Book { id: "42".into(), title: "Dune".into() };
    let urn = book.urn();

    assert_eq!(urn.class, "book");
    assert_eq!(urn.id, "42");
    assert_eq!(urn.owner.as_deref(), Some("librarian"));
    assert_eq!(urn.domain, "", "the domain is the caller's to fill in");
    assert_eq!(urn.partition, None);
}

#[test]
fn class_name_derivation_and_override() {
    assert_eq!(Book::urn_class(), "book");
    assert_eq!(ArchivedBook::urn_class(), "archive_entry");
    assert_eq!(derive_urn_class("order::model::OrderLine"), "order_line");
}

// =========================================================================
// UrnConverter
// =========================================================================

#[test]
fn registered_types_resolve() {
    let registry = ManagerRegistry::new().register(library());
    let converter = UrnConverter::new(registry, cache_dir("resolve"));

    let urn = Urn::new("42", "book").expect("valid");
    let book = converter.typed_item_from_urn::<Book>(&urn).expect("found");
    assert_eq!(book.title, "Dune");
}

#[test]
fn unknown_class_is_not_found() {
    let registry = ManagerRegistry::new().register(library());
    let converter = UrnConverter::new(registry, cache_dir("unknown-class"));

    let urn = Urn::new("42", "magazine").expect("valid");
    match converter.item_from_urn(&urn, None) {
        Err(UrnError::ResourceNotFound(message)) => {
            assert!(message.contains("magazine"), "bad message: {message}");
        }
        other => panic!("expected ResourceNotFound, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn missing_object_is_not_found() {
    let registry = ManagerRegistry::new().register(library());
    let converter = UrnConverter::new(registry, cache_dir("missing-object"));

    let urn = Urn::new("404", "book").expect("valid");
    match converter.item_from_urn(&urn, None) {
        Err(UrnError::ResourceNotFound(message)) => {
            assert!(message.contains(&urn.to_string()), "bad message: {message}");
        }
        other => panic!("expected ResourceNotFound, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn wrong_type_expectation_is_not_found() {
    let registry = ManagerRegistry::new().register(library());
    let converter = UrnConverter::new(registry, cache_dir("wrong-type"));

    let urn = Urn::new("42", "book").expect("valid");
    assert!(matches!(
        converter.typed_item_from_urn::<Author>(&urn),
        Err(UrnError::ResourceNotFound(_))
    ));
}

#[test]
fn domain_restriction_is_checked_before_any_lookup() {
    let finds = Rc::new(RefCell::new(0));
    let registry = ManagerRegistry::new().register(RecordingManager { finds: Rc::clone(&finds) });
    let mut converter = UrnConverter::new(registry, cache_dir("domains"));
    converter.set_domains(vec!["library".to_string()]);

    let urn = Urn::new("42", "book").expect("valid").with_domain("warehouse");
    match converter.item_from_urn(&urn, None) {
        Err(UrnError::ResourceNotFound(message)) => {
            assert!(message.contains("warehouse"), "bad message: {message}");
        }
        other => panic!("expected ResourceNotFound, got {:?}", other.map(|_| ())),
    }
    assert_eq!(*finds.borrow(), 0, "no manager lookup for a foreign domain");

    // The accepted domain proceeds to the (empty) manager.
    let urn = Urn::new("42", "book").expect("valid").with_domain("library");
    assert!(converter.item_from_urn(&urn, None).is_err());
    assert_eq!(*finds.borrow(), 1);
}

#[test]
fn duplicate_class_registration_is_rejected() {
    let registry = ManagerRegistry::new().register(MetaOnlyManager {
        metadata: vec![
            TypeMetadata::of::<Book>(),
            TypeMetadata::of::<Author>().with_urn_class("book"),
        ],
    });
    let converter = UrnConverter::new(registry, cache_dir("duplicate"));

    match converter.urn_class_map(None) {
        Err(UrnError::InvalidConfiguration(message)) => {
            assert!(message.contains("book"), "bad message: {message}");
        }
        other => panic!("expected InvalidConfiguration, got {other:?}"),
    }
}

#[test]
fn sti_children_do_not_register_a_class() {
    let registry = ManagerRegistry::new().register(MetaOnlyManager {
        metadata: vec![
            TypeMetadata::of::<Book>(),
            TypeMetadata::of::<ArchivedBook>().with_urn_class("book").as_sti_child(),
        ],
    });
    let converter = UrnConverter::new(registry, cache_dir("sti"));

    let map = converter.urn_class_map(None).expect("no conflict");
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("book").map(String::as_str), Some(std::any::type_name::<Book>()));
}

#[test]
fn class_map_is_cached_and_regenerated_on_change() {
    let dir = cache_dir("cache");

    let converter = UrnConverter::new(ManagerRegistry::new().register(library()), &dir);
    let first = converter.urn_class_map(None).expect("built");
    assert_eq!(first.len(), 1);

    let map_path = dir.join("urn").join("class_map.json");
    assert!(map_path.exists(), "map persisted to {map_path:?}");

    // Same registrations: the persisted map is still fresh.
    let converter = UrnConverter::new(ManagerRegistry::new().register(library()), &dir);
    assert_eq!(converter.urn_class_map(None).expect("loaded"), first);

    // A new registration changes the fingerprints and forces a rebuild.
    let registry = ManagerRegistry::new()
        .register(library())
        .register(MetaOnlyManager { metadata: vec![TypeMetadata::of::<Author>()] });
    let converter = UrnConverter::new(registry, &dir);
    let rebuilt = converter.urn_class_map(None).expect("rebuilt");
    assert_eq!(rebuilt.len(), 2);
    assert!(rebuilt.contains_key("author"));

    let persisted = std::fs::read_to_string(&map_path).expect("readable");
    assert!(persisted.contains("author"), "rebuild reached the disk cache");
}
