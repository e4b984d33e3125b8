pub mod compendium;
pub mod items;
pub mod lenient;
pub mod level_data;
pub mod loader;
pub mod occupation;
pub mod proficiency;
pub mod race;
pub mod store;
pub mod validate;

pub use compendium::Compendium;
pub use items::{Action, Armor, ArmorCategory, AttackKind, DamageType, Trait, WeaponType};
pub use level_data::{LevelEntry, LevelTable};
pub use loader::{load_compendium, load_snapshot, DEFAULT_SNAPSHOT_PATH};
pub use occupation::{Bounded, Occupation};
pub use proficiency::{ArmorTag, ProficiencyRef, WeaponTag};
pub use race::{Nameable, Race, Subrace};
pub use store::{DocumentStore, MemoryStore, StoreError, StoreResult};
pub use validate::{validate_compendium, ValidationReport, ValidationSeverity};
