// Persistence of named recorded series for sonogate.

pub mod error;
pub mod json;
pub mod memory;

pub use error::StoreError;
pub use json::JsonSeriesStore;
pub use memory::MemorySeriesStore;

/// Rejette les noms vides ou qui sortiraient du répertoire de stockage.
pub(crate) fn check_name(name: &str) -> Result<(), StoreError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.contains('\0');
    if bad {
        return Err(StoreError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}
