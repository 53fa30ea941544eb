pub use super::factories::{DocumentFactory, StoreFactory, WriteOperationFactory};

pub struct Factory;

impl Factory {
    pub fn document() -> DocumentFactory {
        DocumentFactory::new()
    }

    pub fn write_operation() -> WriteOperationFactory {
        WriteOperationFactory::new()
    }

    pub fn store() -> StoreFactory {
        StoreFactory::new()
    }
}
