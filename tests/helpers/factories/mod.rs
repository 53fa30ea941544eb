pub mod document_factory;
pub mod store_factory;
pub mod write_operation_factory;

pub use document_factory::DocumentFactory;
pub use store_factory::StoreFactory;
pub use write_operation_factory::WriteOperationFactory;

#[cfg(test)]
mod document_factory_test;
#[cfg(test)]
mod store_factory_test;
#[cfg(test)]
mod write_operation_factory_test;
