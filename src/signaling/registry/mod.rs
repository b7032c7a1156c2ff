pub mod in_memory_registration_store;
pub mod registration_store;

pub use in_memory_registration_store::InMemoryRegistrationStore;
pub use registration_store::RegistrationStore;
