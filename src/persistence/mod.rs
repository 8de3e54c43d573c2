//! Order history storage.
//!
//! The DCA core never touches storage. The run service uses an
//! [`OrderRepository`] to decide whether a run is due and to record its result.

pub mod memory;
pub mod repository;

pub use memory::MemoryRepository;
pub use repository::OrderRepository;
