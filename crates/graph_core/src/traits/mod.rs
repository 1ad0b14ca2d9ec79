pub mod persistence;

pub use persistence::{
    GraphPersistence, HistoryLog, HistoryPersistence, PersistenceError, PersistenceResult,
};
